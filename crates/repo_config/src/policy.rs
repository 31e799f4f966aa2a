//! Compliance policies and typed policy rules.
//!
//! A policy groups named rules. Each rule is written as `type` + `value` +
//! `enforcement` in configuration files; on load the untyped `value` is
//! checked against what the `type` expects and turned into a [`RuleCheck`].
//!
//! Rules whose value has the wrong shape become [`RuleCheck::Malformed`] and
//! rules of an unknown type become [`RuleCheck::Unrecognized`]. Neither ever
//! produces a violation during an audit; the configuration validator reports
//! both as warnings.
//!
//! # Examples
//!
//! ```rust
//! use repo_config::policy::{PolicyRule, RuleCheck, Severity};
//!
//! let rule: PolicyRule = serde_json::from_value(serde_json::json!({
//!     "type": "min_reviews",
//!     "value": 2,
//!     "enforcement": "required",
//! }))?;
//!
//! assert_eq!(rule.check, RuleCheck::MinReviews(2));
//! assert_eq!(rule.severity(), Severity::Critical);
//! # Ok::<(), serde_json::Error>(())
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;

/// A named group of rules checked during an audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PolicyTemplate {
    #[serde(default)]
    pub description: String,

    /// Rules keyed by rule name.
    #[serde(default)]
    pub rules: BTreeMap<String, PolicyRule>,
}

/// How strictly a rule is enforced.
///
/// Deserialization ignores case. Unknown enforcement strings deserialize as
/// [`Enforcement::Optional`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Enforcement {
    Required,
    Recommended,
    #[default]
    Optional,
}

impl From<String> for Enforcement {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "required" => Self::Required,
            "recommended" => Self::Recommended,
            _ => Self::Optional,
        }
    }
}

impl Enforcement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Recommended => "recommended",
            Self::Optional => "optional",
        }
    }

    /// Severity assigned to violations of rules with this enforcement.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Required => Severity::Critical,
            Self::Recommended => Severity::Medium,
            Self::Optional => Severity::Low,
        }
    }
}

impl fmt::Display for Enforcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a policy violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed repository visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryVisibility {
    Public,
    Private,
}

impl RepositoryVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for RepositoryVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Security feature named by a `security_feature` rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SecurityFeature {
    VulnerabilityAlerts,
    SecurityAdvisories,
    /// A feature the audited state does not track.
    Other(String),
}

impl SecurityFeature {
    pub fn parse(name: &str) -> Self {
        match name {
            "vulnerability_alerts" => Self::VulnerabilityAlerts,
            "security_advisories" => Self::SecurityAdvisories,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::VulnerabilityAlerts => "vulnerability_alerts",
            Self::SecurityAdvisories => "security_advisories",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for SecurityFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a rule checks, with its expected value.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCheck {
    /// Repository visibility must equal this string exactly. Only `public`
    /// and `private` are ever observed, so `internal` or differently cased
    /// values never pass.
    Visibility(String),
    /// When `true`, the `main` branch must be protected. `false` disables the check.
    BranchProtection(bool),
    /// `main` must be protected and require at least this many reviews.
    MinReviews(i64),
    /// File must be present (case-insensitive).
    FileExists(String),
    /// Workflow must be present; a leading `.github/workflows/` is ignored.
    WorkflowExists(String),
    /// Security feature must be enabled.
    SecurityFeature(SecurityFeature),
    /// Known rule type whose value has the wrong shape.
    Malformed { rule_type: String, value: Value },
    /// Rule type this engine does not evaluate.
    Unrecognized { rule_type: String, value: Value },
}

pub const VISIBILITY: &str = "visibility";
pub const BRANCH_PROTECTION: &str = "branch_protection";
pub const MIN_REVIEWS: &str = "min_reviews";
pub const FILE_EXISTS: &str = "file_exists";
pub const WORKFLOW_EXISTS: &str = "workflow_exists";
pub const SECURITY_FEATURE: &str = "security_feature";

impl RuleCheck {
    /// Builds a check from the untyped `type` and `value` pair.
    pub fn from_parts(rule_type: &str, value: Value) -> Self {
        let parsed = match rule_type {
            VISIBILITY => value
                .as_str()
                .map(|visibility| Self::Visibility(visibility.to_string())),
            BRANCH_PROTECTION => value.as_bool().map(Self::BranchProtection),
            MIN_REVIEWS => review_count(&value).map(Self::MinReviews),
            FILE_EXISTS => value.as_str().map(|file| Self::FileExists(file.to_string())),
            WORKFLOW_EXISTS => value
                .as_str()
                .map(|workflow| Self::WorkflowExists(workflow.to_string())),
            SECURITY_FEATURE => value
                .as_str()
                .map(|feature| Self::SecurityFeature(SecurityFeature::parse(feature))),
            _ => {
                return Self::Unrecognized {
                    rule_type: rule_type.to_string(),
                    value,
                }
            }
        };

        parsed.unwrap_or_else(|| Self::Malformed {
            rule_type: rule_type.to_string(),
            value,
        })
    }

    /// The rule type discriminator as written in configuration.
    pub fn rule_type(&self) -> &str {
        match self {
            Self::Visibility(_) => VISIBILITY,
            Self::BranchProtection(_) => BRANCH_PROTECTION,
            Self::MinReviews(_) => MIN_REVIEWS,
            Self::FileExists(_) => FILE_EXISTS,
            Self::WorkflowExists(_) => WORKFLOW_EXISTS,
            Self::SecurityFeature(_) => SECURITY_FEATURE,
            Self::Malformed { rule_type, .. } | Self::Unrecognized { rule_type, .. } => rule_type,
        }
    }

    /// The expected value in its configuration form.
    pub fn value(&self) -> Value {
        match self {
            Self::Visibility(visibility) => Value::from(visibility.as_str()),
            Self::BranchProtection(enabled) => Value::from(*enabled),
            Self::MinReviews(count) => Value::from(*count),
            Self::FileExists(file) => Value::from(file.as_str()),
            Self::WorkflowExists(workflow) => Value::from(workflow.as_str()),
            Self::SecurityFeature(feature) => Value::from(feature.as_str()),
            Self::Malformed { value, .. } | Self::Unrecognized { value, .. } => value.clone(),
        }
    }

    /// Whether the auditor can evaluate this check.
    pub fn is_evaluable(&self) -> bool {
        !matches!(self, Self::Malformed { .. } | Self::Unrecognized { .. })
    }
}

/// Accepts any integer or finite float; floats are truncated toward zero.
fn review_count(value: &Value) -> Option<i64> {
    if let Some(count) = value.as_i64() {
        return Some(count);
    }
    if let Some(count) = value.as_u64() {
        return Some(i64::try_from(count).unwrap_or(i64::MAX));
    }
    value
        .as_f64()
        .filter(|count| count.is_finite())
        .map(|count| count.trunc() as i64)
}

/// A single policy rule.
///
/// Serializes as `{ type, value, enforcement, message }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPolicyRule", into = "RawPolicyRule")]
pub struct PolicyRule {
    pub check: RuleCheck,
    pub enforcement: Enforcement,
    /// Message reported with violations. Empty means a generated message is used.
    pub message: String,
}

impl PolicyRule {
    pub fn new(check: RuleCheck, enforcement: Enforcement) -> Self {
        Self {
            check,
            enforcement,
            message: String::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn rule_type(&self) -> &str {
        self.check.rule_type()
    }

    pub fn severity(&self) -> Severity {
        self.enforcement.severity()
    }
}

#[derive(Serialize, Deserialize)]
struct RawPolicyRule {
    #[serde(rename = "type")]
    rule_type: String,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    enforcement: Enforcement,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    message: String,
}

impl From<RawPolicyRule> for PolicyRule {
    fn from(raw: RawPolicyRule) -> Self {
        Self {
            check: RuleCheck::from_parts(&raw.rule_type, raw.value),
            enforcement: raw.enforcement,
            message: raw.message,
        }
    }
}

impl From<PolicyRule> for RawPolicyRule {
    fn from(rule: PolicyRule) -> Self {
        Self {
            rule_type: rule.check.rule_type().to_string(),
            value: rule.check.value(),
            enforcement: rule.enforcement,
            message: rule.message,
        }
    }
}
