//! Built-in compliance policies and presets.
//!
//! The catalog offers ready-made policies for common concerns (branch
//! protection, vulnerability management, documentation, CI, code quality).
//! A preset selects a subset of the catalog and adjusts rule values or
//! enforcement for a compliance framework.
//!
//! # Examples
//!
//! ```rust
//! use repo_config::catalog::preset_policies;
//! use repo_config::policy::RuleCheck;
//!
//! let policies = preset_policies("enterprise")?;
//! let reviews = &policies["branch_protection"].rules["require_reviews"];
//! assert_eq!(reviews.check, RuleCheck::MinReviews(3));
//! # Ok::<(), repo_config::ConfigurationError>(())
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::policy::{
    Enforcement, PolicyRule, PolicyTemplate, RuleCheck, BRANCH_PROTECTION, FILE_EXISTS,
    MIN_REVIEWS, SECURITY_FEATURE, WORKFLOW_EXISTS,
};

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;

/// Adjustments a preset makes to one catalog policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PolicyOverride {
    /// Enforcement applied to every rule of the policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement: Option<Enforcement>,

    /// Per-rule adjustments, applied after the policy-wide enforcement.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rules: BTreeMap<String, RuleOverride>,
}

/// Adjustments a preset makes to one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RuleOverride {
    /// Replacement value, interpreted according to the rule's type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement: Option<Enforcement>,
}

/// A named selection of catalog policies for a compliance framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyPreset {
    /// Display name.
    pub name: String,

    pub description: String,

    /// Catalog policies included by the preset.
    pub policies: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, PolicyOverride>,
}

impl PolicyPreset {
    /// Selects this preset's policies from `catalog` and applies its overrides.
    ///
    /// Policies missing from the catalog, and overrides naming rules the
    /// policy does not have, are skipped.
    pub fn apply(&self, catalog: &BTreeMap<String, PolicyTemplate>) -> BTreeMap<String, PolicyTemplate> {
        let mut selected = BTreeMap::new();

        for policy_name in &self.policies {
            let Some(policy) = catalog.get(policy_name) else {
                debug!("Preset '{}' names unknown policy '{}'", self.name, policy_name);
                continue;
            };

            let mut policy = policy.clone();
            if let Some(adjustment) = self.overrides.get(policy_name) {
                adjustment.apply_to(&mut policy);
            }
            selected.insert(policy_name.clone(), policy);
        }

        selected
    }
}

impl PolicyOverride {
    fn apply_to(&self, policy: &mut PolicyTemplate) {
        if let Some(enforcement) = self.enforcement {
            for rule in policy.rules.values_mut() {
                rule.enforcement = enforcement;
            }
        }

        for (rule_name, adjustment) in &self.rules {
            let Some(rule) = policy.rules.get_mut(rule_name) else {
                continue;
            };
            if let Some(value) = &adjustment.value {
                let rule_type = rule.rule_type().to_string();
                rule.check = RuleCheck::from_parts(&rule_type, value.clone());
            }
            if let Some(enforcement) = adjustment.enforcement {
                rule.enforcement = enforcement;
            }
        }
    }
}

fn rule(rule_type: &str, value: Value, enforcement: Enforcement, message: &str) -> PolicyRule {
    PolicyRule::new(RuleCheck::from_parts(rule_type, value), enforcement).with_message(message)
}

fn policy(description: &str, rules: Vec<(&str, PolicyRule)>) -> PolicyTemplate {
    PolicyTemplate {
        description: description.to_string(),
        rules: rules
            .into_iter()
            .map(|(name, rule)| (name.to_string(), rule))
            .collect(),
    }
}

/// The built-in policy catalog, keyed by policy name.
pub fn builtin_policies() -> BTreeMap<String, PolicyTemplate> {
    use Enforcement::{Optional, Recommended, Required};

    BTreeMap::from([
        (
            "branch_protection".to_string(),
            policy(
                "Enforce branch protection rules on critical branches",
                vec![
                    (
                        "main_protected",
                        rule(BRANCH_PROTECTION, json!(true), Required, "Main branch must be protected"),
                    ),
                    (
                        "require_reviews",
                        rule(
                            MIN_REVIEWS,
                            json!(2),
                            Required,
                            "Pull requests must be reviewed before merging",
                        ),
                    ),
                ],
            ),
        ),
        (
            "vulnerability_management".to_string(),
            policy(
                "Enable security vulnerability detection and management",
                vec![
                    (
                        "vulnerability_alerts",
                        rule(
                            SECURITY_FEATURE,
                            json!("vulnerability_alerts"),
                            Required,
                            "Vulnerability alerts must be enabled",
                        ),
                    ),
                    (
                        "security_advisories",
                        rule(
                            SECURITY_FEATURE,
                            json!("security_advisories"),
                            Required,
                            "Security advisories must be enabled",
                        ),
                    ),
                ],
            ),
        ),
        (
            "required_documentation".to_string(),
            policy(
                "Ensure required documentation files are present",
                vec![
                    (
                        "readme",
                        rule(FILE_EXISTS, json!("README.md"), Required, "README.md file is required"),
                    ),
                    (
                        "license",
                        rule(FILE_EXISTS, json!("LICENSE"), Required, "LICENSE file is required"),
                    ),
                    (
                        "security_policy",
                        rule(
                            FILE_EXISTS,
                            json!("SECURITY.md"),
                            Recommended,
                            "SECURITY.md file should be present",
                        ),
                    ),
                ],
            ),
        ),
        (
            "ci_cd_pipeline".to_string(),
            policy(
                "Ensure CI/CD pipelines are properly configured",
                vec![(
                    "ci_workflow",
                    rule(
                        WORKFLOW_EXISTS,
                        json!(".github/workflows/ci.yml"),
                        Recommended,
                        "CI workflow should be configured",
                    ),
                )],
            ),
        ),
        (
            "code_quality".to_string(),
            policy(
                "Enforce code quality standards",
                vec![
                    (
                        "code_owners",
                        rule(
                            FILE_EXISTS,
                            json!("CODEOWNERS"),
                            Recommended,
                            "CODEOWNERS file should be defined",
                        ),
                    ),
                    (
                        "contributing_guide",
                        rule(
                            FILE_EXISTS,
                            json!("CONTRIBUTING.md"),
                            Optional,
                            "Contribution guidelines should be present",
                        ),
                    ),
                ],
            ),
        ),
    ])
}

/// The built-in presets, keyed by preset name.
pub fn presets() -> BTreeMap<String, PolicyPreset> {
    BTreeMap::from([
        (
            "minimal".to_string(),
            PolicyPreset {
                name: "Minimal Security".to_string(),
                description: "Basic security requirements for all repositories".to_string(),
                policies: vec![
                    "branch_protection".to_string(),
                    "vulnerability_management".to_string(),
                ],
                overrides: BTreeMap::from([(
                    "branch_protection".to_string(),
                    review_override(1),
                )]),
            },
        ),
        (
            "soc2".to_string(),
            PolicyPreset {
                name: "SOC 2 Type II".to_string(),
                description: "Service Organization Control 2 compliance requirements".to_string(),
                policies: vec![
                    "branch_protection".to_string(),
                    "vulnerability_management".to_string(),
                    "required_documentation".to_string(),
                ],
                overrides: BTreeMap::from([(
                    "branch_protection".to_string(),
                    review_override(2),
                )]),
            },
        ),
        (
            "enterprise".to_string(),
            PolicyPreset {
                name: "Enterprise Standard".to_string(),
                description: "Comprehensive enterprise security and compliance".to_string(),
                policies: vec![
                    "branch_protection".to_string(),
                    "vulnerability_management".to_string(),
                    "required_documentation".to_string(),
                    "ci_cd_pipeline".to_string(),
                    "code_quality".to_string(),
                ],
                overrides: BTreeMap::from([
                    ("branch_protection".to_string(), review_override(3)),
                    (
                        "ci_cd_pipeline".to_string(),
                        PolicyOverride {
                            enforcement: Some(Enforcement::Required),
                            ..Default::default()
                        },
                    ),
                ]),
            },
        ),
    ])
}

fn review_override(count: u32) -> PolicyOverride {
    PolicyOverride {
        enforcement: None,
        rules: BTreeMap::from([(
            "require_reviews".to_string(),
            RuleOverride {
                value: Some(json!(count)),
                enforcement: None,
            },
        )]),
    }
}

/// The catalog policies of preset `name`, with the preset's overrides applied.
///
/// # Errors
///
/// Returns `ConfigurationError::InvalidConfiguration` when no preset is
/// named `name`.
pub fn preset_policies(name: &str) -> ConfigurationResult<BTreeMap<String, PolicyTemplate>> {
    let presets = presets();
    let preset = presets
        .get(name)
        .ok_or_else(|| ConfigurationError::InvalidConfiguration {
            field: "preset".to_string(),
            reason: format!(
                "unknown preset '{}', expected one of: {}",
                name,
                presets.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
        })?;

    Ok(preset.apply(&builtin_policies()))
}
