//! Approved policy exceptions.
//!
//! An exception waives one `(policy, rule)` pair for every repository matched
//! by the target it is attached to. Whether an exception is currently active
//! is decided by the auditor; this module only models the exception and
//! interprets its expiry date.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ConfigurationError, ConfigurationResult};

#[cfg(test)]
#[path = "exception_tests.rs"]
mod tests;

/// A time-scoped, approved waiver of one policy rule.
///
/// # Examples
///
/// ```rust
/// use repo_config::PolicyException;
///
/// let exception = PolicyException {
///     policy_name: "documentation".to_string(),
///     rule_name: "license".to_string(),
///     reason: "Internal tooling".to_string(),
///     approved_by: "security-team".to_string(),
///     approval_date: "2024-01-10".to_string(),
///     expires_at: "2024-12-31".to_string(),
///     conditions: vec![],
/// };
/// assert!(exception.expiry().unwrap().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PolicyException {
    #[serde(alias = "policyName")]
    pub policy_name: String,

    #[serde(alias = "ruleName")]
    pub rule_name: String,

    #[serde(default)]
    pub reason: String,

    #[serde(default, alias = "approvedBy")]
    pub approved_by: String,

    #[serde(default, alias = "approvalDate")]
    pub approval_date: String,

    /// RFC 3339 timestamp or `YYYY-MM-DD` date. Empty means the exception never expires.
    #[serde(default, alias = "expiresAt")]
    pub expires_at: String,

    /// Free-form notes attached to the approval.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
}

impl PolicyException {
    /// Checks whether this exception waives the given rule.
    pub fn covers(&self, policy_name: &str, rule_name: &str) -> bool {
        self.policy_name == policy_name && self.rule_name == rule_name
    }

    /// Parses `expires_at`.
    ///
    /// Returns `Ok(None)` when no expiry is set. A bare date expires at the
    /// last second of that day, UTC.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidConfiguration` when `expires_at`
    /// is neither an RFC 3339 timestamp nor a `YYYY-MM-DD` date.
    pub fn expiry(&self) -> ConfigurationResult<Option<DateTime<Utc>>> {
        let raw = self.expires_at.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(timestamp.with_timezone(&Utc)));
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(23, 59, 59))
            .map(|end_of_day| Some(end_of_day.and_utc()))
            .ok_or_else(|| ConfigurationError::InvalidConfiguration {
                field: "expires_at".to_string(),
                reason: format!(
                    "'{}' is not an RFC 3339 timestamp or YYYY-MM-DD date",
                    raw
                ),
            })
    }

    /// Checks whether the exception has expired at `now`.
    ///
    /// Exceptions without an expiry, or with an unparseable one, never count
    /// as expired here.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expiry(), Ok(Some(expiry)) if expiry < now)
    }
}
