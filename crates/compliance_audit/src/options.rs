//! Audit behaviour settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How `expires_at` on policy exceptions is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionExpiry {
    /// Exceptions never expire, whatever their `expires_at` says.
    #[default]
    Ignore,
    /// An exception whose expiry lies strictly before the evaluation instant
    /// is inactive.
    Enforce,
}

/// Settings for one audit run.
///
/// # Examples
///
/// ```rust
/// use compliance_audit::{AuditOptions, ExceptionExpiry};
///
/// let options: AuditOptions = toml::from_str(r#"
///     exception_expiry = "enforce"
///     evaluated_at = "2024-06-01T00:00:00Z"
/// "#)?;
/// assert_eq!(options.exception_expiry, ExceptionExpiry::Enforce);
/// # Ok::<(), toml::de::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditOptions {
    pub exception_expiry: ExceptionExpiry,

    /// Instant used for expiry checks and stamped on the report.
    pub evaluated_at: DateTime<Utc>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            exception_expiry: ExceptionExpiry::default(),
            evaluated_at: Utc::now(),
        }
    }
}

impl AuditOptions {
    /// Options enforcing exception expiry at `evaluated_at`.
    pub fn enforcing_expiry_at(evaluated_at: DateTime<Utc>) -> Self {
        Self {
            exception_expiry: ExceptionExpiry::Enforce,
            evaluated_at,
        }
    }
}
