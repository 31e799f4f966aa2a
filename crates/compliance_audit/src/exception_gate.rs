//! Decides which policy exceptions currently suppress violations.

use chrono::{DateTime, Utc};
use tracing::debug;

use repo_config::PolicyException;

use crate::options::{AuditOptions, ExceptionExpiry};

#[cfg(test)]
#[path = "exception_gate_tests.rs"]
mod tests;

/// Applies the configured expiry semantics to policy exceptions.
///
/// # Examples
///
/// ```rust
/// use compliance_audit::{exception_gate::ExceptionGate, AuditOptions};
/// use repo_config::PolicyException;
///
/// let exception = PolicyException {
///     policy_name: "docs".to_string(),
///     rule_name: "license".to_string(),
///     expires_at: "2000-01-01".to_string(),
///     ..Default::default()
/// };
///
/// // Expiry is ignored unless enforcement is requested.
/// let gate = ExceptionGate::new(&AuditOptions::default());
/// assert!(gate.has_active_exception("docs", "license", &[exception]));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionGate {
    expiry: ExceptionExpiry,
    now: DateTime<Utc>,
}

impl ExceptionGate {
    pub fn new(options: &AuditOptions) -> Self {
        Self {
            expiry: options.exception_expiry,
            now: options.evaluated_at,
        }
    }

    /// Whether `exception` is in force.
    ///
    /// Exceptions without an expiry are always active. With expiry
    /// enforcement, an unparseable expiry keeps the exception active; the
    /// configuration validator reports it.
    pub fn is_active(&self, exception: &PolicyException) -> bool {
        match self.expiry {
            ExceptionExpiry::Ignore => true,
            ExceptionExpiry::Enforce => {
                let expired = exception.is_expired_at(self.now);
                if expired {
                    debug!(
                        "Exception for {}/{} expired at {}",
                        exception.policy_name, exception.rule_name, exception.expires_at
                    );
                }
                !expired
            }
        }
    }

    /// Whether any active exception in `exceptions` waives `(policy_name, rule_name)`.
    pub fn has_active_exception(
        &self,
        policy_name: &str,
        rule_name: &str,
        exceptions: &[PolicyException],
    ) -> bool {
        exceptions
            .iter()
            .any(|exception| exception.covers(policy_name, rule_name) && self.is_active(exception))
    }
}
