//! Policy rule evaluation against observed repository state.
//!
//! Evaluation is a pure function of one rule check and one repository state.
//! Checks that cannot be evaluated (malformed or unrecognized rules) never
//! produce a finding, and neither do `security_feature` rules naming a
//! feature the state does not track.

use serde::{Deserialize, Serialize};
use std::fmt;

use repo_config::policy::{RuleCheck, SecurityFeature};

use crate::state::RepositoryState;

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;

/// An expected or observed value reported with a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComplianceValue {
    Flag(bool),
    Count(i64),
    Text(String),
}

impl fmt::Display for ComplianceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(flag) => write!(f, "{}", flag),
            Self::Count(count) => write!(f, "{}", count),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// A failed check: what the rule expected, what was observed, and how to fix it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub expected: ComplianceValue,
    pub actual: ComplianceValue,
    pub remediation: String,
}

impl Finding {
    fn new(expected: ComplianceValue, actual: ComplianceValue, remediation: impl Into<String>) -> Self {
        Self {
            expected,
            actual,
            remediation: remediation.into(),
        }
    }
}

/// Checks `state` against one rule check.
///
/// Returns `None` when the repository complies or the check cannot be
/// evaluated.
///
/// # Examples
///
/// ```rust
/// use compliance_audit::evaluator::{evaluate, ComplianceValue};
/// use compliance_audit::RepositoryState;
/// use repo_config::policy::RuleCheck;
///
/// let finding = evaluate(&RuleCheck::MinReviews(2), &RepositoryState::default()).unwrap();
/// assert_eq!(finding.expected, ComplianceValue::Count(2));
/// assert_eq!(finding.actual, ComplianceValue::Count(0));
/// ```
pub fn evaluate(check: &RuleCheck, state: &RepositoryState) -> Option<Finding> {
    match check {
        RuleCheck::Visibility(expected) => {
            let actual = state.visibility();
            (expected.as_str() != actual.as_str()).then(|| {
                Finding::new(
                    ComplianceValue::Text(expected.clone()),
                    ComplianceValue::Text(actual.to_string()),
                    format!("Change repository visibility to {}", expected),
                )
            })
        }

        RuleCheck::BranchProtection(required) => {
            let protected = state.main_branch().is_some_and(|branch| branch.protected);
            (*required && !protected).then(|| {
                Finding::new(
                    ComplianceValue::Flag(true),
                    ComplianceValue::Flag(false),
                    "Enable branch protection for the main branch.",
                )
            })
        }

        RuleCheck::MinReviews(expected) => match state.main_branch() {
            None => Some(Finding::new(
                ComplianceValue::Count(*expected),
                ComplianceValue::Count(0),
                "Enable branch protection with required reviews",
            )),
            Some(branch) if i64::from(branch.required_reviews) < *expected => Some(Finding::new(
                ComplianceValue::Count(*expected),
                ComplianceValue::Count(i64::from(branch.required_reviews)),
                format!("Increase required reviewers to {}", expected),
            )),
            Some(_) => None,
        },

        RuleCheck::FileExists(file) => (!state.has_file(file)).then(|| {
            Finding::new(
                ComplianceValue::Text(file.clone()),
                ComplianceValue::Text("not found".to_string()),
                format!("Add required file: {}", file),
            )
        }),

        RuleCheck::WorkflowExists(workflow) => (!state.has_workflow(workflow)).then(|| {
            Finding::new(
                ComplianceValue::Text(workflow.clone()),
                ComplianceValue::Text("not found".to_string()),
                format!("Add required workflow: {}", workflow),
            )
        }),

        RuleCheck::SecurityFeature(feature) => {
            let enabled = match feature {
                SecurityFeature::VulnerabilityAlerts => state.vulnerability_alerts,
                SecurityFeature::SecurityAdvisories => state.security_advisories,
                SecurityFeature::Other(_) => return None,
            };
            (!enabled).then(|| {
                Finding::new(
                    ComplianceValue::Text(format!("{} enabled", feature)),
                    ComplianceValue::Text("disabled".to_string()),
                    format!("Enable {} in repository settings", feature),
                )
            })
        }

        RuleCheck::Malformed { .. } | RuleCheck::Unrecognized { .. } => None,
    }
}
