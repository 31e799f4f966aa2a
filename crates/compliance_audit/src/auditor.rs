//! Compliance auditing of repository states against configured policies.
//!
//! An audit is a single synchronous pass. Each repository's effective
//! configuration supplies the exceptions that apply to it; every rule of
//! every policy is then either waived by an active exception or evaluated
//! against the repository's observed state.
//!
//! Repositories whose effective configuration cannot be computed are skipped
//! and listed in the report. The audit itself never fails.

use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

use repo_config::policy::{PolicyRule, PolicyTemplate};
use repo_config::{EffectiveConfigBuilder, RepoConfig};

use crate::evaluator::{evaluate, Finding};
use crate::exception_gate::ExceptionGate;
use crate::options::AuditOptions;
use crate::report::{
    AuditReport, AuditSummary, PolicyAuditResult, PolicyViolation, RepoAuditResult,
    RuleAuditResult, SkippedRepository,
};
use crate::state::RepositoryState;

#[cfg(test)]
#[path = "auditor_tests.rs"]
mod tests;

/// How one repository fared against one policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PolicyOutcome {
    Compliant,
    Exempted,
    Violating,
}

/// Audits repository states against the policies of one configuration.
///
/// # Examples
///
/// ```rust
/// use compliance_audit::{AuditOptions, ComplianceAuditor, RepositoryState};
/// use repo_config::RepoConfig;
/// use std::collections::BTreeMap;
///
/// let config: RepoConfig = serde_json::from_value(serde_json::json!({
///     "version": "1.0",
///     "organization": "acme",
///     "policies": {
///         "docs": {
///             "rules": {
///                 "readme": { "type": "file_exists", "value": "README.md", "enforcement": "required" },
///             },
///         },
///     },
/// }))?;
///
/// let states = BTreeMap::from([
///     ("api".to_string(), RepositoryState {
///         files: vec!["README.md".to_string()],
///         ..Default::default()
///     }),
///     ("web".to_string(), RepositoryState::default()),
/// ]);
///
/// let report = ComplianceAuditor::new(&config, AuditOptions::default()).run_audit(&states);
/// assert_eq!(report.summary.compliance_percentage, 50.0);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ComplianceAuditor<'a> {
    config: &'a RepoConfig,
    options: AuditOptions,
    gate: ExceptionGate,
}

impl<'a> ComplianceAuditor<'a> {
    pub fn new(config: &'a RepoConfig, options: AuditOptions) -> Self {
        Self {
            config,
            options,
            gate: ExceptionGate::new(&options),
        }
    }

    /// Audits every supplied repository state, in repository name order.
    #[instrument(skip_all, fields(organization = %self.config.organization, repositories = states.len()))]
    pub fn run_audit(&self, states: &BTreeMap<String, RepositoryState>) -> AuditReport {
        self.warn_unevaluable_rules();

        let mut policy_results = self.initial_policy_results();
        let mut summary = AuditSummary {
            total_policies: self.config.policies.len(),
            ..Default::default()
        };
        let mut repositories = Vec::new();
        let mut skipped_repositories = Vec::new();
        let mut builder = EffectiveConfigBuilder::new(self.config);

        for (repo_name, state) in states {
            summary.total_repositories += 1;

            let effective = match builder.build(repo_name) {
                Ok(effective) => effective,
                Err(error) => {
                    warn!(
                        "Skipping repository '{}': cannot compute effective configuration: {}",
                        repo_name, error
                    );
                    skipped_repositories.push(SkippedRepository {
                        repository: repo_name.clone(),
                        reason: error.to_string(),
                    });
                    continue;
                }
            };

            let mut repo_result = RepoAuditResult {
                repository: repo_name.clone(),
                template: effective.template.clone(),
                compliant: true,
                violations: Vec::new(),
                exceptions: effective.exceptions.clone(),
                last_modified: state.last_modified,
            };

            for (policy_name, policy) in &self.config.policies {
                let Some(policy_result) = policy_results.get_mut(policy_name) else {
                    continue;
                };
                let outcome = self.audit_policy(
                    repo_name,
                    state,
                    policy_name,
                    policy,
                    policy_result,
                    &mut repo_result,
                );
                match outcome {
                    PolicyOutcome::Compliant => policy_result.compliant_repos += 1,
                    PolicyOutcome::Exempted => policy_result.exempted_repos += 1,
                    PolicyOutcome::Violating => policy_result.violating_repos += 1,
                }
            }

            summary.audited_repositories += 1;
            if repo_result.compliant {
                summary.compliant_repositories += 1;
            }
            summary.total_violations += repo_result.violations.len();
            summary.total_exceptions += repo_result.exceptions.len();
            summary.active_exceptions += repo_result
                .exceptions
                .iter()
                .filter(|exception| self.gate.is_active(exception))
                .count();

            repositories.push(repo_result);
        }

        let policies: Vec<PolicyAuditResult> = policy_results
            .into_values()
            .map(|mut result| {
                result.compliance_percentage = percentage(
                    result.compliant_repos,
                    summary.audited_repositories.saturating_sub(result.exempted_repos),
                );
                result
            })
            .collect();
        summary.compliance_percentage =
            percentage(summary.compliant_repositories, summary.audited_repositories);

        info!(
            "Audited {} of {} repositories: {} compliant, {} violation(s)",
            summary.audited_repositories,
            summary.total_repositories,
            summary.compliant_repositories,
            summary.total_violations
        );

        AuditReport {
            organization: self.config.organization.clone(),
            generated_at: self.options.evaluated_at,
            summary,
            policies,
            repositories,
            skipped_repositories,
        }
    }

    fn audit_policy(
        &self,
        repo_name: &str,
        state: &RepositoryState,
        policy_name: &str,
        policy: &PolicyTemplate,
        policy_result: &mut PolicyAuditResult,
        repo_result: &mut RepoAuditResult,
    ) -> PolicyOutcome {
        let mut outcome = PolicyOutcome::Compliant;

        for (rule_name, rule) in &policy.rules {
            let rule_result = policy_result
                .rules
                .iter_mut()
                .find(|result| result.rule_name == *rule_name);

            if self
                .gate
                .has_active_exception(policy_name, rule_name, &repo_result.exceptions)
            {
                if let Some(rule_result) = rule_result {
                    rule_result.exempted_repos.push(repo_name.to_string());
                }
                outcome = outcome.max(PolicyOutcome::Exempted);
                continue;
            }

            let Some(finding) = evaluate(&rule.check, state) else {
                continue;
            };

            if let Some(rule_result) = rule_result {
                rule_result.violating_repos.push(repo_name.to_string());
            }
            repo_result.compliant = false;
            repo_result
                .violations
                .push(violation(policy_name, rule_name, rule, finding));
            outcome = PolicyOutcome::Violating;
        }

        outcome
    }

    fn initial_policy_results(&self) -> BTreeMap<String, PolicyAuditResult> {
        self.config
            .policies
            .iter()
            .map(|(policy_name, policy)| {
                let rules = policy
                    .rules
                    .iter()
                    .map(|(rule_name, rule)| RuleAuditResult {
                        rule_name: rule_name.clone(),
                        rule_type: rule.rule_type().to_string(),
                        enforcement: rule.enforcement,
                        violating_repos: Vec::new(),
                        exempted_repos: Vec::new(),
                    })
                    .collect();

                let result = PolicyAuditResult {
                    policy_name: policy_name.clone(),
                    description: policy.description.clone(),
                    rules,
                    compliant_repos: 0,
                    violating_repos: 0,
                    exempted_repos: 0,
                    compliance_percentage: 0.0,
                };
                (policy_name.clone(), result)
            })
            .collect()
    }

    fn warn_unevaluable_rules(&self) {
        for (policy_name, policy) in &self.config.policies {
            for (rule_name, rule) in &policy.rules {
                if !rule.check.is_evaluable() {
                    warn!(
                        "Rule '{}/{}' of type '{}' cannot be evaluated and is skipped",
                        policy_name,
                        rule_name,
                        rule.rule_type()
                    );
                }
            }
        }
    }
}

/// Audits `states` against `config` with default options.
pub fn run_audit(config: &RepoConfig, states: &BTreeMap<String, RepositoryState>) -> AuditReport {
    ComplianceAuditor::new(config, AuditOptions::default()).run_audit(states)
}

fn violation(policy_name: &str, rule_name: &str, rule: &PolicyRule, finding: Finding) -> PolicyViolation {
    let message = if rule.message.is_empty() {
        format!(
            "{} check failed: expected {}, found {}",
            rule.rule_type(),
            finding.expected,
            finding.actual
        )
    } else {
        rule.message.clone()
    };

    PolicyViolation {
        policy_name: policy_name.to_string(),
        rule_name: rule_name.to_string(),
        rule_type: rule.rule_type().to_string(),
        expected: finding.expected,
        actual: finding.actual,
        severity: rule.severity(),
        message,
        remediation: finding.remediation,
    }
}

/// `part / whole * 100`, clamped to `[0, 100]`; 0 when `whole` is 0.
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0)
}
