//! Compliance audit report.
//!
//! A report is built fresh by each audit run and never changes afterwards.
//! It serializes with camelCase keys for report-writing collaborators, and
//! [`AuditReport::generate_summary`] renders a Markdown overview.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt::Write;

use repo_config::policy::{Enforcement, Severity};
use repo_config::PolicyException;

use crate::evaluator::ComplianceValue;

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;

/// Result of one audit run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub organization: String,
    pub generated_at: DateTime<Utc>,
    pub summary: AuditSummary,
    /// Per-policy results, ordered by policy name.
    pub policies: Vec<PolicyAuditResult>,
    /// Per-repository results, ordered by repository name.
    pub repositories: Vec<RepoAuditResult>,
    /// Repositories whose effective configuration could not be computed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_repositories: Vec<SkippedRepository>,
}

/// Aggregate counts over all repositories.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    /// Every supplied repository, skipped ones included.
    pub total_repositories: usize,
    pub audited_repositories: usize,
    pub compliant_repositories: usize,
    /// `compliant / audited * 100`, or 0 when nothing was audited.
    pub compliance_percentage: f64,
    pub total_policies: usize,
    pub total_violations: usize,
    pub total_exceptions: usize,
    pub active_exceptions: usize,
}

/// Results for one policy.
///
/// Every audited repository falls in exactly one bucket: violating (some rule
/// violated), exempted (no violation, some rule waived) or compliant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAuditResult {
    pub policy_name: String,
    pub description: String,
    pub rules: Vec<RuleAuditResult>,
    pub compliant_repos: usize,
    pub violating_repos: usize,
    pub exempted_repos: usize,
    /// `compliant / (audited - exempted) * 100`, or 0 when the divisor is 0.
    pub compliance_percentage: f64,
}

/// Results for one rule of a policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAuditResult {
    pub rule_name: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    pub enforcement: Enforcement,
    pub violating_repos: Vec<String>,
    pub exempted_repos: Vec<String>,
}

/// Results for one audited repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoAuditResult {
    pub repository: String,
    /// Template that determined the repository's configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub compliant: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<PolicyViolation>,
    /// Every exception attached to the repository, active or not.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<PolicyException>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// A rule the repository does not satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyViolation {
    #[serde(rename = "policy")]
    pub policy_name: String,
    #[serde(rename = "rule")]
    pub rule_name: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    pub expected: ComplianceValue,
    pub actual: ComplianceValue,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remediation: String,
}

/// A repository left out of the audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRepository {
    pub repository: String,
    pub reason: String,
}

impl AuditReport {
    /// Results for `repository`, if it was audited.
    pub fn repository(&self, repository: &str) -> Option<&RepoAuditResult> {
        self.repositories
            .iter()
            .find(|result| result.repository == repository)
    }

    /// Results for `policy_name`.
    pub fn policy(&self, policy_name: &str) -> Option<&PolicyAuditResult> {
        self.policies
            .iter()
            .find(|result| result.policy_name == policy_name)
    }

    /// Renders the report as Markdown.
    pub fn generate_summary(&self) -> String {
        let mut out = String::new();
        self.write_summary(&mut out).ok();
        out
    }

    fn write_summary(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "# Compliance Audit Report for {}\n", self.organization)?;
        writeln!(
            out,
            "Generated: {}\n",
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;

        let summary = &self.summary;
        writeln!(out, "## Summary\n")?;
        writeln!(out, "- Total Repositories: {}", summary.total_repositories)?;
        writeln!(out, "- Audited Repositories: {}", summary.audited_repositories)?;
        writeln!(
            out,
            "- Compliant Repositories: {} ({:.1}%)",
            summary.compliant_repositories, summary.compliance_percentage
        )?;
        writeln!(out, "- Total Violations: {}", summary.total_violations)?;
        writeln!(out, "- Active Exceptions: {}", summary.active_exceptions)?;

        writeln!(out, "\n## Policy Compliance\n")?;
        for policy in &self.policies {
            writeln!(out, "### {}", policy.policy_name)?;
            writeln!(out, "{}\n", policy.description)?;
            writeln!(out, "- Compliance: {:.1}%", policy.compliance_percentage)?;
            writeln!(out, "- Compliant: {} repos", policy.compliant_repos)?;
            writeln!(out, "- Violating: {} repos", policy.violating_repos)?;
            writeln!(out, "- Exempted: {} repos\n", policy.exempted_repos)?;
        }

        let non_compliant: Vec<&RepoAuditResult> = self
            .repositories
            .iter()
            .filter(|repo| !repo.compliant)
            .collect();
        if !non_compliant.is_empty() {
            writeln!(out, "\n## Non-Compliant Repositories\n")?;
            for repo in non_compliant {
                writeln!(out, "### {}", repo.repository)?;
                for violation in &repo.violations {
                    writeln!(
                        out,
                        "- **{}/{}**: {}",
                        violation.policy_name, violation.rule_name, violation.message
                    )?;
                    if !violation.remediation.is_empty() {
                        writeln!(out, "  - Remediation: {}", violation.remediation)?;
                    }
                }
                writeln!(out)?;
            }
        }

        if !self.skipped_repositories.is_empty() {
            writeln!(out, "\n## Skipped Repositories\n")?;
            for skipped in &self.skipped_repositories {
                writeln!(out, "- {}: {}", skipped.repository, skipped.reason)?;
            }
        }

        Ok(())
    }
}
