//! Compliance auditing for repository configurations.
//!
//! Audits observed [`RepositoryState`] snapshots against the policies of a
//! [`repo_config::RepoConfig`], honouring the policy exceptions attached to
//! each repository's targets, and produces an [`AuditReport`].
//!
//! The crate performs no I/O: repository states are fetched by the caller and
//! the report is returned as a value.

pub mod auditor;
pub mod evaluator;
pub mod exception_gate;
pub mod options;
pub mod report;
pub mod state;

pub use auditor::{run_audit, ComplianceAuditor};
pub use evaluator::{evaluate, ComplianceValue, Finding};
pub use exception_gate::ExceptionGate;
pub use options::{AuditOptions, ExceptionExpiry};
pub use report::{
    AuditReport, AuditSummary, PolicyAuditResult, PolicyViolation, RepoAuditResult,
    RuleAuditResult, SkippedRepository,
};
pub use state::{BranchProtectionState, RepositoryState};
