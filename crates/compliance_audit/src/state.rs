//! Observed repository state.
//!
//! A [`RepositoryState`] is a snapshot of one real repository, fetched by the
//! caller from its hosting provider. The auditor only reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use repo_config::policy::RepositoryVisibility;

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;

/// Branch whose protection is checked by branch and review rules.
pub const MAIN_BRANCH: &str = "main";

/// Snapshot of one repository as it currently exists.
///
/// Every field defaults when absent, so a state can be decoded from partial
/// provider data.
///
/// # Examples
///
/// ```rust
/// use compliance_audit::RepositoryState;
/// use repo_config::policy::RepositoryVisibility;
///
/// let state: RepositoryState = serde_json::from_value(serde_json::json!({
///     "name": "api",
///     "private": true,
///     "branch_protection": { "main": { "protected": true, "required_reviews": 2 } },
///     "files": ["README.md"],
/// }))?;
///
/// assert_eq!(state.visibility(), RepositoryVisibility::Private);
/// assert_eq!(state.main_branch().map(|b| b.required_reviews), Some(2));
/// assert!(state.has_file("readme.md"));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RepositoryState {
    pub name: String,
    pub private: bool,
    pub archived: bool,
    pub has_issues: bool,
    pub has_wiki: bool,
    pub has_projects: bool,
    pub has_downloads: bool,

    /// Protection state keyed by branch name.
    pub branch_protection: BTreeMap<String, BranchProtectionState>,

    pub vulnerability_alerts: bool,
    pub security_advisories: bool,

    /// Paths of files present in the repository.
    pub files: Vec<String>,

    /// Workflow file names, without the `.github/workflows/` directory.
    pub workflows: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Observed protection of one branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BranchProtectionState {
    pub protected: bool,
    pub required_reviews: u32,
    pub enforce_admins: bool,
}

impl RepositoryState {
    /// Public or private. Internal visibility is not observed.
    pub fn visibility(&self) -> RepositoryVisibility {
        if self.private {
            RepositoryVisibility::Private
        } else {
            RepositoryVisibility::Public
        }
    }

    /// Protection state of [`MAIN_BRANCH`], if any was observed.
    pub fn main_branch(&self) -> Option<&BranchProtectionState> {
        self.branch_protection.get(MAIN_BRANCH)
    }

    /// Case-insensitive file lookup.
    pub fn has_file(&self, file: &str) -> bool {
        self.files.iter().any(|present| same_name(present, file))
    }

    /// Case-insensitive workflow lookup. A leading `.github/workflows/` on
    /// `workflow` is ignored.
    pub fn has_workflow(&self, workflow: &str) -> bool {
        let wanted = workflow
            .strip_prefix(".github/workflows/")
            .unwrap_or(workflow);
        self.workflows.iter().any(|present| same_name(present, wanted))
    }
}

fn same_name(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}
