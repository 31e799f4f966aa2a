//! Layer merging for partial configuration objects.
//!
//! Configuration is assembled from layers applied in order (defaults, template
//! chain root to leaf, target overrides). Merging is per field: a field set in
//! the overlay replaces the accumulated value, a field left unset inherits it.
//! Lists and maps are replaced as a whole, with two exceptions:
//!
//! - branch protection rules merge per branch, and within a branch per field;
//! - team and user permission maps merge per key.
//!
//! # Examples
//!
//! ```rust
//! use repo_config::merger::Merge;
//! use repo_config::settings::RepoSettings;
//!
//! let base = RepoSettings {
//!     private: Some(true),
//!     topics: Some(vec!["rust".to_string(), "cli".to_string()]),
//!     ..Default::default()
//! };
//! let overlay = RepoSettings {
//!     has_wiki: Some(false),
//!     topics: Some(vec!["service".to_string()]),
//!     ..Default::default()
//! };
//!
//! let merged = base.merge(&overlay);
//! assert_eq!(merged.private, Some(true));
//! assert_eq!(merged.has_wiki, Some(false));
//! assert_eq!(merged.topics, Some(vec!["service".to_string()]));
//! ```

use crate::settings::{BranchProtectionRule, PermissionSettings, RepoSettings, SecuritySettings};
use std::collections::BTreeMap;

#[cfg(test)]
#[path = "merger_tests.rs"]
mod tests;

/// A configuration object that can absorb a higher-precedence layer.
///
/// `merge` is pure: neither input is modified and the result is a new value.
pub trait Merge: Clone {
    /// Returns `self` overlaid with `overlay`, overlay fields winning.
    fn merge(&self, overlay: &Self) -> Self;
}

/// Merges two optional layers.
///
/// Returns `None` only when neither layer is present.
pub fn merge_optional<T: Merge>(base: Option<&T>, overlay: Option<&T>) -> Option<T> {
    match (base, overlay) {
        (None, None) => None,
        (Some(base), None) => Some(base.clone()),
        (None, Some(overlay)) => Some(overlay.clone()),
        (Some(base), Some(overlay)) => Some(base.merge(overlay)),
    }
}

fn pick<T: Clone>(base: &Option<T>, overlay: &Option<T>) -> Option<T> {
    overlay.clone().or_else(|| base.clone())
}

fn merge_keyed<V: Clone>(
    base: &Option<BTreeMap<String, V>>,
    overlay: &Option<BTreeMap<String, V>>,
    merge_value: impl Fn(&V, &V) -> V,
) -> Option<BTreeMap<String, V>> {
    match (base, overlay) {
        (None, None) => None,
        (Some(base), None) => Some(base.clone()),
        (None, Some(overlay)) => Some(overlay.clone()),
        (Some(base), Some(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                let combined = match merged.get(key) {
                    Some(existing) => merge_value(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), combined);
            }
            Some(merged)
        }
    }
}

impl Merge for RepoSettings {
    fn merge(&self, overlay: &Self) -> Self {
        Self {
            description: pick(&self.description, &overlay.description),
            homepage: pick(&self.homepage, &overlay.homepage),
            topics: pick(&self.topics, &overlay.topics),
            private: pick(&self.private, &overlay.private),
            archived: pick(&self.archived, &overlay.archived),
            has_issues: pick(&self.has_issues, &overlay.has_issues),
            has_projects: pick(&self.has_projects, &overlay.has_projects),
            has_wiki: pick(&self.has_wiki, &overlay.has_wiki),
            has_downloads: pick(&self.has_downloads, &overlay.has_downloads),
            allow_squash_merge: pick(&self.allow_squash_merge, &overlay.allow_squash_merge),
            allow_merge_commit: pick(&self.allow_merge_commit, &overlay.allow_merge_commit),
            allow_rebase_merge: pick(&self.allow_rebase_merge, &overlay.allow_rebase_merge),
            delete_branch_on_merge: pick(
                &self.delete_branch_on_merge,
                &overlay.delete_branch_on_merge,
            ),
            default_branch: pick(&self.default_branch, &overlay.default_branch),
        }
    }
}

impl Merge for BranchProtectionRule {
    fn merge(&self, overlay: &Self) -> Self {
        Self {
            required_reviews: pick(&self.required_reviews, &overlay.required_reviews),
            dismiss_stale_reviews: pick(&self.dismiss_stale_reviews, &overlay.dismiss_stale_reviews),
            require_code_owner_reviews: pick(
                &self.require_code_owner_reviews,
                &overlay.require_code_owner_reviews,
            ),
            required_status_checks: pick(
                &self.required_status_checks,
                &overlay.required_status_checks,
            ),
            strict_status_checks: pick(&self.strict_status_checks, &overlay.strict_status_checks),
            restrict_pushes: pick(&self.restrict_pushes, &overlay.restrict_pushes),
            allowed_users: pick(&self.allowed_users, &overlay.allowed_users),
            allowed_teams: pick(&self.allowed_teams, &overlay.allowed_teams),
            require_up_to_date_branch: pick(
                &self.require_up_to_date_branch,
                &overlay.require_up_to_date_branch,
            ),
            enforce_admins: pick(&self.enforce_admins, &overlay.enforce_admins),
            require_conversation_resolution: pick(
                &self.require_conversation_resolution,
                &overlay.require_conversation_resolution,
            ),
            allow_force_pushes: pick(&self.allow_force_pushes, &overlay.allow_force_pushes),
            allow_deletions: pick(&self.allow_deletions, &overlay.allow_deletions),
        }
    }
}

impl Merge for SecuritySettings {
    fn merge(&self, overlay: &Self) -> Self {
        Self {
            vulnerability_alerts: pick(&self.vulnerability_alerts, &overlay.vulnerability_alerts),
            security_advisories: pick(&self.security_advisories, &overlay.security_advisories),
            private_vulnerability_reporting: pick(
                &self.private_vulnerability_reporting,
                &overlay.private_vulnerability_reporting,
            ),
            branch_protection: merge_keyed(
                &self.branch_protection,
                &overlay.branch_protection,
                BranchProtectionRule::merge,
            ),
            webhooks: pick(&self.webhooks, &overlay.webhooks),
        }
    }
}

impl Merge for PermissionSettings {
    fn merge(&self, overlay: &Self) -> Self {
        Self {
            team_permissions: merge_keyed(
                &self.team_permissions,
                &overlay.team_permissions,
                |_, level| *level,
            ),
            user_permissions: merge_keyed(
                &self.user_permissions,
                &overlay.user_permissions,
                |_, level| *level,
            ),
        }
    }
}
