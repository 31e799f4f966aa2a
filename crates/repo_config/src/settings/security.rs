//! Security settings, branch protection rules and webhooks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Security-related repository settings.
///
/// `branch_protection` is keyed by branch name and merges branch by branch.
/// `webhooks` is replaced as a whole when a later layer sets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SecuritySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerability_alerts: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_advisories: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_vulnerability_reporting: Option<bool>,

    /// Protection rules keyed by branch name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_protection: Option<BTreeMap<String, BranchProtectionRule>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhooks: Option<Vec<WebhookConfig>>,
}

/// Protection settings for a single branch.
///
/// # Examples
///
/// ```rust
/// use repo_config::settings::BranchProtectionRule;
///
/// let main = BranchProtectionRule {
///     required_reviews: Some(2),
///     enforce_admins: Some(true),
///     ..Default::default()
/// };
/// assert_eq!(main.required_reviews, Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BranchProtectionRule {
    /// Required number of approving reviews
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_reviews: Option<u32>,

    /// Dismiss stale reviews when new commits are pushed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismiss_stale_reviews: Option<bool>,

    /// Require review from code owners
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_code_owner_reviews: Option<bool>,

    /// Required status checks (list of check names)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_status_checks: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_status_checks: Option<bool>,

    /// Restrict who can push to the branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrict_pushes: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_users: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_teams: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_up_to_date_branch: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_admins: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_conversation_resolution: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_force_pushes: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_deletions: Option<bool>,
}

/// Webhook definition attached to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Endpoint receiving the deliveries
    pub url: String,

    /// Events that trigger a delivery
    #[serde(default)]
    pub events: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret: String,
}
