//! Team and user access levels.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Access granted to a team or user.
///
/// Serializes to/from lowercase strings. The legacy names `pull` and `push`
/// are accepted as aliases for `read` and `write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    #[serde(alias = "pull")]
    Read,
    Triage,
    #[serde(alias = "push")]
    Write,
    Maintain,
    Admin,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Triage => "triage",
            Self::Write => "write",
            Self::Maintain => "maintain",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Team and user permission grants.
///
/// Both maps merge key by key: a later layer adds or replaces individual
/// grants and never removes grants made by earlier layers.
///
/// # Examples
///
/// ```rust
/// use repo_config::settings::{PermissionLevel, PermissionSettings};
/// use std::collections::BTreeMap;
///
/// let permissions = PermissionSettings {
///     team_permissions: Some(BTreeMap::from([
///         ("platform".to_string(), PermissionLevel::Admin),
///     ])),
///     user_permissions: None,
/// };
/// assert!(permissions.user_permissions.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PermissionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_permissions: Option<BTreeMap<String, PermissionLevel>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_permissions: Option<BTreeMap<String, PermissionLevel>>,
}
