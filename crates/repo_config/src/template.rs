//! Reusable, inheritable configuration templates.

use serde::{Deserialize, Serialize};

use crate::merger::merge_optional;
use crate::settings::{PermissionSettings, RepoSettings, SecuritySettings};

/// A named bundle of repository settings.
///
/// `base` names a parent template. Templates form a directed graph through
/// their `base` references, which must be acyclic. Resolution (see
/// [`crate::resolver::TemplateResolver`]) produces new merged values and never
/// modifies the templates it reads.
///
/// # Examples
///
/// ```rust
/// use repo_config::{settings::RepoSettings, Template};
///
/// let derived = Template {
///     base: Some("base".to_string()),
///     settings: Some(RepoSettings {
///         has_wiki: Some(false),
///         ..Default::default()
///     }),
///     ..Default::default()
/// };
/// assert_eq!(derived.parent(), Some("base"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Template {
    /// Name of the parent template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<RepoSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecuritySettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionSettings>,
}

impl Template {
    /// The parent template name, treating an empty `base` as no parent.
    pub fn parent(&self) -> Option<&str> {
        self.base.as_deref().filter(|base| !base.is_empty())
    }

    /// Overlays `child` on top of this (already resolved) template.
    ///
    /// The result has no `base`: it is a fully resolved template.
    pub fn overlay(&self, child: &Template) -> Template {
        Template {
            base: None,
            description: child.description.clone().or_else(|| self.description.clone()),
            settings: merge_optional(self.settings.as_ref(), child.settings.as_ref()),
            security: merge_optional(self.security.as_ref(), child.security.as_ref()),
            permissions: merge_optional(self.permissions.as_ref(), child.permissions.as_ref()),
        }
    }

    /// This template with its `base` reference removed.
    pub(crate) fn detached(&self) -> Template {
        Template {
            base: None,
            ..self.clone()
        }
    }
}
