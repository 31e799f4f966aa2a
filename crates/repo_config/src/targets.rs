//! Repository targeting rules.
//!
//! Targets decide which template and inline overrides apply to a repository:
//!
//! 1. `specific` entries match one repository by exact name. The first match
//!    wins and nothing else from `repositories` is applied.
//! 2. Otherwise every `patterns` entry whose `match` pattern matches is
//!    applied in list order, later entries winning on conflicting fields.
//! 3. Finally `default` is applied, if present.

use serde::{Deserialize, Serialize};

use crate::exception::PolicyException;
use crate::settings::{PermissionSettings, RepoSettings, SecuritySettings};

/// A template reference plus inline overrides.
///
/// Used for organization-wide `defaults` and embedded in every target kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TargetOverrides {
    /// Template applied before the inline settings of this layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<RepoSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecuritySettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionSettings>,
}

impl TargetOverrides {
    /// The referenced template name, treating an empty name as no template.
    pub fn template_name(&self) -> Option<&str> {
        self.template.as_deref().filter(|name| !name.is_empty())
    }
}

/// Configuration for one repository, selected by exact name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpecificTarget {
    pub name: String,

    #[serde(flatten)]
    pub overrides: TargetOverrides,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<PolicyException>,
}

/// Configuration for every repository whose name matches a pattern.
///
/// See [`crate::pattern`] for the pattern syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PatternTarget {
    #[serde(rename = "match")]
    pub pattern: String,

    #[serde(flatten)]
    pub overrides: TargetOverrides,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<PolicyException>,
}

/// Fallback configuration applied after any pattern matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DefaultTarget {
    #[serde(flatten)]
    pub overrides: TargetOverrides,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<PolicyException>,
}

/// All repository targeting rules of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RepoTargets {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specific: Vec<SpecificTarget>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<PatternTarget>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultTarget>,
}

impl RepoTargets {
    /// The first `specific` entry named exactly `repo_name`.
    pub fn find_specific(&self, repo_name: &str) -> Option<&SpecificTarget> {
        self.specific.iter().find(|target| target.name == repo_name)
    }
}
