//! Root repository configuration.
//!
//! [`RepoConfig`] is the decoded form of an organization's repository
//! configuration file. The engine only reads it; decoding it from YAML, TOML
//! or JSON is the caller's business.
//!
//! # Examples
//!
//! ```rust
//! use repo_config::RepoConfig;
//!
//! let config: RepoConfig = serde_json::from_value(serde_json::json!({
//!     "version": "1.0",
//!     "organization": "acme",
//!     "templates": {
//!         "base": { "settings": { "private": true } },
//!         "derived": { "base": "base", "settings": { "has_wiki": false } },
//!     },
//!     "repositories": {
//!         "specific": [{ "name": "r", "template": "derived" }],
//!     },
//! }))?;
//!
//! let effective = config.effective_config("r")?;
//! assert_eq!(effective.settings.private, Some(true));
//! assert_eq!(effective.settings.has_wiki, Some(false));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::effective::{EffectiveConfigBuilder, EffectiveConfiguration};
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::policy::PolicyTemplate;
use crate::resolver::TemplateResolver;
use crate::targets::{RepoTargets, TargetOverrides};
use crate::template::Template;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Organization-wide repository configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RepoConfig {
    pub version: String,

    pub organization: String,

    /// Layer applied to every repository before any target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<TargetOverrides>,

    /// Templates keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub templates: BTreeMap<String, Template>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<RepoTargets>,

    /// Compliance policies keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub policies: BTreeMap<String, PolicyTemplate>,
}

impl RepoConfig {
    /// Computes the effective configuration for one repository.
    ///
    /// Templates are resolved afresh on every call. When computing many
    /// repositories, reuse an [`EffectiveConfigBuilder`] so shared ancestors
    /// are resolved once.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::TemplateNotFound` or
    /// `ConfigurationError::InheritanceCycle` when a template applied to the
    /// repository cannot be resolved.
    pub fn effective_config(&self, repo_name: &str) -> ConfigurationResult<EffectiveConfiguration> {
        EffectiveConfigBuilder::new(self).build(repo_name)
    }

    /// Resolves a template with its full inheritance chain merged in.
    pub fn resolve_template(&self, name: &str) -> ConfigurationResult<Template> {
        TemplateResolver::new(&self.templates).resolve(name)
    }

    /// The inheritance chain of a template, starting with the template itself.
    pub fn inheritance_chain(&self, name: &str) -> ConfigurationResult<Vec<String>> {
        TemplateResolver::new(&self.templates).inheritance_chain(name)
    }

    /// The inheritance chain of every template, keyed by template name.
    pub fn all_chains(&self) -> ConfigurationResult<BTreeMap<String, Vec<String>>> {
        TemplateResolver::new(&self.templates).all_chains()
    }
}

/// Layers several configurations into one.
///
/// `version` and `organization` come from the first configuration. Templates
/// and policies are unioned, later configurations replacing same-named
/// entries. The last configuration that sets `defaults` (respectively
/// `repositories`) provides it.
///
/// # Errors
///
/// Returns `ConfigurationError::NoConfigurations` when `configs` is empty.
pub fn merge_repo_configs(configs: &[RepoConfig]) -> ConfigurationResult<RepoConfig> {
    let first = configs.first().ok_or(ConfigurationError::NoConfigurations)?;

    let mut merged = RepoConfig {
        version: first.version.clone(),
        organization: first.organization.clone(),
        ..Default::default()
    };

    for config in configs {
        for (name, template) in &config.templates {
            if merged.templates.insert(name.clone(), template.clone()).is_some() {
                debug!("Template '{}' replaced by a later configuration", name);
            }
        }
        for (name, policy) in &config.policies {
            if merged.policies.insert(name.clone(), policy.clone()).is_some() {
                debug!("Policy '{}' replaced by a later configuration", name);
            }
        }
        if config.defaults.is_some() {
            merged.defaults = config.defaults.clone();
        }
        if config.repositories.is_some() {
            merged.repositories = config.repositories.clone();
        }
    }

    Ok(merged)
}
