//! Effective configuration for a single repository.
//!
//! The effective configuration is assembled from layers, each one overriding
//! the accumulated result field by field:
//!
//! 1. the organization `defaults` (template first, then inline settings);
//! 2. the first `specific` target named exactly like the repository, after
//!    which assembly stops;
//! 3. otherwise every matching `patterns` target, in list order;
//! 4. the `default` target.
//!
//! Each target contributes its template (fully resolved) and then its inline
//! overrides. Exceptions are collected from every target that was applied.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::RepoConfig;
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::exception::PolicyException;
use crate::merger::Merge;
use crate::pattern::match_pattern;
use crate::resolver::TemplateResolver;
use crate::settings::{PermissionSettings, RepoSettings, SecuritySettings};
use crate::targets::TargetOverrides;

#[cfg(test)]
#[path = "effective_tests.rs"]
mod tests;

/// Where a configuration layer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigurationSource {
    /// Organization-wide `defaults`.
    Defaults,
    /// A `specific` target with this name.
    Specific { name: String },
    /// A `patterns` target with this pattern.
    Pattern { pattern: String },
    /// The `default` target.
    Default,
}

/// One layer applied while building an effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedLayer {
    pub source: ConfigurationSource,

    /// Template applied by this layer, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// Fully merged configuration for one repository.
///
/// Fields left unset by every layer stay `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EffectiveConfiguration {
    pub settings: RepoSettings,

    pub security: SecuritySettings,

    pub permissions: PermissionSettings,

    /// Exceptions of every applied target, in application order.
    pub exceptions: Vec<PolicyException>,

    /// The template that determined this repository's configuration.
    ///
    /// A specific target's template wins, then the first matching pattern that
    /// names a template, then the default target, then the defaults template.
    pub template: Option<String>,

    /// Applied layers in application order.
    pub layers: Vec<AppliedLayer>,
}

impl EffectiveConfiguration {
    fn absorb(
        &mut self,
        settings: Option<&RepoSettings>,
        security: Option<&SecuritySettings>,
        permissions: Option<&PermissionSettings>,
    ) {
        if let Some(settings) = settings {
            self.settings = self.settings.merge(settings);
        }
        if let Some(security) = security {
            self.security = self.security.merge(security);
        }
        if let Some(permissions) = permissions {
            self.permissions = self.permissions.merge(permissions);
        }
    }

    fn determining_template(&self) -> Option<String> {
        let targeted = self
            .layers
            .iter()
            .filter(|layer| layer.source != ConfigurationSource::Defaults)
            .find_map(|layer| layer.template.clone());

        targeted.or_else(|| {
            self.layers
                .iter()
                .find(|layer| layer.source == ConfigurationSource::Defaults)
                .and_then(|layer| layer.template.clone())
        })
    }
}

/// Builds effective configurations, sharing template resolution between calls.
///
/// # Examples
///
/// ```rust
/// use repo_config::{effective::EffectiveConfigBuilder, RepoConfig};
///
/// let config: RepoConfig = serde_json::from_value(serde_json::json!({
///     "version": "1.0",
///     "organization": "acme",
///     "defaults": { "settings": { "has_issues": true } },
///     "repositories": {
///         "patterns": [{ "match": "api-*", "settings": { "private": true } }],
///     },
/// }))?;
///
/// let mut builder = EffectiveConfigBuilder::new(&config);
/// let api = builder.build("api-gateway")?;
/// let web = builder.build("website")?;
///
/// assert_eq!(api.settings.private, Some(true));
/// assert_eq!(web.settings.private, None);
/// assert_eq!(web.settings.has_issues, Some(true));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct EffectiveConfigBuilder<'a> {
    config: &'a RepoConfig,
    resolver: TemplateResolver<'a>,
}

impl<'a> EffectiveConfigBuilder<'a> {
    pub fn new(config: &'a RepoConfig) -> Self {
        Self {
            config,
            resolver: TemplateResolver::new(&config.templates),
        }
    }

    /// Computes the effective configuration of `repo_name`.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError::TemplateNotFound` / `InheritanceCycle` when an
    ///   applied template cannot be resolved.
    /// - `ConfigurationError::InvalidConfiguration` when a pattern target has
    ///   an empty `match`.
    #[instrument(skip(self))]
    pub fn build(&mut self, repo_name: &str) -> ConfigurationResult<EffectiveConfiguration> {
        let config = self.config;
        let mut effective = EffectiveConfiguration::default();

        if let Some(defaults) = &config.defaults {
            self.apply(&mut effective, ConfigurationSource::Defaults, defaults)?;
        }

        let Some(targets) = &config.repositories else {
            effective.template = effective.determining_template();
            return Ok(effective);
        };

        if let Some(specific) = targets.find_specific(repo_name) {
            debug!("Repository '{}' matched specific target", repo_name);
            self.apply(
                &mut effective,
                ConfigurationSource::Specific {
                    name: specific.name.clone(),
                },
                &specific.overrides,
            )?;
            effective.exceptions.extend(specific.exceptions.iter().cloned());
            effective.template = effective.determining_template();
            return Ok(effective);
        }

        for (index, target) in targets.patterns.iter().enumerate() {
            if target.pattern.is_empty() {
                return Err(ConfigurationError::InvalidConfiguration {
                    field: format!("repositories.patterns[{}].match", index),
                    reason: "pattern target has no match pattern".to_string(),
                });
            }
            if !match_pattern(repo_name, &target.pattern) {
                continue;
            }

            debug!(
                "Repository '{}' matched pattern '{}'",
                repo_name, target.pattern
            );
            self.apply(
                &mut effective,
                ConfigurationSource::Pattern {
                    pattern: target.pattern.clone(),
                },
                &target.overrides,
            )?;
            effective.exceptions.extend(target.exceptions.iter().cloned());
        }

        if let Some(default) = &targets.default {
            self.apply(&mut effective, ConfigurationSource::Default, &default.overrides)?;
            effective.exceptions.extend(default.exceptions.iter().cloned());
        }

        effective.template = effective.determining_template();
        Ok(effective)
    }

    fn apply(
        &mut self,
        effective: &mut EffectiveConfiguration,
        source: ConfigurationSource,
        overrides: &TargetOverrides,
    ) -> ConfigurationResult<()> {
        let template_name = overrides.template_name();

        if let Some(name) = template_name {
            let template = self.resolver.resolve(name)?;
            effective.absorb(
                template.settings.as_ref(),
                template.security.as_ref(),
                template.permissions.as_ref(),
            );
        }

        effective.absorb(
            overrides.settings.as_ref(),
            overrides.security.as_ref(),
            overrides.permissions.as_ref(),
        );

        effective.layers.push(AppliedLayer {
            source,
            template: template_name.map(str::to_string),
        });
        Ok(())
    }
}
