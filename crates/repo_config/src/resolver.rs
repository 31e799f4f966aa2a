//! Template inheritance resolution.
//!
//! Resolving a template walks its `base` references up to a root template,
//! then merges the chain root to leaf so that the most specific template wins
//! on every field it sets. The walk keeps a visited set, so a cycle
//! (including a template naming itself as its base) is reported as
//! `ConfigurationError::InheritanceCycle` before any merge happens.
//!
//! A [`TemplateResolver`] remembers every template it has resolved. Templates
//! sharing an ancestor reuse the resolved ancestor instead of merging it again.
//!
//! # Examples
//!
//! ```rust
//! use repo_config::{resolver::TemplateResolver, settings::RepoSettings, Template};
//! use std::collections::BTreeMap;
//!
//! let templates = BTreeMap::from([
//!     ("base".to_string(), Template {
//!         settings: Some(RepoSettings { private: Some(true), ..Default::default() }),
//!         ..Default::default()
//!     }),
//!     ("service".to_string(), Template {
//!         base: Some("base".to_string()),
//!         settings: Some(RepoSettings { has_wiki: Some(false), ..Default::default() }),
//!         ..Default::default()
//!     }),
//! ]);
//!
//! let mut resolver = TemplateResolver::new(&templates);
//! let resolved = resolver.resolve("service")?;
//! let settings = resolved.settings.unwrap();
//! assert_eq!(settings.private, Some(true));
//! assert_eq!(settings.has_wiki, Some(false));
//!
//! assert_eq!(resolver.inheritance_chain("service")?, vec!["service", "base"]);
//! # Ok::<(), repo_config::ConfigurationError>(())
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, instrument};

use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::template::Template;

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;

/// Resolves templates against a template registry, memoizing results.
#[derive(Debug, Clone)]
pub struct TemplateResolver<'a> {
    templates: &'a BTreeMap<String, Template>,
    resolved: HashMap<String, Template>,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(templates: &'a BTreeMap<String, Template>) -> Self {
        Self {
            templates,
            resolved: HashMap::new(),
        }
    }

    /// Returns `name` followed by its parent, grandparent and so on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::TemplateNotFound` when `name` or one of its
    /// ancestors is missing from the registry, and
    /// `ConfigurationError::InheritanceCycle` when the chain loops.
    pub fn inheritance_chain(&self, name: &str) -> ConfigurationResult<Vec<String>> {
        let mut chain: Vec<String> = Vec::new();
        let mut visited = HashSet::new();
        let mut current = name;

        loop {
            let template = Self::lookup(self.templates, current, &chain, &mut visited)?;
            chain.push(current.to_string());
            match template.parent() {
                Some(parent) => current = parent,
                None => return Ok(chain),
            }
        }
    }

    /// The inheritance chain of every template in the registry.
    ///
    /// # Errors
    ///
    /// Fails on the first template (in name order) whose chain cannot be walked.
    pub fn all_chains(&self) -> ConfigurationResult<BTreeMap<String, Vec<String>>> {
        self.templates
            .keys()
            .map(|name| Ok((name.clone(), self.inheritance_chain(name)?)))
            .collect()
    }

    /// Resolves a template into a single merged template without a `base`.
    ///
    /// # Errors
    ///
    /// Same as [`TemplateResolver::inheritance_chain`].
    #[instrument(skip(self))]
    pub fn resolve(&mut self, name: &str) -> ConfigurationResult<Template> {
        if let Some(cached) = self.resolved.get(name) {
            return Ok(cached.clone());
        }

        let templates = self.templates;
        let mut pending: Vec<(&str, &Template)> = Vec::new();
        let mut walked: Vec<String> = Vec::new();
        let mut visited = HashSet::new();
        let mut current = name;
        let mut resolved_base: Option<Template> = None;

        loop {
            if let Some(cached) = self.resolved.get(current) {
                debug!("Reusing resolved ancestor '{}'", current);
                resolved_base = Some(cached.clone());
                break;
            }

            let template = Self::lookup(templates, current, &walked, &mut visited)?;
            pending.push((current, template));
            walked.push(current.to_string());

            match template.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        let mut accumulated = resolved_base;
        for (template_name, template) in pending.into_iter().rev() {
            let merged = match &accumulated {
                Some(base) => base.overlay(template),
                None => template.detached(),
            };
            self.resolved.insert(template_name.to_string(), merged.clone());
            accumulated = Some(merged);
        }

        debug!("Resolved template '{}' through {:?}", name, walked);

        // The walk always records at least one template or a cached ancestor.
        accumulated.ok_or_else(|| ConfigurationError::TemplateNotFound {
            name: name.to_string(),
            referenced_by: None,
            chain: walked,
        })
    }

    fn lookup<'t>(
        templates: &'t BTreeMap<String, Template>,
        name: &str,
        chain: &[String],
        visited: &mut HashSet<String>,
    ) -> ConfigurationResult<&'t Template> {
        if !visited.insert(name.to_string()) {
            let mut cycle = chain.to_vec();
            cycle.push(name.to_string());
            return Err(ConfigurationError::InheritanceCycle {
                name: name.to_string(),
                chain: cycle,
            });
        }

        templates
            .get(name)
            .ok_or_else(|| ConfigurationError::TemplateNotFound {
                name: name.to_string(),
                referenced_by: chain.last().cloned(),
                chain: chain.to_vec(),
            })
    }
}
