//! Configuration engine error types.
//!
//! Structural problems in a repository configuration (unknown templates,
//! inheritance cycles, missing required fields) are reported through
//! [`ConfigurationError`]. Each variant carries enough context (template name,
//! the inheritance chain walked so far) for a human to fix the configuration.

use thiserror::Error;

use crate::validator::ValidationError;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Configuration engine errors.
///
/// These errors indicate an unusable configuration. They are raised while
/// resolving templates or building an effective configuration and are never
/// silently ignored.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Template not found: '{name}'{} (chain: {})", describe_referrer(.referenced_by), format_chain(.chain))]
    TemplateNotFound {
        name: String,
        referenced_by: Option<String>,
        chain: Vec<String>,
    },

    #[error("Template inheritance cycle detected at '{name}' (chain: {})", format_chain(.chain))]
    InheritanceCycle { name: String, chain: Vec<String> },

    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("No configurations supplied to merge")]
    NoConfigurations,

    #[error("Configuration validation failed with {error_count} error(s)")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<ValidationError>,
    },
}

impl ConfigurationError {
    /// Returns `true` for errors raised by template lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TemplateNotFound { .. })
    }

    /// Returns `true` for errors raised by inheritance cycle detection.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::InheritanceCycle { .. })
    }
}

fn describe_referrer(referenced_by: &Option<String>) -> String {
    match referenced_by {
        Some(parent) => format!(" referenced as base of '{}'", parent),
        None => String::new(),
    }
}

fn format_chain(chain: &[String]) -> String {
    if chain.is_empty() {
        "<empty>".to_string()
    } else {
        chain.join(" -> ")
    }
}

/// Result type alias for configuration operations.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
