//! Repository configuration engine.
//!
//! Computes the effective configuration of a repository from an
//! organization's declarative configuration: reusable templates with
//! inheritance, organization defaults, and per-repository, pattern and
//! fallback targets. Also holds the compliance policy model consumed by the
//! `compliance_audit` crate and a structural validator for configurations.
//!
//! The engine performs no I/O. Callers decode a [`RepoConfig`] from any serde
//! format and query it.

// Configuration model
pub mod config;
pub mod exception;
pub mod policy;
pub mod settings;
pub mod targets;
pub mod template;

// Resolution
pub mod effective;
pub mod merger;
pub mod pattern;
pub mod resolver;

// Validation and catalog
pub mod catalog;
pub mod errors;
pub mod validator;

pub use config::{merge_repo_configs, RepoConfig};
pub use effective::{AppliedLayer, ConfigurationSource, EffectiveConfigBuilder, EffectiveConfiguration};
pub use errors::{ConfigurationError, ConfigurationResult};
pub use exception::PolicyException;
pub use policy::{Enforcement, PolicyRule, PolicyTemplate, RuleCheck, Severity};
pub use targets::{DefaultTarget, PatternTarget, RepoTargets, SpecificTarget, TargetOverrides};
pub use template::Template;
pub use validator::{
    ConfigurationValidator, ValidationError, ValidationErrorType, ValidationResult,
    ValidationWarning,
};
