//! Structural validation of repository configurations.
//!
//! Validation is a separate pass from auditing. It reports everything that
//! would make a configuration unusable (missing required fields, unresolvable
//! templates, exceptions pointing at rules that do not exist) as errors, and
//! everything the auditor would silently tolerate (malformed or unrecognized
//! rules, expired exceptions) as warnings.
//!
//! # Examples
//!
//! ```rust
//! use repo_config::validator::{ConfigurationValidator, ValidationErrorType};
//! use repo_config::RepoConfig;
//!
//! let config: RepoConfig = serde_json::from_value(serde_json::json!({
//!     "version": "1.0",
//!     "organization": "acme",
//!     "repositories": {
//!         "specific": [{ "name": "r", "template": "missing" }],
//!     },
//! }))?;
//!
//! let result = ConfigurationValidator::new().validate(&config);
//!
//! assert!(!result.is_valid());
//! assert_eq!(result.errors[0].error_type, ValidationErrorType::UnknownReference);
//! assert_eq!(result.errors[0].field_path, "repositories.specific[0].template");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, instrument};

use crate::config::RepoConfig;
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::exception::PolicyException;
use crate::policy::{
    RuleCheck, BRANCH_PROTECTION, FILE_EXISTS, MIN_REVIEWS, SECURITY_FEATURE, VISIBILITY,
    WORKFLOW_EXISTS,
};
use crate::resolver::TemplateResolver;
use crate::targets::TargetOverrides;

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

/// Result of configuration validation.
///
/// Validation succeeds when no errors are present; warnings never fail it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    /// Blocking issues.
    pub errors: Vec<ValidationError>,
    /// Non-blocking issues.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// Individual validation error with context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub error_type: ValidationErrorType,
    /// Dot-separated path to the offending field.
    pub field_path: String,
    pub message: String,
    /// How to fix the error, when there is an obvious fix.
    pub suggestion: Option<String>,
}

/// Validation error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValidationErrorType {
    /// A required field is missing or empty.
    RequiredFieldMissing,
    /// A name refers to a template, policy or rule that does not exist.
    UnknownReference,
    /// A template's inheritance chain loops back on itself.
    InheritanceCycle,
    /// A field value cannot be interpreted.
    InvalidValue,
}

impl fmt::Display for ValidationErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiredFieldMissing => write!(f, "RequiredFieldMissing"),
            Self::UnknownReference => write!(f, "UnknownReference"),
            Self::InheritanceCycle => write!(f, "InheritanceCycle"),
            Self::InvalidValue => write!(f, "InvalidValue"),
        }
    }
}

/// Non-blocking validation warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    /// Dot-separated path to the field that triggered the warning.
    pub field_path: String,
    pub message: String,
    pub recommendation: Option<String>,
}

/// Validates repository configurations.
///
/// Exception expiry is judged against a fixed reference instant so that
/// repeated validations of the same configuration agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationValidator {
    reference_time: DateTime<Utc>,
}

impl Default for ConfigurationValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationValidator {
    /// A validator judging exception expiry against the current time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// A validator judging exception expiry against `reference_time`.
    pub fn at(reference_time: DateTime<Utc>) -> Self {
        Self { reference_time }
    }

    /// Validates the whole configuration, collecting every finding.
    #[instrument(skip_all, fields(organization = %config.organization))]
    pub fn validate(&self, config: &RepoConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        self.validate_root(config, &mut result);
        self.validate_templates(config, &mut result);
        self.validate_targets(config, &mut result);
        self.validate_policies(config, &mut result);
        self.validate_exceptions(config, &mut result);

        debug!(
            "Validation finished with {} error(s) and {} warning(s)",
            result.errors.len(),
            result.warnings.len()
        );
        result
    }

    /// Validates the configuration and fails when any error was found.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::ValidationFailed` carrying every error.
    /// Warnings alone never fail; they are returned in the `Ok` result.
    pub fn validate_or_error(&self, config: &RepoConfig) -> ConfigurationResult<ValidationResult> {
        let result = self.validate(config);
        if result.is_valid() {
            Ok(result)
        } else {
            Err(ConfigurationError::ValidationFailed {
                error_count: result.errors.len(),
                errors: result.errors,
            })
        }
    }

    // ========================================================================
    // Validation Helpers
    // ========================================================================

    fn validate_root(&self, config: &RepoConfig, result: &mut ValidationResult) {
        if config.version.trim().is_empty() {
            result.add_error(required("version", "Configuration version is required"));
        }
        if config.organization.trim().is_empty() {
            result.add_error(required(
                "organization",
                "Organization name is required",
            ));
        }
    }

    fn validate_templates(&self, config: &RepoConfig, result: &mut ValidationResult) {
        let resolver = TemplateResolver::new(&config.templates);

        for name in config.templates.keys() {
            let Err(error) = resolver.inheritance_chain(name) else {
                continue;
            };

            let error_type = if error.is_cycle() {
                ValidationErrorType::InheritanceCycle
            } else {
                ValidationErrorType::UnknownReference
            };
            result.add_error(ValidationError {
                error_type,
                field_path: format!("templates.{}.base", name),
                message: error.to_string(),
                suggestion: Some(
                    "Point 'base' at an existing template that does not inherit from this one"
                        .to_string(),
                ),
            });
        }
    }

    fn validate_targets(&self, config: &RepoConfig, result: &mut ValidationResult) {
        if let Some(defaults) = &config.defaults {
            check_template_reference(config, defaults, "defaults", result);
        }

        let Some(targets) = &config.repositories else {
            return;
        };

        let mut seen = HashSet::new();
        for (index, target) in targets.specific.iter().enumerate() {
            let path = format!("repositories.specific[{}]", index);
            if target.name.trim().is_empty() {
                result.add_error(required(
                    &format!("{}.name", path),
                    "Specific repository target requires a name",
                ));
            } else if !seen.insert(target.name.as_str()) {
                result.add_warning(ValidationWarning {
                    field_path: format!("{}.name", path),
                    message: format!(
                        "Repository '{}' is targeted more than once; only the first entry applies",
                        target.name
                    ),
                    recommendation: Some("Remove or merge the duplicate entry".to_string()),
                });
            }
            check_template_reference(config, &target.overrides, &path, result);
        }

        for (index, target) in targets.patterns.iter().enumerate() {
            let path = format!("repositories.patterns[{}]", index);
            if target.pattern.is_empty() {
                result.add_error(required(
                    &format!("{}.match", path),
                    "Pattern target requires a match pattern",
                ));
            }
            check_template_reference(config, &target.overrides, &path, result);
        }

        if let Some(default) = &targets.default {
            check_template_reference(config, &default.overrides, "repositories.default", result);
        }
    }

    fn validate_policies(&self, config: &RepoConfig, result: &mut ValidationResult) {
        for (policy_name, policy) in &config.policies {
            for (rule_name, rule) in &policy.rules {
                let field_path = format!("policies.{}.rules.{}", policy_name, rule_name);
                match &rule.check {
                    RuleCheck::Malformed { rule_type, value } => {
                        result.add_warning(ValidationWarning {
                            field_path,
                            message: format!(
                                "Value {} is not valid for rule type '{}'; the rule is never evaluated",
                                value, rule_type
                            ),
                            recommendation: Some(expected_value(rule_type).to_string()),
                        });
                    }
                    RuleCheck::Unrecognized { rule_type, .. } => {
                        result.add_warning(ValidationWarning {
                            field_path,
                            message: format!(
                                "Unknown rule type '{}'; the rule is never evaluated",
                                rule_type
                            ),
                            recommendation: Some(
                                "Use one of: visibility, branch_protection, min_reviews, file_exists, workflow_exists, security_feature"
                                    .to_string(),
                            ),
                        });
                    }
                    RuleCheck::Visibility(visibility)
                        if !matches!(visibility.as_str(), "public" | "private" | "internal") =>
                    {
                        result.add_warning(ValidationWarning {
                            field_path,
                            message: format!(
                                "Visibility '{}' is never observed; the rule always fails",
                                visibility
                            ),
                            recommendation: Some(expected_value(VISIBILITY).to_string()),
                        });
                    }
                    RuleCheck::MinReviews(count) if *count < 0 => {
                        result.add_warning(ValidationWarning {
                            field_path,
                            message: format!(
                                "Review count {} is negative; only main branch protection is checked",
                                count
                            ),
                            recommendation: Some(expected_value(MIN_REVIEWS).to_string()),
                        });
                    }
                    _ => {}
                }
            }
        }
    }

    fn validate_exceptions(&self, config: &RepoConfig, result: &mut ValidationResult) {
        let Some(targets) = &config.repositories else {
            return;
        };

        let specific = targets.specific.iter().enumerate().map(|(index, target)| {
            (format!("repositories.specific[{}]", index), &target.exceptions)
        });
        let patterns = targets.patterns.iter().enumerate().map(|(index, target)| {
            (format!("repositories.patterns[{}]", index), &target.exceptions)
        });
        let default = targets
            .default
            .iter()
            .map(|target| ("repositories.default".to_string(), &target.exceptions));

        for (target_path, exceptions) in specific.chain(patterns).chain(default) {
            for (index, exception) in exceptions.iter().enumerate() {
                let path = format!("{}.exceptions[{}]", target_path, index);
                self.validate_exception(config, exception, &path, result);
            }
        }
    }

    fn validate_exception(
        &self,
        config: &RepoConfig,
        exception: &PolicyException,
        path: &str,
        result: &mut ValidationResult,
    ) {
        match config.policies.get(&exception.policy_name) {
            None => result.add_error(ValidationError {
                error_type: ValidationErrorType::UnknownReference,
                field_path: format!("{}.policy_name", path),
                message: format!(
                    "Exception references unknown policy '{}'",
                    exception.policy_name
                ),
                suggestion: None,
            }),
            Some(policy) if !policy.rules.contains_key(&exception.rule_name) => {
                result.add_error(ValidationError {
                    error_type: ValidationErrorType::UnknownReference,
                    field_path: format!("{}.rule_name", path),
                    message: format!(
                        "Exception references unknown rule '{}' of policy '{}'",
                        exception.rule_name, exception.policy_name
                    ),
                    suggestion: None,
                })
            }
            Some(_) => {}
        }

        if exception.reason.trim().is_empty() {
            result.add_error(required(
                &format!("{}.reason", path),
                "Exception requires a reason",
            ));
        }
        if exception.approved_by.trim().is_empty() {
            result.add_error(required(
                &format!("{}.approved_by", path),
                "Exception requires an approver",
            ));
        }

        match exception.expiry() {
            Err(error) => result.add_error(ValidationError {
                error_type: ValidationErrorType::InvalidValue,
                field_path: format!("{}.expires_at", path),
                message: error.to_string(),
                suggestion: Some("Use YYYY-MM-DD or an RFC 3339 timestamp".to_string()),
            }),
            Ok(Some(expiry)) if expiry < self.reference_time => {
                result.add_warning(ValidationWarning {
                    field_path: format!("{}.expires_at", path),
                    message: format!(
                        "Exception for {}/{} expired on {}",
                        exception.policy_name,
                        exception.rule_name,
                        expiry.format("%Y-%m-%d")
                    ),
                    recommendation: Some("Renew or remove the exception".to_string()),
                })
            }
            Ok(_) => {}
        }
    }
}

fn required(field_path: &str, message: &str) -> ValidationError {
    ValidationError {
        error_type: ValidationErrorType::RequiredFieldMissing,
        field_path: field_path.to_string(),
        message: message.to_string(),
        suggestion: None,
    }
}

fn check_template_reference(
    config: &RepoConfig,
    overrides: &TargetOverrides,
    path: &str,
    result: &mut ValidationResult,
) {
    let Some(name) = overrides.template_name() else {
        return;
    };
    if !config.templates.contains_key(name) {
        result.add_error(ValidationError {
            error_type: ValidationErrorType::UnknownReference,
            field_path: format!("{}.template", path),
            message: format!("Template '{}' is not defined", name),
            suggestion: Some("Define the template under 'templates' or fix the name".to_string()),
        });
    }
}

fn expected_value(rule_type: &str) -> &'static str {
    match rule_type {
        VISIBILITY => "Expected one of: public, private, internal",
        BRANCH_PROTECTION => "Expected a boolean",
        MIN_REVIEWS => "Expected a non-negative integer",
        FILE_EXISTS | WORKFLOW_EXISTS | SECURITY_FEATURE => "Expected a string",
        _ => "Check the rule value",
    }
}
