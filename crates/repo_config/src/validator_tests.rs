//! Tests for configuration validation.

use super::*;
use chrono::TimeZone;
use serde_json::json;

// ============================================================================
// Test Helpers
// ============================================================================

fn config(value: serde_json::Value) -> RepoConfig {
    serde_json::from_value(value).expect("valid configuration")
}

fn validator() -> ConfigurationValidator {
    ConfigurationValidator::at(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
}

fn paths(errors: &[ValidationError]) -> Vec<&str> {
    errors.iter().map(|error| error.field_path.as_str()).collect()
}

fn with_exception(exception: serde_json::Value) -> RepoConfig {
    config(json!({
        "version": "1.0",
        "organization": "acme",
        "policies": {
            "docs": {
                "description": "Documentation",
                "rules": {
                    "readme": { "type": "file_exists", "value": "README.md", "enforcement": "required" },
                },
            },
        },
        "repositories": {
            "patterns": [{ "match": "*", "exceptions": [exception] }],
        },
    }))
}

// ============================================================================
// ValidationResult
// ============================================================================

#[test]
fn test_new_result_is_valid() {
    let result = ValidationResult::new();
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_warnings_do_not_invalidate() {
    let mut result = ValidationResult::new();
    result.add_warning(ValidationWarning {
        field_path: "policies.x".to_string(),
        message: "odd".to_string(),
        recommendation: None,
    });
    assert!(result.is_valid());
}

// ============================================================================
// Root and templates
// ============================================================================

#[test]
fn test_well_formed_configuration_passes() {
    let config = config(json!({
        "version": "1.0",
        "organization": "acme",
        "templates": {
            "base": { "settings": { "private": true } },
            "service": { "base": "base" },
        },
        "repositories": {
            "specific": [{ "name": "api", "template": "service" }],
            "patterns": [{ "match": "lib-*", "template": "base" }],
        },
    }));

    let result = validator().validate(&config);

    assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_missing_version_and_organization() {
    let config = RepoConfig::default();

    let result = validator().validate(&config);

    assert_eq!(paths(&result.errors), vec!["version", "organization"]);
    assert!(result
        .errors
        .iter()
        .all(|error| error.error_type == ValidationErrorType::RequiredFieldMissing));
}

#[test]
fn test_template_cycle_is_reported() {
    let config = config(json!({
        "version": "1.0",
        "organization": "acme",
        "templates": {
            "a": { "base": "b" },
            "b": { "base": "a" },
        },
    }));

    let result = validator().validate(&config);

    assert_eq!(paths(&result.errors), vec!["templates.a.base", "templates.b.base"]);
    assert!(result
        .errors
        .iter()
        .all(|error| error.error_type == ValidationErrorType::InheritanceCycle));
    assert!(result.errors[0].message.contains("a -> b -> a"));
}

#[test]
fn test_missing_base_template_is_reported() {
    let config = config(json!({
        "version": "1.0",
        "organization": "acme",
        "templates": { "child": { "base": "parent" } },
    }));

    let result = validator().validate(&config);

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].error_type, ValidationErrorType::UnknownReference);
    assert!(result.errors[0].message.contains("'parent'"));
}

// ============================================================================
// Targets
// ============================================================================

#[test]
fn test_target_structure_errors() {
    let config = config(json!({
        "version": "1.0",
        "organization": "acme",
        "defaults": { "template": "nope" },
        "repositories": {
            "specific": [{ "name": "" }],
            "patterns": [{ "match": "", "template": "gone" }],
            "default": { "template": "absent" },
        },
    }));

    let result = validator().validate(&config);

    assert_eq!(
        paths(&result.errors),
        vec![
            "defaults.template",
            "repositories.specific[0].name",
            "repositories.patterns[0].match",
            "repositories.patterns[0].template",
            "repositories.default.template",
        ]
    );
}

#[test]
fn test_duplicate_specific_targets_warn() {
    let config = config(json!({
        "version": "1.0",
        "organization": "acme",
        "repositories": {
            "specific": [{ "name": "api" }, { "name": "api" }],
        },
    }));

    let result = validator().validate(&config);

    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].field_path, "repositories.specific[1].name");
}

// ============================================================================
// Policies
// ============================================================================

#[test]
fn test_malformed_and_unrecognized_rules_warn() {
    let config = config(json!({
        "version": "1.0",
        "organization": "acme",
        "policies": {
            "security": {
                "rules": {
                    "reviews": { "type": "min_reviews", "value": "two", "enforcement": "required" },
                    "signing": { "type": "signed_commits", "value": true },
                    "visibility": { "type": "visibility", "value": "private" },
                },
            },
        },
    }));

    let result = validator().validate(&config);

    assert!(result.is_valid());
    let warned: Vec<&str> = result
        .warnings
        .iter()
        .map(|warning| warning.field_path.as_str())
        .collect();
    assert_eq!(
        warned,
        vec![
            "policies.security.rules.reviews",
            "policies.security.rules.signing"
        ]
    );
    assert!(result.warnings[0].message.contains("'min_reviews'"));
    assert_eq!(
        result.warnings[0].recommendation.as_deref(),
        Some("Expected a non-negative integer")
    );
    assert!(result.warnings[1].message.contains("Unknown rule type 'signed_commits'"));
}

#[test]
fn test_unobservable_visibility_and_negative_reviews_warn() {
    let config = config(json!({
        "version": "1.0",
        "organization": "acme",
        "policies": {
            "security": {
                "rules": {
                    "cased": { "type": "visibility", "value": "Private" },
                    "internal": { "type": "visibility", "value": "internal" },
                    "reviews": { "type": "min_reviews", "value": -1 },
                },
            },
        },
    }));

    let result = validator().validate(&config);

    assert!(result.is_valid());
    let warned: Vec<&str> = result
        .warnings
        .iter()
        .map(|warning| warning.field_path.as_str())
        .collect();
    assert_eq!(
        warned,
        vec![
            "policies.security.rules.cased",
            "policies.security.rules.reviews"
        ]
    );
    assert!(result.warnings[0].message.contains("'Private'"));
    assert!(result.warnings[1].message.contains("Review count -1 is negative"));
}

// ============================================================================
// Exceptions
// ============================================================================

#[test]
fn test_valid_exception_passes() {
    let config = with_exception(json!({
        "policy_name": "docs",
        "rule_name": "readme",
        "reason": "Generated repository",
        "approved_by": "security-team",
        "expires_at": "2024-12-31",
    }));

    let result = validator().validate(&config);

    assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_exception_unknown_policy() {
    let config = with_exception(json!({
        "policy_name": "nonexistent",
        "rule_name": "readme",
        "reason": "r",
        "approved_by": "a",
    }));

    let result = validator().validate(&config);

    assert_eq!(
        paths(&result.errors),
        vec!["repositories.patterns[0].exceptions[0].policy_name"]
    );
}

#[test]
fn test_exception_unknown_rule() {
    let config = with_exception(json!({
        "policy_name": "docs",
        "rule_name": "changelog",
        "reason": "r",
        "approved_by": "a",
    }));

    let result = validator().validate(&config);

    assert_eq!(
        paths(&result.errors),
        vec!["repositories.patterns[0].exceptions[0].rule_name"]
    );
    assert!(result.errors[0].message.contains("'changelog'"));
}

#[test]
fn test_exception_missing_reason_and_approver() {
    let config = with_exception(json!({
        "policy_name": "docs",
        "rule_name": "readme",
    }));

    let result = validator().validate(&config);

    assert_eq!(
        paths(&result.errors),
        vec![
            "repositories.patterns[0].exceptions[0].reason",
            "repositories.patterns[0].exceptions[0].approved_by",
        ]
    );
}

#[test]
fn test_exception_unparseable_expiry() {
    let config = with_exception(json!({
        "policy_name": "docs",
        "rule_name": "readme",
        "reason": "r",
        "approved_by": "a",
        "expires_at": "next quarter",
    }));

    let result = validator().validate(&config);

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].error_type, ValidationErrorType::InvalidValue);
    assert_eq!(
        result.errors[0].field_path,
        "repositories.patterns[0].exceptions[0].expires_at"
    );
}

#[test]
fn test_expired_exception_warns() {
    let config = with_exception(json!({
        "policy_name": "docs",
        "rule_name": "readme",
        "reason": "r",
        "approved_by": "a",
        "expires_at": "2024-01-31",
    }));

    let result = validator().validate(&config);

    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(
        result.warnings[0].message,
        "Exception for docs/readme expired on 2024-01-31"
    );
}

// ============================================================================
// validate_or_error
// ============================================================================

#[test]
fn test_validate_or_error_returns_all_errors() {
    let error = validator()
        .validate_or_error(&RepoConfig::default())
        .expect_err("should fail");

    match error {
        ConfigurationError::ValidationFailed {
            error_count,
            errors,
        } => {
            assert_eq!(error_count, 2);
            assert_eq!(errors.len(), 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_validate_or_error_keeps_warnings() {
    let config = config(json!({
        "version": "1.0",
        "organization": "acme",
        "policies": {
            "p": { "rules": { "r": { "type": "mystery", "value": 1 } } },
        },
    }));

    let result = validator().validate_or_error(&config).expect("valid");

    assert_eq!(result.warnings.len(), 1);
}
