//! Tests for policy rule parsing.

use super::*;
use serde_json::json;

fn parse_rule(value: Value) -> PolicyRule {
    serde_json::from_value(value).expect("rule should deserialize")
}

#[test]
fn test_visibility_rule_parses_expected_visibility() {
    let rule = parse_rule(json!({ "type": "visibility", "value": "private" }));
    assert_eq!(rule.check, RuleCheck::Visibility("private".to_string()));
}

#[test]
fn test_visibility_rule_keeps_any_string_verbatim() {
    let cased = parse_rule(json!({ "type": "visibility", "value": "Private" }));
    let unknown = parse_rule(json!({ "type": "visibility", "value": "secret" }));

    assert_eq!(cased.check, RuleCheck::Visibility("Private".to_string()));
    assert_eq!(unknown.check, RuleCheck::Visibility("secret".to_string()));
    assert!(unknown.check.is_evaluable());
}

#[test]
fn test_visibility_rule_with_bool_value_is_malformed() {
    let rule = parse_rule(json!({ "type": "visibility", "value": true }));
    assert_eq!(
        rule.check,
        RuleCheck::Malformed {
            rule_type: "visibility".to_string(),
            value: json!(true),
        }
    );
    assert!(!rule.check.is_evaluable());
}

#[test]
fn test_branch_protection_rule_requires_bool() {
    assert_eq!(
        parse_rule(json!({ "type": "branch_protection", "value": true })).check,
        RuleCheck::BranchProtection(true)
    );
    assert!(matches!(
        parse_rule(json!({ "type": "branch_protection", "value": "yes" })).check,
        RuleCheck::Malformed { .. }
    ));
}

#[test]
fn test_min_reviews_accepts_integer_and_float() {
    assert_eq!(
        parse_rule(json!({ "type": "min_reviews", "value": 2 })).check,
        RuleCheck::MinReviews(2)
    );
    assert_eq!(
        parse_rule(json!({ "type": "min_reviews", "value": 3.0 })).check,
        RuleCheck::MinReviews(3)
    );
    assert_eq!(
        parse_rule(json!({ "type": "min_reviews", "value": 2.7 })).check,
        RuleCheck::MinReviews(2)
    );
}

#[test]
fn test_min_reviews_accepts_negative_counts() {
    assert_eq!(
        parse_rule(json!({ "type": "min_reviews", "value": -1 })).check,
        RuleCheck::MinReviews(-1)
    );
    assert_eq!(
        parse_rule(json!({ "type": "min_reviews", "value": -1.5 })).check,
        RuleCheck::MinReviews(-1)
    );
}

#[test]
fn test_min_reviews_rejects_strings() {
    assert!(matches!(
        parse_rule(json!({ "type": "min_reviews", "value": "2" })).check,
        RuleCheck::Malformed { .. }
    ));
}

#[test]
fn test_file_and_workflow_rules_take_strings() {
    assert_eq!(
        parse_rule(json!({ "type": "file_exists", "value": "LICENSE" })).check,
        RuleCheck::FileExists("LICENSE".to_string())
    );
    assert_eq!(
        parse_rule(json!({ "type": "workflow_exists", "value": ".github/workflows/ci.yml" }))
            .check,
        RuleCheck::WorkflowExists(".github/workflows/ci.yml".to_string())
    );
}

#[test]
fn test_security_feature_names() {
    assert_eq!(
        parse_rule(json!({ "type": "security_feature", "value": "vulnerability_alerts" })).check,
        RuleCheck::SecurityFeature(SecurityFeature::VulnerabilityAlerts)
    );
    assert_eq!(
        parse_rule(json!({ "type": "security_feature", "value": "secret_scanning" })).check,
        RuleCheck::SecurityFeature(SecurityFeature::Other("secret_scanning".to_string()))
    );
}

#[test]
fn test_unknown_rule_type_is_unrecognized() {
    let rule = parse_rule(json!({ "type": "enforce_admins", "value": true }));
    assert_eq!(
        rule.check,
        RuleCheck::Unrecognized {
            rule_type: "enforce_admins".to_string(),
            value: json!(true),
        }
    );
    assert_eq!(rule.rule_type(), "enforce_admins");
}

#[test]
fn test_missing_value_is_malformed_for_known_type() {
    let rule = parse_rule(json!({ "type": "file_exists" }));
    assert!(matches!(rule.check, RuleCheck::Malformed { .. }));
}

#[test]
fn test_enforcement_maps_to_severity() {
    assert_eq!(Enforcement::Required.severity(), Severity::Critical);
    assert_eq!(Enforcement::Recommended.severity(), Severity::Medium);
    assert_eq!(Enforcement::Optional.severity(), Severity::Low);
}

#[test]
fn test_unknown_or_missing_enforcement_is_optional() {
    let unknown = parse_rule(json!({ "type": "file_exists", "value": "a", "enforcement": "mandatory" }));
    let missing = parse_rule(json!({ "type": "file_exists", "value": "a" }));

    assert_eq!(unknown.enforcement, Enforcement::Optional);
    assert_eq!(unknown.severity(), Severity::Low);
    assert_eq!(missing.enforcement, Enforcement::Optional);
}

#[test]
fn test_enforcement_ignores_case() {
    let required = parse_rule(json!({ "type": "file_exists", "value": "a", "enforcement": "Required" }));
    let recommended =
        parse_rule(json!({ "type": "file_exists", "value": "a", "enforcement": "RECOMMENDED" }));

    assert_eq!(required.enforcement, Enforcement::Required);
    assert_eq!(required.severity(), Severity::Critical);
    assert_eq!(recommended.severity(), Severity::Medium);
}

#[test]
fn test_enforcement_serializes_lowercase() {
    assert_eq!(
        serde_json::to_value(Enforcement::Recommended).expect("serializable"),
        json!("recommended")
    );
}

#[test]
fn test_rule_serializes_back_to_configuration_form() {
    let rule = PolicyRule::new(RuleCheck::MinReviews(2), Enforcement::Required)
        .with_message("Two reviews required");

    let value = serde_json::to_value(&rule).expect("serialize rule");

    assert_eq!(
        value,
        json!({
            "type": "min_reviews",
            "value": 2,
            "enforcement": "required",
            "message": "Two reviews required",
        })
    );
}

#[test]
fn test_policy_template_from_toml() {
    let policy: PolicyTemplate = toml::from_str(
        r#"
        description = "Documentation"

        [rules.readme]
        type = "file_exists"
        value = "README.md"
        enforcement = "required"

        [rules.reviews]
        type = "min_reviews"
        value = 1
        enforcement = "recommended"
        "#,
    )
    .expect("policy should parse");

    assert_eq!(policy.description, "Documentation");
    assert_eq!(policy.rules.len(), 2);
    assert_eq!(
        policy.rules["readme"].check,
        RuleCheck::FileExists("README.md".to_string())
    );
    assert_eq!(policy.rules["reviews"].check, RuleCheck::MinReviews(1));
}
