//! Tests for template inheritance resolution.

use super::*;
use crate::settings::{BranchProtectionRule, PermissionLevel, PermissionSettings, RepoSettings, SecuritySettings};
use tracing_test::traced_test;

// ============================================================================
// Test Helpers
// ============================================================================

fn template(base: Option<&str>, settings: RepoSettings) -> Template {
    Template {
        base: base.map(str::to_string),
        settings: Some(settings),
        ..Default::default()
    }
}

fn registry(entries: Vec<(&str, Template)>) -> BTreeMap<String, Template> {
    entries
        .into_iter()
        .map(|(name, template)| (name.to_string(), template))
        .collect()
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_root_template_resolves_to_itself_without_base() {
    let templates = registry(vec![(
        "base",
        template(
            None,
            RepoSettings {
                private: Some(true),
                ..Default::default()
            },
        ),
    )]);

    let resolved = TemplateResolver::new(&templates)
        .resolve("base")
        .expect("resolves");

    assert_eq!(resolved.base, None);
    assert_eq!(resolved.settings.unwrap().private, Some(true));
}

#[test]
fn test_empty_base_is_treated_as_root() {
    let templates = registry(vec![(
        "base",
        template(
            Some(""),
            RepoSettings {
                has_issues: Some(true),
                ..Default::default()
            },
        ),
    )]);

    let resolved = TemplateResolver::new(&templates)
        .resolve("base")
        .expect("resolves");

    assert_eq!(resolved.settings.unwrap().has_issues, Some(true));
}

#[test]
fn test_leaf_fields_win_over_ancestors() {
    let templates = registry(vec![
        (
            "root",
            template(
                None,
                RepoSettings {
                    private: Some(true),
                    has_wiki: Some(true),
                    description: Some("root".to_string()),
                    ..Default::default()
                },
            ),
        ),
        (
            "middle",
            template(
                Some("root"),
                RepoSettings {
                    has_wiki: Some(false),
                    has_projects: Some(true),
                    ..Default::default()
                },
            ),
        ),
        (
            "leaf",
            template(
                Some("middle"),
                RepoSettings {
                    description: Some("leaf".to_string()),
                    has_projects: Some(false),
                    ..Default::default()
                },
            ),
        ),
    ]);

    let settings = TemplateResolver::new(&templates)
        .resolve("leaf")
        .expect("resolves")
        .settings
        .expect("settings present");

    assert_eq!(settings.private, Some(true));
    assert_eq!(settings.has_wiki, Some(false));
    assert_eq!(settings.has_projects, Some(false));
    assert_eq!(settings.description.as_deref(), Some("leaf"));
    assert_eq!(settings.has_issues, None);
    assert_eq!(settings.homepage, None);
}

#[test]
fn test_sections_absent_everywhere_stay_absent() {
    let templates = registry(vec![
        ("root", template(None, RepoSettings::default())),
        ("leaf", template(Some("root"), RepoSettings::default())),
    ]);

    let resolved = TemplateResolver::new(&templates)
        .resolve("leaf")
        .expect("resolves");

    assert!(resolved.security.is_none());
    assert!(resolved.permissions.is_none());
}

#[test]
fn test_security_and_permissions_merge_through_chain() {
    let mut root = template(None, RepoSettings::default());
    root.security = Some(SecuritySettings {
        branch_protection: Some(BTreeMap::from([(
            "main".to_string(),
            BranchProtectionRule {
                required_reviews: Some(1),
                ..Default::default()
            },
        )])),
        ..Default::default()
    });
    root.permissions = Some(PermissionSettings {
        team_permissions: Some(BTreeMap::from([(
            "platform".to_string(),
            PermissionLevel::Admin,
        )])),
        ..Default::default()
    });

    let mut leaf = template(Some("root"), RepoSettings::default());
    leaf.security = Some(SecuritySettings {
        branch_protection: Some(BTreeMap::from([(
            "release".to_string(),
            BranchProtectionRule {
                required_reviews: Some(2),
                ..Default::default()
            },
        )])),
        ..Default::default()
    });
    leaf.permissions = Some(PermissionSettings {
        team_permissions: Some(BTreeMap::from([(
            "developers".to_string(),
            PermissionLevel::Write,
        )])),
        ..Default::default()
    });

    let templates = registry(vec![("root", root), ("leaf", leaf)]);
    let resolved = TemplateResolver::new(&templates)
        .resolve("leaf")
        .expect("resolves");

    let branches = resolved.security.unwrap().branch_protection.unwrap();
    assert_eq!(branches.len(), 2);
    let teams = resolved.permissions.unwrap().team_permissions.unwrap();
    assert_eq!(teams.len(), 2);
}

#[test]
fn test_resolution_does_not_modify_registry() {
    let templates = registry(vec![
        ("root", template(None, RepoSettings::default())),
        ("leaf", template(Some("root"), RepoSettings::default())),
    ]);
    let before = templates.clone();

    TemplateResolver::new(&templates)
        .resolve("leaf")
        .expect("resolves");

    assert_eq!(templates, before);
    assert_eq!(templates["leaf"].base.as_deref(), Some("root"));
}

#[test]
fn test_shared_ancestor_is_reused() {
    let templates = registry(vec![
        (
            "root",
            template(
                None,
                RepoSettings {
                    private: Some(true),
                    ..Default::default()
                },
            ),
        ),
        ("a", template(Some("root"), RepoSettings::default())),
        ("b", template(Some("root"), RepoSettings::default())),
    ]);
    let mut resolver = TemplateResolver::new(&templates);

    let a = resolver.resolve("a").expect("resolves a");
    let b = resolver.resolve("b").expect("resolves b");

    assert_eq!(a.settings.unwrap().private, Some(true));
    assert_eq!(b.settings.unwrap().private, Some(true));
    assert_eq!(resolver.resolved.len(), 3);
}

#[test]
#[traced_test]
fn test_cached_ancestor_is_logged() {
    let templates = registry(vec![
        ("root", template(None, RepoSettings::default())),
        ("a", template(Some("root"), RepoSettings::default())),
        ("b", template(Some("root"), RepoSettings::default())),
    ]);
    let mut resolver = TemplateResolver::new(&templates);

    resolver.resolve("a").expect("resolves a");
    resolver.resolve("b").expect("resolves b");

    assert!(logs_contain("Reusing resolved ancestor 'root'"));
}

#[test]
fn test_deep_chain_resolves() {
    let mut entries = vec![(
        "t0".to_string(),
        template(
            None,
            RepoSettings {
                private: Some(true),
                ..Default::default()
            },
        ),
    )];
    for depth in 1..200 {
        let parent = format!("t{}", depth - 1);
        entries.push((
            format!("t{}", depth),
            template(Some(parent.as_str()), RepoSettings::default()),
        ));
    }
    let templates: BTreeMap<String, Template> = entries.into_iter().collect();

    let resolver = TemplateResolver::new(&templates);
    assert_eq!(resolver.inheritance_chain("t199").expect("chain").len(), 200);

    let resolved = TemplateResolver::new(&templates)
        .resolve("t199")
        .expect("resolves");
    assert_eq!(resolved.settings.unwrap().private, Some(true));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_template_is_not_found() {
    let templates = registry(vec![]);

    let error = TemplateResolver::new(&templates)
        .resolve("ghost")
        .expect_err("should fail");

    assert_eq!(
        error,
        ConfigurationError::TemplateNotFound {
            name: "ghost".to_string(),
            referenced_by: None,
            chain: vec![],
        }
    );
}

#[test]
fn test_missing_base_reports_referrer() {
    let templates = registry(vec![
        ("leaf", template(Some("middle"), RepoSettings::default())),
        ("middle", template(Some("gone"), RepoSettings::default())),
    ]);

    let error = TemplateResolver::new(&templates)
        .resolve("leaf")
        .expect_err("should fail");

    assert_eq!(
        error,
        ConfigurationError::TemplateNotFound {
            name: "gone".to_string(),
            referenced_by: Some("middle".to_string()),
            chain: vec!["leaf".to_string(), "middle".to_string()],
        }
    );
}

#[test]
fn test_self_reference_is_cycle() {
    let templates = registry(vec![("loop", template(Some("loop"), RepoSettings::default()))]);

    let error = TemplateResolver::new(&templates)
        .resolve("loop")
        .expect_err("should fail");

    assert_eq!(
        error,
        ConfigurationError::InheritanceCycle {
            name: "loop".to_string(),
            chain: vec!["loop".to_string(), "loop".to_string()],
        }
    );
}

#[test]
fn test_indirect_cycle_is_detected() {
    let templates = registry(vec![
        ("a", template(Some("b"), RepoSettings::default())),
        ("b", template(Some("c"), RepoSettings::default())),
        ("c", template(Some("a"), RepoSettings::default())),
    ]);

    let error = TemplateResolver::new(&templates)
        .resolve("a")
        .expect_err("should fail");

    assert!(error.is_cycle());
    assert_eq!(
        error,
        ConfigurationError::InheritanceCycle {
            name: "a".to_string(),
            chain: vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "a".to_string()
            ],
        }
    );
}

#[test]
fn test_cycle_below_entry_point_is_detected() {
    let templates = registry(vec![
        ("entry", template(Some("x"), RepoSettings::default())),
        ("x", template(Some("y"), RepoSettings::default())),
        ("y", template(Some("x"), RepoSettings::default())),
    ]);

    let resolver = TemplateResolver::new(&templates);
    let error = resolver.inheritance_chain("entry").expect_err("should fail");

    assert!(error.is_cycle());
}

#[test]
fn test_failed_resolution_caches_nothing() {
    let templates = registry(vec![("a", template(Some("missing"), RepoSettings::default()))]);
    let mut resolver = TemplateResolver::new(&templates);

    assert!(resolver.resolve("a").is_err());
    assert!(resolver.resolved.is_empty());
}

// ============================================================================
// Chains
// ============================================================================

#[test]
fn test_inheritance_chain_lists_self_then_ancestors() {
    let templates = registry(vec![
        ("root", template(None, RepoSettings::default())),
        ("middle", template(Some("root"), RepoSettings::default())),
        ("leaf", template(Some("middle"), RepoSettings::default())),
    ]);

    let chain = TemplateResolver::new(&templates)
        .inheritance_chain("leaf")
        .expect("chain");

    assert_eq!(chain, vec!["leaf", "middle", "root"]);
}

#[test]
fn test_all_chains_covers_every_template() {
    let templates = registry(vec![
        ("root", template(None, RepoSettings::default())),
        ("leaf", template(Some("root"), RepoSettings::default())),
    ]);

    let chains = TemplateResolver::new(&templates)
        .all_chains()
        .expect("chains");

    assert_eq!(chains.len(), 2);
    assert_eq!(chains["root"], vec!["root"]);
    assert_eq!(chains["leaf"], vec!["leaf", "root"]);
}

#[test]
fn test_all_chains_fails_on_broken_template() {
    let templates = registry(vec![
        ("ok", template(None, RepoSettings::default())),
        ("broken", template(Some("broken"), RepoSettings::default())),
    ]);

    let error = TemplateResolver::new(&templates)
        .all_chains()
        .expect_err("should fail");

    assert!(error.is_cycle());
}
