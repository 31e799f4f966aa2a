//! Repository name pattern matching.
//!
//! Patterns select repositories in `repositories.patterns` targets. The rules are:
//!
//! - An empty pattern matches every repository name.
//! - A pattern containing `*` is a glob. Each `*` matches any run of characters
//!   and the pattern is anchored at both ends; every other character is literal.
//! - Any other pattern is tried as a regular expression (unanchored). When it
//!   does not compile, the pattern is matched as a plain substring.
//!
//! Matching is case-sensitive.
//!
//! # Examples
//!
//! ```rust
//! use repo_config::pattern::match_pattern;
//!
//! assert!(match_pattern("api-gateway", "api-*"));
//! assert!(!match_pattern("my-api-gateway", "api-*"));
//! assert!(match_pattern("service-42", r"service-\d+"));
//! assert!(match_pattern("anything", ""));
//! ```

use regex::Regex;

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;

/// A compiled repository name pattern.
///
/// Compile once with [`RepositoryPattern::new`] and reuse it when the same
/// pattern is checked against many repository names.
#[derive(Debug, Clone)]
pub struct RepositoryPattern {
    source: String,
    kind: PatternKind,
}

#[derive(Debug, Clone)]
enum PatternKind {
    Any,
    Expression(Regex),
    Substring(String),
}

impl RepositoryPattern {
    /// Compiles a pattern. Never fails: invalid expressions fall back to
    /// substring matching.
    pub fn new(pattern: &str) -> Self {
        let kind = if pattern.is_empty() {
            PatternKind::Any
        } else if pattern.contains('*') {
            match Regex::new(&glob_to_regex(pattern)) {
                Ok(regex) => PatternKind::Expression(regex),
                Err(_) => PatternKind::Substring(pattern.to_string()),
            }
        } else {
            match Regex::new(pattern) {
                Ok(regex) => PatternKind::Expression(regex),
                Err(_) => PatternKind::Substring(pattern.to_string()),
            }
        };

        Self {
            source: pattern.to_string(),
            kind,
        }
    }

    /// The pattern text this matcher was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Checks whether `name` matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        match &self.kind {
            PatternKind::Any => true,
            PatternKind::Expression(regex) => regex.is_match(name),
            PatternKind::Substring(needle) => name.contains(needle.as_str()),
        }
    }
}

/// Checks whether a repository name matches a pattern.
///
/// Convenience wrapper around [`RepositoryPattern`] for one-off checks.
pub fn match_pattern(name: &str, pattern: &str) -> bool {
    RepositoryPattern::new(pattern).matches(name)
}

/// Translates a glob into an anchored regular expression.
fn glob_to_regex(glob: &str) -> String {
    let body = glob
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("^{}$", body)
}
