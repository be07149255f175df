//! Glob patterns used for bulk invalidation

use std::fmt;

use regex::Regex;

use super::key::CACHE_NAMESPACE;
use crate::domain::DomainError;

/// Glob pattern over cache keys.
///
/// `*` matches any run of characters, `?` matches one character, every other
/// character is literal. Patterns are confined to the cache namespace so an
/// invalidation can never reach keys the response cache does not own.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    raw: String,
    matcher: Regex,
}

impl KeyPattern {
    pub fn new(pattern: impl Into<String>) -> Result<Self, DomainError> {
        let raw = pattern.into();
        let namespace_prefix = format!("{}:", CACHE_NAMESPACE);

        if !raw.starts_with(&namespace_prefix) {
            return Err(DomainError::validation(format!(
                "Invalidation pattern '{}' must start with '{}'",
                raw, namespace_prefix
            )));
        }

        if raw.contains('[') || raw.contains(']') {
            return Err(DomainError::validation(format!(
                "Invalidation pattern '{}' uses unsupported character classes",
                raw
            )));
        }

        let matcher = Regex::new(&glob_to_regex(&raw))
            .map_err(|e| DomainError::validation(format!("Invalid pattern '{}': {}", raw, e)))?;

        Ok(Self { raw, matcher })
    }

    /// Everything under a path prefix in the public namespace
    pub fn public_prefix(path_prefix: &str) -> Result<Self, DomainError> {
        Self::new(format!("{}:public:{}*", CACHE_NAMESPACE, path_prefix))
    }

    /// Everything under a path prefix for every actor in the private namespace
    pub fn private_prefix(path_prefix: &str) -> Result<Self, DomainError> {
        Self::new(format!("{}:user:*:{}*", CACHE_NAMESPACE, path_prefix))
    }

    /// Every key the response cache owns
    pub fn namespace() -> Result<Self, DomainError> {
        Self::new(format!("{}:*", CACHE_NAMESPACE))
    }

    /// The raw glob, in the syntax Redis `SCAN MATCH` understands
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, key: &str) -> bool {
        self.matcher.is_match(key)
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for KeyPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for KeyPattern {}

fn glob_to_regex(glob: &str) -> String {
    let mut expr = String::with_capacity(glob.len() + 8);
    expr.push('^');

    for c in glob.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }

    expr.push('$');
    expr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_pattern() {
        let pattern = KeyPattern::namespace().unwrap();

        assert_eq!(pattern.as_str(), "cache:*");
        assert!(pattern.matches("cache:public:/api/contests"));
        assert!(pattern.matches("cache:user:u1:/api/result/user/statistics"));
        assert!(!pattern.matches("session:u1"));
    }

    #[test]
    fn test_prefix_match() {
        let pattern = KeyPattern::new("cache:public:/api/quiz*").unwrap();

        assert!(pattern.matches("cache:public:/api/quiz/quizzes"));
        assert!(pattern.matches("cache:public:/api/quiz/quizzes/42?full=true"));
        assert!(!pattern.matches("cache:public:/api/contests"));
        assert!(!pattern.matches("cache:user:u1:/api/quiz/quizzes"));
    }

    #[test]
    fn test_match_is_anchored() {
        let pattern = KeyPattern::new("cache:public:/api/result").unwrap();

        assert!(pattern.matches("cache:public:/api/result"));
        assert!(!pattern.matches("cache:public:/api/result/7"));
        assert!(!pattern.matches("x-cache:public:/api/result"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pattern = KeyPattern::new("cache:public:/api/quiz/quizzes?page=1").unwrap();

        // `?` is a single-char wildcard, `.` and `+` stay literal
        assert!(pattern.matches("cache:public:/api/quiz/quizzes?page=1"));
        assert!(pattern.matches("cache:public:/api/quiz/quizzesXpage=1"));

        let dotted = KeyPattern::new("cache:public:/v1.0+*").unwrap();
        assert!(dotted.matches("cache:public:/v1.0+/items"));
        assert!(!dotted.matches("cache:public:/v1x0+/items"));
    }

    #[test]
    fn test_private_prefix_spans_actors() {
        let pattern = KeyPattern::private_prefix("/api/result").unwrap();

        assert_eq!(pattern.as_str(), "cache:user:*:/api/result*");
        assert!(pattern.matches("cache:user:u1:/api/result/user/statistics"));
        assert!(pattern.matches("cache:user:u2:/api/result/quiz/9"));
        assert!(!pattern.matches("cache:public:/api/result/leaderboard/9"));
    }

    #[test]
    fn test_rejects_patterns_outside_namespace() {
        assert!(KeyPattern::new("*").is_err());
        assert!(KeyPattern::new("session:*").is_err());
        assert!(KeyPattern::new("cache:public:/api/[ab]*").is_err());
    }
}
