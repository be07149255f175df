//! Cache key derivation for response caching
//!
//! Keys live in one of two namespaces:
//! - `cache:public:<path+query>` for responses shared by every caller
//! - `cache:user:<actor>:<path+query>` for responses scoped to one actor

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Root tag shared by every key the response cache writes
pub const CACHE_NAMESPACE: &str = "cache";

const PUBLIC_SEGMENT: &str = "public";
const PRIVATE_SEGMENT: &str = "user";

/// Whether a cached response is shared or isolated per actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    Public,
    Private,
}

impl CacheScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheScope::Public => "public",
            CacheScope::Private => "private",
        }
    }
}

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(CacheScope::Public),
            "private" | "user" => Ok(CacheScope::Private),
            _ => Err(DomainError::validation(format!(
                "Unknown cache scope: {}. Valid scopes: public, private",
                s
            ))),
        }
    }
}

/// Identifier of the authenticated caller, resolved upstream
///
/// Rejects anything that could break out of its key segment: separators,
/// whitespace and glob metacharacters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();

        if id.is_empty() {
            return Err(DomainError::validation("Actor id cannot be empty"));
        }

        if id
            .chars()
            .any(|c| c == ':' || c.is_whitespace() || matches!(c, '*' | '?' | '[' | ']'))
        {
            return Err(DomainError::validation(format!(
                "Actor id '{}' contains reserved characters",
                id
            )));
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully derived cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a response shared by all callers
    pub fn public(path_and_query: &str) -> Self {
        Self(format!(
            "{}:{}:{}",
            CACHE_NAMESPACE, PUBLIC_SEGMENT, path_and_query
        ))
    }

    /// Key for a response that belongs to one actor
    pub fn private(actor: &ActorId, path_and_query: &str) -> Self {
        Self(format!(
            "{}:{}:{}:{}",
            CACHE_NAMESPACE,
            PRIVATE_SEGMENT,
            actor.as_str(),
            path_and_query
        ))
    }

    /// Derives the key for a request under the given scope.
    ///
    /// Returns `None` for a private scope without an actor; such a request
    /// must not be cached at all rather than land in the public namespace.
    pub fn for_request(
        scope: CacheScope,
        actor: Option<&ActorId>,
        path_and_query: &str,
    ) -> Option<Self> {
        match scope {
            CacheScope::Public => Some(Self::public(path_and_query)),
            CacheScope::Private => actor.map(|actor| Self::private(actor, path_and_query)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key() {
        let key = CacheKey::public("/api/quiz/quizzes?page=2");
        assert_eq!(key.as_str(), "cache:public:/api/quiz/quizzes?page=2");
    }

    #[test]
    fn test_private_key() {
        let actor = ActorId::new("u1").unwrap();
        let key = CacheKey::private(&actor, "/api/result/user/statistics");
        assert_eq!(key.as_str(), "cache:user:u1:/api/result/user/statistics");
    }

    #[test]
    fn test_private_scope_without_actor_has_no_key() {
        let key = CacheKey::for_request(CacheScope::Private, None, "/api/result/user/statistics");
        assert!(key.is_none());
    }

    #[test]
    fn test_public_scope_ignores_actor() {
        let actor = ActorId::new("u1").unwrap();
        let key = CacheKey::for_request(CacheScope::Public, Some(&actor), "/api/contests");
        assert_eq!(key.unwrap().as_str(), "cache:public:/api/contests");
    }

    #[test]
    fn test_actors_get_distinct_keys() {
        let a = ActorId::new("u1").unwrap();
        let b = ActorId::new("u2").unwrap();
        let path = "/api/result/user/statistics";

        assert_ne!(
            CacheKey::for_request(CacheScope::Private, Some(&a), path),
            CacheKey::for_request(CacheScope::Private, Some(&b), path)
        );
    }

    #[test]
    fn test_actor_id_rejects_reserved_characters() {
        assert!(ActorId::new("").is_err());
        assert!(ActorId::new("u1:/api").is_err());
        assert!(ActorId::new("u*").is_err());
        assert!(ActorId::new("a b").is_err());
        assert!(ActorId::new("65f1c2e4a9b0c3d2e1f00001").is_ok());
    }

    #[test]
    fn test_scope_from_str() {
        assert_eq!("public".parse::<CacheScope>().unwrap(), CacheScope::Public);
        assert_eq!("PRIVATE".parse::<CacheScope>().unwrap(), CacheScope::Private);
        assert_eq!("user".parse::<CacheScope>().unwrap(), CacheScope::Private);
        assert!("shared".parse::<CacheScope>().is_err());
    }
}
