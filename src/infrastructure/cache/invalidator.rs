//! Cache invalidation hooks for mutation handlers

use std::sync::Arc;

use tracing::{debug, error, warn};

use super::store::CacheStore;
use crate::domain::cache::{InvalidationTable, KeyPattern, Mutation};
use crate::domain::EntityKind;
use crate::infrastructure::observability::{record_cache_invalidation, InvalidationTrigger};

/// Erases cache entries made stale by a successful write.
///
/// Best-effort: a failed invalidation leaves entries stale until their TTL
/// runs out and is never reported to the caller.
#[derive(Debug, Clone)]
pub struct CacheInvalidator {
    store: CacheStore,
    table: Arc<InvalidationTable>,
}

impl CacheInvalidator {
    pub fn new(store: CacheStore, table: InvalidationTable) -> Self {
        Self {
            store,
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &InvalidationTable {
        &self.table
    }

    /// Deletes every entry matching a raw glob pattern
    pub async fn invalidate(&self, pattern: &str) -> usize {
        match KeyPattern::new(pattern) {
            Ok(pattern) => self.invalidate_pattern(&pattern).await,
            Err(e) => {
                error!(pattern = %pattern, error = %e, "Rejected cache invalidation pattern");
                0
            }
        }
    }

    /// Deletes every entry matching an already validated pattern
    pub async fn invalidate_pattern(&self, pattern: &KeyPattern) -> usize {
        let deleted = self.delete_matching(pattern).await;
        record_cache_invalidation(InvalidationTrigger::Adhoc, deleted);

        deleted
    }

    /// Applies the table's fan-out for one mutation
    pub async fn invalidate_for(&self, kind: EntityKind, mutation: Mutation) -> usize {
        let patterns = self.table.patterns_for(kind, mutation);

        if patterns.is_empty() {
            warn!(entity = %kind, mutation = %mutation, "No invalidation rule registered");
            return 0;
        }

        let mut deleted = 0;

        for pattern in patterns {
            deleted += self.delete_matching(pattern).await;
        }

        record_cache_invalidation(InvalidationTrigger::Mutation(kind, mutation), deleted);

        deleted
    }

    async fn delete_matching(&self, pattern: &KeyPattern) -> usize {
        if !self.store.is_available() {
            warn!(pattern = %pattern, "Cache unavailable, invalidation skipped");
            return 0;
        }

        let deleted = self.store.delete_by_pattern(pattern).await;
        debug!(pattern = %pattern, deleted, "Invalidated cache entries");

        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::cache::MockCacheBackend;
    use crate::infrastructure::cache::StoreSettings;

    async fn seeded() -> (CacheInvalidator, CacheStore) {
        let store = CacheStore::new(Arc::new(MockCacheBackend::new()), StoreSettings::default());
        store.connect().await;

        let ttl = Duration::from_secs(60);
        for key in [
            "cache:public:/api/quiz/quizzes",
            "cache:public:/api/quiz/quizzes/1",
            "cache:public:/api/contests",
            "cache:public:/api/categories",
            "cache:user:u1:/api/result/user/statistics",
            "cache:user:u2:/api/result/user/statistics",
        ] {
            store.set(key, "{}", ttl).await;
        }

        let invalidator =
            CacheInvalidator::new(store.clone(), InvalidationTable::platform_default().unwrap());
        (invalidator, store)
    }

    #[tokio::test]
    async fn test_invalidate_prefix() {
        let (invalidator, store) = seeded().await;

        assert_eq!(invalidator.invalidate("cache:public:/api/quiz*").await, 2);
        assert!(store.get("cache:public:/api/quiz/quizzes").await.is_none());
        assert!(store.get("cache:public:/api/contests").await.is_some());
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_soft() {
        let (invalidator, store) = seeded().await;

        assert_eq!(invalidator.invalidate("*").await, 0);
        assert!(store.get("cache:public:/api/contests").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_for_result_submission() {
        let (invalidator, store) = seeded().await;

        let deleted = invalidator
            .invalidate_for(EntityKind::Result, Mutation::Create)
            .await;

        // both users' statistics plus the contest listing
        assert_eq!(deleted, 3);
        assert!(store.get("cache:public:/api/quiz/quizzes").await.is_some());
        assert!(store.get("cache:public:/api/categories").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_for_category_touches_quizzes() {
        let (invalidator, store) = seeded().await;

        invalidator
            .invalidate_for(EntityKind::Category, Mutation::Update)
            .await;

        assert!(store.get("cache:public:/api/categories").await.is_none());
        assert!(store.get("cache:public:/api/quiz/quizzes/1").await.is_none());
        assert!(store.get("cache:public:/api/contests").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_when_unavailable() {
        let store = CacheStore::new(
            Arc::new(MockCacheBackend::new().refusing_connections()),
            StoreSettings::default(),
        );
        store.connect().await;
        let invalidator = CacheInvalidator::new(store, InvalidationTable::platform_default().unwrap());

        assert_eq!(
            invalidator.invalidate_for(EntityKind::Quiz, Mutation::Delete).await,
            0
        );
    }
}
