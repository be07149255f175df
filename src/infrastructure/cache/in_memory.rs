//! In-memory cache backend using moka

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::cache::{CacheBackend, KeyPattern};
use crate::domain::DomainError;

/// Configuration for the in-memory backend
#[derive(Debug, Clone)]
pub struct InMemoryBackendConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Upper bound on any entry's lifetime, whatever TTL it was stored with
    pub max_ttl: Duration,
}

impl Default for InMemoryBackendConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            max_ttl: Duration::from_secs(24 * 3600),
        }
    }
}

impl InMemoryBackendConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_max_ttl(mut self, ttl: Duration) -> Self {
        self.max_ttl = ttl;
        self
    }
}

#[derive(Debug, Clone)]
struct Entry {
    body: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-local backend for development and tests.
///
/// Entries carry their own deadline; moka's global time-to-live only bounds
/// how long a forgotten entry can occupy memory.
#[derive(Debug)]
pub struct InMemoryBackend {
    cache: MokaCache<String, Entry>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_config(InMemoryBackendConfig::default())
    }

    pub fn with_config(config: InMemoryBackendConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.max_ttl)
            .build();

        Self { cache }
    }

    /// Approximate number of live entries
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        match self.cache.get(key).await {
            Some(entry) if entry.is_expired() => {
                self.cache.remove(key).await;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.body)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let entry = Entry {
            body: value.to_string(),
            expires_at: Instant::now() + ttl.max(Duration::from_secs(1)),
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;

        let matching: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| pattern.matches(key.as_str()))
            .map(|(key, _)| (*key).clone())
            .collect();

        let mut deleted = 0;

        for key in matching {
            if self.cache.remove(&key).await.is_some() {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    async fn flush_all(&self) -> Result<(), DomainError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let backend = InMemoryBackend::new();

        backend
            .set("cache:public:/api/contests", "[]", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            backend.get("cache:public:/api/contests").await.unwrap(),
            Some("[]".to_string())
        );
    }

    #[tokio::test]
    async fn test_get_missing() {
        let backend = InMemoryBackend::new();
        assert!(backend.get("cache:public:/nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_whole_entry() {
        let backend = InMemoryBackend::new();
        let ttl = Duration::from_secs(60);

        backend.set("cache:public:/a", "{\"v\":1}", ttl).await.unwrap();
        backend.set("cache:public:/a", "{\"v\":2}", ttl).await.unwrap();

        assert_eq!(
            backend.get("cache:public:/a").await.unwrap(),
            Some("{\"v\":2}".to_string())
        );
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let backend = InMemoryBackend::new();

        backend
            .set("cache:public:/short", "1", Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(backend.get("cache:public:/short").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let backend = InMemoryBackend::new();
        let ttl = Duration::from_secs(60);
        backend.set("cache:user:u1:/api/result/user/statistics", "1", ttl).await.unwrap();
        backend.set("cache:user:u2:/api/result/user/statistics", "2", ttl).await.unwrap();
        backend.set("cache:public:/api/result/leaderboard/q1", "3", ttl).await.unwrap();

        let pattern = KeyPattern::private_prefix("/api/result").unwrap();
        let deleted = backend.delete_pattern(&pattern).await.unwrap();

        assert_eq!(deleted, 2);
        assert!(backend
            .get("cache:public:/api/result/leaderboard/q1")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_flush_all() {
        let backend = InMemoryBackend::new();
        let ttl = Duration::from_secs(60);
        backend.set("cache:public:/a", "1", ttl).await.unwrap();
        backend.set("cache:public:/b", "2", ttl).await.unwrap();

        backend.flush_all().await.unwrap();

        assert_eq!(backend.entry_count().await, 0);
    }
}
