//! Cache backend trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use super::pattern::KeyPattern;
use crate::domain::DomainError;

/// Raw key-value backend behind the cache store.
///
/// Backends report every failure as an error; the store above them decides
/// what is soft. Connection-class failures must be reported as
/// `DomainError::CacheUnavailable` so the store can start reconnecting.
#[async_trait]
pub trait CacheBackend: Send + Sync + Debug {
    /// Short backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Establishes (or re-establishes) the backend connection
    async fn connect(&self) -> Result<(), DomainError>;

    /// Gets a stored value
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Stores a value, replacing any previous one, expiring after `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes every key matching the pattern, returning how many were removed
    async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<usize, DomainError>;

    /// Removes every entry
    async fn flush_all(&self) -> Result<(), DomainError>;

    /// Round-trip health probe
    async fn ping(&self) -> Result<(), DomainError>;

    /// Closes the connection
    async fn disconnect(&self) -> Result<(), DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    /// Mock backend with failure injection and call counters
    #[derive(Debug, Default)]
    pub struct MockCacheBackend {
        entries: Mutex<HashMap<String, (String, Instant)>>,
        refuse_connections: AtomicBool,
        connection_lost: AtomicBool,
        command_error: AtomicBool,
        hang: AtomicBool,
        connect_delay_ms: AtomicU64,
        connect_calls: AtomicUsize,
        disconnect_calls: AtomicUsize,
        set_calls: AtomicUsize,
    }

    impl MockCacheBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every `connect` fails
        pub fn refusing_connections(self) -> Self {
            self.refuse_connections.store(true, Ordering::SeqCst);
            self
        }

        pub fn set_refuse_connections(&self, refuse: bool) {
            self.refuse_connections.store(refuse, Ordering::SeqCst);
        }

        /// Every command fails as if the connection dropped
        pub fn set_connection_lost(&self, lost: bool) {
            self.connection_lost.store(lost, Ordering::SeqCst);
        }

        /// Every command fails with a non-connection error
        pub fn set_command_error(&self, failing: bool) {
            self.command_error.store(failing, Ordering::SeqCst);
        }

        /// Every command waits far longer than any test timeout
        pub fn set_hang(&self, hang: bool) {
            self.hang.store(hang, Ordering::SeqCst);
        }

        /// `connect` takes this long before it answers
        pub fn set_connect_delay(&self, delay: Duration) {
            self.connect_delay_ms
                .store(delay.as_millis() as u64, Ordering::SeqCst);
        }

        pub fn disconnect_calls(&self) -> usize {
            self.disconnect_calls.load(Ordering::SeqCst)
        }

        pub fn connect_calls(&self) -> usize {
            self.connect_calls.load(Ordering::SeqCst)
        }

        pub fn set_calls(&self) -> usize {
            self.set_calls.load(Ordering::SeqCst)
        }

        pub fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }

        pub fn contains(&self, key: &str) -> bool {
            self.entries.lock().unwrap().contains_key(key)
        }

        async fn check(&self) -> Result<(), DomainError> {
            if self.hang.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }

            if self.connection_lost.load(Ordering::SeqCst) {
                return Err(DomainError::cache_unavailable("connection reset by peer"));
            }

            if self.command_error.load(Ordering::SeqCst) {
                return Err(DomainError::cache("command rejected"));
            }

            Ok(())
        }
    }

    #[async_trait]
    impl CacheBackend for MockCacheBackend {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn connect(&self) -> Result<(), DomainError> {
            self.connect_calls.fetch_add(1, Ordering::SeqCst);

            let delay = self.connect_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            if self.refuse_connections.load(Ordering::SeqCst) {
                return Err(DomainError::cache_unavailable("connection refused"));
            }

            self.connection_lost.store(false, Ordering::SeqCst);
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.check().await?;
            let mut entries = self.entries.lock().unwrap();

            match entries.get(key) {
                Some((_, expires_at)) if *expires_at <= Instant::now() => {
                    entries.remove(key);
                    Ok(None)
                }
                Some((value, _)) => Ok(Some(value.clone())),
                None => Ok(None),
            }
        }

        async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
            self.set_calls.fetch_add(1, Ordering::SeqCst);
            self.check().await?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
            Ok(())
        }

        async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<usize, DomainError> {
            self.check().await?;
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|key, _| !pattern.matches(key));
            Ok(before - entries.len())
        }

        async fn flush_all(&self) -> Result<(), DomainError> {
            self.check().await?;
            self.entries.lock().unwrap().clear();
            Ok(())
        }

        async fn ping(&self) -> Result<(), DomainError> {
            self.check().await
        }

        async fn disconnect(&self) -> Result<(), DomainError> {
            self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_set_get() {
            let backend = MockCacheBackend::new();
            backend
                .set("cache:public:/a", "{}", Duration::from_secs(60))
                .await
                .unwrap();

            let value = backend.get("cache:public:/a").await.unwrap();
            assert_eq!(value, Some("{}".to_string()));
        }

        #[tokio::test]
        async fn test_mock_connection_lost() {
            let backend = MockCacheBackend::new();
            backend.set_connection_lost(true);

            let err = backend.get("cache:public:/a").await.unwrap_err();
            assert!(err.is_connection_failure());

            backend.connect().await.unwrap();
            assert!(backend.get("cache:public:/a").await.is_ok());
        }

        #[tokio::test]
        async fn test_mock_delete_pattern() {
            let backend = MockCacheBackend::new();
            let ttl = Duration::from_secs(60);
            backend.set("cache:public:/api/quiz/1", "1", ttl).await.unwrap();
            backend.set("cache:public:/api/quiz/2", "2", ttl).await.unwrap();
            backend.set("cache:public:/api/contests", "3", ttl).await.unwrap();

            let pattern = KeyPattern::new("cache:public:/api/quiz*").unwrap();
            let deleted = backend.delete_pattern(&pattern).await.unwrap();

            assert_eq!(deleted, 2);
            assert_eq!(backend.len(), 1);
        }
    }
}
