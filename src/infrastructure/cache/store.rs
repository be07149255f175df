//! Fail-soft cache store adapter
//!
//! The single point of contact with the cache backend. Nothing here returns
//! an error: a dead or misbehaving backend turns every operation into a
//! cache miss or a no-op, so the application never depends on the cache
//! being up.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::domain::cache::{CacheBackend, KeyPattern, ReconnectPolicy};
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_cache_store_error, set_cache_store_available};

/// Connection lifecycle of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Never connected, or disconnected on shutdown
    Disconnected,
    Connected,
    /// Connection lost, background reconnect in progress
    Reconnecting,
    /// Connect failed or reconnect attempts exhausted
    Unavailable,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connected,
            2 => ConnectionState::Reconnecting,
            3 => ConnectionState::Unavailable,
            _ => ConnectionState::Disconnected,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connected => 1,
            ConnectionState::Reconnecting => 2,
            ConnectionState::Unavailable => 3,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Unavailable => "unavailable",
        };
        f.write_str(label)
    }
}

/// Timeouts and reconnection policy for the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    pub connect_timeout: Duration,
    pub operation_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(10_000),
            operation_timeout: Duration::from_millis(2_000),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

struct StoreInner {
    backend: Arc<dyn CacheBackend>,
    settings: StoreSettings,
    state: AtomicU8,
    reconnecting: AtomicBool,
}

/// Shared handle to the cache backend; clones refer to the same connection
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<StoreInner>,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("backend", &self.inner.backend.name())
            .field("state", &self.state())
            .field("settings", &self.inner.settings)
            .finish()
    }
}

impl CacheStore {
    /// Creates a store around a backend; call `connect` before use
    pub fn new(backend: Arc<dyn CacheBackend>, settings: StoreSettings) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backend,
                settings,
                state: AtomicU8::new(ConnectionState::Disconnected.as_u8()),
                reconnecting: AtomicBool::new(false),
            }),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.inner.backend.name()
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.inner.settings
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    /// Cheap health check consulted before every operation
    pub fn is_available(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Connects to the backend within the connect timeout.
    ///
    /// Never fails: an unreachable backend leaves the store `Unavailable`
    /// and every other operation becomes a no-op.
    pub async fn connect(&self) -> ConnectionState {
        match self.attempt_connect().await {
            Ok(()) => self.transition(ConnectionState::Connected),
            Err(e) => {
                warn!(
                    backend = self.backend_name(),
                    error = %e,
                    "Cache store connection failed, caching disabled"
                );
                self.transition(ConnectionState::Unavailable);
            }
        }

        self.state()
    }

    /// Gets a cached value; any failure reads as a miss
    pub async fn get(&self, key: &str) -> Option<String> {
        if !self.is_available() {
            return None;
        }

        self.run("get", key, self.inner.backend.get(key))
            .await
            .flatten()
    }

    /// Stores a value; failures are logged and swallowed
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        if !self.is_available() {
            return;
        }

        if self
            .run("set", key, self.inner.backend.set(key, value, ttl))
            .await
            .is_some()
        {
            debug!(key = %key, ttl_secs = ttl.as_secs(), "Cached response");
        }
    }

    /// Deletes every key matching the pattern, returns how many were removed
    pub async fn delete_by_pattern(&self, pattern: &KeyPattern) -> usize {
        if !self.is_available() {
            return 0;
        }

        self.run(
            "delete_pattern",
            pattern.as_str(),
            self.inner.backend.delete_pattern(pattern),
        )
        .await
        .unwrap_or(0)
    }

    /// Removes every entry from the backend
    pub async fn flush_all(&self) -> bool {
        if !self.is_available() {
            return false;
        }

        let flushed = self
            .run("flush_all", "*", self.inner.backend.flush_all())
            .await
            .is_some();

        if flushed {
            info!(backend = self.backend_name(), "Cache flushed");
        }

        flushed
    }

    /// Round-trip probe used by readiness checks
    pub async fn ping(&self) -> bool {
        if !self.is_available() {
            return false;
        }

        self.run("ping", "", self.inner.backend.ping()).await.is_some()
    }

    /// Closes the connection on shutdown.
    ///
    /// The state is settled first so an in-flight reconnect sees the
    /// shutdown and does not resurrect the connection.
    pub async fn disconnect(&self) {
        self.transition(ConnectionState::Disconnected);
        self.close_backend().await;
    }

    async fn close_backend(&self) {
        if let Err(e) = self.inner.backend.disconnect().await {
            warn!(backend = self.backend_name(), error = %e, "Cache store disconnect failed");
        }
    }

    async fn attempt_connect(&self) -> Result<(), DomainError> {
        let timeout = self.inner.settings.connect_timeout;

        tokio::time::timeout(timeout, self.inner.backend.connect())
            .await
            .map_err(|_| {
                DomainError::cache_unavailable(format!(
                    "connect timed out after {}ms",
                    timeout.as_millis()
                ))
            })?
    }

    /// Runs one backend operation under the operation timeout, turning every
    /// failure into `None`
    async fn run<T, F>(&self, operation: &'static str, target: &str, future: F) -> Option<T>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        match tokio::time::timeout(self.inner.settings.operation_timeout, future).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) if e.is_connection_failure() => {
                record_cache_store_error(operation);
                warn!(operation, target = %target, error = %e, "Cache connection lost");
                self.start_reconnect();
                None
            }
            Ok(Err(e)) => {
                record_cache_store_error(operation);
                warn!(operation, target = %target, error = %e, "Cache operation failed");
                None
            }
            Err(_) => {
                record_cache_store_error(operation);
                warn!(
                    operation,
                    target = %target,
                    timeout_ms = self.inner.settings.operation_timeout.as_millis() as u64,
                    "Cache operation timed out"
                );
                None
            }
        }
    }

    fn start_reconnect(&self) {
        if self
            .inner
            .reconnecting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        // only a live connection is re-established; shutdown and exhaustion are final
        if !self.transition_from(ConnectionState::Connected, ConnectionState::Reconnecting) {
            self.inner.reconnecting.store(false, Ordering::SeqCst);
            return;
        }

        let store = self.clone();
        tokio::spawn(async move {
            store.reconnect_loop().await;
            store.inner.reconnecting.store(false, Ordering::SeqCst);
        });
    }

    async fn reconnect_loop(&self) {
        let policy = self.inner.settings.reconnect;

        for (index, delay) in policy.schedule().enumerate() {
            let attempt = index + 1;
            tokio::time::sleep(delay).await;

            // disconnect() or a manual connect() may have settled the state meanwhile
            if self.state() != ConnectionState::Reconnecting {
                return;
            }

            info!(
                attempt,
                max_attempts = policy.max_attempts,
                "Cache store reconnecting"
            );

            match self.attempt_connect().await {
                Ok(()) => {
                    if !self.transition_from(ConnectionState::Reconnecting, ConnectionState::Connected)
                        && self.state() == ConnectionState::Disconnected
                    {
                        debug!("Store shut down during reconnect, closing the new connection");
                        self.close_backend().await;
                    }
                    return;
                }
                Err(e) => debug!(attempt, error = %e, "Cache reconnect attempt failed"),
            }
        }

        if self.transition_from(ConnectionState::Reconnecting, ConnectionState::Unavailable) {
            error!(
                max_attempts = policy.max_attempts,
                "Cache store reconnect attempts exhausted, caching disabled until reconnected"
            );
        }
    }

    fn transition(&self, next: ConnectionState) {
        let previous = ConnectionState::from_u8(self.inner.state.swap(next.as_u8(), Ordering::SeqCst));
        self.log_transition(previous, next);
    }

    /// Moves to `next` only from `expected`; false if the state moved on
    fn transition_from(&self, expected: ConnectionState, next: ConnectionState) -> bool {
        let swapped = self
            .inner
            .state
            .compare_exchange(expected.as_u8(), next.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();

        if swapped {
            self.log_transition(expected, next);
        }

        swapped
    }

    fn log_transition(&self, previous: ConnectionState, next: ConnectionState) {
        if previous == next {
            return;
        }

        set_cache_store_available(next == ConnectionState::Connected);

        match next {
            ConnectionState::Connected => {
                info!(backend = self.backend_name(), from = %previous, "Cache store connected")
            }
            ConnectionState::Reconnecting => {
                warn!(backend = self.backend_name(), from = %previous, "Cache store reconnecting")
            }
            ConnectionState::Unavailable => {
                warn!(backend = self.backend_name(), from = %previous, "Cache store unavailable")
            }
            ConnectionState::Disconnected => {
                info!(backend = self.backend_name(), from = %previous, "Cache store disconnected")
            }
        }
    }
}
