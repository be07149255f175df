//! Cache backend selection from configuration

use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheSettings;
use crate::domain::cache::{CacheBackend, ReconnectPolicy};
use crate::domain::DomainError;

use super::in_memory::{InMemoryBackend, InMemoryBackendConfig};
use super::redis::{RedisBackend, RedisBackendConfig};
use super::store::{CacheStore, StoreSettings};

/// Supported cache backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackendType {
    #[default]
    Redis,
    /// Process-local moka cache
    InMemory,
}

impl std::fmt::Display for CacheBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendType::Redis => write!(f, "redis"),
            CacheBackendType::InMemory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for CacheBackendType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(CacheBackendType::Redis),
            "memory" | "in_memory" | "inmemory" => Ok(CacheBackendType::InMemory),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache backend: {}. Valid backends: redis, memory",
                s
            ))),
        }
    }
}

impl From<&CacheSettings> for StoreSettings {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            connect_timeout: Duration::from_millis(settings.connect_timeout_ms),
            operation_timeout: Duration::from_millis(settings.operation_timeout_ms),
            reconnect: ReconnectPolicy::new(
                settings.max_reconnect_attempts,
                Duration::from_millis(settings.reconnect_backoff_step_ms),
                Duration::from_millis(settings.reconnect_backoff_cap_ms),
            ),
        }
    }
}

/// Factory for cache backends and the store wrapping them
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates the configured backend; only an unknown backend name fails
    pub fn create_backend(
        &self,
        settings: &CacheSettings,
    ) -> Result<Arc<dyn CacheBackend>, DomainError> {
        let backend_type: CacheBackendType = settings.backend.parse()?;

        match backend_type {
            CacheBackendType::Redis => {
                let mut config = RedisBackendConfig::new(settings.host.clone(), settings.port)
                    .with_database(settings.database);

                if let Some(password) = settings.password.as_deref().filter(|p| !p.is_empty()) {
                    config = config.with_password(password);
                }

                Ok(Arc::new(RedisBackend::new(config)))
            }
            CacheBackendType::InMemory => {
                let config = InMemoryBackendConfig::default()
                    .with_max_capacity(settings.memory_max_capacity);

                Ok(Arc::new(InMemoryBackend::with_config(config)))
            }
        }
    }

    /// Creates an unconnected store for the configured backend
    pub fn create_store(&self, settings: &CacheSettings) -> Result<CacheStore, DomainError> {
        let backend = self.create_backend(settings)?;
        Ok(CacheStore::new(backend, StoreSettings::from(settings)))
    }

    /// Creates an unconnected store over the in-memory backend
    pub fn create_in_memory_store(&self) -> CacheStore {
        CacheStore::new(Arc::new(InMemoryBackend::new()), StoreSettings::default())
    }
}
