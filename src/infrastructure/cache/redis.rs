//! Redis cache backend

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisError};
use tokio::sync::RwLock;

use crate::domain::cache::{CacheBackend, KeyPattern};
use crate::domain::DomainError;

const SCAN_BATCH: usize = 100;

/// Configuration for the Redis backend
#[derive(Clone)]
pub struct RedisBackendConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub database: i64,
}

impl fmt::Debug for RedisBackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackendConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("database", &self.database)
            .finish()
    }
}

impl Default for RedisBackendConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            database: 0,
        }
    }
}

impl RedisBackendConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_database(mut self, database: i64) -> Self {
        self.database = database;
        self
    }

    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: self.database,
                password: self.password.clone(),
                ..Default::default()
            },
        }
    }
}

/// Redis backend over a multiplexed tokio connection.
///
/// Reconnection is driven by the cache store, which calls `connect` again
/// under its own bounded policy; this type only swaps in the new connection.
pub struct RedisBackend {
    config: RedisBackendConfig,
    connection: RwLock<Option<MultiplexedConnection>>,
}

impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend")
            .field("config", &self.config)
            .field("connection", &"<MultiplexedConnection>")
            .finish()
    }
}

impl RedisBackend {
    pub fn new(config: RedisBackendConfig) -> Self {
        Self {
            config,
            connection: RwLock::new(None),
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, DomainError> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or_else(|| DomainError::cache_unavailable("Redis is not connected"))
    }
}

fn map_redis_error(context: String, e: RedisError) -> DomainError {
    if e.is_connection_dropped() || e.is_connection_refusal() || e.is_io_error() || e.is_timeout()
    {
        DomainError::cache_unavailable(format!("{}: {}", context, e))
    } else {
        DomainError::cache(format!("{}: {}", context, e))
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn connect(&self) -> Result<(), DomainError> {
        let client = Client::open(self.config.connection_info()).map_err(|e| {
            DomainError::cache_unavailable(format!("Failed to create Redis client: {}", e))
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("Failed to connect to Redis".to_string(), e))?;

        *self.connection.write().await = Some(connection);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.connection().await?;

        conn.get(key)
            .await
            .map_err(|e| map_redis_error(format!("Failed to get key '{}'", key), e))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let mut conn = self.connection().await?;
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| map_redis_error(format!("Failed to set key '{}'", key), e))
    }

    async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<usize, DomainError> {
        let mut conn = self.connection().await?;

        // SCAN rather than KEYS so a large keyspace never blocks the server
        let mut cursor = 0u64;
        let mut total_deleted = 0usize;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern.as_str())
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    map_redis_error(format!("Failed to scan keys matching '{}'", pattern), e)
                })?;

            if !keys.is_empty() {
                let deleted: usize = conn
                    .del(&keys)
                    .await
                    .map_err(|e| map_redis_error("Failed to delete keys".to_string(), e))?;
                total_deleted += deleted;
            }

            cursor = next_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(total_deleted)
    }

    /// Erases the cache namespace only; other keys in the database survive
    async fn flush_all(&self) -> Result<(), DomainError> {
        self.delete_pattern(&KeyPattern::namespace()?).await.map(|_| ())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection().await?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| map_redis_error("Failed to ping Redis".to_string(), e))
    }

    async fn disconnect(&self) -> Result<(), DomainError> {
        // dropping the last handle closes the multiplexed connection
        self.connection.write().await.take();
        Ok(())
    }
}
