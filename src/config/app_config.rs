use serde::Deserialize;

use crate::infrastructure::observability::MetricsConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Response cache and cache store settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// `redis` or `memory`
    pub backend: String,
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub database: i64,
    pub connect_timeout_ms: u64,
    pub operation_timeout_ms: u64,
    pub max_reconnect_attempts: u32,
    pub reconnect_backoff_step_ms: u64,
    pub reconnect_backoff_cap_ms: u64,
    /// Responses with a larger body are served but never stored
    pub max_body_bytes: usize,
    /// Entry limit for the in-memory backend
    pub memory_max_capacity: u64,
}

impl std::fmt::Debug for CacheSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSettings")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("database", &self.database)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("operation_timeout_ms", &self.operation_timeout_ms)
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .field("reconnect_backoff_step_ms", &self.reconnect_backoff_step_ms)
            .field("reconnect_backoff_cap_ms", &self.reconnect_backoff_cap_ms)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("memory_max_capacity", &self.memory_max_capacity)
            .finish()
    }
}

/// Request identity and admin access
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Trusted header carrying the authenticated user id
    pub actor_header: String,
    /// Enables the admin cache endpoints when set
    pub admin_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("actor_header", &self.actor_header)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: "redis".to_string(),
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            database: 0,
            connect_timeout_ms: 10_000,
            operation_timeout_ms: 2_000,
            max_reconnect_attempts: 10,
            reconnect_backoff_step_ms: 200,
            reconnect_backoff_cap_ms: 3_000,
            max_body_bytes: 1024 * 1024,
            memory_max_capacity: 10_000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            actor_header: "x-user-id".to_string(),
            admin_token: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;
        app_config
            .cache
            .apply_redis_env(|name| std::env::var(name).ok())?;

        Ok(app_config)
    }
}

impl CacheSettings {
    /// Applies `REDIS_HOST`, `REDIS_PORT` and `REDIS_PASSWORD` on top of the
    /// loaded settings
    pub fn apply_redis_env<F>(&mut self, lookup: F) -> Result<(), config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("REDIS_HOST").filter(|h| !h.is_empty()) {
            self.host = host;
        }

        if let Some(port) = lookup("REDIS_PORT").filter(|p| !p.is_empty()) {
            self.port = port.parse().map_err(|_| {
                config::ConfigError::Message(format!("REDIS_PORT is not a valid port: {}", port))
            })?;
        }

        if let Some(password) = lookup("REDIS_PASSWORD").filter(|p| !p.is_empty()) {
            self.password = Some(password);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_cache_defaults() {
        let settings = CacheSettings::default();

        assert_eq!(settings.backend, "redis");
        assert_eq!(settings.port, 6379);
        assert_eq!(settings.connect_timeout_ms, 10_000);
        assert_eq!(settings.operation_timeout_ms, 2_000);
        assert_eq!(settings.max_reconnect_attempts, 10);
        assert_eq!(settings.reconnect_backoff_step_ms, 200);
        assert_eq!(settings.reconnect_backoff_cap_ms, 3_000);
        assert_eq!(settings.max_body_bytes, 1_048_576);
    }

    #[test]
    fn test_auth_defaults() {
        let auth = AuthConfig::default();

        assert_eq!(auth.actor_header, "x-user-id");
        assert!(auth.admin_token.is_none());
    }

    #[test]
    fn test_partial_sections_deserialize() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "cache": { "backend": "memory", "port": 6380 }, "auth": { "admin_token": "t" } }"#,
        )
        .unwrap();

        assert_eq!(config.cache.backend, "memory");
        assert_eq!(config.cache.port, 6380);
        assert_eq!(config.cache.host, "127.0.0.1");
        assert_eq!(config.auth.admin_token.as_deref(), Some("t"));
        assert_eq!(config.auth.actor_header, "x-user-id");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_redis_env_overrides() {
        let mut settings = CacheSettings::default();

        settings
            .apply_redis_env(env(&[
                ("REDIS_HOST", "redis.internal"),
                ("REDIS_PORT", "6390"),
                ("REDIS_PASSWORD", "pw"),
            ]))
            .unwrap();

        assert_eq!(settings.host, "redis.internal");
        assert_eq!(settings.port, 6390);
        assert_eq!(settings.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_redis_env_absent_keeps_settings() {
        let mut settings = CacheSettings::default();

        settings.apply_redis_env(env(&[("REDIS_HOST", "")])).unwrap();

        assert_eq!(settings.host, "127.0.0.1");
        assert!(settings.password.is_none());
    }

    #[test]
    fn test_redis_env_invalid_port() {
        let mut settings = CacheSettings::default();

        assert!(settings
            .apply_redis_env(env(&[("REDIS_PORT", "not-a-port")]))
            .is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = CacheSettings {
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let auth = AuthConfig {
            admin_token: Some("s3cret".to_string()),
            ..Default::default()
        };

        assert!(!format!("{:?}", settings).contains("hunter2"));
        assert!(!format!("{:?}", auth).contains("s3cret"));
    }
}
