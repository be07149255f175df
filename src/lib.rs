//! QuizHub cache service
//!
//! The quiz platform's REST surface behind an HTTP response cache:
//! - Fail-soft cache store over Redis or an in-memory backend
//! - Read-through, write-back response caching per route and per user
//! - Table-driven invalidation after successful writes

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use api::state::AppState;
use domain::cache::InvalidationTable;
use domain::{EntityKind, Resource};
use infrastructure::cache::{CacheFactory, ConnectionState};
use infrastructure::resource::InMemoryResourceRepository;

/// Create the application state with the default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration.
///
/// Connects the cache store; an unreachable cache is logged and the state is
/// still returned so the service starts uncached.
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let cache = CacheFactory::new().create_store(&config.cache)?;

    info!(
        backend = cache.backend_name(),
        host = %config.cache.host,
        port = config.cache.port,
        "Connecting cache store"
    );

    if cache.connect().await != ConnectionState::Connected {
        warn!("Cache store unavailable at startup, responses will not be cached");
    }

    let table = InvalidationTable::platform_default()?;
    let resources = Arc::new(InMemoryResourceRepository::with_resources(
        default_categories(),
    ));

    let mut state = AppState::new(resources, cache, table)
        .with_max_cached_body_bytes(config.cache.max_body_bytes);

    match config.auth.admin_token.as_deref().filter(|token| !token.is_empty()) {
        Some(token) => {
            info!("Admin cache endpoints enabled");
            state = state.with_admin_token(token);
        }
        None => info!("No admin token configured, admin cache endpoints disabled"),
    }

    Ok(state)
}

fn default_categories() -> Vec<Resource> {
    ["General knowledge", "Science", "Programming"]
        .into_iter()
        .map(|name| Resource::new(EntityKind::Category, None, json!({ "name": name })))
        .collect()
}
