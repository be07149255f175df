//! Cache administration endpoints

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::cache::{KeyPattern, Mutation};
use crate::domain::EntityKind;
use crate::infrastructure::cache::ConnectionState;

/// Either a raw pattern or an entity mutation to replay from the table
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InvalidateRequest {
    Pattern { pattern: String },
    Mutation { entity: String, mutation: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub patterns: Vec<String>,
    pub deleted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    pub flushed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatusResponse {
    pub backend: &'static str,
    pub state: ConnectionState,
    pub available: bool,
    pub reachable: bool,
}

/// GET /admin/cache/status
pub async fn cache_status(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Json<CacheStatusResponse> {
    let reachable = state.cache.is_available() && state.cache.ping().await;

    Json(CacheStatusResponse {
        backend: state.cache.backend_name(),
        state: state.cache.state(),
        available: state.cache.is_available(),
        reachable,
    })
}

/// POST /admin/cache/flush
pub async fn flush_cache(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<FlushResponse>, ApiError> {
    if !state.cache.is_available() {
        return Err(ApiError::unavailable(format!(
            "Cache is {}",
            state.cache.state()
        )));
    }

    let flushed = state.cache.flush_all().await;

    if flushed {
        info!("Cache flushed by admin");
    } else {
        warn!("Admin cache flush failed");
    }

    Ok(Json(FlushResponse { flushed }))
}

/// POST /admin/cache/invalidate
pub async fn invalidate_cache(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(request): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>, ApiError> {
    match request {
        InvalidateRequest::Pattern { pattern } => {
            let pattern = KeyPattern::new(pattern)?;
            let deleted = state.invalidator.invalidate_pattern(&pattern).await;

            info!(pattern = %pattern, deleted, "Cache invalidated by admin");

            Ok(Json(InvalidateResponse {
                patterns: vec![pattern.as_str().to_string()],
                deleted,
            }))
        }
        InvalidateRequest::Mutation { entity, mutation } => {
            let kind: EntityKind = entity.parse()?;
            let mutation: Mutation = mutation.parse()?;

            let patterns = state
                .invalidator
                .table()
                .patterns_for(kind, mutation)
                .iter()
                .map(|pattern| pattern.as_str().to_string())
                .collect();
            let deleted = state.invalidator.invalidate_for(kind, mutation).await;

            info!(entity = %kind, mutation = %mutation, deleted, "Cache invalidated by admin");

            Ok(Json(InvalidateResponse { patterns, deleted }))
        }
    }
}
