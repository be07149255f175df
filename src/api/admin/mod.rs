//! Admin API endpoints, mounted only when an admin token is configured

pub mod cache;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/cache/status", get(cache::cache_status))
        .route("/cache/flush", post(cache::flush_cache))
        .route("/cache/invalidate", post(cache::invalidate_cache))
}
