use axum::{middleware, routing::get, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::admin;
use super::health;
use super::middleware::{actor_middleware, logging_middleware, metrics_middleware, ActorHeader};
use super::platform;
use super::state::AppState;

/// Create the full router with application state
pub fn create_router_with_state(state: AppState, actor_header: ActorHeader) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .merge(platform::create_platform_router(&state));

    if state.admin_token.is_some() {
        router = router.nest("/admin", admin::create_admin_router());
    }

    // the actor must be resolved before logging and any cache lookup
    router
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(actor_header, actor_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
