//! API middleware components

pub mod actor;
pub mod admin_auth;
pub mod logging;
pub mod metrics;
pub mod response_cache;

pub use actor::{actor_middleware, ActorHeader, CurrentActor, RequireActor};
pub use admin_auth::{RequireAdmin, ADMIN_TOKEN_HEADER};
pub use logging::logging_middleware;
pub use metrics::metrics_middleware;
pub use response_cache::{cached, response_cache_middleware, ResponseCache, DEFAULT_MAX_BODY_BYTES};
