//! API layer - HTTP endpoints and middleware

pub mod admin;
pub mod health;
pub mod middleware;
pub mod platform;
pub mod router;
pub mod state;
pub mod types;

pub use middleware::{cached, ResponseCache};
pub use router::create_router_with_state;
pub use state::AppState;
