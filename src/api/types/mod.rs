//! Shared API request and response types

pub mod error;
pub mod json;

pub use error::{ApiError, ApiErrorBody};
pub use json::Json;
