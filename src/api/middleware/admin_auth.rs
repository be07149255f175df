//! Admin token guard for the cache administration endpoints

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Extractor that requires the configured admin token in `x-admin-token`
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            return Err(ApiError::forbidden("Admin endpoints are disabled"));
        };

        let provided = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::unauthorized(format!(
                    "Admin access required. Provide the admin token via '{}' header",
                    ADMIN_TOKEN_HEADER
                ))
            })?;

        if !tokens_match(provided.as_bytes(), expected.as_bytes()) {
            warn!("Rejected admin request with invalid token");
            return Err(ApiError::forbidden("Invalid admin token"));
        }

        debug!("Admin access granted");
        Ok(RequireAdmin)
    }
}

/// Compares without short-circuiting on the first differing byte
fn tokens_match(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }

    provided
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
