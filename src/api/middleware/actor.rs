//! Actor resolution from the trusted identity header
//!
//! Authentication happens upstream; the resolved user id arrives in a header
//! and is turned into an `ActorId` request extension for the private cache
//! scope and for handlers that need a caller.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderName},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::api::types::ApiError;
use crate::domain::cache::ActorId;
use crate::domain::DomainError;

/// Name of the header carrying the authenticated user id
#[derive(Debug, Clone)]
pub struct ActorHeader(pub HeaderName);

impl ActorHeader {
    pub fn new(name: &str) -> Result<Self, DomainError> {
        HeaderName::try_from(name.to_ascii_lowercase())
            .map(Self)
            .map_err(|e| {
                DomainError::configuration(format!("Invalid actor header '{}': {}", name, e))
            })
    }
}

impl Default for ActorHeader {
    fn default() -> Self {
        Self(HeaderName::from_static("x-user-id"))
    }
}

/// Inserts the caller's `ActorId` when the identity header holds a valid id.
///
/// A malformed id is dropped, so the request proceeds anonymously.
pub async fn actor_middleware(
    State(header): State<ActorHeader>,
    mut request: Request,
    next: Next,
) -> Response {
    let raw = request
        .headers()
        .get(&header.0)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    if let Some(raw) = raw {
        match ActorId::new(raw) {
            Ok(actor) => {
                request.extensions_mut().insert(actor);
            }
            Err(e) => warn!(header = %header.0, error = %e, "Ignoring invalid actor id"),
        }
    }

    next.run(request).await
}

/// Optional caller identity
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Option<ActorId>);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentActor(parts.extensions.get::<ActorId>().cloned()))
    }
}

/// Extractor that rejects anonymous requests
#[derive(Debug, Clone)]
pub struct RequireActor(pub ActorId);

impl<S> FromRequestParts<S> for RequireActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ActorId>()
            .cloned()
            .map(RequireActor)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
