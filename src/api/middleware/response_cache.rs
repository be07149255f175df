//! Read-through response cache for GET routes
//!
//! A hit replays the stored JSON body without running the handler. On a miss
//! the handler runs and a successful JSON response is written back by a
//! detached task, so a slow or failing cache never delays the caller. When
//! the store is unavailable every request goes straight to the handler.

use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    extract::{OriginalUri, Request, State},
    handler::Handler,
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
};
use serde::de::IgnoredAny;
use tracing::{debug, error, warn};

use crate::api::types::ApiError;
use crate::domain::cache::{ActorId, CacheKey, CacheScope};
use crate::infrastructure::cache::CacheStore;
use crate::infrastructure::observability::{record_cache_lookup, CacheLookupOutcome};

/// Default upper bound on a body worth storing
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// The only content type a hit is replayed with
const REPLAY_CONTENT_TYPE: &str = "application/json";

/// Per-route cache registration: store handle, TTL and scope
#[derive(Debug, Clone)]
pub struct ResponseCache {
    store: CacheStore,
    ttl: Duration,
    scope: CacheScope,
    max_body_bytes: usize,
}

impl ResponseCache {
    /// TTL below one second is raised to one second
    pub fn new(store: CacheStore, ttl_secs: u64, scope: CacheScope) -> Self {
        Self {
            store,
            ttl: Duration::from_secs(ttl_secs.max(1)),
            scope,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Responses shared by every caller
    pub fn public(store: CacheStore, ttl_secs: u64) -> Self {
        Self::new(store, ttl_secs, CacheScope::Public)
    }

    /// Responses keyed per actor; requests without one are never cached
    pub fn private(store: CacheStore, ttl_secs: u64) -> Self {
        Self::new(store, ttl_secs, CacheScope::Private)
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn scope(&self) -> CacheScope {
        self.scope
    }

    fn is_storable(&self, response: &Response) -> bool {
        if response.status() != StatusCode::OK || !is_replayable(response.headers()) {
            return false;
        }

        matches!(
            response.body().size_hint().exact(),
            Some(len) if len as usize <= self.max_body_bytes
        )
    }

    /// Buffers a storable response, schedules the write-back and rebuilds
    /// the response with the identical body
    async fn write_back(&self, key: CacheKey, response: Response) -> Response {
        if !self.is_storable(&response) {
            debug!(
                key = %key,
                status = response.status().as_u16(),
                "Response not cacheable"
            );
            return response;
        }

        let (parts, body) = response.into_parts();

        let bytes = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(key = %key, error = %e, "Failed to read handler response body");
                return ApiError::internal("Failed to read response body").into_response();
            }
        };

        match std::str::from_utf8(&bytes) {
            Ok(text) => {
                let store = self.store.clone();
                let value = text.to_string();
                let ttl = self.ttl;

                tokio::spawn(async move {
                    store.set(key.as_str(), &value, ttl).await;
                });
            }
            Err(_) => warn!(key = %key, "Response body is not UTF-8, not cached"),
        }

        Response::from_parts(parts, Body::from(bytes))
    }
}

/// GET route whose handler sits behind the response cache
pub fn cached<H, T, S>(handler: H, cache: ResponseCache) -> MethodRouter<S>
where
    H: Handler<T, S>,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    get(handler).route_layer(middleware::from_fn_with_state(
        cache,
        response_cache_middleware,
    ))
}

pub async fn response_cache_middleware(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    if !cache.store.is_available() {
        record_cache_lookup(cache.scope, CacheLookupOutcome::Bypass);
        return next.run(request).await;
    }

    let path_and_query = request_path_and_query(&request);
    let actor = request.extensions().get::<ActorId>();

    let Some(key) = CacheKey::for_request(cache.scope, actor, &path_and_query) else {
        error!(
            path = %path_and_query,
            scope = %cache.scope,
            "Private cached route reached without an actor, caching skipped"
        );
        record_cache_lookup(cache.scope, CacheLookupOutcome::Bypass);
        return next.run(request).await;
    };

    if let Some(body) = cache.store.get(key.as_str()).await {
        if serde_json::from_str::<IgnoredAny>(&body).is_ok() {
            debug!(key = %key, scope = %cache.scope, "Serving cached response");
            record_cache_lookup(cache.scope, CacheLookupOutcome::Hit);
            return replay(body);
        }

        warn!(key = %key, "Cached entry is not valid JSON, ignoring");
    }

    record_cache_lookup(cache.scope, CacheLookupOutcome::Miss);

    let response = next.run(request).await;
    cache.write_back(key, response).await
}

/// Path and query as the client sent them, before any router nesting
fn request_path_and_query(request: &Request) -> String {
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| request.uri());

    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// A hit is rebuilt from the stored body alone, so only responses whose
/// headers the replay reproduces exactly are stored
fn is_replayable(headers: &HeaderMap) -> bool {
    let plain_json = headers
        .get(header::CONTENT_TYPE)
        .is_some_and(|value| value == REPLAY_CONTENT_TYPE);

    plain_json
        && headers
            .keys()
            .all(|name| *name == header::CONTENT_TYPE || *name == header::CONTENT_LENGTH)
}

fn replay(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, REPLAY_CONTENT_TYPE)],
        body,
    )
        .into_response()
}
