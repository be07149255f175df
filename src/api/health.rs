//! Health check endpoints for Kubernetes probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;
use crate::domain::EntityKind;

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Simple health check - returns 200 if the service is running
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check with dependency verification.
///
/// The cache is optional for serving traffic, so a cache outage only
/// degrades readiness; a failing resource store makes the service unready.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();

    let checks = vec![check_resources(&state).await, check_cache(&state).await];
    let overall_status = overall(&checks);

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Liveness check - simple check to verify the service is running
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

fn overall(checks: &[HealthCheck]) -> HealthStatus {
    checks
        .iter()
        .map(|check| check.status)
        .fold(HealthStatus::Healthy, |acc, status| match (acc, status) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        })
}

async fn check_resources(state: &AppState) -> HealthCheck {
    let start = Instant::now();

    match state.resources.list(EntityKind::Category).await {
        Ok(_) => HealthCheck {
            name: "resources".to_string(),
            status: HealthStatus::Healthy,
            message: None,
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
        Err(e) => HealthCheck {
            name: "resources".to_string(),
            status: HealthStatus::Unhealthy,
            message: Some(e.to_string()),
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
    }
}

async fn check_cache(state: &AppState) -> HealthCheck {
    let start = Instant::now();
    let connection = state.cache.state();

    let (status, message) = if !state.cache.is_available() {
        (
            HealthStatus::Degraded,
            Some(format!("cache {}, serving uncached", connection)),
        )
    } else if state.cache.ping().await {
        (HealthStatus::Healthy, None)
    } else {
        (HealthStatus::Degraded, Some("cache ping failed".to_string()))
    };

    HealthCheck {
        name: format!("cache:{}", state.cache.backend_name()),
        status,
        message,
        latency_ms: Some(start.elapsed().as_millis() as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{body::Body, http::Request, routing::get, Router};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::domain::cache::{InvalidationTable, MockCacheBackend};
    use crate::infrastructure::cache::{CacheStore, StoreSettings};
    use crate::infrastructure::resource::InMemoryResourceRepository;

    async fn ready(backend: MockCacheBackend) -> (StatusCode, Value) {
        let store = CacheStore::new(Arc::new(backend), StoreSettings::default());
        store.connect().await;

        let state = AppState::new(
            Arc::new(InMemoryResourceRepository::new()),
            store,
            InvalidationTable::platform_default().unwrap(),
        );
        let app = Router::new()
            .route("/ready", get(ready_check))
            .with_state(state);

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
    }

    #[test]
    fn test_overall_status() {
        let check = |status| HealthCheck {
            name: "x".to_string(),
            status,
            message: None,
            latency_ms: None,
        };

        assert_eq!(overall(&[]), HealthStatus::Healthy);
        assert_eq!(
            overall(&[check(HealthStatus::Healthy), check(HealthStatus::Degraded)]),
            HealthStatus::Degraded
        );
        assert_eq!(
            overall(&[check(HealthStatus::Unhealthy), check(HealthStatus::Degraded)]),
            HealthStatus::Unhealthy
        );
    }

    #[tokio::test]
    async fn test_ready_with_cache_connected() {
        let (status, body) = ready(MockCacheBackend::new()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["checks"][1]["name"], "cache:mock");
    }

    #[tokio::test]
    async fn test_ready_with_cache_down_is_degraded() {
        let (status, body) = ready(MockCacheBackend::new().refusing_connections()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"][1]["status"], "degraded");
        assert_eq!(body["checks"][0]["status"], "healthy");
    }
}
