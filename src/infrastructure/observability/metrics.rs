//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;
use crate::domain::cache::{CacheScope, Mutation};
use crate::domain::EntityKind;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics").finish_non_exhaustive()
    }
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    let builder = PrometheusBuilder::new();

    match builder.install_recorder() {
        Ok(handle) => {
            register_default_metrics();

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

fn register_default_metrics() {
    gauge!("quizhub_cache_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    gauge!("cache_store_available").set(0.0);
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let status_str = status.to_string();
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status_str),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// How a cacheable request was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookupOutcome {
    Hit,
    Miss,
    /// The store was unavailable and the lookup never ran
    Bypass,
}

impl CacheLookupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheLookupOutcome::Hit => "hit",
            CacheLookupOutcome::Miss => "miss",
            CacheLookupOutcome::Bypass => "bypass",
        }
    }
}

/// Record the outcome of a response cache lookup
pub fn record_cache_lookup(scope: CacheScope, outcome: CacheLookupOutcome) {
    counter!(
        "response_cache_lookups_total",
        "scope" => scope.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record a failed or timed out cache store operation
pub fn record_cache_store_error(operation: &'static str) {
    counter!("cache_store_errors_total", "operation" => operation).increment(1);
}

/// What caused an invalidation. Raw patterns never become labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationTrigger {
    Mutation(EntityKind, Mutation),
    /// Operator supplied pattern (admin API, CLI)
    Adhoc,
}

impl InvalidationTrigger {
    fn labels(&self) -> (&'static str, &'static str) {
        match self {
            InvalidationTrigger::Mutation(kind, mutation) => (kind.as_str(), mutation.as_str()),
            InvalidationTrigger::Adhoc => ("adhoc", "adhoc"),
        }
    }
}

/// Record the number of entries erased for one trigger
pub fn record_cache_invalidation(trigger: InvalidationTrigger, deleted: usize) {
    let (entity, mutation) = trigger.labels();

    counter!(
        "cache_invalidated_keys_total",
        "entity" => entity,
        "mutation" => mutation
    )
    .increment(deleted as u64);
}

pub fn set_cache_store_available(available: bool) {
    gauge!("cache_store_available").set(if available { 1.0 } else { 0.0 });
}

/// Sanitize URL path for metric labels (remove IDs, limit cardinality)
fn sanitize_path(path: &str) -> String {
    let path = path.split('?').next().unwrap_or_default();

    let sanitized = path
        .split('/')
        .map(|segment| {
            let is_numeric = !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit());

            if is_numeric || uuid::Uuid::parse_str(segment).is_ok() {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    // Truncate long paths
    match sanitized.char_indices().nth(50) {
        Some((idx, _)) => sanitized[..idx].to_string(),
        None => sanitized,
    }
}
