//! Application state for shared services

use std::sync::Arc;

use crate::domain::cache::InvalidationTable;
use crate::domain::ResourceRepository;
use crate::infrastructure::cache::{CacheInvalidator, CacheStore};

/// Application state shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub resources: Arc<dyn ResourceRepository>,
    pub cache: CacheStore,
    pub invalidator: CacheInvalidator,
    /// Largest response body the response cache stores
    pub max_cached_body_bytes: usize,
    /// Shared secret for the admin cache endpoints; `None` disables them
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        resources: Arc<dyn ResourceRepository>,
        cache: CacheStore,
        table: InvalidationTable,
    ) -> Self {
        let invalidator = CacheInvalidator::new(cache.clone(), table);

        Self {
            resources,
            cache,
            invalidator,
            max_cached_body_bytes: crate::api::middleware::DEFAULT_MAX_BODY_BYTES,
            admin_token: None,
        }
    }

    pub fn with_max_cached_body_bytes(mut self, max_bytes: usize) -> Self {
        self.max_cached_body_bytes = max_bytes;
        self
    }

    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(Arc::from(token.into()));
        self
    }
}
