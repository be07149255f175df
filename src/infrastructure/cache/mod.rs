//! Cache infrastructure - backends, the fail-soft store and invalidation hooks

mod factory;
mod in_memory;
mod invalidator;
mod redis;
mod store;

pub use factory::{CacheBackendType, CacheFactory};
pub use in_memory::{InMemoryBackend, InMemoryBackendConfig};
pub use invalidator::CacheInvalidator;
pub use redis::{RedisBackend, RedisBackendConfig};
pub use store::{CacheStore, ConnectionState, StoreSettings};
