//! Cache domain - response cache keys, invalidation rules and backend contract

mod backend;
mod invalidation;
mod key;
mod pattern;
mod policy;

pub use backend::CacheBackend;
pub use invalidation::{prefixes, InvalidationTable, Mutation};
pub use key::{ActorId, CacheKey, CacheScope, CACHE_NAMESPACE};
pub use pattern::KeyPattern;
pub use policy::ReconnectPolicy;

#[cfg(test)]
pub use backend::mock::MockCacheBackend;
