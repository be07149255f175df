//! Resource repository trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;

use super::entity::{EntityKind, Resource};
use crate::domain::DomainError;

/// Persistence boundary for platform resources
#[async_trait]
pub trait ResourceRepository: Send + Sync + Debug {
    /// Lists every resource of a kind, oldest first
    async fn list(&self, kind: EntityKind) -> Result<Vec<Resource>, DomainError>;

    /// Gets one resource by id
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Resource>, DomainError>;

    /// Stores a new resource
    async fn create(&self, resource: Resource) -> Result<Resource, DomainError>;

    /// Replaces the payload of an existing resource, erroring if missing
    async fn update(&self, kind: EntityKind, id: &str, data: Value)
        -> Result<Resource, DomainError>;

    /// Deletes a resource, returns true if it existed
    async fn delete(&self, kind: EntityKind, id: &str) -> Result<bool, DomainError>;

    /// Counts resources of a kind owned by the given actor
    async fn count_owned(&self, kind: EntityKind, owner: &str) -> Result<usize, DomainError> {
        Ok(self
            .list(kind)
            .await?
            .iter()
            .filter(|resource| resource.is_owned_by(owner))
            .count())
    }
}
