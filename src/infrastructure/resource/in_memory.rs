//! In-memory resource repository

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{DomainError, EntityKind, Resource, ResourceRepository};

type ResourceMap = HashMap<(EntityKind, String), Resource>;

/// Thread-safe in-memory repository
///
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug, Default)]
pub struct InMemoryResourceRepository {
    resources: RwLock<ResourceMap>,
}

impl InMemoryResourceRepository {
    /// Creates a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with resources
    pub fn with_resources(resources: Vec<Resource>) -> Self {
        let map = resources
            .into_iter()
            .map(|resource| ((resource.kind, resource.id.clone()), resource))
            .collect();

        Self {
            resources: RwLock::new(map),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, ResourceMap>, DomainError> {
        self.resources
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, ResourceMap>, DomainError> {
        self.resources
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl ResourceRepository for InMemoryResourceRepository {
    async fn list(&self, kind: EntityKind) -> Result<Vec<Resource>, DomainError> {
        let resources = self.read()?;

        let mut listed: Vec<Resource> = resources
            .values()
            .filter(|resource| resource.kind == kind)
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(listed)
    }

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Resource>, DomainError> {
        let resources = self.read()?;

        Ok(resources.get(&(kind, id.to_string())).cloned())
    }

    async fn create(&self, resource: Resource) -> Result<Resource, DomainError> {
        let key = (resource.kind, resource.id.clone());
        let mut resources = self.write()?;

        if resources.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "{} '{}' already exists",
                resource.kind, resource.id
            )));
        }

        resources.insert(key, resource.clone());
        Ok(resource)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        data: Value,
    ) -> Result<Resource, DomainError> {
        let mut resources = self.write()?;

        let resource = resources
            .get_mut(&(kind, id.to_string()))
            .ok_or_else(|| DomainError::not_found(format!("{} '{}' not found", kind, id)))?;

        resource.replace_data(data);
        Ok(resource.clone())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<bool, DomainError> {
        let mut resources = self.write()?;

        Ok(resources.remove(&(kind, id.to_string())).is_some())
    }
}
