//! Platform resources served through the cached routes

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::DomainError;

/// Entity types exposed by the platform API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Quiz,
    Category,
    Contest,
    Result,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Quiz,
        EntityKind::Category,
        EntityKind::Contest,
        EntityKind::Result,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Quiz => "quiz",
            EntityKind::Category => "category",
            EntityKind::Contest => "contest",
            EntityKind::Result => "result",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quiz" | "quizzes" => Ok(EntityKind::Quiz),
            "category" | "categories" => Ok(EntityKind::Category),
            "contest" | "contests" => Ok(EntityKind::Contest),
            "result" | "results" => Ok(EntityKind::Result),
            _ => Err(DomainError::validation(format!(
                "Unknown entity: {}. Valid entities: quiz, category, contest, result",
                s
            ))),
        }
    }
}

/// A stored platform document.
///
/// The payload is opaque JSON; validation of quiz, contest and result
/// content belongs to the handlers that own those rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub kind: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Creates a new resource with a generated id
    pub fn new(kind: EntityKind, owner: Option<String>, data: Value) -> Self {
        let now = Utc::now();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            owner,
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the payload and bumps the update timestamp
    pub fn replace_data(&mut self, data: Value) {
        self.data = data;
        self.updated_at = Utc::now();
    }

    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner.as_deref() == Some(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_resource() {
        let resource = Resource::new(EntityKind::Quiz, None, json!({"title": "Rust basics"}));

        assert_eq!(resource.kind, EntityKind::Quiz);
        assert!(!resource.id.is_empty());
        assert_eq!(resource.created_at, resource.updated_at);
    }

    #[test]
    fn test_replace_data_bumps_timestamp() {
        let mut resource = Resource::new(EntityKind::Contest, None, json!({"name": "Weekly"}));
        let created = resource.created_at;

        resource.replace_data(json!({"name": "Monthly"}));

        assert_eq!(resource.data["name"], "Monthly");
        assert!(resource.updated_at >= created);
    }

    #[test]
    fn test_ownership() {
        let resource = Resource::new(EntityKind::Result, Some("u1".to_string()), json!({}));

        assert!(resource.is_owned_by("u1"));
        assert!(!resource.is_owned_by("u2"));
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let resource = Resource::new(EntityKind::Category, None, json!({"name": "Science"}));
        let json = serde_json::to_string(&resource).unwrap();

        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"kind\":\"category\""));
        assert!(!json.contains("owner"));
    }
}
