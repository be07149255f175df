//! Declarative invalidation fan-out: which cached views a mutation makes stale

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::pattern::KeyPattern;
use crate::domain::resource::EntityKind;
use crate::domain::DomainError;

/// Route prefixes of the cached platform views
pub mod prefixes {
    pub const QUIZ: &str = "/api/quiz";
    pub const CATEGORIES: &str = "/api/categories";
    pub const CONTESTS: &str = "/api/contests";
    pub const RESULT: &str = "/api/result";
}

/// Kind of write performed on an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutation {
    Create,
    Update,
    Delete,
}

impl Mutation {
    pub const ALL: [Mutation; 3] = [Mutation::Create, Mutation::Update, Mutation::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mutation::Create => "create",
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mutation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(Mutation::Create),
            "update" => Ok(Mutation::Update),
            "delete" => Ok(Mutation::Delete),
            _ => Err(DomainError::validation(format!(
                "Unknown mutation: {}. Valid mutations: create, update, delete",
                s
            ))),
        }
    }
}

/// Maps (entity, mutation) to the key patterns that must be erased
#[derive(Debug, Clone, Default)]
pub struct InvalidationTable {
    entries: HashMap<(EntityKind, Mutation), Vec<KeyPattern>>,
}

impl InvalidationTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the patterns for one (entity, mutation) pair, replacing
    /// any previous registration
    pub fn with_rule(
        mut self,
        kind: EntityKind,
        mutation: Mutation,
        patterns: Vec<KeyPattern>,
    ) -> Self {
        self.entries.insert((kind, mutation), patterns);
        self
    }

    /// Registers the same patterns for every mutation of an entity
    pub fn with_rule_for_all(self, kind: EntityKind, patterns: Vec<KeyPattern>) -> Self {
        Mutation::ALL.iter().fold(self, |table, mutation| {
            table.with_rule(kind, *mutation, patterns.clone())
        })
    }

    /// Patterns to erase after the given mutation; empty when unregistered
    pub fn patterns_for(&self, kind: EntityKind, mutation: Mutation) -> &[KeyPattern] {
        self.entries
            .get(&(kind, mutation))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The fan-out used by the quiz platform routes.
    ///
    /// Quiz titles are embedded in contest and result views, so renaming or
    /// removing a quiz reaches those namespaces too. A new quiz only changes
    /// quiz listings.
    pub fn platform_default() -> Result<Self, DomainError> {
        let quiz_views = KeyPattern::public_prefix(prefixes::QUIZ)?;
        let category_views = KeyPattern::public_prefix(prefixes::CATEGORIES)?;
        let contest_views = KeyPattern::public_prefix(prefixes::CONTESTS)?;
        let contest_user_views = KeyPattern::private_prefix(prefixes::CONTESTS)?;
        let result_views = KeyPattern::public_prefix(prefixes::RESULT)?;
        let result_user_views = KeyPattern::private_prefix(prefixes::RESULT)?;

        let quiz_embedding_views = vec![
            quiz_views.clone(),
            contest_views.clone(),
            result_views.clone(),
            result_user_views.clone(),
        ];

        Ok(Self::new()
            .with_rule(EntityKind::Quiz, Mutation::Create, vec![quiz_views.clone()])
            .with_rule(EntityKind::Quiz, Mutation::Update, quiz_embedding_views.clone())
            .with_rule(EntityKind::Quiz, Mutation::Delete, quiz_embedding_views)
            .with_rule_for_all(EntityKind::Category, vec![category_views, quiz_views])
            .with_rule_for_all(
                EntityKind::Contest,
                vec![contest_views.clone(), contest_user_views],
            )
            .with_rule_for_all(
                EntityKind::Result,
                vec![result_views, result_user_views, contest_views],
            ))
    }
}
