//! Domain layer - cache policy, resources and errors

pub mod cache;
pub mod error;
pub mod resource;

pub use error::DomainError;
pub use resource::{EntityKind, Resource, ResourceRepository};
