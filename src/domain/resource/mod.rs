//! Resource domain - quizzes, categories, contests and results as stored documents

mod entity;
mod repository;

pub use entity::{EntityKind, Resource};
pub use repository::ResourceRepository;
