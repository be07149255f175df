//! Quizzes endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;

use super::common::{self, ResourceListResponse};
use crate::api::middleware::CurrentActor;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{EntityKind, Resource};

/// GET /api/quiz/quizzes
pub async fn list_quizzes(
    State(state): State<AppState>,
) -> Result<Json<ResourceListResponse>, ApiError> {
    common::list(&state, EntityKind::Quiz).await
}

/// GET /api/quiz/quizzes/{id}
pub async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Resource>, ApiError> {
    common::fetch(&state, EntityKind::Quiz, &id).await.map(Json)
}

/// POST /api/quiz/quizzes
pub async fn create_quiz(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(data): Json<Value>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    validate_quiz(&data)?;
    common::create(&state, EntityKind::Quiz, actor, data).await
}

/// PUT /api/quiz/quizzes/{id}
pub async fn update_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<Value>,
) -> Result<Json<Resource>, ApiError> {
    validate_quiz(&data)?;
    common::update(&state, EntityKind::Quiz, &id, data).await
}

/// DELETE /api/quiz/quizzes/{id}
pub async fn delete_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    common::remove(&state, EntityKind::Quiz, &id).await
}

/// A quiz needs at least a non-empty title; questions are free-form
fn validate_quiz(data: &Value) -> Result<(), ApiError> {
    let has_title = data
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|title| !title.trim().is_empty());

    if !has_title {
        return Err(ApiError::bad_request("Quiz requires a non-empty 'title'"));
    }

    Ok(())
}
