//! Category endpoints
//!
//! Category names feed the quiz listings, so every category mutation also
//! invalidates the cached quiz pages.

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

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ResourceListResponse>, ApiError> {
    common::list(&state, EntityKind::Category).await
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Resource>, ApiError> {
    common::fetch(&state, EntityKind::Category, &id).await.map(Json)
}

pub async fn create_category(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(data): Json<Value>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    if data.get("name").and_then(Value::as_str).is_none() {
        return Err(ApiError::bad_request("Category requires a 'name'"));
    }

    common::create(&state, EntityKind::Category, actor, data).await
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<Value>,
) -> Result<Json<Resource>, ApiError> {
    if data.get("name").and_then(Value::as_str).is_none() {
        return Err(ApiError::bad_request("Category requires a 'name'"));
    }

    common::update(&state, EntityKind::Category, &id, data).await
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    common::remove(&state, EntityKind::Category, &id).await
}
