//! Handler bodies shared by the platform collections

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::cache::{ActorId, Mutation};
use crate::domain::{EntityKind, Resource};

/// Listing response for every collection
#[derive(Debug, Clone, Serialize)]
pub struct ResourceListResponse {
    pub items: Vec<Resource>,
    pub total: usize,
}

pub(super) async fn list(
    state: &AppState,
    kind: EntityKind,
) -> Result<Json<ResourceListResponse>, ApiError> {
    debug!(entity = %kind, "Listing resources");

    let items = state.resources.list(kind).await?;
    let total = items.len();

    Ok(Json(ResourceListResponse { items, total }))
}

pub(super) async fn fetch(
    state: &AppState,
    kind: EntityKind,
    id: &str,
) -> Result<Resource, ApiError> {
    state
        .resources
        .get(kind, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} '{}' not found", kind, id)))
}

/// Results whose payload references `id` under `field` (`quizId`, `contestId`)
pub(super) async fn results_referencing(
    state: &AppState,
    field: &str,
    id: &str,
) -> Result<Vec<Resource>, ApiError> {
    let results = state.resources.list(EntityKind::Result).await?;

    Ok(results
        .into_iter()
        .filter(|result| result.data.get(field).and_then(Value::as_str) == Some(id))
        .collect())
}

/// Score recorded on a result, if any
pub(super) fn score_of(result: &Resource) -> Option<f64> {
    result.data.get("score").and_then(Value::as_f64)
}

/// Stores a new resource, then invalidates what it made stale
pub(super) async fn create(
    state: &AppState,
    kind: EntityKind,
    owner: Option<ActorId>,
    data: Value,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    require_object(&data)?;

    let resource = Resource::new(kind, owner.map(|actor| actor.as_str().to_string()), data);
    let created = state.resources.create(resource).await?;

    let invalidated = state.invalidator.invalidate_for(kind, Mutation::Create).await;
    info!(entity = %kind, id = %created.id, invalidated, "Resource created");

    Ok((StatusCode::CREATED, Json(created)))
}

pub(super) async fn update(
    state: &AppState,
    kind: EntityKind,
    id: &str,
    data: Value,
) -> Result<Json<Resource>, ApiError> {
    require_object(&data)?;

    let updated = state.resources.update(kind, id, data).await?;

    let invalidated = state.invalidator.invalidate_for(kind, Mutation::Update).await;
    info!(entity = %kind, id = %id, invalidated, "Resource updated");

    Ok(Json(updated))
}

pub(super) async fn remove(
    state: &AppState,
    kind: EntityKind,
    id: &str,
) -> Result<StatusCode, ApiError> {
    if !state.resources.delete(kind, id).await? {
        return Err(ApiError::not_found(format!("{} '{}' not found", kind, id)));
    }

    let invalidated = state.invalidator.invalidate_for(kind, Mutation::Delete).await;
    info!(entity = %kind, id = %id, invalidated, "Resource deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn require_object(data: &Value) -> Result<(), ApiError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(ApiError::bad_request("Request body must be a JSON object"))
    }
}
