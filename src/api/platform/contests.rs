//! Contest endpoints

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::Value;

use super::common::{self, ResourceListResponse};
use super::results::{rank_results, LeaderboardEntry};
use crate::api::middleware::{CurrentActor, RequireActor};
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{EntityKind, Resource};

/// GET /api/contests
pub async fn list_contests(
    State(state): State<AppState>,
) -> Result<Json<ResourceListResponse>, ApiError> {
    common::list(&state, EntityKind::Contest).await
}

/// GET /api/contests/{id}
pub async fn get_contest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Resource>, ApiError> {
    common::fetch(&state, EntityKind::Contest, &id).await.map(Json)
}

/// Contest standings: each participant's best result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestLeaderboard {
    pub contest_id: String,
    pub completed_participants: usize,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// GET /api/contests/{id}/leaderboard
pub async fn get_contest_leaderboard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContestLeaderboard>, ApiError> {
    let contest = common::fetch(&state, EntityKind::Contest, &id).await?;
    let results = common::results_referencing(&state, "contestId", &id).await?;

    let mut best: HashMap<&str, &Resource> = HashMap::new();
    for result in &results {
        let (Some(owner), Some(score)) = (result.owner.as_deref(), common::score_of(result)) else {
            continue;
        };

        let replace = match best.get(owner) {
            Some(current) => common::score_of(current).is_none_or(|current| score > current),
            None => true,
        };
        if replace {
            best.insert(owner, result);
        }
    }

    let leaderboard = rank_results(best.into_values().collect(), usize::MAX);

    Ok(Json(ContestLeaderboard {
        contest_id: contest.id,
        completed_participants: leaderboard.len(),
        leaderboard,
    }))
}

/// GET /api/contests/my-contests
pub async fn list_my_contests(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
) -> Result<Json<ResourceListResponse>, ApiError> {
    let items: Vec<Resource> = state
        .resources
        .list(EntityKind::Contest)
        .await?
        .into_iter()
        .filter(|contest| contest.is_owned_by(actor.as_str()))
        .collect();
    let total = items.len();

    Ok(Json(ResourceListResponse { items, total }))
}

/// POST /api/contests
pub async fn create_contest(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(data): Json<Value>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    common::create(&state, EntityKind::Contest, actor, data).await
}

/// PUT /api/contests/{id}
pub async fn update_contest(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<Value>,
) -> Result<Json<Resource>, ApiError> {
    common::update(&state, EntityKind::Contest, &id, data).await
}

/// DELETE /api/contests/{id}
pub async fn delete_contest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    common::remove(&state, EntityKind::Contest, &id).await
}
