//! Quiz result endpoints
//!
//! Results belong to the actor who submitted them. A result may reference a
//! quiz (`quizId`) and a contest (`contestId`); the per-quiz aggregates are
//! cached publicly, the caller's own views per actor, and single results are
//! always read fresh.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::common::{self, ResourceListResponse};
use crate::api::middleware::RequireActor;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::cache::ActorId;
use crate::domain::{EntityKind, Resource};

/// Leaderboards list at most this many entries
pub const LEADERBOARD_SIZE: usize = 10;

/// Aggregate over the caller's own results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub attempts: usize,
    pub total_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_score: Option<f64>,
}

impl UserStatistics {
    fn from_results(results: &[Resource]) -> Self {
        let scores: Vec<f64> = results.iter().filter_map(common::score_of).collect();

        Self {
            attempts: results.len(),
            total_score: scores.iter().sum(),
            best_score: scores.iter().copied().reduce(f64::max),
        }
    }
}

/// Aggregate over every attempt at one quiz
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStatistics {
    pub quiz_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub total_attempts: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest_score: Option<f64>,
}

impl QuizStatistics {
    fn from_results(quiz: &Resource, results: &[Resource]) -> Self {
        let scores: Vec<f64> = results.iter().filter_map(common::score_of).collect();
        let average_score =
            (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64);

        Self {
            quiz_id: quiz.id.clone(),
            title: quiz.data.get("title").and_then(Value::as_str).map(str::to_string),
            total_attempts: results.len(),
            average_score,
            highest_score: scores.iter().copied().reduce(f64::max),
            lowest_score: scores.iter().copied().reduce(f64::min),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Highest score first; ties go to the earlier submission
pub(super) fn rank_results(results: Vec<&Resource>, limit: usize) -> Vec<LeaderboardEntry> {
    let mut scored: Vec<(f64, &Resource)> = results
        .into_iter()
        .filter_map(|result| common::score_of(result).map(|score| (score, result)))
        .collect();

    scored.sort_by(|(a_score, a), (b_score, b)| {
        b_score
            .total_cmp(a_score)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });

    scored
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, (score, result))| LeaderboardEntry {
            rank: index + 1,
            user: result.owner.clone(),
            score,
        })
        .collect()
}

/// GET /api/result/quiz/{quiz_id}/statistics
pub async fn get_quiz_statistics(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> Result<Json<QuizStatistics>, ApiError> {
    let quiz = common::fetch(&state, EntityKind::Quiz, &quiz_id).await?;
    let results = common::results_referencing(&state, "quizId", &quiz_id).await?;

    Ok(Json(QuizStatistics::from_results(&quiz, &results)))
}

/// GET /api/result/leaderboard/{quiz_id}
pub async fn get_quiz_leaderboard(
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let results = common::results_referencing(&state, "quizId", &quiz_id).await?;

    Ok(Json(LeaderboardResponse {
        leaderboard: rank_results(results.iter().collect(), LEADERBOARD_SIZE),
    }))
}

/// GET /api/result/quiz/{quiz_id}: the caller's own attempts
pub async fn get_my_quiz_results(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Path(quiz_id): Path<String>,
) -> Result<Json<ResourceListResponse>, ApiError> {
    let items: Vec<Resource> = common::results_referencing(&state, "quizId", &quiz_id)
        .await?
        .into_iter()
        .filter(|result| result.is_owned_by(actor.as_str()))
        .collect();
    let total = items.len();

    Ok(Json(ResourceListResponse { items, total }))
}

/// GET /api/result/user/statistics
pub async fn get_user_statistics(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
) -> Result<Json<UserStatistics>, ApiError> {
    debug!(actor = %actor, "Computing result statistics");

    let owned: Vec<Resource> = state
        .resources
        .list(EntityKind::Result)
        .await?
        .into_iter()
        .filter(|result| result.is_owned_by(actor.as_str()))
        .collect();

    Ok(Json(UserStatistics::from_results(&owned)))
}

/// GET /api/result/{id}
pub async fn get_result(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Path(id): Path<String>,
) -> Result<Json<Resource>, ApiError> {
    owned_result(&state, &actor, &id).await.map(Json)
}

/// POST /api/result
pub async fn submit_result(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Json(data): Json<Value>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    common::create(&state, EntityKind::Result, Some(actor), data).await
}

/// DELETE /api/result/{id}
pub async fn delete_result(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    owned_result(&state, &actor, &id).await?;
    common::remove(&state, EntityKind::Result, &id).await
}

/// Someone else's result is reported as missing
async fn owned_result(state: &AppState, actor: &ActorId, id: &str) -> Result<Resource, ApiError> {
    let result = common::fetch(state, EntityKind::Result, id).await?;

    if !result.is_owned_by(actor.as_str()) {
        return Err(ApiError::not_found(format!("result '{}' not found", id)));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(score: Value) -> Resource {
        Resource::new(EntityKind::Result, Some("u1".to_string()), json!({ "score": score }))
    }

    #[test]
    fn test_statistics_from_results() {
        let stats = UserStatistics::from_results(&[result(json!(3)), result(json!(7.5))]);

        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.total_score, 10.5);
        assert_eq!(stats.best_score, Some(7.5));
    }

    #[test]
    fn test_statistics_ignore_missing_scores() {
        let stats = UserStatistics::from_results(&[result(json!("n/a"))]);

        assert_eq!(stats.attempts, 1);
        assert_eq!(stats.total_score, 0.0);
        assert!(stats.best_score.is_none());
    }

    fn scored(owner: &str, score: f64) -> Resource {
        Resource::new(EntityKind::Result, Some(owner.to_string()), json!({ "score": score }))
    }

    #[test]
    fn test_quiz_statistics() {
        let quiz = Resource::new(EntityKind::Quiz, None, json!({ "title": "Ownership" }));
        let stats = QuizStatistics::from_results(&quiz, &[scored("a", 4.0), scored("b", 8.0)]);

        assert_eq!(stats.title.as_deref(), Some("Ownership"));
        assert_eq!(stats.total_attempts, 2);
        assert_eq!(stats.average_score, Some(6.0));
        assert_eq!(stats.highest_score, Some(8.0));
        assert_eq!(stats.lowest_score, Some(4.0));
    }

    #[test]
    fn test_rank_results_orders_and_limits() {
        let first = scored("a", 5.0);
        let second = scored("b", 9.0);
        let unscored = result(json!(null));
        let mut tied = scored("c", 5.0);
        tied.created_at = first.created_at + chrono::Duration::seconds(1);

        let ranked = rank_results(vec![&first, &second, &unscored, &tied], 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].user.as_deref(), Some("b"));
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].user.as_deref(), Some("a"));
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_statistics_empty() {
        let stats = UserStatistics::from_results(&[]);

        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({ "attempts": 0, "totalScore": 0.0 })
        );
    }
}
