//! Platform REST endpoints served through the response cache

pub mod categories;
pub mod common;
pub mod contests;
pub mod quizzes;
pub mod results;

use axum::Router;

use super::middleware::{cached, ResponseCache};
use super::state::AppState;
use crate::domain::cache::CacheScope;

pub const QUIZ_TTL_SECS: u64 = 300;
pub const CATEGORY_TTL_SECS: u64 = 300;
pub const CONTEST_TTL_SECS: u64 = 60;
pub const CONTEST_LEADERBOARD_TTL_SECS: u64 = 30;
pub const STATISTICS_TTL_SECS: u64 = 60;
pub const QUIZ_RESULTS_TTL_SECS: u64 = 120;

/// Create the platform router; cached GET routes share the state's store
pub fn create_platform_router(state: &AppState) -> Router<AppState> {
    let cache = |ttl_secs: u64, scope: CacheScope| {
        ResponseCache::new(state.cache.clone(), ttl_secs, scope)
            .with_max_body_bytes(state.max_cached_body_bytes)
    };

    Router::new()
        // Quizzes
        .route(
            "/api/quiz/quizzes",
            cached(quizzes::list_quizzes, cache(QUIZ_TTL_SECS, CacheScope::Public))
                .post(quizzes::create_quiz),
        )
        .route(
            "/api/quiz/quizzes/{id}",
            cached(quizzes::get_quiz, cache(QUIZ_TTL_SECS, CacheScope::Public))
                .put(quizzes::update_quiz)
                .delete(quizzes::delete_quiz),
        )
        // Categories
        .route(
            "/api/categories",
            cached(
                categories::list_categories,
                cache(CATEGORY_TTL_SECS, CacheScope::Public),
            )
            .post(categories::create_category),
        )
        .route(
            "/api/categories/{id}",
            cached(
                categories::get_category,
                cache(CATEGORY_TTL_SECS, CacheScope::Public),
            )
            .put(categories::update_category)
            .delete(categories::delete_category),
        )
        // Contests
        .route(
            "/api/contests",
            cached(contests::list_contests, cache(CONTEST_TTL_SECS, CacheScope::Public))
                .post(contests::create_contest),
        )
        .route(
            "/api/contests/{id}",
            cached(contests::get_contest, cache(CONTEST_TTL_SECS, CacheScope::Public))
                .put(contests::update_contest)
                .delete(contests::delete_contest),
        )
        .route(
            "/api/contests/{id}/leaderboard",
            cached(
                contests::get_contest_leaderboard,
                cache(CONTEST_LEADERBOARD_TTL_SECS, CacheScope::Public),
            ),
        )
        .route(
            "/api/contests/my-contests",
            cached(
                contests::list_my_contests,
                cache(CONTEST_TTL_SECS, CacheScope::Private),
            ),
        )
        // Results
        .route(
            "/api/result",
            axum::routing::post(results::submit_result),
        )
        .route(
            "/api/result/user/statistics",
            cached(
                results::get_user_statistics,
                cache(STATISTICS_TTL_SECS, CacheScope::Private),
            ),
        )
        .route(
            "/api/result/quiz/{quiz_id}/statistics",
            cached(
                results::get_quiz_statistics,
                cache(QUIZ_RESULTS_TTL_SECS, CacheScope::Public),
            ),
        )
        .route(
            "/api/result/quiz/{quiz_id}",
            cached(
                results::get_my_quiz_results,
                cache(QUIZ_RESULTS_TTL_SECS, CacheScope::Private),
            ),
        )
        .route(
            "/api/result/leaderboard/{quiz_id}",
            cached(
                results::get_quiz_leaderboard,
                cache(QUIZ_RESULTS_TTL_SECS, CacheScope::Public),
            ),
        )
        .route(
            "/api/result/{id}",
            axum::routing::get(results::get_result).delete(results::delete_result),
        )
}
