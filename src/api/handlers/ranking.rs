//! Leaderboard handlers.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    LeaderboardResponse, PaginationParams, RankingEntryDto, StandingResponse,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RankingError};

/// `GET /rankings`: Paginated leaderboard from the latest snapshot.
///
/// # Errors
///
/// Returns [`RankingError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/rankings",
    tag = "Rankings",
    summary = "List rankings",
    description = "Returns the latest computed ratings ordered by rating descending, ties broken by key.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated leaderboard", body = LeaderboardResponse),
    )
)]
pub async fn list_rankings(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, RankingError> {
    let params = params.clamped();
    let page = state
        .rankings
        .leaderboard(params.page as usize, params.per_page as usize)
        .await?;
    let total = u32::try_from(page.total).unwrap_or(u32::MAX);

    Ok(Json(LeaderboardResponse {
        data: page.entries.into_iter().map(RankingEntryDto::from).collect(),
        pagination: params.meta(total),
        watermark: page.watermark.map(|w| w.get()),
        computed_at: page.computed_at,
    }))
}

/// `GET /rankings/{key}`: Rating, rank and record of one competitor.
///
/// # Errors
///
/// Returns [`RankingError::CompetitorNotFound`] if the competitor has
/// neither a rating nor any games.
#[utoipa::path(
    get,
    path = "/api/v1/rankings/{key}",
    tag = "Rankings",
    summary = "Get a competitor's standing",
    params(
        ("key" = String, Path, description = "Competitor key"),
    ),
    responses(
        (status = 200, description = "Competitor standing", body = StandingResponse),
        (status = 404, description = "Unknown competitor", body = ErrorResponse),
    )
)]
pub async fn get_standing(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, RankingError> {
    let standing = state.rankings.standing(&key).await?;
    Ok(Json(StandingResponse::from(standing)))
}

/// Ranking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rankings", get(list_rankings))
        .route("/rankings/{key}", get(get_standing))
}
