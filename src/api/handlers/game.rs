//! Vote ingestion handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{GameResponse, RecordGameRequest};
use crate::app_state::AppState;
use crate::domain::AccountId;
use crate::error::{ErrorResponse, RankingError};

/// `POST /games`: Record one battle outcome.
///
/// # Errors
///
/// Returns [`RankingError`] for blank or identical competitors, an unknown
/// account, or a storage failure.
#[utoipa::path(
    post,
    path = "/api/v1/games",
    tag = "Games",
    summary = "Record a battle",
    description = "Appends one game to the log. Ratings change on the next `rating-update` run.",
    request_body = RecordGameRequest,
    responses(
        (status = 201, description = "Game recorded", body = GameResponse),
        (status = 400, description = "Invalid competitors or account", body = ErrorResponse),
    )
)]
pub async fn record_game(
    State(state): State<AppState>,
    Json(req): Json<RecordGameRequest>,
) -> Result<impl IntoResponse, RankingError> {
    let game = state
        .rankings
        .record_game(&req.winner, &req.loser, req.account_id.map(AccountId::new))
        .await?;
    Ok((StatusCode::CREATED, Json(GameResponse::from(game))))
}

/// Game routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/games", post(record_game))
}
