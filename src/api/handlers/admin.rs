//! Operator status endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{AdminStatusResponse, LockStateDto, SnapshotStatusDto};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RankingError};

/// `GET /admin/status`: Lock states and latest snapshot metadata.
///
/// # Errors
///
/// Returns [`RankingError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/admin/status",
    tag = "Admin",
    summary = "Job and snapshot status",
    description = "Shows which job locks are held and at what progress, and whether the latest snapshot was produced by the running algorithm.",
    responses(
        (status = 200, description = "Current status", body = AdminStatusResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, RankingError> {
    let locks = state
        .actions
        .lock_states()
        .await?
        .into_iter()
        .map(|(name, lock)| LockStateDto::new(name, lock))
        .collect();
    let snapshot = state
        .rankings
        .snapshot_status()
        .await?
        .map(SnapshotStatusDto::from);

    Ok(Json(AdminStatusResponse {
        locks,
        snapshot,
        algorithm_fingerprint: state.rankings.algorithm_fingerprint(),
        games: state.rankings.game_count().await?,
    }))
}

/// Admin routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/status", get(status_handler))
}
