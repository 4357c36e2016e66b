//! `/action/{lock_name}`: start, poll and force-release background jobs.

use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Path, Query, State};
use axum::http::Method;
use axum::routing::any;
use axum::Router;

use crate::api::dto::ActionParams;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RankingError};
use crate::service::{ActionMethod, ActionOutcome};

/// `GET|POST|DELETE /action/{lock_name}`
///
/// Success bodies are bare integer percentages, not JSON.
///
/// # Errors
///
/// Returns [`RankingError`] for unknown locks, unsupported methods, bad
/// parameters and lock contention.
#[utoipa::path(
    method(get, post, delete),
    path = "/action/{lock_name}",
    tag = "Actions",
    summary = "Start, poll or release a background job",
    description = "POST takes out the named lock and starts its job. GET returns the holder's progress percentage. DELETE force-releases the lock without stopping the job.",
    params(
        ("lock_name" = String, Path, description = "`rating-update` or `seed-battles`"),
        ActionParams,
    ),
    responses(
        (status = 200, description = "Progress percentage (GET) or lock released (DELETE)", body = String),
        (status = 201, description = "Job started, body is the initial progress", body = String),
        (status = 204, description = "No job is running"),
        (status = 304, description = "Lock was not held"),
        (status = 400, description = "Unknown lock, method or parameter", body = ErrorResponse),
        (status = 503, description = "Lock already held", body = ErrorResponse),
    )
)]
pub async fn action_handler(
    State(state): State<AppState>,
    method: Method,
    Path(lock_name): Path<String>,
    query: Result<Query<ActionParams>, QueryRejection>,
    form: Result<Form<ActionParams>, FormRejection>,
) -> Result<ActionOutcome, RankingError> {
    let Query(query) = query.map_err(|e| RankingError::InvalidRequest(e.body_text()))?;
    let body = match form {
        Ok(Form(params)) => params,
        Err(FormRejection::InvalidFormContentType(_)) => ActionParams::default(),
        Err(err) => return Err(RankingError::InvalidRequest(err.body_text())),
    };
    state
        .actions
        .handle(
            &lock_name,
            ActionMethod::from(&method),
            body.number.or(query.number),
        )
        .await
}

/// Action routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/action/{lock_name}", any(action_handler))
}
