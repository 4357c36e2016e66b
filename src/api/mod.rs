//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`. The job action resource
//! and the health check live at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "animeu-ranking",
        description = "ELO rankings for character battles, with lock-guarded background jobs."
    ),
    paths(
        handlers::action::action_handler,
        handlers::game::record_game,
        handlers::ranking::list_rankings,
        handlers::ranking::get_standing,
        handlers::admin::status_handler,
        handlers::system::health_handler,
    ),
    components(schemas(
        dto::RecordGameRequest,
        dto::GameResponse,
        dto::RankingEntryDto,
        dto::LeaderboardResponse,
        dto::StandingResponse,
        dto::PaginationMeta,
        dto::LockStateDto,
        dto::SnapshotStatusDto,
        dto::AdminStatusResponse,
        handlers::system::HealthResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Actions", description = "Background jobs guarded by named locks"),
        (name = "Games", description = "Battle outcome ingestion"),
        (name = "Rankings", description = "Computed ratings"),
        (name = "Admin", description = "Operator status"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::action::routes())
        .merge(handlers::system::routes());
    with_docs(router)
}

#[cfg(feature = "swagger-ui")]
fn with_docs(router: Router<AppState>) -> Router<AppState> {
    router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
}

#[cfg(not(feature = "swagger-ui"))]
fn with_docs(router: Router<AppState>) -> Router<AppState> {
    router.route(
        "/api-docs/openapi.json",
        axum::routing::get(|| async { axum::Json(ApiDoc::openapi()) }),
    )
}
