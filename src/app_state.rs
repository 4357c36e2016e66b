//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::{ActionService, RankingService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Lock-guarded job actions.
    pub actions: Arc<ActionService>,
    /// Vote ingestion and ranking queries.
    pub rankings: Arc<RankingService>,
}
