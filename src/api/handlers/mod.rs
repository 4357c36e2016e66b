//! REST endpoint handlers organized by resource.

pub mod action;
pub mod admin;
pub mod game;
pub mod ranking;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(game::routes())
        .merge(ranking::routes())
        .merge(admin::routes())
}
