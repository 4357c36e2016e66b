//! Vote ingestion DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Game;

/// Request body for `POST /games`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordGameRequest {
    /// Key of the competitor that won.
    pub winner: String,
    /// Key of the competitor that lost.
    pub loser: String,
    /// Voting account; anonymous when omitted.
    #[serde(default)]
    pub account_id: Option<i64>,
}

/// Response body for `POST /games` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct GameResponse {
    /// Assigned game id.
    pub id: i64,
    /// Account the vote is attributed to.
    pub account_id: i64,
    /// Winning competitor.
    pub winner: String,
    /// Losing competitor.
    pub loser: String,
    /// When the vote was cast.
    pub played_at: DateTime<Utc>,
}

impl From<Game> for GameResponse {
    fn from(game: Game) -> Self {
        Self {
            id: game.id.get(),
            account_id: game.account_id.get(),
            winner: game.winner_key,
            loser: game.loser_key,
            played_at: game.played_at,
        }
    }
}
