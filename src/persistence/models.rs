//! Database row types and their conversion into domain types.

use chrono::{DateTime, Utc};
use sqlx::types::Json;

use crate::domain::{AccountId, Game, GameId, Lock, LockName, RatingSnapshot, Ratings};
use crate::error::RankingError;

/// A row from the `games` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GameRow {
    /// Auto-increment row ID.
    pub id: i64,
    /// Voting account.
    pub account_id: i64,
    /// Winning competitor.
    pub winner_key: String,
    /// Losing competitor.
    pub loser_key: String,
    /// Battle timestamp.
    pub played_at: DateTime<Utc>,
}

impl From<GameRow> for Game {
    fn from(row: GameRow) -> Self {
        Self {
            id: GameId::new(row.id),
            account_id: AccountId::new(row.account_id),
            winner_key: row.winner_key,
            loser_key: row.loser_key,
            played_at: row.played_at,
        }
    }
}

/// A row from the `rating_snapshots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    /// Computation timestamp.
    pub computed_at: DateTime<Utc>,
    /// Newest folded game.
    pub watermark_game_id: i64,
    /// Algorithm fingerprint.
    pub algorithm_fingerprint: String,
    /// Ratings as JSONB.
    pub ratings: Json<Ratings>,
}

impl From<SnapshotRow> for RatingSnapshot {
    fn from(row: SnapshotRow) -> Self {
        Self {
            computed_at: row.computed_at,
            watermark: GameId::new(row.watermark_game_id),
            algorithm_fingerprint: row.algorithm_fingerprint,
            ratings: row.ratings.0,
        }
    }
}

/// A row from the `locks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockRow {
    /// Lock name (primary key).
    pub name: String,
    /// Acquisition timestamp.
    pub acquired_at: DateTime<Utc>,
    /// Progress percentage.
    pub progress: i16,
    /// Acquisition token from `lock_generation_seq`.
    pub generation: i64,
}

impl TryFrom<LockRow> for Lock {
    type Error = RankingError;

    fn try_from(row: LockRow) -> Result<Self, Self::Error> {
        let name: LockName = row
            .name
            .parse()
            .map_err(|_| RankingError::Persistence(format!("unknown lock row: {}", row.name)))?;
        Ok(Self {
            name,
            acquired_at: row.acquired_at,
            progress: u8::try_from(row.progress.clamp(0, 100)).unwrap_or(0),
            generation: row.generation,
        })
    }
}
