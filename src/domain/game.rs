//! Battle records: identifiers, stored games and validated new games.
//!
//! Games are append-only. The insert-assigned [`GameId`] is the watermark
//! key, while folding into ratings follows the *canonical order*:
//! `played_at` ascending with the id as tie-breaker (see
//! [`Game::canonical_cmp`]).

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::RankingError;

/// Insert-assigned, monotonically increasing game identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct GameId(i64);

impl GameId {
    /// Wraps a raw row id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw row id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for GameId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Identifier of the account a game is attributed to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
    /// Wraps a raw account id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw account id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recorded pairwise outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Game {
    /// Insert-assigned identifier.
    pub id: GameId,
    /// Account that cast the vote.
    pub account_id: AccountId,
    /// Competitor that won.
    pub winner_key: String,
    /// Competitor that lost.
    pub loser_key: String,
    /// Wall-clock time of the battle.
    pub played_at: DateTime<Utc>,
}

impl Game {
    /// Compares two games in canonical fold order: `played_at`, then `id`.
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.played_at
            .cmp(&other.played_at)
            .then(self.id.cmp(&other.id))
    }
}

/// Sorts games into canonical fold order.
pub fn sort_canonical(games: &mut [Game]) {
    games.sort_by(Game::canonical_cmp);
}

/// A validated game that has not been stored yet.
///
/// Construction rejects blank keys and self-play, so every stored game has
/// two distinct, non-empty competitors.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGame {
    account_id: AccountId,
    winner_key: String,
    loser_key: String,
    played_at: DateTime<Utc>,
}

impl NewGame {
    /// Validates and builds a new game.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::InvalidRequest`] for blank keys and
    /// [`RankingError::SelfPlay`] when winner and loser are the same.
    pub fn new(
        account_id: AccountId,
        winner_key: impl Into<String>,
        loser_key: impl Into<String>,
        played_at: DateTime<Utc>,
    ) -> Result<Self, RankingError> {
        let winner_key = winner_key.into();
        let loser_key = loser_key.into();
        if winner_key.trim().is_empty() || loser_key.trim().is_empty() {
            return Err(RankingError::InvalidRequest(
                "winner and loser must be non-empty".to_string(),
            ));
        }
        if winner_key == loser_key {
            return Err(RankingError::SelfPlay(winner_key));
        }
        Ok(Self {
            account_id,
            winner_key,
            loser_key,
            played_at,
        })
    }

    /// Account the game is attributed to.
    #[must_use]
    pub const fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Winning competitor key.
    #[must_use]
    pub fn winner_key(&self) -> &str {
        &self.winner_key
    }

    /// Losing competitor key.
    #[must_use]
    pub fn loser_key(&self) -> &str {
        &self.loser_key
    }

    /// Time the battle was played.
    #[must_use]
    pub const fn played_at(&self) -> DateTime<Utc> {
        self.played_at
    }

    /// Attaches a stored id, producing the persisted form.
    #[must_use]
    pub fn into_game(self, id: GameId) -> Game {
        Game {
            id,
            account_id: self.account_id,
            winner_key: self.winner_key,
            loser_key: self.loser_key,
            played_at: self.played_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn game(id: i64, played_at: DateTime<Utc>) -> Game {
        Game {
            id: GameId::new(id),
            account_id: AccountId::new(1),
            winner_key: "Rem".to_string(),
            loser_key: "Ram".to_string(),
            played_at,
        }
    }

    #[test]
    fn self_play_is_rejected() {
        let result = NewGame::new(AccountId::new(1), "Rem", "Rem", Utc::now());
        let Err(RankingError::SelfPlay(key)) = result else {
            panic!("expected self-play rejection");
        };
        assert_eq!(key, "Rem");
    }

    #[test]
    fn blank_keys_are_rejected() {
        let result = NewGame::new(AccountId::new(1), "  ", "Ram", Utc::now());
        assert!(matches!(result, Err(RankingError::InvalidRequest(_))));
    }

    #[test]
    fn canonical_order_is_time_then_id() {
        let now = Utc::now();
        let backfilled = game(3, now - Duration::hours(1));
        let first = game(1, now);
        let second = game(2, now);
        let mut games = vec![second.clone(), first.clone(), backfilled.clone()];
        sort_canonical(&mut games);
        assert_eq!(games, vec![backfilled, first, second]);
    }

    #[test]
    fn game_id_serializes_transparently() {
        let json = serde_json::to_string(&GameId::new(42)).unwrap_or_default();
        assert_eq!(json, "42");
    }
}
