//! Read paths over the latest snapshot, plus vote ingestion.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{AccountId, Game, GameId, NewGame, RankedEntry, RatingSnapshot};
use crate::error::RankingError;
use crate::persistence::{AccountStore, GameStore, SnapshotStore};
use crate::rating::{EloParams, fingerprint};

const ANONYMOUS_EMAIL: &str = "anonymous@animeu.local";
const ANONYMOUS_USERNAME: &str = "anonymous";

/// One page of the leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardPage {
    /// Rows on this page.
    pub entries: Vec<RankedEntry>,
    /// Rated competitors overall.
    pub total: usize,
    /// Watermark of the snapshot the page was read from.
    pub watermark: Option<GameId>,
    /// When that snapshot was computed.
    pub computed_at: Option<DateTime<Utc>>,
}

/// A competitor's rating alongside its raw record.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    /// Competitor key.
    pub key: String,
    /// Rating in the latest snapshot; `None` until a recompute sees it.
    pub rating: Option<f64>,
    /// 1-based rank in the latest snapshot.
    pub rank: Option<usize>,
    /// Games won.
    pub wins: u64,
    /// Games lost.
    pub losses: u64,
}

/// Metadata of the latest snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStatus {
    /// When it was computed.
    pub computed_at: DateTime<Utc>,
    /// Newest game it covers.
    pub watermark: GameId,
    /// Algorithm that produced it.
    pub algorithm_fingerprint: String,
    /// Whether that algorithm is the one running now.
    pub fingerprint_current: bool,
    /// Rated competitors.
    pub competitors: usize,
}

/// Vote ingestion and ranking queries.
#[derive(Debug, Clone)]
pub struct RankingService {
    games: Arc<dyn GameStore>,
    snapshots: Arc<dyn SnapshotStore>,
    accounts: Arc<dyn AccountStore>,
    params: EloParams,
}

impl RankingService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        games: Arc<dyn GameStore>,
        snapshots: Arc<dyn SnapshotStore>,
        accounts: Arc<dyn AccountStore>,
        params: EloParams,
    ) -> Self {
        Self {
            games,
            snapshots,
            accounts,
            params,
        }
    }

    /// Records one vote. Votes without an account go to a shared
    /// anonymous account.
    ///
    /// # Errors
    ///
    /// - [`RankingError::InvalidRequest`] for blank keys or an unknown account.
    /// - [`RankingError::SelfPlay`] if winner and loser are the same.
    /// - [`RankingError::Persistence`] on storage failure.
    pub async fn record_game(
        &self,
        winner: &str,
        loser: &str,
        account_id: Option<AccountId>,
    ) -> Result<Game, RankingError> {
        let account_id = match account_id {
            Some(id) => id,
            None => {
                self.accounts
                    .find_or_create(ANONYMOUS_EMAIL, ANONYMOUS_USERNAME)
                    .await?
            }
        };
        let game = NewGame::new(account_id, winner.trim(), loser.trim(), Utc::now())?;
        let stored = self.games.append(game).await?;
        tracing::debug!(
            game = %stored.id,
            winner = %stored.winner_key,
            loser = %stored.loser_key,
            "game recorded"
        );
        Ok(stored)
    }

    /// One page of the latest leaderboard. `page` is 1-based.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    pub async fn leaderboard(
        &self,
        page: usize,
        per_page: usize,
    ) -> Result<LeaderboardPage, RankingError> {
        let Some(snapshot) = self.snapshots.latest().await? else {
            return Ok(LeaderboardPage {
                entries: Vec::new(),
                total: 0,
                watermark: None,
                computed_at: None,
            });
        };
        let rows = snapshot.leaderboard();
        let total = rows.len();
        let start = page.saturating_sub(1).saturating_mul(per_page);
        let entries = rows.into_iter().skip(start).take(per_page).collect();
        Ok(LeaderboardPage {
            entries,
            total,
            watermark: Some(snapshot.watermark),
            computed_at: Some(snapshot.computed_at),
        })
    }

    /// Rating, rank and record of `key`.
    ///
    /// # Errors
    ///
    /// - [`RankingError::CompetitorNotFound`] if `key` is unrated and has
    ///   never played.
    /// - [`RankingError::Persistence`] on storage failure.
    pub async fn standing(&self, key: &str) -> Result<Standing, RankingError> {
        let ranked = self
            .snapshots
            .latest()
            .await?
            .and_then(|snapshot| snapshot.standing(key));
        let record = self.games.win_loss(key).await?;
        if ranked.is_none() && record.wins == 0 && record.losses == 0 {
            return Err(RankingError::CompetitorNotFound(key.to_string()));
        }
        Ok(Standing {
            key: key.to_string(),
            rating: ranked.as_ref().map(|r| r.rating),
            rank: ranked.map(|r| r.rank),
            wins: record.wins,
            losses: record.losses,
        })
    }

    /// Metadata of the latest snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    pub async fn snapshot_status(&self) -> Result<Option<SnapshotStatus>, RankingError> {
        let current = self.algorithm_fingerprint();
        Ok(self
            .snapshots
            .latest()
            .await?
            .map(|snapshot: RatingSnapshot| SnapshotStatus {
                computed_at: snapshot.computed_at,
                watermark: snapshot.watermark,
                fingerprint_current: snapshot.algorithm_fingerprint == current,
                algorithm_fingerprint: snapshot.algorithm_fingerprint,
                competitors: snapshot.ratings.len(),
            }))
    }

    /// Fingerprint of the running algorithm.
    #[must_use]
    pub fn algorithm_fingerprint(&self) -> String {
        fingerprint(&self.params)
    }

    /// Number of stored games.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    pub async fn game_count(&self) -> Result<u64, RankingError> {
        self.games.count().await
    }
}
