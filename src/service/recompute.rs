//! Incremental rating recomputation.
//!
//! Each run folds only the games added since the last snapshot, seeded
//! from that snapshot's ratings. A snapshot produced by a different
//! algorithm fingerprint is ignored and the whole history is refolded from
//! default ratings.
//!
//! The watermark is the largest game id folded so far. Games inside a window
//! are folded in canonical order (`played_at`, then id). A game backfilled
//! with an old timestamp after a run lands in the next window and is folded
//! after games that are newer in wall-clock terms.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{Cadence, GameId, ProgressReporter, ProgressUpdate, RatingSnapshot, Ratings};
use crate::error::RankingError;
use crate::persistence::{GameStore, SnapshotStore};
use crate::rating::{EloFold, EloParams, fingerprint};

/// Result of one recomputation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecomputeOutcome {
    /// No games exist; nothing was written.
    NoGames,
    /// A new snapshot was appended.
    Updated {
        /// Watermark of the new snapshot.
        watermark: GameId,
        /// Games folded in this run.
        games_folded: u64,
        /// Whether the run started from default ratings.
        full_rebuild: bool,
        /// Competitors in the new snapshot.
        competitors: usize,
    },
}

/// The recompute job with its injected stores.
#[derive(Debug, Clone)]
pub struct RecomputeJob {
    games: Arc<dyn GameStore>,
    snapshots: Arc<dyn SnapshotStore>,
    params: EloParams,
    cadence: Cadence,
}

impl RecomputeJob {
    /// Creates a job using the default ELO parameters.
    #[must_use]
    pub fn new(games: Arc<dyn GameStore>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self {
            games,
            snapshots,
            params: EloParams::default(),
            cadence: Cadence::default(),
        }
    }

    /// Overrides the ELO parameters (and therefore the fingerprint).
    #[must_use]
    pub fn with_params(mut self, params: EloParams) -> Self {
        self.params = params;
        self
    }

    /// Overrides the progress cadence.
    #[must_use]
    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Fingerprint of the algorithm this job runs.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.params)
    }

    /// Runs one recomputation, reporting progress to `reporter`.
    ///
    /// The snapshot is written once at the end; a failure before that
    /// leaves the previous snapshot as the latest.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] if reading games or snapshots,
    /// or appending the new snapshot, fails.
    pub async fn run(&self, reporter: &dyn ProgressReporter) -> Result<RecomputeOutcome, RankingError> {
        let Some(max_id) = self.games.max_id().await? else {
            tracing::info!("no battles found, skipping ranking");
            reporter.report(ProgressUpdate::COMPLETE).await;
            return Ok(RecomputeOutcome::NoGames);
        };

        let current_fingerprint = self.fingerprint();
        let (initial, after) = match self.snapshots.latest().await? {
            Some(snapshot) if snapshot.algorithm_fingerprint == current_fingerprint => {
                (snapshot.ratings, Some(snapshot.watermark))
            }
            Some(snapshot) => {
                tracing::info!(
                    previous = %snapshot.algorithm_fingerprint,
                    current = %current_fingerprint,
                    "ranking algorithm change detected, rebuilding from scratch"
                );
                (Ratings::new(), None)
            }
            None => (Ratings::new(), None),
        };
        let full_rebuild = after.is_none();

        let (window, watermark) = match after {
            Some(previous) if previous >= max_id => (Vec::new(), previous),
            _ => (self.games.games_in_window(after, max_id).await?, max_id),
        };
        tracing::info!(
            from = after.map_or(0, GameId::get),
            to = watermark.get(),
            games = window.len(),
            full_rebuild,
            "updating rankings"
        );

        let total = window.len() as u64;
        let mut state = EloFold::new(self.params, initial);
        if window.is_empty() {
            reporter.report(ProgressUpdate::COMPLETE).await;
        }
        for (index, game) in (0u64..).zip(window.iter()) {
            state.apply(&game.winner_key, &game.loser_key);
            if let Some(update) = self.cadence.update_for(index, total) {
                reporter.report(update).await;
            }
        }
        let ratings = state.finish();
        let competitors = ratings.len();

        let snapshot = RatingSnapshot {
            computed_at: Utc::now(),
            watermark,
            algorithm_fingerprint: current_fingerprint,
            ratings,
        };
        self.snapshots.append(&snapshot).await?;
        tracing::info!(watermark = %watermark, competitors, "rankings updated");

        Ok(RecomputeOutcome::Updated {
            watermark,
            games_folded: total,
            full_rebuild,
            competitors,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use tokio::sync::Mutex;

    use super::*;
    use crate::domain::{AccountId, NewGame};
    use crate::persistence::MemoryStore;

    #[derive(Debug, Default)]
    struct Recorder(Mutex<Vec<ProgressUpdate>>);

    #[async_trait]
    impl ProgressReporter for Recorder {
        async fn report(&self, update: ProgressUpdate) {
            self.0.lock().await.push(update);
        }
    }

    impl Recorder {
        async fn updates(&self) -> Vec<ProgressUpdate> {
            self.0.lock().await.clone()
        }
    }

    fn job(store: &Arc<MemoryStore>) -> RecomputeJob {
        RecomputeJob::new(
            Arc::clone(store) as Arc<dyn GameStore>,
            Arc::clone(store) as Arc<dyn SnapshotStore>,
        )
    }

    async fn play(store: &MemoryStore, winner: &str, loser: &str, at: DateTime<Utc>) {
        let Ok(game) = NewGame::new(AccountId::new(1), winner, loser, at) else {
            panic!("valid game");
        };
        if GameStore::append(store, game).await.is_err() {
            panic!("append failed");
        }
    }

    async fn latest(store: &MemoryStore) -> RatingSnapshot {
        let Ok(Some(snapshot)) = SnapshotStore::latest(store).await else {
            panic!("expected a snapshot");
        };
        snapshot
    }

    #[tokio::test]
    async fn no_games_is_a_reported_noop() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Recorder::default();
        let outcome = job(&store).run(&recorder).await;
        assert!(matches!(outcome, Ok(RecomputeOutcome::NoGames)));
        assert_eq!(recorder.updates().await, vec![ProgressUpdate::COMPLETE]);
        assert_eq!(store.snapshot_count().await, 0);
    }

    #[tokio::test]
    async fn watermark_tracks_max_id_and_rerun_is_stable() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        play(&store, "Rem", "Ram", now).await;
        play(&store, "Emilia", "Rem", now).await;
        play(&store, "Ram", "Emilia", now).await;

        let job = job(&store);
        let Ok(RecomputeOutcome::Updated { watermark, games_folded, full_rebuild, .. }) =
            job.run(&crate::domain::NoProgress).await
        else {
            panic!("first run failed");
        };
        assert_eq!(watermark, GameId::new(3));
        assert_eq!(games_folded, 3);
        assert!(full_rebuild);
        let first = latest(&store).await;

        let recorder = Recorder::default();
        let Ok(RecomputeOutcome::Updated { games_folded, full_rebuild, .. }) =
            job.run(&recorder).await
        else {
            panic!("second run failed");
        };
        assert_eq!(games_folded, 0);
        assert!(!full_rebuild);
        let second = latest(&store).await;
        assert_eq!(second.watermark, first.watermark);
        assert_eq!(second.ratings, first.ratings);
        assert_eq!(recorder.updates().await, vec![ProgressUpdate::COMPLETE]);
    }

    #[tokio::test]
    async fn incremental_run_matches_full_fold() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        play(&store, "A", "B", now).await;
        play(&store, "B", "C", now + Duration::seconds(1)).await;
        let job = job(&store);
        let _ = job.run(&crate::domain::NoProgress).await;

        play(&store, "C", "A", now + Duration::seconds(2)).await;
        let Ok(RecomputeOutcome::Updated { games_folded, .. }) =
            job.run(&crate::domain::NoProgress).await
        else {
            panic!("incremental run failed");
        };
        assert_eq!(games_folded, 1);

        let expected = crate::rating::fold(
            [("A", "B"), ("B", "C"), ("C", "A")],
            Ratings::new(),
            EloParams::default(),
        );
        assert_eq!(latest(&store).await.ratings, expected);
    }

    #[tokio::test]
    async fn fingerprint_change_rebuilds_full_history() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        play(&store, "A", "B", now).await;
        play(&store, "A", "C", now).await;
        let _ = job(&store).run(&crate::domain::NoProgress).await;

        let tuned = EloParams {
            k_factor: 16.0,
            ..EloParams::default()
        };
        let rebuilt = job(&store).with_params(tuned);
        let Ok(RecomputeOutcome::Updated { games_folded, full_rebuild, watermark, .. }) =
            rebuilt.run(&crate::domain::NoProgress).await
        else {
            panic!("rebuild failed");
        };
        assert!(full_rebuild);
        assert_eq!(games_folded, 2);
        assert_eq!(watermark, GameId::new(2));

        let snapshot = latest(&store).await;
        assert_eq!(snapshot.algorithm_fingerprint, rebuilt.fingerprint());
        let expected = crate::rating::fold([("A", "B"), ("A", "C")], Ratings::new(), tuned);
        assert_eq!(snapshot.ratings, expected);
    }

    #[tokio::test]
    async fn window_folds_in_timestamp_order() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        play(&store, "A", "B", now).await;
        // backfilled: inserted later, played earlier
        play(&store, "B", "C", now - Duration::hours(1)).await;
        let _ = job(&store).run(&crate::domain::NoProgress).await;

        let expected = crate::rating::fold(
            [("B", "C"), ("A", "B")],
            Ratings::new(),
            EloParams::default(),
        );
        let snapshot = latest(&store).await;
        assert_eq!(snapshot.ratings, expected);
        assert_eq!(snapshot.watermark, GameId::new(2));
    }

    #[tokio::test]
    async fn progress_follows_cadence() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        for i in 0..5 {
            let winner = format!("c{i}");
            play(&store, &winner, "anchor", now).await;
        }
        let recorder = Recorder::default();
        let _ = job(&store)
            .with_cadence(Cadence::every(2))
            .run(&recorder)
            .await;
        let done: Vec<u64> = recorder.updates().await.iter().map(|u| u.done).collect();
        assert_eq!(done, vec![1, 3, 5]);
    }
}
