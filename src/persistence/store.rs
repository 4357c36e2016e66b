//! Storage contracts consumed by the jobs and read paths.
//!
//! Every store is object-safe and injected as `Arc<dyn ...>`, so the same
//! job code runs against [`super::MemoryStore`] in tests and
//! [`super::PostgresStore`] in production.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AccountId, Game, GameId, Lock, LockName, NewGame, RatingSnapshot};
use crate::error::RankingError;

/// Win and loss totals of one competitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinLoss {
    /// Games won.
    pub wins: u64,
    /// Games lost.
    pub losses: u64,
}

/// Append-only game log.
#[async_trait]
pub trait GameStore: Send + Sync + fmt::Debug {
    /// Appends one game and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn append(&self, game: NewGame) -> Result<Game, RankingError>;

    /// Appends many games in one write, returning how many were stored.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn append_batch(&self, games: Vec<NewGame>) -> Result<u64, RankingError>;

    /// Number of stored games.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn count(&self) -> Result<u64, RankingError>;

    /// Largest assigned id, or `None` when the log is empty.
    ///
    /// The result is a safe high-water mark: every game with a smaller id is
    /// already visible to [`GameStore::games_in_window`], and every game
    /// stored afterwards gets a larger id. Backends with concurrent writers
    /// must wait for in-flight inserts before answering.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn max_id(&self) -> Result<Option<GameId>, RankingError>;

    /// Games with `after < id <= up_to` in canonical order
    /// (`played_at`, then id). `after = None` starts from the beginning.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn games_in_window(
        &self,
        after: Option<GameId>,
        up_to: GameId,
    ) -> Result<Vec<Game>, RankingError>;

    /// Win and loss counts for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn win_loss(&self, key: &str) -> Result<WinLoss, RankingError>;
}

/// Append-only history of rating snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync + fmt::Debug {
    /// Most recently computed snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn latest(&self) -> Result<Option<RatingSnapshot>, RankingError>;

    /// Appends a snapshot in a single write.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn append(&self, snapshot: &RatingSnapshot) -> Result<(), RankingError>;
}

/// Named single-holder lock rows.
#[async_trait]
pub trait LockStore: Send + Sync + fmt::Debug {
    /// Atomically creates the lock row if none exists.
    ///
    /// Returns `None` when the lock is already held. Implementations must
    /// rely on a uniqueness guarantee of the storage, never a separate read.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn insert_if_absent(
        &self,
        name: LockName,
        acquired_at: DateTime<Utc>,
    ) -> Result<Option<Lock>, RankingError>;

    /// Current lock row, if held.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn get(&self, name: LockName) -> Result<Option<Lock>, RankingError>;

    /// Writes progress if the row still carries `generation`.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn set_progress(
        &self,
        name: LockName,
        generation: i64,
        progress: u8,
    ) -> Result<bool, RankingError>;

    /// Deletes the row unconditionally. Returns whether a row existed.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn delete(&self, name: LockName) -> Result<bool, RankingError>;

    /// Deletes the row only if it still carries `generation`.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn delete_generation(&self, name: LockName, generation: i64)
    -> Result<bool, RankingError>;
}

/// Accounts that games are attributed to.
#[async_trait]
pub trait AccountStore: Send + Sync + fmt::Debug {
    /// Returns the account identified by `email`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    async fn find_or_create(&self, email: &str, username: &str)
    -> Result<AccountId, RankingError>;
}

/// Bundle of store handles passed to services.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Game log.
    pub games: Arc<dyn GameStore>,
    /// Snapshot history.
    pub snapshots: Arc<dyn SnapshotStore>,
    /// Lock table.
    pub locks: Arc<dyn LockStore>,
    /// Accounts.
    pub accounts: Arc<dyn AccountStore>,
}

impl Stores {
    /// Builds a bundle where one backend serves every store.
    #[must_use]
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: GameStore + SnapshotStore + LockStore + AccountStore + 'static,
    {
        Self {
            games: Arc::clone(&backend) as Arc<dyn GameStore>,
            snapshots: Arc::clone(&backend) as Arc<dyn SnapshotStore>,
            locks: Arc::clone(&backend) as Arc<dyn LockStore>,
            accounts: backend,
        }
    }
}
