//! In-process store backend.
//!
//! Used when persistence is disabled and throughout the tests. Each map sits
//! behind its own [`tokio::sync::RwLock`]; lock acquisition checks and
//! inserts under one write guard, which gives the same insert-if-absent
//! guarantee as the primary key in PostgreSQL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::store::{AccountStore, GameStore, LockStore, SnapshotStore, WinLoss};
use crate::domain::{
    AccountId, Game, GameId, Lock, LockName, NewGame, RatingSnapshot, sort_canonical,
};
use crate::error::RankingError;

/// Memory-backed implementation of every store trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: RwLock<Vec<Game>>,
    snapshots: RwLock<Vec<RatingSnapshot>>,
    locks: RwLock<HashMap<LockName, Lock>>,
    accounts: RwLock<HashMap<String, AccountId>>,
    next_generation: AtomicI64,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots ever appended.
    pub async fn snapshot_count(&self) -> usize {
        self.snapshots.read().await.len()
    }

    /// Number of distinct accounts.
    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Every stored game in insertion order.
    pub async fn all_games(&self) -> Vec<Game> {
        self.games.read().await.clone()
    }
}

fn next_id(games: &[Game]) -> i64 {
    games.last().map_or(1, |g| g.id.get() + 1)
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn append(&self, game: NewGame) -> Result<Game, RankingError> {
        let mut games = self.games.write().await;
        let stored = game.into_game(GameId::new(next_id(&games)));
        games.push(stored.clone());
        Ok(stored)
    }

    async fn append_batch(&self, batch: Vec<NewGame>) -> Result<u64, RankingError> {
        let mut games = self.games.write().await;
        let count = batch.len() as u64;
        for game in batch {
            let id = GameId::new(next_id(&games));
            games.push(game.into_game(id));
        }
        Ok(count)
    }

    async fn count(&self) -> Result<u64, RankingError> {
        Ok(self.games.read().await.len() as u64)
    }

    async fn max_id(&self) -> Result<Option<GameId>, RankingError> {
        Ok(self.games.read().await.last().map(|g| g.id))
    }

    async fn games_in_window(
        &self,
        after: Option<GameId>,
        up_to: GameId,
    ) -> Result<Vec<Game>, RankingError> {
        let games = self.games.read().await;
        let mut window: Vec<Game> = games
            .iter()
            .filter(|g| after.is_none_or(|a| g.id > a) && g.id <= up_to)
            .cloned()
            .collect();
        sort_canonical(&mut window);
        Ok(window)
    }

    async fn win_loss(&self, key: &str) -> Result<WinLoss, RankingError> {
        let games = self.games.read().await;
        Ok(games.iter().fold(WinLoss::default(), |mut acc, g| {
            if g.winner_key == key {
                acc.wins += 1;
            }
            if g.loser_key == key {
                acc.losses += 1;
            }
            acc
        }))
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn latest(&self) -> Result<Option<RatingSnapshot>, RankingError> {
        // appended last wins ties on computed_at
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .iter()
            .enumerate()
            .max_by_key(|(i, s)| (s.computed_at, *i))
            .map(|(_, s)| s.clone()))
    }

    async fn append(&self, snapshot: &RatingSnapshot) -> Result<(), RankingError> {
        self.snapshots.write().await.push(snapshot.clone());
        Ok(())
    }
}

#[async_trait]
impl LockStore for MemoryStore {
    async fn insert_if_absent(
        &self,
        name: LockName,
        acquired_at: DateTime<Utc>,
    ) -> Result<Option<Lock>, RankingError> {
        let mut locks = self.locks.write().await;
        if locks.contains_key(&name) {
            return Ok(None);
        }
        let lock = Lock {
            name,
            acquired_at,
            progress: 0,
            generation: self.next_generation.fetch_add(1, Ordering::SeqCst) + 1,
        };
        locks.insert(name, lock.clone());
        Ok(Some(lock))
    }

    async fn get(&self, name: LockName) -> Result<Option<Lock>, RankingError> {
        Ok(self.locks.read().await.get(&name).cloned())
    }

    async fn set_progress(
        &self,
        name: LockName,
        generation: i64,
        progress: u8,
    ) -> Result<bool, RankingError> {
        let mut locks = self.locks.write().await;
        match locks.get_mut(&name) {
            Some(lock) if lock.generation == generation => {
                lock.progress = progress.min(100);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, name: LockName) -> Result<bool, RankingError> {
        Ok(self.locks.write().await.remove(&name).is_some())
    }

    async fn delete_generation(
        &self,
        name: LockName,
        generation: i64,
    ) -> Result<bool, RankingError> {
        let mut locks = self.locks.write().await;
        if locks.get(&name).is_some_and(|l| l.generation == generation) {
            locks.remove(&name);
            return Ok(true);
        }
        Ok(false)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_or_create(
        &self,
        email: &str,
        _username: &str,
    ) -> Result<AccountId, RankingError> {
        let mut accounts = self.accounts.write().await;
        let next = AccountId::new(accounts.len() as i64 + 1);
        Ok(*accounts.entry(email.to_string()).or_insert(next))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;

    fn new_game(winner: &str, loser: &str, played_at: DateTime<Utc>) -> NewGame {
        let Ok(game) = NewGame::new(AccountId::new(1), winner, loser, played_at) else {
            panic!("valid game");
        };
        game
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let Ok(first) = GameStore::append(&store, new_game("A", "B", now)).await else {
            panic!("append failed");
        };
        let _ = store
            .append_batch(vec![new_game("B", "C", now), new_game("C", "A", now)])
            .await;
        assert_eq!(first.id, GameId::new(1));
        assert!(matches!(store.max_id().await, Ok(Some(id)) if id == GameId::new(3)));
        assert!(matches!(store.count().await, Ok(3)));
    }

    #[tokio::test]
    async fn window_is_bounded_and_canonical() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let _ = GameStore::append(&store, new_game("A", "B", now)).await;
        let _ = GameStore::append(&store, new_game("B", "C", now)).await;
        let _ = GameStore::append(&store, new_game("C", "D", now - Duration::minutes(5))).await;
        let _ = GameStore::append(&store, new_game("D", "E", now)).await;

        let Ok(window) = store
            .games_in_window(Some(GameId::new(1)), GameId::new(3))
            .await
        else {
            panic!("window query failed");
        };
        let ids: Vec<i64> = window.iter().map(|g| g.id.get()).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn watermark_never_skips_concurrent_batches() {
        let store = Arc::new(MemoryStore::new());
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    for _ in 0..25 {
                        let now = Utc::now();
                        let batch = (0..20).map(|_| new_game("A", "B", now)).collect();
                        let _ = store.append_batch(batch).await;
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        let mut previous = None;
        let mut folded = 0usize;
        for _ in 0..50 {
            let Ok(Some(max)) = store.max_id().await else {
                tokio::task::yield_now().await;
                continue;
            };
            let Ok(window) = store.games_in_window(previous, max).await else {
                panic!("window query failed");
            };
            let expected = max.get() - previous.map_or(0, GameId::get);
            assert_eq!(window.len() as i64, expected);
            folded += window.len();
            previous = Some(max);
            tokio::task::yield_now().await;
        }
        for writer in writers {
            let _ = writer.await;
        }
        let Ok(Some(max)) = store.max_id().await else {
            panic!("games were written");
        };
        let Ok(rest) = store.games_in_window(previous, max).await else {
            panic!("window query failed");
        };
        assert_eq!(folded + rest.len(), 2000);
    }

    #[tokio::test]
    async fn concurrent_insert_if_absent_has_one_winner() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .insert_if_absent(LockName::RatingUpdate, Utc::now())
                    .await
            }));
        }
        let mut winners = 0;
        for handle in handles {
            if let Ok(Ok(Some(_))) = handle.await {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn stale_generation_cannot_touch_new_lock() {
        let store = MemoryStore::new();
        let Ok(Some(old)) = store.insert_if_absent(LockName::SeedBattles, Utc::now()).await else {
            panic!("first acquisition");
        };
        let _ = store.delete(LockName::SeedBattles).await;
        let Ok(Some(new)) = store.insert_if_absent(LockName::SeedBattles, Utc::now()).await else {
            panic!("second acquisition");
        };
        assert!(new.generation > old.generation);
        assert!(matches!(
            store.set_progress(LockName::SeedBattles, old.generation, 50).await,
            Ok(false)
        ));
        assert!(matches!(
            store.delete_generation(LockName::SeedBattles, old.generation).await,
            Ok(false)
        ));
        assert!(matches!(store.get(LockName::SeedBattles).await, Ok(Some(l)) if l.progress == 0));
    }

    #[tokio::test]
    async fn find_or_create_is_idempotent() {
        let store = MemoryStore::new();
        let a = store.find_or_create("seed@example.com", "seed").await.ok();
        let b = store.find_or_create("seed@example.com", "seed").await.ok();
        assert_eq!(a, b);
        assert_eq!(store.account_count().await, 1);
    }
}
