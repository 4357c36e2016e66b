//! Advisory lock manager: acquire, poll, release and progress writes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{Lock, LockName, ProgressReporter, ProgressUpdate};
use crate::error::RankingError;
use crate::persistence::LockStore;

/// Thin coordinator over a [`LockStore`].
///
/// All operations are single-row and never wait on a running job.
#[derive(Debug, Clone)]
pub struct LockManager {
    store: Arc<dyn LockStore>,
}

impl LockManager {
    /// Creates a manager over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self { store }
    }

    /// Takes out the lock, or returns `None` if another holder has it.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    pub async fn try_acquire(&self, name: LockName) -> Result<Option<Lock>, RankingError> {
        let lock = self.store.insert_if_absent(name, Utc::now()).await?;
        match &lock {
            Some(l) => tracing::info!(lock = %name, generation = l.generation, "lock acquired"),
            None => tracing::debug!(lock = %name, "lock already held"),
        }
        Ok(lock)
    }

    /// Current state of the lock.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    pub async fn get(&self, name: LockName) -> Result<Option<Lock>, RankingError> {
        self.store.get(name).await
    }

    /// Force-releases the lock regardless of holder. Returns whether a lock
    /// was held.
    ///
    /// A job still running under the released lock keeps running.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    pub async fn release(&self, name: LockName) -> Result<bool, RankingError> {
        let released = self.store.delete(name).await?;
        if released {
            tracing::warn!(lock = %name, "lock force-released");
        }
        Ok(released)
    }

    /// Releases `lock` only if it has not been force-released and re-taken.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    pub async fn release_own(&self, lock: &Lock) -> Result<bool, RankingError> {
        let released = self
            .store
            .delete_generation(lock.name, lock.generation)
            .await?;
        if released {
            tracing::info!(lock = %lock.name, generation = lock.generation, "lock released");
        } else {
            tracing::warn!(
                lock = %lock.name,
                generation = lock.generation,
                "lock was force-released before the job finished"
            );
        }
        Ok(released)
    }

    /// Writes progress for `lock`. Returns `false` once the lock is gone.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] on storage failure.
    pub async fn set_progress(&self, lock: &Lock, progress: u8) -> Result<bool, RankingError> {
        self.store
            .set_progress(lock.name, lock.generation, progress)
            .await
    }
}

/// Reporter that mirrors job progress into the held lock row.
#[derive(Debug, Clone)]
pub struct LockProgress {
    locks: LockManager,
    lock: Lock,
    lost: Arc<AtomicBool>,
}

impl LockProgress {
    /// Creates a reporter for the job holding `lock`.
    #[must_use]
    pub fn new(locks: LockManager, lock: Lock) -> Self {
        Self {
            locks,
            lock,
            lost: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a progress write found the lock gone.
    #[must_use]
    pub fn lock_lost(&self) -> bool {
        self.lost.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ProgressReporter for LockProgress {
    async fn report(&self, update: ProgressUpdate) {
        let progress = update.percent();
        tracing::info!(
            lock = %self.lock.name,
            done = update.done,
            total = update.total,
            progress,
            "updating lock progress"
        );
        match self.locks.set_progress(&self.lock, progress).await {
            Ok(true) => {}
            Ok(false) => {
                if !self.lost.swap(true, Ordering::Relaxed) {
                    tracing::warn!(lock = %self.lock.name, "progress write found lock released");
                }
            }
            Err(err) => tracing::warn!(lock = %self.lock.name, error = %err, "progress write failed"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn manager() -> LockManager {
        LockManager::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn concurrent_acquire_has_exactly_one_winner() {
        let locks = manager();
        let (a, b) = tokio::join!(
            locks.try_acquire(LockName::RatingUpdate),
            locks.try_acquire(LockName::RatingUpdate)
        );
        let (Ok(a), Ok(b)) = (a, b) else {
            panic!("store failure");
        };
        assert!(a.is_some() ^ b.is_some());

        assert!(matches!(locks.release(LockName::RatingUpdate).await, Ok(true)));
        assert!(matches!(
            locks.try_acquire(LockName::RatingUpdate).await,
            Ok(Some(_))
        ));
    }

    #[tokio::test]
    async fn locks_are_independent() {
        let locks = manager();
        let rating = locks.try_acquire(LockName::RatingUpdate).await;
        let seed = locks.try_acquire(LockName::SeedBattles).await;
        assert!(matches!(rating, Ok(Some(_))));
        assert!(matches!(seed, Ok(Some(_))));
    }

    #[tokio::test]
    async fn progress_reporter_writes_percent() {
        let locks = manager();
        let Ok(Some(lock)) = locks.try_acquire(LockName::SeedBattles).await else {
            panic!("acquire failed");
        };
        let reporter = LockProgress::new(locks.clone(), lock);
        reporter.report(ProgressUpdate::new(1, 4)).await;
        let Ok(Some(current)) = locks.get(LockName::SeedBattles).await else {
            panic!("lock vanished");
        };
        assert_eq!(current.progress, 25);
        assert!(!reporter.lock_lost());
    }

    #[tokio::test]
    async fn reporter_notices_force_release() {
        let locks = manager();
        let Ok(Some(lock)) = locks.try_acquire(LockName::RatingUpdate).await else {
            panic!("acquire failed");
        };
        let reporter = LockProgress::new(locks.clone(), lock.clone());
        let _ = locks.release(LockName::RatingUpdate).await;
        let _ = locks.try_acquire(LockName::RatingUpdate).await;

        reporter.report(ProgressUpdate::new(3, 4)).await;
        assert!(reporter.lock_lost());
        // the newer holder's lock survives the stale job's cleanup
        assert!(matches!(locks.release_own(&lock).await, Ok(false)));
        assert!(matches!(
            locks.get(LockName::RatingUpdate).await,
            Ok(Some(l)) if l.progress == 0
        ));
    }
}
