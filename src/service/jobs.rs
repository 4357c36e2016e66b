//! Background execution of lock-guarded jobs.
//!
//! A job runs on its own tokio task and owns its lock for the whole run.
//! Whatever happens inside the job, including a panic, the lock is released
//! before the outcome is surfaced. Successful runs keep the lock for a short
//! grace period first so pollers can observe 100%.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::lock_manager::{LockManager, LockProgress};
use super::recompute::{RecomputeJob, RecomputeOutcome};
use super::seeder::{BattleSeeder, SeedOutcome};
use crate::domain::{Lock, LockName, ProgressReporter};
use crate::error::RankingError;

/// Handle to a job running on its own task.
///
/// Dropping the handle detaches the job; it keeps running to completion.
/// A started job cannot be cancelled.
#[derive(Debug)]
pub struct Detached<T> {
    lock: Lock,
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> Detached<T> {
    /// Spawns `future` as the job holding `lock`.
    pub fn spawn<F>(lock: Lock, future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            lock,
            handle: tokio::spawn(future),
        }
    }

    /// The lock the job was started under.
    #[must_use]
    pub const fn lock(&self) -> &Lock {
        &self.lock
    }

    /// Whether the task has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the job to finish.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Internal`] if the task panicked.
    pub async fn join(self) -> Result<T, RankingError> {
        self.handle
            .await
            .map_err(|e| RankingError::Internal(format!("job task failed: {e}")))
    }
}

/// A unit of lock-guarded work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Fold new games into a fresh rating snapshot.
    RecomputeRatings,
    /// Generate `count` synthetic battles.
    SeedBattles {
        /// Battles to generate.
        count: u64,
    },
}

impl Job {
    /// The lock guarding this job.
    #[must_use]
    pub const fn lock_name(&self) -> LockName {
        match self {
            Self::RecomputeRatings => LockName::RatingUpdate,
            Self::SeedBattles { .. } => LockName::SeedBattles,
        }
    }
}

/// What a finished job produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobReport {
    /// Recomputation result.
    Recomputed(RecomputeOutcome),
    /// Seeding result.
    Seeded(SeedOutcome),
}

/// Result type of a detached job.
pub type JobResult = Result<JobReport, RankingError>;

/// Launches jobs and enforces the lock cleanup contract.
#[derive(Debug, Clone)]
pub struct JobRunner {
    locks: LockManager,
    recompute: Arc<RecomputeJob>,
    seeder: Option<Arc<BattleSeeder>>,
    grace: Duration,
}

impl JobRunner {
    /// Creates a runner without a seeder and without a completion grace.
    #[must_use]
    pub fn new(locks: LockManager, recompute: Arc<RecomputeJob>) -> Self {
        Self {
            locks,
            recompute,
            seeder: None,
            grace: Duration::ZERO,
        }
    }

    /// Enables the seeding job.
    #[must_use]
    pub fn with_seeder(mut self, seeder: Option<Arc<BattleSeeder>>) -> Self {
        self.seeder = seeder;
        self
    }

    /// Sets how long a successful job keeps its lock.
    #[must_use]
    pub const fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// The lock manager jobs run under.
    #[must_use]
    pub const fn locks(&self) -> &LockManager {
        &self.locks
    }

    /// Whether seeding is available.
    #[must_use]
    pub const fn can_seed(&self) -> bool {
        self.seeder.is_some()
    }

    /// Spawns `job` under the already-acquired `lock`.
    pub fn launch(&self, lock: Lock, job: Job) -> Detached<JobResult> {
        let runner = self.clone();
        let held = lock.clone();
        Detached::spawn(lock, async move { runner.run_locked(held, job).await })
    }

    /// Acquires the job's lock and runs it to completion.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::LockContended`] if the lock is held, or the
    /// job's own error.
    pub async fn run_exclusive(&self, job: Job) -> JobResult {
        let name = job.lock_name();
        let Some(lock) = self.locks.try_acquire(name).await? else {
            return Err(RankingError::LockContended(name));
        };
        self.launch(lock, job).join().await?
    }

    async fn run_locked(&self, lock: Lock, job: Job) -> JobResult {
        let reporter = LockProgress::new(self.locks.clone(), lock.clone());
        let worker = self.clone();
        let job_reporter = reporter.clone();
        let result = match tokio::spawn(async move { worker.execute(job, &job_reporter).await })
            .await
        {
            Ok(result) => result,
            Err(err) => Err(RankingError::Internal(format!("job panicked: {err}"))),
        };

        match &result {
            Ok(_) => {
                if reporter.lock_lost() {
                    tracing::warn!(lock = %lock.name, "job finished after its lock was released");
                } else if !self.grace.is_zero() {
                    tokio::time::sleep(self.grace).await;
                }
            }
            Err(err) => tracing::error!(lock = %lock.name, error = %err, "job failed"),
        }

        if let Err(err) = self.locks.release_own(&lock).await {
            tracing::error!(lock = %lock.name, error = %err, "failed to release lock");
        }
        result
    }

    async fn execute(&self, job: Job, reporter: &dyn ProgressReporter) -> JobResult {
        match job {
            Job::RecomputeRatings => self
                .recompute
                .run(reporter)
                .await
                .map(JobReport::Recomputed),
            Job::SeedBattles { count } => {
                let Some(seeder) = &self.seeder else {
                    return Err(RankingError::Catalog(
                        "no character catalog configured".to_string(),
                    ));
                };
                seeder.seed(count, reporter).await.map(JobReport::Seeded)
            }
        }
    }
}
