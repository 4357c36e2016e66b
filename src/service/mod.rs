//! Service layer: the lock manager, the two lock-guarded jobs, the runner
//! that executes them in the background, and the read paths.
//!
//! [`ActionService`] is the entry point for `/action/{lock_name}` requests;
//! [`RankingService`] serves votes and leaderboard queries.

pub mod action;
pub mod jobs;
pub mod lock_manager;
pub mod ranking;
pub mod recompute;
pub mod seeder;

pub use action::{ActionMethod, ActionOutcome, ActionService};
pub use jobs::{Detached, Job, JobReport, JobResult, JobRunner};
pub use lock_manager::{LockManager, LockProgress};
pub use ranking::{LeaderboardPage, RankingService, SnapshotStatus, Standing};
pub use recompute::{RecomputeJob, RecomputeOutcome};
pub use seeder::{BattleSeeder, FeatureScale, SeedOutcome};
