//! Domain layer: games, locks, rating snapshots, competitors and progress.
//!
//! These types carry no I/O. Stores in [`crate::persistence`] persist them
//! and the jobs in [`crate::service`] operate on them.

pub mod competitor;
pub mod game;
pub mod lock;
pub mod progress;
pub mod snapshot;

pub use competitor::Competitor;
pub use game::{AccountId, Game, GameId, NewGame, sort_canonical};
pub use lock::{Lock, LockName};
pub use progress::{Cadence, NoProgress, ProgressReporter, ProgressUpdate};
pub use snapshot::{RankedEntry, RatingSnapshot, Ratings};
