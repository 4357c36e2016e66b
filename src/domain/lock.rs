//! Named advisory locks guarding the long-running jobs.
//!
//! The set of lock names is closed: parsing an unrecognised name is a
//! request error ([`RankingError::UnknownLock`]), never a crash.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::RankingError;

/// Known job lock names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LockName {
    /// Guards the incremental rating recomputation.
    RatingUpdate,
    /// Guards the synthetic battle seeder.
    SeedBattles,
}

impl LockName {
    /// Every known lock, in display order.
    pub const ALL: [Self; 2] = [Self::RatingUpdate, Self::SeedBattles];

    /// Returns the wire name used in URLs and the lock table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RatingUpdate => "rating-update",
            Self::SeedBattles => "seed-battles",
        }
    }
}

impl fmt::Display for LockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockName {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| RankingError::UnknownLock(s.to_string()))
    }
}

/// A held lock row.
///
/// `generation` is assigned by the store on acquisition and grows with every
/// acquisition of any lock, so a job can tell its own lock apart from a later
/// one taken out under the same name after a force-release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Lock {
    /// Lock name.
    pub name: LockName,
    /// When the lock was taken out.
    pub acquired_at: DateTime<Utc>,
    /// Progress percentage (0–100) written by the holder.
    pub progress: u8,
    /// Acquisition token.
    pub generation: i64,
}
