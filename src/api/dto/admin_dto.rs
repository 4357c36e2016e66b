//! Operator status DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Lock, LockName};
use crate::service::SnapshotStatus;

/// State of one job lock.
#[derive(Debug, Serialize, ToSchema)]
pub struct LockStateDto {
    /// Lock name.
    pub name: String,
    /// Whether a job currently holds it.
    pub held: bool,
    /// Progress percentage of the holder.
    pub progress: Option<u8>,
    /// When the holder acquired it.
    pub acquired_at: Option<DateTime<Utc>>,
    /// Generation token of the holder.
    pub generation: Option<i64>,
}

impl LockStateDto {
    /// Builds the DTO from a lock name and its current row.
    #[must_use]
    pub fn new(name: LockName, lock: Option<Lock>) -> Self {
        Self {
            name: name.to_string(),
            held: lock.is_some(),
            progress: lock.as_ref().map(|l| l.progress),
            acquired_at: lock.as_ref().map(|l| l.acquired_at),
            generation: lock.map(|l| l.generation),
        }
    }
}

/// Metadata of the latest rating snapshot.
#[derive(Debug, Serialize, ToSchema)]
pub struct SnapshotStatusDto {
    /// When it was computed.
    pub computed_at: DateTime<Utc>,
    /// Newest game it covers.
    pub watermark: i64,
    /// Fingerprint of the algorithm that produced it.
    pub algorithm_fingerprint: String,
    /// Whether the running algorithm matches; `false` means the next
    /// recompute rebuilds from scratch.
    pub fingerprint_current: bool,
    /// Rated competitors.
    pub competitors: usize,
}

impl From<SnapshotStatus> for SnapshotStatusDto {
    fn from(status: SnapshotStatus) -> Self {
        Self {
            computed_at: status.computed_at,
            watermark: status.watermark.get(),
            algorithm_fingerprint: status.algorithm_fingerprint,
            fingerprint_current: status.fingerprint_current,
            competitors: status.competitors,
        }
    }
}

/// Response for `GET /admin/status`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStatusResponse {
    /// Every known lock.
    pub locks: Vec<LockStateDto>,
    /// Latest snapshot, if one exists.
    pub snapshot: Option<SnapshotStatusDto>,
    /// Fingerprint of the running algorithm.
    pub algorithm_fingerprint: String,
    /// Stored games.
    pub games: u64,
}
