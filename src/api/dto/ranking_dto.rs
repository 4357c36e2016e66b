//! Leaderboard and per-competitor DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::RankedEntry;
use crate::service::Standing;

/// One leaderboard row.
#[derive(Debug, Serialize, ToSchema)]
pub struct RankingEntryDto {
    /// 1-based rank.
    pub rank: usize,
    /// Competitor key.
    pub key: String,
    /// Current rating.
    pub rating: f64,
}

impl From<RankedEntry> for RankingEntryDto {
    fn from(entry: RankedEntry) -> Self {
        Self {
            rank: entry.rank,
            key: entry.key,
            rating: entry.rating,
        }
    }
}

/// Paginated response for `GET /rankings`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Rows on this page.
    pub data: Vec<RankingEntryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
    /// Newest game reflected in the ratings.
    pub watermark: Option<i64>,
    /// When the ratings were computed.
    pub computed_at: Option<DateTime<Utc>>,
}

/// Response for `GET /rankings/{key}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StandingResponse {
    /// Competitor key.
    pub key: String,
    /// Rating, or `null` before the competitor's first recompute.
    pub rating: Option<f64>,
    /// 1-based rank, when rated.
    pub rank: Option<usize>,
    /// Games won.
    pub wins: u64,
    /// Games lost.
    pub losses: u64,
}

impl From<Standing> for StandingResponse {
    fn from(standing: Standing) -> Self {
        Self {
            key: standing.key,
            rating: standing.rating,
            rank: standing.rank,
            wins: standing.wins,
            losses: standing.losses,
        }
    }
}
