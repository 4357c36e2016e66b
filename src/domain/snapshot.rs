//! Persisted rating snapshots.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GameId;

/// Competitor key → rating.
///
/// A `BTreeMap` keeps serialization stable across runs.
pub type Ratings = BTreeMap<String, f64>;

/// One computed ranking.
///
/// Snapshots are appended, never updated; the most recent one wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    /// When the snapshot was computed.
    pub computed_at: DateTime<Utc>,
    /// Newest game folded into `ratings`.
    pub watermark: GameId,
    /// Fingerprint of the algorithm that produced `ratings`.
    pub algorithm_fingerprint: String,
    /// Ratings for every competitor seen so far.
    pub ratings: Ratings,
}

/// A ranked leaderboard row.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    /// 1-based rank.
    pub rank: usize,
    /// Competitor key.
    pub key: String,
    /// Rating value.
    pub rating: f64,
}

impl RatingSnapshot {
    /// Returns every competitor ordered by rating descending, ties by key.
    #[must_use]
    pub fn leaderboard(&self) -> Vec<RankedEntry> {
        let mut rows: Vec<(&String, f64)> = self.ratings.iter().map(|(k, v)| (k, *v)).collect();
        rows.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        rows.into_iter()
            .enumerate()
            .map(|(i, (key, rating))| RankedEntry {
                rank: i + 1,
                key: key.clone(),
                rating,
            })
            .collect()
    }

    /// Rating and rank of a single competitor, if it has been rated.
    #[must_use]
    pub fn standing(&self, key: &str) -> Option<RankedEntry> {
        self.ratings.get(key)?;
        self.leaderboard().into_iter().find(|entry| entry.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> RatingSnapshot {
        let mut ratings = Ratings::new();
        ratings.insert("Asuna".to_string(), 1010.0);
        ratings.insert("Kurisu".to_string(), 1040.0);
        ratings.insert("Holo".to_string(), 1010.0);
        RatingSnapshot {
            computed_at: Utc::now(),
            watermark: GameId::new(3),
            algorithm_fingerprint: "abc".to_string(),
            ratings,
        }
    }

    #[test]
    fn leaderboard_orders_by_rating_then_key() {
        let keys: Vec<String> = snapshot().leaderboard().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["Kurisu", "Asuna", "Holo"]);
    }

    #[test]
    fn standing_reports_rank() {
        let snap = snapshot();
        let holo = snap.standing("Holo");
        assert_eq!(holo.map(|e| e.rank), Some(3));
        assert!(snap.standing("Nobody").is_none());
    }
}
