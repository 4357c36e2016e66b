//! Sequential ELO fold.
//!
//! The source text of this file is part of the algorithm fingerprint, so any
//! edit here invalidates stored snapshots and forces a full recomputation.

use crate::domain::Ratings;

/// Rating assigned to a competitor the first time it is seen.
pub const DEFAULT_RATING: f64 = 1000.0;

/// Maximum rating change per game.
pub const K_FACTOR: f64 = 30.0;

/// Tunable parameters of the fold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EloParams {
    /// Maximum rating change per game.
    pub k_factor: f64,
    /// Starting rating for unseen competitors.
    pub default_rating: f64,
}

impl Default for EloParams {
    fn default() -> Self {
        Self {
            k_factor: K_FACTOR,
            default_rating: DEFAULT_RATING,
        }
    }
}

/// Probability that a player rated `rating_a` beats one rated `rating_b`.
#[must_use]
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / 400.0))
}

/// Rating after a game with the given expected and actual score.
#[must_use]
pub fn updated_rating(rating: f64, expected: f64, actual: f64, k_factor: f64) -> f64 {
    rating + k_factor * (actual - expected)
}

/// Incremental fold state.
///
/// Games must be applied in canonical order; the result depends on it.
#[derive(Debug, Clone)]
pub struct EloFold {
    params: EloParams,
    ratings: Ratings,
}

impl EloFold {
    /// Starts a fold from previously computed ratings.
    #[must_use]
    pub fn new(params: EloParams, initial: Ratings) -> Self {
        Self {
            params,
            ratings: initial,
        }
    }

    /// Current rating of `key`, or the default if it has not been seen.
    #[must_use]
    pub fn rating(&self, key: &str) -> f64 {
        self.ratings
            .get(key)
            .copied()
            .unwrap_or(self.params.default_rating)
    }

    /// Applies one game. A game between a competitor and itself changes
    /// nothing.
    pub fn apply(&mut self, winner: &str, loser: &str) {
        if winner == loser {
            return;
        }
        let winner_rating = self.rating(winner);
        let loser_rating = self.rating(loser);
        let winner_expected = expected_score(winner_rating, loser_rating);
        let loser_expected = expected_score(loser_rating, winner_rating);
        let k = self.params.k_factor;
        self.ratings.insert(
            winner.to_string(),
            updated_rating(winner_rating, winner_expected, 1.0, k),
        );
        self.ratings.insert(
            loser.to_string(),
            updated_rating(loser_rating, loser_expected, 0.0, k),
        );
    }

    /// Ends the fold, returning the ratings.
    #[must_use]
    pub fn finish(self) -> Ratings {
        self.ratings
    }
}

/// Folds an ordered sequence of `(winner, loser)` games into `initial`.
#[must_use]
pub fn fold<'a, I>(games: I, initial: Ratings, params: EloParams) -> Ratings
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut state = EloFold::new(params, initial);
    for (winner, loser) in games {
        state.apply(winner, loser);
    }
    state.finish()
}
