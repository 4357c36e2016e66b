//! Rating algorithm and its fingerprint.
//!
//! [`elo`] holds the pure fold. [`fingerprint`] identifies the exact
//! algorithm that produced a snapshot: a SHA-256 over the fold's source text
//! and its parameters.

pub mod elo;

use sha2::{Digest, Sha256};

pub use elo::{DEFAULT_RATING, EloFold, EloParams, K_FACTOR, expected_score, fold};

const ALGORITHM_SOURCE: &str = include_str!("elo.rs");

/// Stable hex digest of the rating algorithm and `params`.
#[must_use]
pub fn fingerprint(params: &EloParams) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ALGORITHM_SOURCE.as_bytes());
    hasher.update(params.k_factor.to_bits().to_be_bytes());
    hasher.update(params.default_rating.to_bits().to_be_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests;
