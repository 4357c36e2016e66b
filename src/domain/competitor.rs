//! Competitors and their popularity features.

use std::collections::BTreeMap;

/// A character that can appear in battles.
#[derive(Debug, Clone, PartialEq)]
pub struct Competitor {
    /// Stable key used in games and ratings.
    pub key: String,
    /// Named numeric popularity features (e.g. `heart_on`, `member_favorites`).
    pub features: BTreeMap<String, f64>,
}

impl Competitor {
    /// Creates a competitor with no features.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            features: BTreeMap::new(),
        }
    }

    /// Adds a feature, builder style.
    #[must_use]
    pub fn with_feature(mut self, name: impl Into<String>, value: f64) -> Self {
        self.features.insert(name.into(), value);
        self
    }

    /// Returns a feature value if present.
    #[must_use]
    pub fn feature(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied()
    }
}
