//! Read-only character catalog loaded from the generated character JSON.
//!
//! Only the parts the ranking core needs are read: the first English name
//! (the competitor key) and the numeric `rankings` features.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::domain::Competitor;
use crate::error::RankingError;

/// Feature derived from the `heart_on` / `heart_off` pair.
pub const HEART_ON_OFF_RATIO: &str = "heart_on_off_ratio";

#[derive(Debug, Deserialize)]
struct RawCharacter {
    names: RawNames,
    #[serde(default)]
    rankings: Vec<RawRanking>,
}

#[derive(Debug, Deserialize)]
struct RawNames {
    #[serde(default)]
    en: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawRanking {
    name: String,
    value: serde_json::Value,
}

/// Parses `12`, `12.5`, `"1,204"` and `"#31"` style ranking values.
fn parse_feature_value(value: &serde_json::Value) -> Option<f64> {
    let parsed: Option<f64> = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Competitors available to the battle seeder.
#[derive(Debug, Clone, Default)]
pub struct CharacterCatalog {
    competitors: Vec<Competitor>,
}

impl CharacterCatalog {
    /// Wraps an existing competitor list.
    #[must_use]
    pub fn new(competitors: Vec<Competitor>) -> Self {
        Self { competitors }
    }

    /// Parses the character JSON document.
    ///
    /// Characters without an English name are skipped; a repeated key keeps
    /// its first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Catalog`] if the document is not a JSON array
    /// of characters.
    pub fn from_json(json: &str) -> Result<Self, RankingError> {
        let raw: Vec<RawCharacter> =
            serde_json::from_str(json).map_err(|e| RankingError::Catalog(e.to_string()))?;

        let mut seen = HashSet::new();
        let mut competitors = Vec::with_capacity(raw.len());
        let mut skipped = 0usize;
        for character in raw {
            let Some(key) = character.names.en.into_iter().find(|n| !n.trim().is_empty()) else {
                skipped += 1;
                continue;
            };
            if !seen.insert(key.clone()) {
                skipped += 1;
                continue;
            }
            let mut competitor = Competitor::new(key);
            for ranking in &character.rankings {
                if let Some(value) = parse_feature_value(&ranking.value) {
                    competitor.features.insert(ranking.name.clone(), value);
                }
            }
            if let (Some(on), Some(off)) =
                (competitor.feature("heart_on"), competitor.feature("heart_off"))
                && off > 0.0
            {
                competitor
                    .features
                    .insert(HEART_ON_OFF_RATIO.to_string(), on / off);
            }
            competitors.push(competitor);
        }

        if skipped > 0 {
            tracing::warn!(skipped, "skipped unnamed or duplicate characters");
        }
        tracing::info!(characters = competitors.len(), "character catalog loaded");
        Ok(Self { competitors })
    }

    /// Reads and parses the character JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Catalog`] if the file cannot be read or parsed.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, RankingError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RankingError::Catalog(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// All competitors.
    #[must_use]
    pub fn competitors(&self) -> &[Competitor] {
        &self.competitors
    }

    /// Number of competitors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.competitors.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }
}
