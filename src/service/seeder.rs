//! Synthetic battle generator for demos and load tests.
//!
//! Each battle draws two distinct competitors and one popularity feature
//! from [`POPULARITY_FEATURES`], where a larger value always means a more
//! liked character. Features are normalized to `[0, 1]` by their catalog-wide maximum. The
//! left competitor's win probability is itself drawn uniformly between
//! `0.5` and `0.5 + 0.4 * (left - right)`, then compared against a fresh
//! uniform draw, so popular characters win more often without the outcome
//! ever being fixed.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::{AccountId, Cadence, Competitor, NewGame, ProgressReporter, ProgressUpdate};
use crate::error::RankingError;
use crate::persistence::{AccountStore, CharacterCatalog, GameStore, HEART_ON_OFF_RATIO};

/// Email identifying the synthetic seed account.
pub const SEED_ACCOUNT_EMAIL: &str = "battle-seeder@animeu.local";

/// Display name of the synthetic seed account.
pub const SEED_ACCOUNT_USERNAME: &str = "battle-seeder";

/// Catalog features that grow with popularity. Rank-style features and
/// `heart_off` grow the other way and never bias a battle.
pub const POPULARITY_FEATURES: [&str; 3] = ["heart_on", HEART_ON_OFF_RATIO, "member_favorites"];

/// Largest swing of the win probability away from a fair coin.
const MAX_BIAS: f64 = 0.4;

/// Per-feature maxima used to normalize competitor features.
#[derive(Debug, Clone, Default)]
pub struct FeatureScale {
    maxima: BTreeMap<String, f64>,
}

impl FeatureScale {
    /// Computes maxima of the [`POPULARITY_FEATURES`] over every
    /// competitor, keeping features with a positive maximum.
    #[must_use]
    pub fn from_competitors(competitors: &[Competitor]) -> Self {
        let mut maxima: BTreeMap<String, f64> = BTreeMap::new();
        for competitor in competitors {
            for (name, value) in competitor
                .features
                .iter()
                .filter(|(name, _)| POPULARITY_FEATURES.contains(&name.as_str()))
            {
                let entry = maxima.entry(name.clone()).or_insert(f64::MIN);
                *entry = entry.max(*value);
            }
        }
        maxima.retain(|_, max| *max > 0.0);
        Self { maxima }
    }

    /// Feature names usable for biasing.
    #[must_use]
    pub fn features(&self) -> Vec<&str> {
        self.maxima.keys().map(String::as_str).collect()
    }

    /// `competitor`'s value of `feature` scaled into `[0, 1]`; missing
    /// values count as zero.
    #[must_use]
    pub fn normalized(&self, competitor: &Competitor, feature: &str) -> f64 {
        match (competitor.feature(feature), self.maxima.get(feature)) {
            (Some(value), Some(max)) => (value / max).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

/// Draws the probability that the left competitor wins.
fn left_win_probability<R: Rng + ?Sized>(rng: &mut R, left: f64, right: f64) -> f64 {
    let upper = 0.5 + MAX_BIAS * (left - right);
    0.5 + (upper - 0.5) * rng.gen_range(0.0..=1.0)
}

/// Summary of a seeding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOutcome {
    /// Account all seeded games are attributed to.
    pub account_id: AccountId,
    /// Games written.
    pub battles: u64,
}

/// Seeds synthetic games from the character catalog.
#[derive(Debug, Clone)]
pub struct BattleSeeder {
    catalog: Arc<CharacterCatalog>,
    scale: Arc<FeatureScale>,
    games: Arc<dyn GameStore>,
    accounts: Arc<dyn AccountStore>,
    cadence: Cadence,
}

impl BattleSeeder {
    /// Creates a seeder over `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Catalog`] if the catalog has fewer than two
    /// competitors.
    pub fn new(
        catalog: Arc<CharacterCatalog>,
        games: Arc<dyn GameStore>,
        accounts: Arc<dyn AccountStore>,
    ) -> Result<Self, RankingError> {
        if catalog.len() < 2 {
            return Err(RankingError::Catalog(format!(
                "seeding needs at least two characters, catalog has {}",
                catalog.len()
            )));
        }
        let scale = Arc::new(FeatureScale::from_competitors(catalog.competitors()));
        Ok(Self {
            catalog,
            scale,
            games,
            accounts,
            cadence: Cadence::default(),
        })
    }

    /// Overrides the progress cadence (also the write batch size).
    #[must_use]
    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Seeds `count` battles using an entropy-seeded generator.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] if the account lookup or a game
    /// write fails.
    pub async fn seed(
        &self,
        count: u64,
        reporter: &dyn ProgressReporter,
    ) -> Result<SeedOutcome, RankingError> {
        let mut rng = StdRng::from_entropy();
        self.seed_with_rng(count, reporter, &mut rng).await
    }

    /// Seeds `count` battles drawing randomness from `rng`.
    ///
    /// Games are written in batches at each progress report, so the
    /// reported progress always matches what is stored. Batches are not
    /// rolled back: a run that fails partway keeps every batch written
    /// before the failure, which is exactly the last reported progress.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::Persistence`] if the account lookup or a game
    /// write fails.
    pub async fn seed_with_rng<R: Rng + Send>(
        &self,
        count: u64,
        reporter: &dyn ProgressReporter,
        rng: &mut R,
    ) -> Result<SeedOutcome, RankingError> {
        let account_id = self
            .accounts
            .find_or_create(SEED_ACCOUNT_EMAIL, SEED_ACCOUNT_USERNAME)
            .await?;
        tracing::info!(battles = count, account = %account_id, "seeding battles");

        if count == 0 {
            reporter.report(ProgressUpdate::COMPLETE).await;
            return Ok(SeedOutcome {
                account_id,
                battles: 0,
            });
        }

        let mut batch = Vec::new();
        for index in 0..count {
            batch.push(self.draw(account_id, rng)?);
            if let Some(update) = self.cadence.update_for(index, count) {
                self.games.append_batch(std::mem::take(&mut batch)).await?;
                reporter.report(update).await;
            }
        }

        Ok(SeedOutcome {
            account_id,
            battles: count,
        })
    }

    fn draw<R: Rng + ?Sized>(
        &self,
        account_id: AccountId,
        rng: &mut R,
    ) -> Result<NewGame, RankingError> {
        let competitors = self.catalog.competitors();
        let n = competitors.len();
        let left_index = rng.gen_range(0..n);
        let mut right_index = rng.gen_range(0..n - 1);
        if right_index >= left_index {
            right_index += 1;
        }
        let (Some(left), Some(right)) =
            (competitors.get(left_index), competitors.get(right_index))
        else {
            return Err(RankingError::Internal(
                "competitor index out of range".to_string(),
            ));
        };

        let features = self.scale.features();
        let probability = match features.choose(rng) {
            Some(feature) => left_win_probability(
                rng,
                self.scale.normalized(left, feature),
                self.scale.normalized(right, feature),
            ),
            None => 0.5,
        };
        let (winner, loser) = if rng.gen_range(0.0..1.0) < probability {
            (left, right)
        } else {
            (right, left)
        };
        NewGame::new(account_id, winner.key.as_str(), loser.key.as_str(), Utc::now())
    }
}
