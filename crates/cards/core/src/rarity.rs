//! Rarity taxonomy: ordering, loot weights, and per-run tier counts.
//!
//! Rarity plays two roles in the pipeline:
//! - **Sort key**: composite slots are ordered by rarity rank, then by name
//! - **Weight input**: each tier owns a fraction of a container's spawn budget
//!
//! The weight table comes from configuration and is validated once per run
//! via [`RarityWeights::validate`]; a bad table aborts the whole pipeline.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use crate::error::ConfigError;

/// Closed rarity enumeration, declared in ascending order.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Secret,
}

impl Rarity {
    /// Position in the rarity order (Common = 0).
    pub const fn rank(self) -> u8 {
        self as u8
    }
}

/// Orders two cards by ascending rarity, then by display name.
///
/// Names compare case-insensitively first; the case-sensitive comparison only
/// breaks exact ties so the ordering stays total and deterministic.
pub fn compare(a: (Rarity, &str), b: (Rarity, &str)) -> Ordering {
    a.0.rank()
        .cmp(&b.0.rank())
        .then_with(|| a.1.to_lowercase().cmp(&b.1.to_lowercase()))
        .then_with(|| a.1.cmp(b.1))
}

/// Validated rarity → loot-weight table.
///
/// Only constructible through [`RarityWeights::validate`], so holding one
/// proves every tier has a weight and the weights sum to exactly 1.0.
#[derive(Clone, Debug, PartialEq)]
pub struct RarityWeights {
    weights: [f64; 6],
}

impl RarityWeights {
    /// Validate a raw configuration map.
    ///
    /// Weights are summed in rarity order and compared against 1.0 with zero
    /// tolerance.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingWeight`] if a tier has no entry
    /// - [`ConfigError::NonNumericWeight`] if an entry is not a number
    /// - [`ConfigError::WeightSum`] if the sum is not exactly 1.0
    pub fn validate(raw: &BTreeMap<String, serde_json::Value>) -> Result<Self, ConfigError> {
        let mut weights = [0.0; 6];
        let mut sum = 0.0;

        for rarity in Rarity::iter() {
            let value = raw
                .get(rarity.as_ref())
                .ok_or(ConfigError::MissingWeight(rarity))?;
            let weight = value
                .as_f64()
                .ok_or_else(|| ConfigError::NonNumericWeight {
                    rarity,
                    value: value.to_string(),
                })?;
            weights[rarity.rank() as usize] = weight;
            sum += weight;
        }

        if sum != 1.0 {
            return Err(ConfigError::WeightSum { sum });
        }

        tracing::info!("Rarity weights validation passed (sum: {:.6})", sum);
        Ok(Self { weights })
    }

    /// Configured weight for a tier.
    pub fn weight_of(&self, rarity: Rarity) -> f64 {
        self.weights[rarity.rank() as usize]
    }
}

/// Number of definitions sharing each rarity in the current run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RarityCounts {
    counts: BTreeMap<Rarity, usize>,
}

impl RarityCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count rarities over a set of definitions.
    pub fn tally(rarities: impl IntoIterator<Item = Rarity>) -> Self {
        let mut counts = Self::new();
        for rarity in rarities {
            counts.increment(rarity);
        }
        counts
    }

    pub fn increment(&mut self, rarity: Rarity) {
        *self.counts.entry(rarity).or_default() += 1;
    }

    /// Count for a tier; zero when no definition has that rarity.
    pub fn get(&self, rarity: Rarity) -> usize {
        self.counts.get(&rarity).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rarity, usize)> + '_ {
        self.counts.iter().map(|(r, c)| (*r, *c))
    }
}
