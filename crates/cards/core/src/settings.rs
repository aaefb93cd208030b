//! Pipeline settings, read once at startup.
//!
//! Deserialized by `cards-content` from `config/mod_config.toml`. Every key
//! except `rarity_weights` has a default so a minimal file only carries the
//! weight table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rarity::Rarity;

/// Storage cases whose grids accept every injected card (SICC, documents case).
pub const DEFAULT_STORAGE_CASES: [&str; 2] =
    ["5d235bb686f77443f4331278", "590c60fc86f77412b13fddcf"];

/// Secure containers and the waist pouch that accept the empty booster.
pub const DEFAULT_SECURE_CONTAINERS: [&str; 9] = [
    "544a11ac4bdc2d470e8b456a", // Alpha
    "5857a8b324597729ab0a0e7d", // Beta
    "59db794186f77448bc595262", // Epsilon
    "5857a8bc2459772bad15db29", // Gamma
    "665ee77ccf2d642e98220bca", // Gamma (unheard)
    "5c093ca986f7740a1867ab12", // Kappa
    "676008db84e242067d0dc4c9", // Kappa (desecrated)
    "664a55d84a90fc2c8a6305c9", // Theta
    "5732ee6a24597719ae0c0281", // Waist pouch
];

/// Fallback trader price when neither the card nor the rarity table sets one.
pub const DEFAULT_TRADER_PRICE: u64 = 1000;

/// How list-shaped tables (handbook, trader assortment, loot distributions)
/// treat an entry that already exists for the same item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Always push a new entry. Re-running over the same store duplicates.
    #[default]
    Append,
    /// Replace the existing entry for the same item, if any.
    Upsert,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Emit per-write debug logs.
    #[serde(default)]
    pub debug: bool,

    /// Raw rarity → weight table; validated by [`crate::RarityWeights::validate`].
    #[serde(default)]
    pub rarity_weights: BTreeMap<String, serde_json::Value>,

    /// User-facing find-rate multiplier.
    #[serde(default = "default_multiplier")]
    pub card_weight_multiplier: f64,

    /// Trader used when a definition's own trader is absent.
    #[serde(default)]
    pub fallback_trader: String,

    /// Drives both market flags on every synthesized template.
    #[serde(default)]
    pub cards_tradeable_on_flea: bool,

    /// Rarity name → trader price for definitions without an explicit price.
    #[serde(default)]
    pub trader_sell_prices: BTreeMap<String, u64>,

    #[serde(default)]
    pub cards_examined_by_default: bool,

    /// Regenerate and persist loot baselines at startup.
    #[serde(default)]
    pub auto_update_probabilities: bool,

    /// Master switch for static loot injection.
    #[serde(default = "default_true")]
    pub enable_container_spawns: bool,

    #[serde(default)]
    pub write_policy: WritePolicy,

    #[serde(default = "default_storage_cases")]
    pub storage_cases: Vec<String>,

    #[serde(default = "default_secure_containers")]
    pub secure_containers: Vec<String>,
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_storage_cases() -> Vec<String> {
    DEFAULT_STORAGE_CASES.iter().map(|s| s.to_string()).collect()
}

fn default_secure_containers() -> Vec<String> {
    DEFAULT_SECURE_CONTAINERS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            rarity_weights: BTreeMap::new(),
            card_weight_multiplier: default_multiplier(),
            fallback_trader: String::new(),
            cards_tradeable_on_flea: false,
            trader_sell_prices: BTreeMap::new(),
            cards_examined_by_default: false,
            auto_update_probabilities: false,
            enable_container_spawns: true,
            write_policy: WritePolicy::Append,
            storage_cases: default_storage_cases(),
            secure_containers: default_secure_containers(),
        }
    }
}

impl Settings {
    /// Trader price for a rarity when the definition has no explicit price.
    pub fn fallback_price(&self, rarity: Rarity) -> u64 {
        self.trader_sell_prices
            .get(rarity.as_ref())
            .copied()
            .unwrap_or(DEFAULT_TRADER_PRICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.enable_container_spawns);
        assert!(!settings.cards_tradeable_on_flea);
        assert_eq!(settings.card_weight_multiplier, 1.0);
        assert_eq!(settings.write_policy, WritePolicy::Append);
        assert_eq!(settings.storage_cases.len(), 2);
        assert_eq!(settings.secure_containers.len(), 9);
    }

    #[test]
    fn test_fallback_price() {
        let mut settings = Settings::default();
        settings.trader_sell_prices.insert("Epic".into(), 25_000);
        assert_eq!(settings.fallback_price(Rarity::Epic), 25_000);
        assert_eq!(settings.fallback_price(Rarity::Common), DEFAULT_TRADER_PRICE);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "write_policy": "upsert", "fallback_trader": "t1" }"#)
                .unwrap();
        assert_eq!(settings.write_policy, WritePolicy::Upsert);
        assert_eq!(settings.fallback_trader, "t1");
        assert!(settings.enable_container_spawns);
    }
}
