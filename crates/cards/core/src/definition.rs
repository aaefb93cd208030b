//! Authored card and container definitions.
//!
//! Field names follow the JSON asset files (`config/cards/*.json` merged over
//! `config/card_base.json`), so definitions deserialize without a mapping layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::rarity::Rarity;

/// Width/height footprint in inventory cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSize {
    pub width: u32,
    pub height: u32,
}

/// One card or container to inject.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Template identifier the item is written under.
    pub id: String,
    pub item_name: String,
    pub item_short_name: String,
    #[serde(default)]
    pub item_description: String,

    /// Existing template the new one is cloned from.
    pub clone_item: String,
    #[serde(default)]
    pub item_parent: String,
    /// Handbook category.
    #[serde(default)]
    pub category_id: String,

    pub rarity: Rarity,

    /// Explicit trader price; `None` or a non-positive value derives it from rarity.
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub sold: bool,
    #[serde(default)]
    pub lootable: bool,
    #[serde(default)]
    pub trader: String,
    #[serde(default = "default_loyalty_level")]
    pub trader_loyalty_level: u32,
    #[serde(default)]
    pub unlimited_stock: bool,
    #[serde(default)]
    pub stock_amount: u32,

    #[serde(default = "default_stack_size")]
    pub stack_max_size: u32,
    #[serde(default)]
    pub weight: f64,
    #[serde(rename = "ExternalSize", default)]
    pub external_size: ExternalSize,

    #[serde(default)]
    pub item_sound: String,
    #[serde(default)]
    pub item_prefab_path: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub examined_by_default: Option<bool>,

    /// Raw property overrides layered over the clone source's `_props`.
    #[serde(rename = "_props", default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    #[serde(rename = "Slots", default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<Vec<Value>>,
    #[serde(rename = "Grids", default, skip_serializing_if = "Option::is_none")]
    pub grids: Option<Vec<Value>>,

    /// Map name → container template ids the card may spawn in.
    #[serde(default)]
    pub loot_locations: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

fn default_currency() -> String {
    "roubles".to_string()
}

fn default_loyalty_level() -> u32 {
    1
}

fn default_stack_size() -> u32 {
    1
}

impl Definition {
    /// Deserialize a definition from a base shape with an override layered on top.
    ///
    /// The merge is shallow: top-level keys of `overrides` replace those of
    /// `base` wholesale.
    pub fn from_layers(base: &Value, overrides: &Value) -> serde_json::Result<Self> {
        let mut merged = base.as_object().cloned().unwrap_or_default();
        if let Some(layer) = overrides.as_object() {
            for (key, value) in layer {
                merged.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(Value::Object(merged))
    }

    /// Explicit price when it is set and positive.
    pub fn explicit_price(&self) -> Option<u64> {
        self.price.filter(|p| *p > 0).map(|p| p as u64)
    }

    /// Loot targets in authored order, with repeated containers dropped.
    pub fn loot_targets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.loot_locations.iter().flat_map(|(map, containers)| {
            containers
                .iter()
                .enumerate()
                .filter(move |(i, c)| !containers[..*i].contains(*c))
                .map(move |(_, c)| (map.as_str(), c.as_str()))
        })
    }
}
