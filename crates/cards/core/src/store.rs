//! Serde model of the content database tables the pipeline reads and mutates.
//!
//! Only the fields the pipeline touches are typed. Everything else is kept in
//! flattened `extra` maps so a load → inject → save cycle round-trips the
//! host's data untouched. Keyed tables are `BTreeMap`s so serialized output is
//! stable across runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// The whole content store. Owned by the host; the pipeline borrows it mutably.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentStore {
    #[serde(default)]
    pub templates: Templates,
    #[serde(default)]
    pub locales: Locales,
    #[serde(default)]
    pub traders: BTreeMap<String, Trader>,
    #[serde(default)]
    pub locations: BTreeMap<String, Location>,
    #[serde(default)]
    pub ragfair: Ragfair,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Item template by identifier.
    pub fn template(&self, id: &str) -> Option<&Value> {
        self.templates.items.get(id)
    }

    pub fn template_mut(&mut self, id: &str) -> Option<&mut Value> {
        self.templates.items.get_mut(id)
    }

    pub fn has_template(&self, id: &str) -> bool {
        self.templates.items.contains_key(id)
    }

    /// `_parent` of a template, if the template exists and declares one.
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.template(id)?.get("_parent")?.as_str()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Templates {
    /// Item templates keyed by identifier.
    #[serde(default)]
    pub items: BTreeMap<String, Value>,
    #[serde(default)]
    pub handbook: Handbook,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Handbook {
    #[serde(rename = "Items", default)]
    pub items: Vec<HandbookEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandbookEntry {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "ParentId")]
    pub parent_id: String,
    #[serde(rename = "Price")]
    pub price: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Locales {
    /// Language code → (locale key → text).
    #[serde(default)]
    pub global: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trader {
    #[serde(default)]
    pub assort: TraderAssort,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TraderAssort {
    #[serde(default)]
    pub items: Vec<AssortItem>,
    /// Item id → payment options → cost components.
    #[serde(default)]
    pub barter_scheme: BTreeMap<String, Vec<Vec<BarterCost>>>,
    #[serde(default)]
    pub loyal_level_items: BTreeMap<String, u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssortItem {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_tpl")]
    pub tpl: String,
    #[serde(rename = "parentId")]
    pub parent_id: String,
    #[serde(rename = "slotId")]
    pub slot_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upd: Option<AssortStock>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssortStock {
    #[serde(rename = "UnlimitedCount", default)]
    pub unlimited_count: bool,
    #[serde(rename = "StackObjectsCount", default)]
    pub stack_objects_count: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarterCost {
    pub count: Number,
    #[serde(rename = "_tpl")]
    pub tpl: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Container template id → spawn distribution.
    #[serde(rename = "staticLoot", default)]
    pub static_loot: BTreeMap<String, StaticLootContainer>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticLootContainer {
    #[serde(rename = "itemDistribution", default)]
    pub item_distribution: Vec<ItemDistribution>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One spawn entry. Hosts may store fractional weights, so the number is kept
/// as written and only converted where it is summed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDistribution {
    pub tpl: String,
    #[serde(rename = "relativeProbability", default = "zero_weight")]
    pub relative_probability: Number,
}

impl ItemDistribution {
    pub fn new(tpl: impl Into<String>, relative_probability: u64) -> Self {
        Self {
            tpl: tpl.into(),
            relative_probability: relative_probability.into(),
        }
    }

    /// Weight as a float; zero if the number is not representable.
    pub fn weight(&self) -> f64 {
        self.relative_probability.as_f64().unwrap_or(0.0)
    }
}

fn zero_weight() -> Number {
    Number::from(0u64)
}

/// Market visibility rules.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ragfair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<RagfairDynamic>,
    #[serde(rename = "static", default, skip_serializing_if = "Option::is_none")]
    pub static_rules: Option<RagfairStatic>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RagfairDynamic {
    #[serde(default)]
    pub blacklist: Vec<BlacklistEntry>,
    /// Parent category id → allowed on the market.
    #[serde(default)]
    pub condition: BTreeMap<String, bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RagfairStatic {
    #[serde(default)]
    pub blacklist: Vec<BlacklistEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub tpl: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_round_trip() {
        let raw = json!({
            "templates": {
                "items": { "tpl1": { "_id": "tpl1", "_parent": "p1", "_props": {} } },
                "handbook": { "Items": [], "Categories": [{ "Id": "c1" }] },
                "prices": { "tpl1": 10 }
            },
            "locations": {
                "bigmap": {
                    "base": { "Name": "Customs" },
                    "staticLoot": {
                        "box": { "itemDistribution": [{ "tpl": "x", "relativeProbability": 5 }] }
                    }
                }
            },
            "globals": { "config": {} }
        });

        let store: ContentStore = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(store.parent_of("tpl1"), Some("p1"));
        assert_eq!(
            store.locations["bigmap"].static_loot["box"].item_distribution[0].weight(),
            5.0
        );

        let back = serde_json::to_value(&store).unwrap();
        assert_eq!(back["templates"]["prices"], raw["templates"]["prices"]);
        assert_eq!(back["templates"]["handbook"]["Categories"], raw["templates"]["handbook"]["Categories"]);
        assert_eq!(back["locations"]["bigmap"]["base"], raw["locations"]["bigmap"]["base"]);
        assert_eq!(back["globals"], raw["globals"]);
    }

    #[test]
    fn test_fractional_loot_weight_loads() {
        let raw = json!({
            "locations": {
                "woods": {
                    "staticLoot": {
                        "crate": { "itemDistribution": [
                            { "tpl": "a", "relativeProbability": 2.5 },
                            { "tpl": "b", "relativeProbability": 10 }
                        ] }
                    }
                }
            }
        });

        let store: ContentStore = serde_json::from_value(raw.clone()).unwrap();
        let dist = &store.locations["woods"].static_loot["crate"].item_distribution;
        assert_eq!(dist[0].weight(), 2.5);
        assert_eq!(dist[1].relative_probability, Number::from(10u64));

        // written back exactly as read
        let back = serde_json::to_value(&store).unwrap();
        assert_eq!(back["locations"], raw["locations"]);
    }

    #[test]
    fn test_empty_store_deserializes() {
        let store: ContentStore = serde_json::from_value(json!({})).unwrap();
        assert!(store.templates.items.is_empty());
        assert!(store.ragfair.dynamic.is_none());
    }
}
