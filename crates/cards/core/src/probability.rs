//! Loot baselines and per-card spawn weights.
//!
//! A baseline summarises the native loot density of one (map, container)
//! pair. New cards are weighted against `max_found` so they compete with the
//! container's existing items on the same scale:
//!
//! ```text
//! global_multiplier = user_multiplier * 0.2
//! rarity_pool       = max_found * global_multiplier * rarity_weight
//! weight            = max(1, ceil(rarity_pool / rarity_count))
//! ```
//!
//! Dividing by the tier's card count keeps the tier's total spawn budget fixed
//! no matter how many cards share it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{InjectError, Result};
use crate::store::{ContentStore, ItemDistribution};

/// Share of the container scale given to injected cards before user tuning.
pub const GLOBAL_MULTIPLIER_SCALE: f64 = 0.2;

/// Baseline statistics for one (map, container) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootBaseline {
    pub min_found: u64,
    pub max_found: u64,
    pub average: u64,
    #[serde(rename = "15p")]
    pub p15: u64,
    #[serde(rename = "65p")]
    pub p65: u64,
}

impl LootBaseline {
    /// Baseline for a container whose distribution weights sum to `total`.
    pub fn from_total(total: u64) -> Self {
        let t = total as f64;
        Self {
            min_found: 1,
            max_found: total,
            average: (t / 2.0).round() as u64,
            p15: (t * 0.15).round() as u64,
            p65: (t * 0.65).round() as u64,
        }
    }
}

/// Map name → container id → baseline. This is also the on-disk snapshot format.
pub type BaselineTable = BTreeMap<String, BTreeMap<String, LootBaseline>>;

/// Scan every static loot distribution in the store and derive baselines.
///
/// Containers with an empty distribution, or whose weights sum to zero, get no
/// entry: a zero baseline is treated as absent. Fractional weights are summed
/// as written and the total is rounded.
pub fn compute_baselines(store: &ContentStore) -> BaselineTable {
    let mut out = BaselineTable::new();

    for (map_name, location) in &store.locations {
        for (container_id, container) in &location.static_loot {
            let total: f64 = container
                .item_distribution
                .iter()
                .map(ItemDistribution::weight)
                .sum();
            let total = total.round();
            if !total.is_finite() || total < 1.0 {
                continue;
            }
            let total = total as u64;

            out.entry(map_name.clone())
                .or_default()
                .insert(container_id.clone(), LootBaseline::from_total(total));
        }
    }

    out
}

/// Relative spawn weight for one card in one container.
///
/// A `rarity_count` of zero is treated as one.
pub fn relative_probability(
    baseline_max: u64,
    rarity_count: usize,
    rarity_weight: f64,
    user_multiplier: f64,
) -> u64 {
    let global_multiplier = user_multiplier * GLOBAL_MULTIPLIER_SCALE;
    let rarity_pool = baseline_max as f64 * global_multiplier * rarity_weight;
    let share = (rarity_pool / rarity_count.max(1) as f64).ceil();

    if share.is_finite() && share >= 1.0 {
        share as u64
    } else {
        1
    }
}

/// Owned holder of the baselines used for one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProbabilityEngine {
    baselines: BaselineTable,
}

impl ProbabilityEngine {
    pub fn new(baselines: BaselineTable) -> Self {
        Self { baselines }
    }

    /// Build the engine from an optional persisted snapshot, regenerating from
    /// the store when `regenerate` is set.
    ///
    /// Freshly computed entries replace stale snapshot entries for the same
    /// (map, container); snapshot entries for pairs no longer in the store are
    /// kept.
    pub fn prepare(snapshot: Option<BaselineTable>, store: &ContentStore, regenerate: bool) -> Self {
        let mut engine = Self::new(snapshot.unwrap_or_default());
        if regenerate {
            let fresh = compute_baselines(store);
            tracing::info!(
                "Regenerated loot baselines for {} map(s)",
                fresh.len()
            );
            engine.merge(fresh);
        }
        engine
    }

    /// Merge `fresh` on top of the current table; fresh entries win.
    pub fn merge(&mut self, fresh: BaselineTable) {
        for (map_name, containers) in fresh {
            self.baselines.entry(map_name).or_default().extend(containers);
        }
    }

    pub fn baseline(&self, map: &str, container: &str) -> Option<&LootBaseline> {
        self.baselines.get(map)?.get(container)
    }

    /// Weight for a card in `container` on `map`.
    ///
    /// # Errors
    ///
    /// [`InjectError::MissingContainerBaseline`] when no baseline exists for the pair.
    pub fn weight_for(
        &self,
        map: &str,
        container: &str,
        rarity_count: usize,
        rarity_weight: f64,
        user_multiplier: f64,
    ) -> Result<u64> {
        let baseline =
            self.baseline(map, container)
                .ok_or_else(|| InjectError::MissingContainerBaseline {
                    map: map.to_string(),
                    container: container.to_string(),
                })?;

        Ok(relative_probability(
            baseline.max_found,
            rarity_count,
            rarity_weight,
            user_multiplier,
        ))
    }

    pub fn table(&self) -> &BaselineTable {
        &self.baselines
    }

    pub fn into_table(self) -> BaselineTable {
        self.baselines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ItemDistribution, Location, StaticLootContainer};

    fn container(weights: &[u64]) -> StaticLootContainer {
        StaticLootContainer {
            item_distribution: weights
                .iter()
                .enumerate()
                .map(|(i, w)| ItemDistribution::new(format!("item{i}"), *w))
                .collect(),
            ..Default::default()
        }
    }

    fn store() -> ContentStore {
        let mut store = ContentStore::new();
        let mut customs = Location::default();
        customs.static_loot.insert("jacket".into(), container(&[30, 50, 20]));
        customs.static_loot.insert("empty".into(), container(&[]));
        customs.static_loot.insert("zero".into(), container(&[0, 0]));
        store.locations.insert("bigmap".into(), customs);
        store
    }

    #[test]
    fn test_baseline_from_total() {
        let b = LootBaseline::from_total(100);
        assert_eq!(b.min_found, 1);
        assert_eq!(b.max_found, 100);
        assert_eq!(b.average, 50);
        assert_eq!(b.p15, 15);
        assert_eq!(b.p65, 65);

        let odd = LootBaseline::from_total(7);
        assert_eq!(odd.average, 4); // 3.5 rounds away from zero
        assert_eq!(odd.p15, 1);
        assert_eq!(odd.p65, 5);
    }

    #[test]
    fn test_compute_skips_empty_and_zero() {
        let table = compute_baselines(&store());
        let customs = &table["bigmap"];
        assert_eq!(customs.len(), 1);
        assert_eq!(customs["jacket"].max_found, 100);
    }

    #[test]
    fn test_compute_sums_fractional_weights() {
        let mut s = ContentStore::new();
        let mut woods = Location::default();
        let mut crate_box = container(&[10]);
        crate_box.item_distribution.push(ItemDistribution {
            tpl: "half".into(),
            relative_probability: serde_json::Number::from_f64(2.5).unwrap(),
        });
        woods.static_loot.insert("crate".into(), crate_box);
        s.locations.insert("woods".into(), woods);

        // 12.5 rounds away from zero
        assert_eq!(compute_baselines(&s)["woods"]["crate"].max_found, 13);
    }

    #[test]
    fn test_compute_does_not_mutate() {
        let s = store();
        let before = s.clone();
        let _ = compute_baselines(&s);
        assert_eq!(s, before);
    }

    #[test]
    fn test_reference_scenario() {
        // max 100, multiplier 1, Rare weight 0.2, one card
        assert_eq!(relative_probability(100, 1, 0.2, 1.0), 4);
    }

    #[test]
    fn test_floor_of_one() {
        assert_eq!(relative_probability(0, 1, 0.2, 1.0), 1);
        assert_eq!(relative_probability(10, 500, 0.01, 1.0), 1);
        assert_eq!(relative_probability(100, 1, 0.0, 1.0), 1);
        assert_eq!(relative_probability(100, 0, 0.5, 1.0), 10);
    }

    #[test]
    fn test_monotonic_in_inputs() {
        let mut last = 0;
        for max in [0, 10, 100, 1_000, 10_000] {
            let p = relative_probability(max, 3, 0.25, 1.0);
            assert!(p >= last);
            last = p;
        }

        let mut last = 0;
        for weight in [0.0, 0.03125, 0.125, 0.5, 1.0] {
            let p = relative_probability(5_000, 3, weight, 1.0);
            assert!(p >= last);
            last = p;
        }

        let mut last = u64::MAX;
        for count in 1..20 {
            let p = relative_probability(5_000, count, 0.25, 1.0);
            assert!(p <= last);
            assert!(p >= 1);
            last = p;
        }
    }

    #[test]
    fn test_tier_budget_split() {
        // pool = 10_000 * 0.2 * 0.5 = 1000
        let pool = 1000.0_f64;
        for n in [1usize, 2, 3, 7, 64, 2_000] {
            let each = relative_probability(10_000, n, 0.5, 1.0);
            let total = each * n as u64;
            let expected = (n as u64) * ((pool / n as f64).ceil() as u64).max(1);
            assert_eq!(total, expected);
            assert!(total >= n as u64);
        }
    }

    #[test]
    fn test_merge_fresh_wins() {
        let mut snapshot = BaselineTable::new();
        snapshot
            .entry("bigmap".into())
            .or_default()
            .insert("jacket".into(), LootBaseline::from_total(5));
        snapshot
            .entry("bigmap".into())
            .or_default()
            .insert("stale".into(), LootBaseline::from_total(9));

        let engine = ProbabilityEngine::prepare(Some(snapshot), &store(), true);
        assert_eq!(engine.baseline("bigmap", "jacket").unwrap().max_found, 100);
        assert_eq!(engine.baseline("bigmap", "stale").unwrap().max_found, 9);
    }

    #[test]
    fn test_prepare_without_regenerate_keeps_snapshot() {
        let engine = ProbabilityEngine::prepare(None, &store(), false);
        assert!(engine.table().is_empty());
    }

    #[test]
    fn test_weight_for_missing_baseline() {
        let engine = ProbabilityEngine::new(compute_baselines(&store()));
        let err = engine.weight_for("bigmap", "empty", 1, 0.2, 1.0).unwrap_err();
        assert!(matches!(err, InjectError::MissingContainerBaseline { .. }));
        assert_eq!(engine.weight_for("bigmap", "jacket", 1, 0.2, 1.0).unwrap(), 4);
    }

    #[test]
    fn test_snapshot_keys() {
        let json = serde_json::to_value(LootBaseline::from_total(20)).unwrap();
        assert_eq!(json["15p"], 3);
        assert_eq!(json["65p"], 13);
        assert_eq!(json["max_found"], 20);
    }
}
