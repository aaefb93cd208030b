//! Cross-table injection of one definition into the content store.
//!
//! A card touches seven tables in a fixed order:
//!
//! 1. compat repair of legacy grid filters
//! 2. item template (synthesized, last writer wins)
//! 3. locale strings in every language
//! 4. handbook entry
//! 5. trader assortment, barter price, loyalty level (only if sold)
//! 6. static loot distributions (cards only)
//! 7. market visibility rules (cards only)
//!
//! Containers stop after step 5. Steps 5 and 6 are best-effort: a missing
//! trader or location is recorded in the [`InjectReport`] and the remaining
//! steps still run.

use serde_json::Number;

use crate::definition::Definition;
use crate::error::{InjectError, Result};
use crate::filters;
use crate::probability::ProbabilityEngine;
use crate::rarity::{RarityCounts, RarityWeights};
use crate::settings::{Settings, WritePolicy};
use crate::store::{
    AssortItem, AssortStock, BarterCost, ContentStore, HandbookEntry, ItemDistribution,
};
use crate::synth::{synthesize, trader_price};

pub const ROUBLES_TPL: &str = "5449016a4bdc2d6f028b456f";
pub const DOLLARS_TPL: &str = "5696686a4bdc2da3298b456a";
pub const EUROS_TPL: &str = "5ac3b934156ae10c4430e83c";

/// Parent slot for trader assortment roots.
const ASSORT_ROOT: &str = "hideout";

/// Currency template for a configured currency code. Unknown codes are taken
/// to be a template id already.
pub fn currency_tpl(code: &str) -> &str {
    match code {
        "roubles" => ROUBLES_TPL,
        "dollars" => DOLLARS_TPL,
        "euros" => EUROS_TPL,
        other => other,
    }
}

/// Which injection path a definition takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectKind {
    /// Full path including loot and market visibility.
    Card,
    /// Composite containers; never placed in world loot.
    Container,
}

/// Outcome of one successful injection.
#[derive(Clone, Debug, PartialEq)]
pub struct InjectReport {
    pub id: String,
    pub short_name: String,
    pub kind: InjectKind,
    pub price: u64,
    /// Loot distribution entries written.
    pub loot_entries: usize,
    /// Optional writes that were skipped.
    pub skips: Vec<InjectError>,
}

impl InjectReport {
    fn new(definition: &Definition, kind: InjectKind, price: u64) -> Self {
        Self {
            id: definition.id.clone(),
            short_name: definition.item_short_name.clone(),
            kind,
            price,
            loot_entries: 0,
            skips: Vec::new(),
        }
    }

    fn skip(&mut self, error: InjectError) {
        tracing::debug!(
            card = %self.short_name,
            code = error.error_code(),
            "{}",
            error
        );
        self.skips.push(error);
    }
}

/// Writes definitions into a borrowed store.
pub struct Injector<'a> {
    store: &'a mut ContentStore,
    settings: &'a Settings,
    weights: &'a RarityWeights,
    counts: &'a RarityCounts,
    engine: &'a ProbabilityEngine,
}

impl<'a> Injector<'a> {
    pub fn new(
        store: &'a mut ContentStore,
        settings: &'a Settings,
        weights: &'a RarityWeights,
        counts: &'a RarityCounts,
        engine: &'a ProbabilityEngine,
    ) -> Self {
        Self {
            store,
            settings,
            weights,
            counts,
            engine,
        }
    }

    /// Inject a card: template, locales, handbook, trader, loot, market.
    ///
    /// # Errors
    ///
    /// [`InjectError::MissingBaseTemplate`] or [`InjectError::MalformedTemplate`]
    /// when the template cannot be built; nothing is written in that case.
    pub fn inject_card(&mut self, definition: &Definition) -> Result<InjectReport> {
        self.inject(definition, InjectKind::Card)
    }

    /// Inject a container: template, locales, handbook, trader.
    pub fn inject_container(&mut self, definition: &Definition) -> Result<InjectReport> {
        self.inject(definition, InjectKind::Container)
    }

    fn inject(&mut self, definition: &Definition, kind: InjectKind) -> Result<InjectReport> {
        filters::ensure_compat_filters(self.store);

        let clone_parent = self.write_template(definition)?;
        let price = trader_price(definition, self.settings);
        let mut report = InjectReport::new(definition, kind, price);

        self.write_locales(definition);
        self.write_handbook(definition, price);

        if definition.sold
            && let Err(e) = self.write_trader(definition, price)
        {
            report.skip(e);
        }

        if kind == InjectKind::Card {
            self.write_loot(definition, &mut report);
            self.write_market(definition, clone_parent.as_deref());
        }

        Ok(report)
    }

    /// Returns the clone source's `_parent`, used for market rules.
    fn write_template(&mut self, definition: &Definition) -> Result<Option<String>> {
        let source = self.store.template(&definition.clone_item).ok_or_else(|| {
            InjectError::MissingBaseTemplate {
                definition: definition.item_short_name.clone(),
                clone_source: definition.clone_item.clone(),
            }
        })?;
        let clone_parent = source
            .get("_parent")
            .and_then(|p| p.as_str())
            .map(str::to_string);
        let template = synthesize(definition, source, self.settings)?;

        if self
            .store
            .templates
            .items
            .insert(definition.id.clone(), template)
            .is_some()
        {
            tracing::debug!("Replaced existing template {}", definition.id);
        }

        Ok(clone_parent)
    }

    fn write_locales(&mut self, definition: &Definition) {
        let id = &definition.id;
        for locale in self.store.locales.global.values_mut() {
            locale.insert(format!("{id} Name"), definition.item_name.clone());
            locale.insert(format!("{id} ShortName"), definition.item_short_name.clone());
            locale.insert(format!("{id} Description"), definition.item_description.clone());
        }
    }

    fn write_handbook(&mut self, definition: &Definition, price: u64) {
        let entry = HandbookEntry {
            id: definition.id.clone(),
            parent_id: definition.category_id.clone(),
            price,
        };
        let entries = &mut self.store.templates.handbook.items;
        upsert_or_append(self.settings.write_policy, entries, entry, |e| {
            e.id == definition.id
        });
    }

    fn write_trader(&mut self, definition: &Definition, price: u64) -> Result<()> {
        let trader_id = if self.store.traders.contains_key(&definition.trader) {
            definition.trader.as_str()
        } else {
            self.settings.fallback_trader.as_str()
        };
        let trader = self.store.traders.get_mut(trader_id).ok_or_else(|| {
            InjectError::MissingTrader {
                trader: definition.trader.clone(),
                fallback: self.settings.fallback_trader.clone(),
            }
        })?;

        let item = AssortItem {
            id: definition.id.clone(),
            tpl: definition.id.clone(),
            parent_id: ASSORT_ROOT.to_string(),
            slot_id: ASSORT_ROOT.to_string(),
            upd: Some(AssortStock {
                unlimited_count: definition.unlimited_stock,
                stack_objects_count: definition.stock_amount,
                extra: Default::default(),
            }),
            extra: Default::default(),
        };
        upsert_or_append(
            self.settings.write_policy,
            &mut trader.assort.items,
            item,
            |i| i.id == definition.id,
        );

        let cost = BarterCost {
            count: Number::from(price),
            tpl: currency_tpl(&definition.currency).to_string(),
            extra: Default::default(),
        };
        trader
            .assort
            .barter_scheme
            .insert(definition.id.clone(), vec![vec![cost]]);
        trader
            .assort
            .loyal_level_items
            .insert(definition.id.clone(), definition.trader_loyalty_level);

        tracing::debug!(
            "Added {} to trader {} for {} {}",
            definition.item_short_name,
            trader_id,
            price,
            definition.currency
        );
        Ok(())
    }

    fn write_loot(&mut self, definition: &Definition, report: &mut InjectReport) {
        if !definition.lootable || !self.settings.enable_container_spawns {
            return;
        }

        let rarity_count = self.counts.get(definition.rarity);
        let rarity_weight = self.weights.weight_of(definition.rarity);
        let mut missing_maps: Vec<&str> = Vec::new();

        for (map_name, container_id) in definition.loot_targets() {
            let Some(location) = self.store.locations.get_mut(map_name) else {
                if !missing_maps.contains(&map_name) {
                    missing_maps.push(map_name);
                    report.skip(InjectError::MissingLocation {
                        map: map_name.to_string(),
                    });
                }
                continue;
            };

            let weight = match self.engine.weight_for(
                map_name,
                container_id,
                rarity_count,
                rarity_weight,
                self.settings.card_weight_multiplier,
            ) {
                Ok(weight) => weight,
                Err(e) => {
                    report.skip(e);
                    continue;
                }
            };

            let distribution = &mut location
                .static_loot
                .entry(container_id.to_string())
                .or_default()
                .item_distribution;
            let entry = ItemDistribution::new(definition.id.clone(), weight);
            upsert_or_append(self.settings.write_policy, distribution, entry, |e| {
                e.tpl == definition.id
            });
            report.loot_entries += 1;

            tracing::debug!(
                "Add {} -> {}/{} | relProb={}",
                definition.item_short_name,
                map_name,
                container_id,
                weight
            );
        }
    }

    fn write_market(&mut self, definition: &Definition, clone_parent: Option<&str>) {
        if !self.settings.cards_tradeable_on_flea {
            return;
        }
        let id = definition.id.as_str();
        let ragfair = &mut self.store.ragfair;

        if let Some(dynamic) = ragfair.dynamic.as_mut() {
            let before = dynamic.blacklist.len();
            dynamic.blacklist.retain(|e| e.tpl != id);
            if dynamic.blacklist.len() != before {
                tracing::debug!(
                    "Removed {} from ragfair dynamic blacklist",
                    definition.item_short_name
                );
            }
        }

        if let Some(static_rules) = ragfair.static_rules.as_mut() {
            let before = static_rules.blacklist.len();
            static_rules.blacklist.retain(|e| e.tpl != id);
            if static_rules.blacklist.len() != before {
                tracing::debug!(
                    "Removed {} from ragfair static blacklist",
                    definition.item_short_name
                );
            }
        }

        let parent = Some(definition.item_parent.as_str())
            .filter(|p| !p.is_empty())
            .or(clone_parent);
        if let Some(parent) = parent
            && let Some(dynamic) = ragfair.dynamic.as_mut()
            && let Some(allowed) = dynamic.condition.get_mut(parent)
        {
            *allowed = true;
            tracing::debug!("Enabled ragfair trading for parent category {}", parent);
        }
    }
}

/// Push `entry`, or under [`WritePolicy::Upsert`] replace the first entry
/// matching `same`.
fn upsert_or_append<T>(
    policy: WritePolicy,
    entries: &mut Vec<T>,
    entry: T,
    same: impl Fn(&T) -> bool,
) {
    if policy == WritePolicy::Upsert
        && let Some(existing) = entries.iter_mut().find(|e| same(e))
    {
        *existing = entry;
        return;
    }
    entries.push(entry);
}
