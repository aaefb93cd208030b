//! End-to-end injection run.
//!
//! Phases run strictly in sequence against one exclusively borrowed store:
//!
//! 1. validate the rarity weight table (fatal on failure)
//! 2. tally rarities over the input definitions, first occurrence per id
//! 3. inject every card, isolating failures per definition
//! 4. group injected cards by theme and build composites
//! 5. inject composites through the container path
//! 6. extend storage-case filters with every card and composite id
//! 7. extend secure-container filters with the empty booster id

use std::collections::BTreeSet;

use crate::composite::{CompositeBuilder, CompositeShapes, group_by_theme};
use crate::definition::Definition;
use crate::error::{InjectError, Result};
use crate::filters::{FilterExtension, extend_container_filters};
use crate::inject::{InjectReport, Injector};
use crate::probability::ProbabilityEngine;
use crate::rarity::{RarityCounts, RarityWeights};
use crate::settings::Settings;
use crate::store::ContentStore;

/// A definition that was dropped from the run.
#[derive(Clone, Debug, PartialEq)]
pub struct Failure {
    /// Short name of the definition, or the composite it would have become.
    pub name: String,
    pub error: InjectError,
}

/// Aggregate outcome of one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    /// Successful injections, cards first, then composites.
    pub injected: Vec<InjectReport>,
    pub failed: Vec<Failure>,
    /// Rarity tally over the unique input definitions; the loot weight divisor.
    pub rarity_counts: RarityCounts,
    /// Rarity tally over the cards that were injected.
    pub loaded_counts: RarityCounts,
    /// Working definition set: injected cards followed by injected composites.
    pub definitions: Vec<Definition>,
    pub storage_filters: FilterExtension,
    pub secure_filters: FilterExtension,
    /// Id of the empty booster, when one was built and injected.
    pub booster_id: Option<String>,
}

impl RunReport {
    /// Number of optional writes skipped across all injected definitions.
    pub fn skipped_writes(&self) -> usize {
        self.injected.iter().map(|r| r.skips.len()).sum()
    }

    /// Total loot distribution entries written.
    pub fn loot_entries(&self) -> usize {
        self.injected.iter().map(|r| r.loot_entries).sum()
    }
}

/// Borrowed inputs that stay fixed for a run.
pub struct Pipeline<'a> {
    settings: &'a Settings,
    shapes: &'a CompositeShapes,
    engine: &'a ProbabilityEngine,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: &'a Settings,
        shapes: &'a CompositeShapes,
        engine: &'a ProbabilityEngine,
    ) -> Self {
        Self {
            settings,
            shapes,
            engine,
        }
    }

    /// Run every phase against `store`.
    ///
    /// # Errors
    ///
    /// Only [`InjectError::Configuration`]; the store is untouched in that
    /// case. Per-definition errors are collected in [`RunReport::failed`].
    pub fn run(&self, store: &mut ContentStore, definitions: Vec<Definition>) -> Result<RunReport> {
        let weights = RarityWeights::validate(&self.settings.rarity_weights)?;
        let counts = {
            let mut ids = BTreeSet::new();
            RarityCounts::tally(
                definitions
                    .iter()
                    .filter(|d| ids.insert(d.id.as_str()))
                    .map(|d| d.rarity),
            )
        };

        let mut report = RunReport {
            rarity_counts: counts.clone(),
            ..Default::default()
        };
        let mut seen = BTreeSet::new();

        {
            let mut injector =
                Injector::new(store, self.settings, &weights, &counts, self.engine);
            for definition in definitions {
                if !seen.insert(definition.id.clone()) {
                    record_failure(
                        &mut report,
                        &definition.item_short_name,
                        InjectError::DuplicateDefinition {
                            id: definition.id.clone(),
                        },
                    );
                    continue;
                }
                match injector.inject_card(&definition) {
                    Ok(injected) => {
                        report.injected.push(injected);
                        report.definitions.push(definition);
                    }
                    Err(e) => record_failure(&mut report, &definition.item_short_name, e),
                }
            }
        }

        report.loaded_counts = RarityCounts::tally(report.definitions.iter().map(|d| d.rarity));
        for (rarity, count) in report.loaded_counts.iter() {
            tracing::info!("→ {}: {} card(s) loaded.", rarity, count);
        }

        let composites = self.build_composites(store, &mut report);

        {
            let mut injector =
                Injector::new(store, self.settings, &weights, &counts, self.engine);
            for (composite, is_booster) in composites {
                if !seen.insert(composite.id.clone()) {
                    record_failure(
                        &mut report,
                        &composite.item_short_name,
                        InjectError::DuplicateDefinition {
                            id: composite.id.clone(),
                        },
                    );
                    continue;
                }
                match injector.inject_container(&composite) {
                    Ok(injected) => {
                        if is_booster {
                            report.booster_id = Some(composite.id.clone());
                        }
                        report.injected.push(injected);
                        report.definitions.push(composite);
                    }
                    Err(e) => record_failure(&mut report, &composite.item_short_name, e),
                }
            }
        }

        let ids: Vec<&str> = report.definitions.iter().map(|d| d.id.as_str()).collect();
        let cases: Vec<&str> = self.settings.storage_cases.iter().map(String::as_str).collect();
        report.storage_filters = extend_container_filters(store, &cases, &ids);
        tracing::info!(
            "Storage case filters extended with {} id(s)",
            report.storage_filters.inserted
        );

        if let Some(booster_id) = report.booster_id.as_deref() {
            let secure: Vec<&str> = self
                .settings
                .secure_containers
                .iter()
                .map(String::as_str)
                .collect();
            report.secure_filters = extend_container_filters(store, &secure, &[booster_id]);
            if report.secure_filters.inserted > 0 {
                tracing::info!(
                    "Empty booster added to {} secure container filters",
                    report.secure_filters.inserted
                );
            } else {
                tracing::info!("Empty booster already present in all secure container filters");
            }
        }

        tracing::info!(
            "Injection finished: {} injected, {} failed, {} optional write(s) skipped",
            report.injected.len(),
            report.failed.len(),
            report.skipped_writes()
        );
        Ok(report)
    }

    /// Check configuration and definitions without touching the store.
    ///
    /// Returns the per-definition problems a run would hit before any write:
    /// duplicate ids and missing clone sources.
    ///
    /// # Errors
    ///
    /// [`InjectError::Configuration`] if the weight table is invalid.
    pub fn check(&self, store: &ContentStore, definitions: &[Definition]) -> Result<Vec<Failure>> {
        RarityWeights::validate(&self.settings.rarity_weights)?;

        let mut seen = BTreeSet::new();
        let mut problems = Vec::new();
        for definition in definitions {
            let error = if !seen.insert(definition.id.as_str()) {
                InjectError::DuplicateDefinition {
                    id: definition.id.clone(),
                }
            } else if !store.has_template(&definition.clone_item) {
                InjectError::MissingBaseTemplate {
                    definition: definition.item_short_name.clone(),
                    clone_source: definition.clone_item.clone(),
                }
            } else {
                continue;
            };
            problems.push(Failure {
                name: definition.item_short_name.clone(),
                error,
            });
        }
        Ok(problems)
    }

    /// Themed binders, then the album, then the booster. The flag marks the
    /// booster.
    fn build_composites(
        &self,
        store: &ContentStore,
        report: &mut RunReport,
    ) -> Vec<(Definition, bool)> {
        let builder = CompositeBuilder::new(self.shapes, store);
        let mut built = Vec::new();
        let mut failures = Vec::new();

        for (theme, cards) in group_by_theme(&report.definitions) {
            match builder.themed_binder(theme, &cards) {
                Ok(binder) => built.push((binder, false)),
                Err(e) => failures.push((format!("binder_{theme}"), e)),
            }
        }

        let all: Vec<&Definition> = report.definitions.iter().collect();
        match builder.collector_album(&all) {
            Ok(Some(album)) => built.push((album, false)),
            Ok(None) => {}
            Err(e) => failures.push(("album".to_string(), e)),
        }
        match builder.empty_booster(&all) {
            Ok(Some(booster)) => built.push((booster, true)),
            Ok(None) => {}
            Err(e) => failures.push(("booster".to_string(), e)),
        }

        for (name, error) in failures {
            record_failure(report, &name, error);
        }
        built
    }
}

fn record_failure(report: &mut RunReport, name: &str, error: InjectError) {
    tracing::warn!(
        card = %name,
        code = error.error_code(),
        severity = error.severity().as_str(),
        "Failed to inject {}: {}",
        name,
        error
    );
    report.failed.push(Failure {
        name: name.to_string(),
        error,
    });
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::definition::fixtures::card;
    use crate::error::ConfigError;
    use crate::rarity::Rarity;
    use crate::store::{ItemDistribution, Location, StaticLootContainer};

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.rarity_weights = [
            ("Common", 0.5),
            ("Uncommon", 0.25),
            ("Rare", 0.125),
            ("Epic", 0.0625),
            ("Legendary", 0.03125),
            ("Secret", 0.03125),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect();
        settings.storage_cases = vec!["sicc".into()];
        settings.secure_containers = vec!["gamma".into()];
        settings
    }

    fn case(id: &str) -> serde_json::Value {
        json!({
            "_id": id,
            "_parent": "case_parent",
            "_props": { "Grids": [{ "_props": { "filters": [{ "Filter": [], "ExcludedFilter": [] }] } }] }
        })
    }

    fn store() -> ContentStore {
        let mut store = ContentStore::new();
        store
            .templates
            .items
            .insert("base".into(), json!({ "_id": "base", "_parent": "p", "_props": {} }));
        store.templates.items.insert("sicc".into(), case("sicc"));
        store.templates.items.insert("gamma".into(), case("gamma"));
        store
    }

    fn shapes() -> CompositeShapes {
        let base = json!({
            "id": "unused",
            "item_name": "Composite",
            "item_short_name": "Composite",
            "clone_item": "sicc",
            "rarity": "Common"
        });
        let mut binder_overrides = BTreeMap::new();
        binder_overrides.insert("fauna".to_string(), json!({ "id": "binder_fauna" }));
        CompositeShapes {
            binder_base: Some(base.clone()),
            container_base: Some(base),
            binder_overrides,
            album_override: None,
            booster_override: Some(json!({ "id": "booster" })),
        }
    }

    fn themed(id: &str, name: &str, rarity: Rarity, clone_item: &str) -> Definition {
        let mut def = card(id, name, rarity, clone_item);
        def.theme = Some("fauna".into());
        def
    }

    fn filter_of(store: &ContentStore, id: &str) -> serde_json::Value {
        store.template(id).unwrap()["_props"]["Grids"][0]["_props"]["filters"][0]["Filter"].clone()
    }

    #[test]
    fn test_invalid_weights_abort_before_mutation() {
        let mut settings = settings();
        settings.rarity_weights.remove("Secret");
        let shapes = shapes();
        let engine = ProbabilityEngine::default();
        let mut store = store();
        let before = store.clone();

        let err = Pipeline::new(&settings, &shapes, &engine)
            .run(&mut store, vec![card("c1", "A", Rarity::Common, "base")])
            .unwrap_err();
        assert_eq!(
            err,
            InjectError::Configuration(ConfigError::MissingWeight(Rarity::Secret))
        );
        assert_eq!(store, before);
    }

    #[test]
    fn test_run_isolates_failures_and_builds_composites() {
        let settings = settings();
        let shapes = shapes();
        let engine = ProbabilityEngine::default();
        let mut store = store();

        let definitions = vec![
            themed("c3", "C", Rarity::Epic, "base"),
            themed("c1", "A", Rarity::Common, "base"),
            themed("broken", "Broken", Rarity::Rare, "missing"),
            themed("c2", "B", Rarity::Rare, "base"),
            themed("c1", "A again", Rarity::Common, "base"),
        ];
        let report = Pipeline::new(&settings, &shapes, &engine)
            .run(&mut store, definitions)
            .unwrap();

        let codes: Vec<_> = report.failed.iter().map(|f| f.error.error_code()).collect();
        assert_eq!(codes, vec!["missing_base_template", "duplicate_definition"]);
        assert!(!store.has_template("broken"));

        let ids: Vec<_> = report.definitions.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c1", "c2", "binder_fauna", "booster"]);
        assert_eq!(report.booster_id.as_deref(), Some("booster"));

        let binder = store.template("binder_fauna").unwrap();
        let slot_names: Vec<_> = binder["_props"]["Slots"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["_name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            slot_names,
            vec!["mod_mount_c1", "mod_mount_c2", "mod_mount_c3"]
        );

        assert_eq!(
            filter_of(&store, "sicc"),
            json!(["c3", "c1", "c2", "binder_fauna", "booster"])
        );
        assert_eq!(filter_of(&store, "gamma"), json!(["booster"]));
        assert_eq!(report.rarity_counts.get(Rarity::Common), 1);
        assert_eq!(report.rarity_counts.get(Rarity::Rare), 2);
        assert_eq!(report.loaded_counts.get(Rarity::Rare), 1);
    }

    #[test]
    fn test_counts_skip_duplicates_and_failures() {
        let settings = settings();
        let shapes = shapes();
        let mut store = store();
        let mut customs = Location::default();
        customs.static_loot.insert(
            "jacket".into(),
            StaticLootContainer {
                item_distribution: vec![ItemDistribution::new("native", 100)],
                ..Default::default()
            },
        );
        store.locations.insert("bigmap".into(), customs);
        let engine = ProbabilityEngine::prepare(None, &store, true);

        let mut good = card("c1", "A", Rarity::Common, "base");
        good.lootable = true;
        good.loot_locations
            .insert("bigmap".into(), vec!["jacket".into()]);
        let mut duplicate = good.clone();
        duplicate.item_short_name = "A again".into();

        let definitions = vec![
            good,
            duplicate,
            card("orphan", "Orphan", Rarity::Common, "missing"),
        ];
        let report = Pipeline::new(&settings, &shapes, &engine)
            .run(&mut store, definitions)
            .unwrap();

        let codes: Vec<_> = report.failed.iter().map(|f| f.error.error_code()).collect();
        assert_eq!(codes, vec!["duplicate_definition", "missing_base_template"]);

        // the duplicate never enters the divisor, the failed card still does
        assert_eq!(report.rarity_counts.get(Rarity::Common), 2);
        assert_eq!(report.loaded_counts.get(Rarity::Common), 1);

        // ceil(100 * 0.2 * 0.5 / 2) = 5
        let dist = &store.locations["bigmap"].static_loot["jacket"].item_distribution;
        let entry = dist.iter().find(|e| e.tpl == "c1").unwrap();
        assert_eq!(entry.weight(), 5.0);
    }

    #[test]
    fn test_duplicate_of_failed_card_stays_rejected() {
        let settings = settings();
        let shapes = shapes();
        let engine = ProbabilityEngine::default();
        let mut store = store();

        let definitions = vec![
            card("c1", "Broken", Rarity::Common, "missing"),
            card("c1", "Fixed", Rarity::Common, "base"),
        ];
        let report = Pipeline::new(&settings, &shapes, &engine)
            .run(&mut store, definitions)
            .unwrap();

        let codes: Vec<_> = report.failed.iter().map(|f| f.error.error_code()).collect();
        assert_eq!(codes, vec!["missing_base_template", "duplicate_definition"]);
        assert!(!store.has_template("c1"));
        assert_eq!(report.rarity_counts.get(Rarity::Common), 1);
        assert_eq!(report.loaded_counts, RarityCounts::new());
    }

    #[test]
    fn test_no_booster_shape_leaves_secure_containers() {
        let settings = settings();
        let mut shapes = shapes();
        shapes.booster_override = None;
        let engine = ProbabilityEngine::default();
        let mut store = store();

        let report = Pipeline::new(&settings, &shapes, &engine)
            .run(&mut store, vec![card("c1", "A", Rarity::Common, "base")])
            .unwrap();
        assert!(report.booster_id.is_none());
        assert_eq!(filter_of(&store, "gamma"), json!([]));
        assert_eq!(filter_of(&store, "sicc"), json!(["c1"]));
    }

    #[test]
    fn test_missing_theme_shape_is_recorded() {
        let settings = settings();
        let shapes = shapes();
        let engine = ProbabilityEngine::default();
        let mut store = store();

        let mut def = card("c1", "A", Rarity::Common, "base");
        def.theme = Some("flora".into());
        let report = Pipeline::new(&settings, &shapes, &engine)
            .run(&mut store, vec![def])
            .unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "binder_flora");
        assert!(store.has_template("booster"));
    }

    #[test]
    fn test_check_reports_without_mutation() {
        let settings = settings();
        let shapes = shapes();
        let engine = ProbabilityEngine::default();
        let store = store();

        let definitions = vec![
            card("c1", "A", Rarity::Common, "base"),
            card("c1", "A2", Rarity::Common, "base"),
            card("c2", "B", Rarity::Rare, "missing"),
        ];
        let problems = Pipeline::new(&settings, &shapes, &engine)
            .check(&store, &definitions)
            .unwrap();
        let names: Vec<_> = problems.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A2", "B"]);
    }
}
