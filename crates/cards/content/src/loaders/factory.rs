//! Content factory for loading pipeline inputs from a config directory.

use std::path::{Path, PathBuf};

use cards_core::{BaselineTable, CompositeShapes, ContentStore, ProbabilityEngine, Settings};

use crate::loaders::{
    DefinitionLoader, DefinitionSet, LoadResult, SettingsLoader, ShapeLoader, SnapshotLoader,
};

/// Content factory that loads all pipeline inputs from a config directory.
///
/// # Directory Structure
///
/// ```text
/// config_dir/
/// ├── mod_config.toml
/// ├── probabilities.json
/// ├── card_base.json
/// ├── binder_base.json
/// ├── container_base.json
/// ├── cards/
/// │   ├── ttc_fox.json
/// │   └── ttc_wolf.json
/// └── containers/
///     ├── ttc_binder_fauna.json
///     └── ttc_empty_booster_pack.json
/// ```
pub struct ContentFactory {
    config_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a config directory.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Load settings from `mod_config.toml`.
    pub fn load_settings(&self) -> LoadResult<Settings> {
        SettingsLoader::load(&self.config_dir.join("mod_config.toml"))
    }

    /// Load card definitions from `cards/`, each merged over `card_base.json`.
    ///
    /// Unusable card files are skipped and listed in the returned set.
    pub fn load_definitions(&self) -> LoadResult<DefinitionSet> {
        DefinitionLoader::load(
            &self.config_dir.join("card_base.json"),
            &self.config_dir.join("cards"),
        )
    }

    /// Load composite shapes from the base files and `containers/`.
    pub fn load_shapes(&self) -> LoadResult<CompositeShapes> {
        ShapeLoader::load(&self.config_dir)
    }

    /// Path of the persisted baseline snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.config_dir.join("probabilities.json")
    }

    pub fn load_snapshot(&self) -> LoadResult<Option<BaselineTable>> {
        SnapshotLoader::load(&self.snapshot_path())
    }

    pub fn save_snapshot(&self, table: &BaselineTable) -> LoadResult<()> {
        SnapshotLoader::save(&self.snapshot_path(), table)
    }

    /// Build the probability engine for a run.
    ///
    /// With `regenerate` set, baselines are recomputed from `store`, merged
    /// over the snapshot and the merged table is written back.
    pub fn prepare_engine(
        &self,
        store: &ContentStore,
        regenerate: bool,
    ) -> LoadResult<ProbabilityEngine> {
        let snapshot = self.load_snapshot()?;
        let engine = ProbabilityEngine::prepare(snapshot, store, regenerate);
        if regenerate {
            self.save_snapshot(engine.table())?;
            tracing::info!("{} auto-updated", self.snapshot_path().display());
        }
        Ok(engine)
    }

    /// Returns the config directory path.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}
