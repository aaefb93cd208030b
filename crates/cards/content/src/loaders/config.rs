//! Pipeline settings loader.

use std::path::Path;

use cards_core::Settings;

use crate::loaders::{LoadResult, read_file};

/// Loader for pipeline settings from TOML files.
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from a TOML file.
    ///
    /// Missing keys take their defaults. The rarity weight table is carried
    /// through raw; it is validated when the pipeline runs.
    pub fn load(path: &Path) -> LoadResult<Settings> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse settings from TOML text.
    pub fn parse(content: &str) -> LoadResult<Settings> {
        let settings: Settings = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse settings TOML: {}", e))?;

        Ok(settings)
    }
}
