//! Composite container shape loader.
//!
//! Expected layout, every file optional:
//! ```text
//! config/
//! ├── binder_base.json
//! ├── container_base.json
//! └── containers/
//!     ├── ttc_binder_<theme>.json
//!     ├── ttc_collector_album.json
//!     └── ttc_empty_booster_pack.json
//! ```
//! A composite whose files are absent is simply not built.

use std::path::Path;

use cards_core::CompositeShapes;
use serde_json::Value;

use crate::loaders::{LoadResult, read_json};

const BINDER_PREFIX: &str = "ttc_binder_";
const ALBUM_FILE: &str = "ttc_collector_album.json";
const BOOSTER_FILE: &str = "ttc_empty_booster_pack.json";

/// Loader for composite shapes.
pub struct ShapeLoader;

impl ShapeLoader {
    pub fn load(config_dir: &Path) -> LoadResult<CompositeShapes> {
        let containers_dir = config_dir.join("containers");

        let mut shapes = CompositeShapes {
            binder_base: read_optional(&config_dir.join("binder_base.json"))?,
            container_base: read_optional(&config_dir.join("container_base.json"))?,
            album_override: read_optional(&containers_dir.join(ALBUM_FILE))?,
            booster_override: read_optional(&containers_dir.join(BOOSTER_FILE))?,
            ..Default::default()
        };

        if containers_dir.is_dir() {
            for entry in std::fs::read_dir(&containers_dir)? {
                let path = entry?.path();
                let Some(theme) = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .and_then(|name| name.strip_prefix(BINDER_PREFIX))
                    .and_then(|name| name.strip_suffix(".json"))
                else {
                    continue;
                };
                let theme = theme.to_string();
                shapes.binder_overrides.insert(theme, read_json(&path)?);
            }
        }

        tracing::debug!(
            "Loaded composite shapes: {} themed binder(s), album={}, booster={}",
            shapes.binder_overrides.len(),
            shapes.album_override.is_some(),
            shapes.booster_override.is_some()
        );
        Ok(shapes)
    }
}

fn read_optional(path: &Path) -> LoadResult<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    read_json(path).map(Some)
}
