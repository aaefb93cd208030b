//! Content store loader.

use std::path::Path;

use cards_core::ContentStore;

use crate::loaders::{LoadResult, read_json, write_atomic};

/// Reads and writes the content store as one JSON document.
pub struct StoreLoader;

impl StoreLoader {
    pub fn load(path: &Path) -> LoadResult<ContentStore> {
        let store: ContentStore = read_json(path)?;
        tracing::debug!(
            "Loaded store from {}: {} template(s), {} trader(s), {} location(s)",
            path.display(),
            store.templates.items.len(),
            store.traders.len(),
            store.locations.len()
        );
        Ok(store)
    }

    /// Replace the store file atomically.
    pub fn save(path: &Path, store: &ContentStore) -> LoadResult<()> {
        let bytes = serde_json::to_vec(store)
            .map_err(|e| anyhow::anyhow!("Failed to serialize content store: {}", e))?;
        write_atomic(path, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_round_trip_keeps_unknown_tables() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("database.json");
        std::fs::write(
            &path,
            json!({
                "templates": { "items": { "a": { "_id": "a" } }, "quests": { "q1": {} } },
                "bots": { "types": {} }
            })
            .to_string(),
        )
        .unwrap();

        let store = StoreLoader::load(&path).unwrap();
        assert!(store.has_template("a"));

        StoreLoader::save(&path, &store).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["bots"], json!({ "types": {} }));
        assert_eq!(raw["templates"]["quests"], json!({ "q1": {} }));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("database.json");
        std::fs::write(&path, "{ \"templates\": ").unwrap();

        let err = StoreLoader::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
