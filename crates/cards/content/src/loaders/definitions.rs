//! Card definition loader.
//!
//! Every `*.json` file in the cards directory holds one card's overrides.
//! Each is shallow-merged over the shared base definition before it is
//! deserialized, so a card file only lists what differs from the base.
//!
//! A card file that cannot be read, parsed or deserialized is skipped and
//! reported in [`DefinitionSet::rejected`]; the remaining cards still load.

use std::path::{Path, PathBuf};

use cards_core::Definition;
use serde_json::Value;

use crate::loaders::{LoadResult, read_json};

/// A card file that did not produce a definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of loading a cards directory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DefinitionSet {
    /// Loaded definitions in file-name order.
    pub definitions: Vec<Definition>,
    pub rejected: Vec<RejectedFile>,
}

/// Loader for card definitions.
pub struct DefinitionLoader;

impl DefinitionLoader {
    /// Load every card in `cards_dir` merged over the base at `base_path`.
    ///
    /// Files are read in file-name order so runs are reproducible.
    ///
    /// # Errors
    ///
    /// Only when the base file or the directory itself is unusable. Bad card
    /// files end up in [`DefinitionSet::rejected`].
    pub fn load(base_path: &Path, cards_dir: &Path) -> LoadResult<DefinitionSet> {
        let base: Value = read_json(base_path)?;

        let mut set = DefinitionSet::default();
        for path in Self::card_files(cards_dir)? {
            match Self::load_card(&base, &path) {
                Ok(definition) => set.definitions.push(definition),
                Err(e) => {
                    tracing::warn!(file = %path.display(), "Skipping card file: {}", e);
                    set.rejected.push(RejectedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            "Loaded {} card definition(s) from {} ({} rejected)",
            set.definitions.len(),
            cards_dir.display(),
            set.rejected.len()
        );
        Ok(set)
    }

    fn load_card(base: &Value, path: &Path) -> LoadResult<Definition> {
        let overrides: Value = read_json(path)?;
        Definition::from_layers(base, &overrides)
            .map_err(|e| anyhow::anyhow!("Invalid card definition {}: {}", path.display(), e))
    }

    /// JSON files directly inside `cards_dir`, sorted by name.
    fn card_files(cards_dir: &Path) -> LoadResult<Vec<PathBuf>> {
        let entries = std::fs::read_dir(cards_dir).map_err(|e| {
            anyhow::anyhow!("Failed to read cards directory {}: {}", cards_dir.display(), e)
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use cards_core::Rarity;
    use tempfile::TempDir;

    use super::*;

    const BASE: &str = r#"{
        "id": "",
        "item_name": "",
        "item_short_name": "",
        "clone_item": "5c12613b86f7743bbe2c3f76",
        "item_parent": "5448ecbe4bdc2d60728b4568",
        "rarity": "Common",
        "sold": true,
        "stock_amount": 5,
        "ExternalSize": { "width": 1, "height": 1 }
    }"#;

    fn setup() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("card_base.json"), BASE).unwrap();
        fs::create_dir(temp_dir.path().join("cards")).unwrap();
        temp_dir
    }

    #[test]
    fn test_load_merges_and_sorts() {
        let temp_dir = setup();
        let cards = temp_dir.path().join("cards");
        fs::write(
            cards.join("b_wolf.json"),
            r#"{ "id": "wolf", "item_name": "Wolf", "item_short_name": "Wolf", "rarity": "Epic" }"#,
        )
        .unwrap();
        fs::write(
            cards.join("a_fox.json"),
            r#"{ "id": "fox", "item_name": "Fox", "item_short_name": "Fox", "sold": false }"#,
        )
        .unwrap();
        fs::write(cards.join("notes.txt"), "ignored").unwrap();

        let set =
            DefinitionLoader::load(&temp_dir.path().join("card_base.json"), &cards).unwrap();
        assert!(set.rejected.is_empty());
        let defs = set.definitions;
        let ids: Vec<_> = defs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["fox", "wolf"]);

        assert!(!defs[0].sold);
        assert_eq!(defs[0].rarity, Rarity::Common);
        assert!(defs[1].sold);
        assert_eq!(defs[1].rarity, Rarity::Epic);
        assert_eq!(defs[1].stock_amount, 5);
    }

    #[test]
    fn test_invalid_card_is_skipped() {
        let temp_dir = setup();
        let cards = temp_dir.path().join("cards");
        fs::write(
            cards.join("a_good.json"),
            r#"{ "id": "good", "item_name": "Good", "item_short_name": "Good" }"#,
        )
        .unwrap();
        fs::write(cards.join("b_bad.json"), r#"{ "id": "bad", "rarity": "Mythic" }"#).unwrap();
        fs::write(cards.join("c_truncated.json"), r#"{ "id": "#).unwrap();

        let set =
            DefinitionLoader::load(&temp_dir.path().join("card_base.json"), &cards).unwrap();

        let ids: Vec<_> = set.definitions.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["good"]);

        assert_eq!(set.rejected.len(), 2);
        assert_eq!(set.rejected[0].path, cards.join("b_bad.json"));
        assert!(set.rejected[0].reason.contains("b_bad.json"));
        assert_eq!(set.rejected[1].path, cards.join("c_truncated.json"));
    }

    #[test]
    fn test_missing_base_is_fatal() {
        let temp_dir = setup();
        let cards = temp_dir.path().join("cards");
        let err = DefinitionLoader::load(&temp_dir.path().join("nope.json"), &cards).unwrap_err();
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn test_missing_cards_dir() {
        let temp_dir = setup();
        let err = DefinitionLoader::load(
            &temp_dir.path().join("card_base.json"),
            &temp_dir.path().join("nope"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("cards directory"));
    }
}
