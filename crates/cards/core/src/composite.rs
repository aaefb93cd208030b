//! Composite containers derived from the injected card set.
//!
//! Three kinds are built, each from a base shape shallow-merged with a
//! per-composite override:
//!
//! | Composite       | Base shape       | Layout                                  |
//! |-----------------|------------------|-----------------------------------------|
//! | themed binder   | `binder_base`    | one mount slot per card of the theme    |
//! | collector album | `binder_base`    | one mount slot per card, every theme    |
//! | empty booster   | `container_base` | one 4x4 grid accepting every card       |
//!
//! Slot and grid ids are the first 24 hex digits of `sha256("<parent>:<name>")`
//! so a rebuild over the same cards yields the same template.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::definition::{Definition, ExternalSize};
use crate::error::{InjectError, Result};
use crate::rarity;
use crate::store::ContentStore;

/// Side length of the empty booster's single grid.
pub const BOOSTER_GRID_SIDE: u32 = 4;

const SLOT_ID_LEN: usize = 24;

/// Raw shapes for every composite, as read from the container config files.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositeShapes {
    /// Shared base for binders and the album.
    pub binder_base: Option<Value>,
    /// Shared base for the booster.
    pub container_base: Option<Value>,
    /// Theme name → binder override.
    pub binder_overrides: BTreeMap<String, Value>,
    pub album_override: Option<Value>,
    pub booster_override: Option<Value>,
}

/// Content-addressed identifier for a slot or grid under `parent_id`.
pub fn slot_id(parent_id: &str, name: &str) -> String {
    let digest = Sha256::digest(format!("{parent_id}:{name}").as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(SLOT_ID_LEN);
    id
}

/// Cards grouped by theme. Cards without a theme are left out.
pub fn group_by_theme(cards: &[Definition]) -> BTreeMap<&str, Vec<&Definition>> {
    let mut themes: BTreeMap<&str, Vec<&Definition>> = BTreeMap::new();
    for card in cards {
        if let Some(theme) = card.theme.as_deref() {
            themes.entry(theme).or_default().push(card);
        }
    }
    themes
}

/// Sort cards by ascending rarity, then by display name.
pub fn sort_cards<'c>(cards: impl IntoIterator<Item = &'c Definition>) -> Vec<&'c Definition> {
    let mut sorted: Vec<&Definition> = cards.into_iter().collect();
    sorted.sort_by(|a, b| {
        rarity::compare(
            (a.rarity, a.item_name.as_str()),
            (b.rarity, b.item_name.as_str()),
        )
    });
    sorted
}

/// One mount slot per card, in the given order, each accepting only its card.
pub fn mount_slots(parent_id: &str, cards: &[&Definition]) -> Vec<Value> {
    cards
        .iter()
        .map(|card| {
            let name = format!("mod_mount_{}", card.id);
            json!({
                "_id": slot_id(parent_id, &name),
                "_name": name,
                "_parent": parent_id,
                "_type": "Slot",
                "_props": {
                    "filters": [{ "Filter": [card.id], "ExcludedFilter": [] }],
                    "required": false,
                    "max_count": 1,
                    "iconId": "mount"
                }
            })
        })
        .collect()
}

/// Builds composite definitions against a read-only view of the store.
pub struct CompositeBuilder<'a> {
    shapes: &'a CompositeShapes,
    store: &'a ContentStore,
}

impl<'a> CompositeBuilder<'a> {
    pub fn new(shapes: &'a CompositeShapes, store: &'a ContentStore) -> Self {
        Self { shapes, store }
    }

    /// Binder holding exactly the cards of `theme`.
    ///
    /// # Errors
    ///
    /// - [`InjectError::MissingCompositeShape`] if the binder base or the
    ///   theme's override is absent
    /// - [`InjectError::MissingBaseTemplate`] if the base shape's clone source
    ///   is not in the store
    /// - [`InjectError::InvalidDefinition`] if the merged shape does not
    ///   deserialize
    pub fn themed_binder(&self, theme: &str, cards: &[&Definition]) -> Result<Definition> {
        let base = required(self.shapes.binder_base.as_ref(), "binder_base")?;
        let overrides = required(
            self.shapes.binder_overrides.get(theme),
            &format!("binder_{theme}"),
        )?;

        let binder = self.slotted(base, overrides, cards)?;
        tracing::info!("Card binder '{}' built with {} cards", theme, cards.len());
        Ok(binder)
    }

    /// Album holding every card regardless of theme. `None` without an album
    /// override.
    pub fn collector_album(&self, cards: &[&Definition]) -> Result<Option<Definition>> {
        let Some(overrides) = self.shapes.album_override.as_ref() else {
            return Ok(None);
        };
        let base = required(self.shapes.binder_base.as_ref(), "binder_base")?;

        let album = self.slotted(base, overrides, cards)?;
        tracing::info!("Collector album built with {} cards", cards.len());
        Ok(Some(album))
    }

    /// Booster with one grid accepting every card. `None` without a booster
    /// override.
    pub fn empty_booster(&self, cards: &[&Definition]) -> Result<Option<Definition>> {
        let Some(overrides) = self.shapes.booster_override.as_ref() else {
            return Ok(None);
        };
        let base = required(self.shapes.container_base.as_ref(), "container_base")?;

        let mut booster = self.shape(base, overrides)?;
        let allowed: Vec<&str> = cards.iter().map(|c| c.id.as_str()).collect();
        booster.grids = Some(vec![json!({
            "_id": slot_id(&booster.id, "emptyBooster"),
            "_name": "emptyBooster",
            "_parent": booster.id,
            "_props": {
                "cellsH": BOOSTER_GRID_SIDE,
                "cellsV": BOOSTER_GRID_SIDE,
                "minCount": 0,
                "filters": [{ "Filter": allowed, "ExcludedFilter": [] }]
            }
        })]);

        tracing::info!(
            "Empty booster built successfully, accepting {} cards",
            cards.len()
        );
        Ok(Some(booster))
    }

    fn slotted(&self, base: &Value, overrides: &Value, cards: &[&Definition]) -> Result<Definition> {
        let mut binder = self.shape(base, overrides)?;
        let sorted = sort_cards(cards.iter().copied());
        binder.slots = Some(mount_slots(&binder.id, &sorted));
        binder.external_size = ExternalSize {
            width: 1,
            height: 1,
        };
        Ok(binder)
    }

    /// Merge the shape layers and inherit the clone source's parent.
    fn shape(&self, base: &Value, overrides: &Value) -> Result<Definition> {
        let mut definition = Definition::from_layers(base, overrides)
            .map_err(|e| InjectError::InvalidDefinition(format!("composite shape: {e}")))?;

        let parent = self
            .store
            .parent_of(&definition.clone_item)
            .ok_or_else(|| InjectError::MissingBaseTemplate {
                definition: definition.item_short_name.clone(),
                clone_source: definition.clone_item.clone(),
            })?;
        definition.item_parent = parent.to_string();
        definition.lootable = false;
        definition.theme = None;
        Ok(definition)
    }
}

fn required<'v>(shape: Option<&'v Value>, name: &str) -> Result<&'v Value> {
    shape.ok_or_else(|| InjectError::MissingCompositeShape {
        name: name.to_string(),
    })
}
