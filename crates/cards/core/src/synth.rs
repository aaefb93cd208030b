//! Template synthesis: clone a base template and overlay definition fields.
//!
//! Overlay precedence, later layers win:
//!
//! ```text
//! 1. clone source        deep copy of the existing template
//! 2. _props override     definition's raw property block, merged key by key
//! 3. Slots / Grids       definition's structural overrides, written into _props
//! 4. identity            _id, _name, _parent
//! 5. presentation        prefab, names, colour, size, weight, sound, examine flag
//! 6. market flags        CanSellOnRagfair / CanRequireOnRagfair from one switch
//! 7. safety fields       fixed values that keep the item inert in gameplay
//! ```

use serde_json::{Map, Value, json};

use crate::definition::Definition;
use crate::error::{InjectError, Result};
use crate::settings::Settings;

/// Effective trader price: explicit positive price, else the rarity fallback.
pub fn trader_price(definition: &Definition, settings: &Settings) -> u64 {
    definition
        .explicit_price()
        .unwrap_or_else(|| settings.fallback_price(definition.rarity))
}

/// Build a new, independent item template for `definition`.
///
/// # Errors
///
/// [`InjectError::MalformedTemplate`] if the clone source is not a JSON object
/// or its `_props` is not an object.
pub fn synthesize(
    definition: &Definition,
    clone_source: &Value,
    settings: &Settings,
) -> Result<Value> {
    let mut template = clone_source
        .as_object()
        .cloned()
        .ok_or_else(|| malformed(definition, "clone source is not an object"))?;

    let mut props = match template.remove("_props") {
        Some(Value::Object(props)) => props,
        None | Some(Value::Null) => Map::new(),
        Some(_) => return Err(malformed(definition, "clone source _props is not an object")),
    };

    if let Some(overrides) = &definition.props {
        overlay(&mut props, overrides);
    }
    if let Some(slots) = &definition.slots {
        props.insert("Slots".into(), Value::Array(slots.clone()));
    }
    if let Some(grids) = &definition.grids {
        props.insert("Grids".into(), Value::Array(grids.clone()));
    }

    template.insert("_id".into(), json!(definition.id));
    template.insert("_name".into(), json!(definition.item_name));
    template.insert("_parent".into(), json!(definition.item_parent));

    overlay(&mut props, &presentation_layer(definition, settings));
    overlay(&mut props, &market_layer(settings));
    overlay(&mut props, &safety_layer());

    if settings.cards_tradeable_on_flea {
        tracing::debug!(
            "Card {} configured for flea market trading",
            definition.item_short_name
        );
    }

    template.insert("_props".into(), Value::Object(props));
    Ok(Value::Object(template))
}

/// Shallow merge: each key of `layer` replaces the same key in `target`.
fn overlay(target: &mut Map<String, Value>, layer: &Map<String, Value>) {
    for (key, value) in layer {
        target.insert(key.clone(), value.clone());
    }
}

fn presentation_layer(definition: &Definition, settings: &Settings) -> Map<String, Value> {
    let examined = definition
        .examined_by_default
        .unwrap_or(settings.cards_examined_by_default);

    into_map(json!({
        "Prefab": { "path": definition.item_prefab_path },
        "Name": definition.item_name,
        "ShortName": definition.item_short_name,
        "Description": definition.item_description,
        "BackgroundColor": definition.color,
        "StackMaxSize": definition.stack_max_size,
        "Weight": definition.weight,
        "Width": definition.external_size.width,
        "Height": definition.external_size.height,
        "ItemSound": definition.item_sound,
        "ExaminedByDefault": examined,
    }))
}

fn market_layer(settings: &Settings) -> Map<String, Value> {
    let tradeable = settings.cards_tradeable_on_flea;
    into_map(json!({
        "CanSellOnRagfair": tradeable,
        "CanRequireOnRagfair": tradeable,
    }))
}

fn safety_layer() -> Map<String, Value> {
    into_map(json!({
        "ConflictingItems": [],
        "Unlootable": false,
        "UnlootableFromSlot": "FirstPrimaryWeapon",
        "UnlootableFromSide": [],
        "AnimationVariantsNumber": 0,
        "DiscardingBlock": false,
        "RagFairCommissionModifier": 1,
        "IsAlwaysAvailableForInsurance": false,
        "InsuranceDisabled": true,
        "QuestItem": false,
    }))
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn malformed(definition: &Definition, reason: &str) -> InjectError {
    InjectError::MalformedTemplate {
        id: definition.clone_item.clone(),
        reason: reason.to_string(),
    }
}
