//! Grid filter maintenance on existing container templates.
//!
//! Two routines share the same walk over `_props.Grids[*]._props.filters[*]`:
//! - compat repair installs a default filter on legacy gear grids that lack one
//! - filter extension makes a set of containers accept a set of item ids

use serde_json::{Value, json};

use crate::store::ContentStore;

/// Backpack and simple container parent categories whose first grid may lack
/// a filter list.
pub const COMPAT_PARENTS: [&str; 2] = ["5448e53e4bdc2d60728b4567", "5448bf274bdc2dfc2f8b456a"];

/// Excluded from compat repair.
pub const COMPAT_EXEMPT: &str = "5c0a794586f77461c458f892";

/// Base item category accepted by the default compat filter.
pub const COMPAT_FILTER_ITEM: &str = "54009119af1c881c07000029";

/// Install a minimal default filter on compat-parent templates whose primary
/// grid has none. Returns how many templates were repaired.
pub fn ensure_compat_filters(store: &mut ContentStore) -> usize {
    let mut repaired = 0;

    for (id, template) in store.templates.items.iter_mut() {
        if id == COMPAT_EXEMPT {
            continue;
        }
        let parent = template.get("_parent").and_then(Value::as_str);
        if !parent.is_some_and(|p| COMPAT_PARENTS.contains(&p)) {
            continue;
        }

        let Some(grid_props) = template
            .pointer_mut("/_props/Grids/0/_props")
            .and_then(Value::as_object_mut)
        else {
            continue;
        };
        if grid_props.get("filters").is_some_and(|f| !f.is_null()) {
            continue;
        }

        grid_props.insert(
            "filters".into(),
            json!([{ "Filter": [COMPAT_FILTER_ITEM], "ExcludedFilter": [""] }]),
        );
        repaired += 1;
    }

    if repaired > 0 {
        tracing::debug!("Installed compat filters on {} template(s)", repaired);
    }
    repaired
}

/// Outcome of one filter-extension pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterExtension {
    /// Ids appended across all filters.
    pub inserted: usize,
    /// Container ids that were absent or had no grids.
    pub missing: Vec<String>,
}

/// Ensure every filter on every grid of `containers` accepts all of `item_ids`.
///
/// Membership is checked before each append, so running the pass twice
/// inserts nothing the second time.
pub fn extend_container_filters<S: AsRef<str>>(
    store: &mut ContentStore,
    containers: &[S],
    item_ids: &[S],
) -> FilterExtension {
    let mut outcome = FilterExtension::default();

    for container_id in containers {
        let container_id = container_id.as_ref();
        let grids = store
            .template_mut(container_id)
            .and_then(|tpl| tpl.pointer_mut("/_props/Grids"))
            .and_then(Value::as_array_mut);
        let Some(grids) = grids else {
            tracing::debug!("Container {} has no grids, cannot extend its filter", container_id);
            outcome.missing.push(container_id.to_string());
            continue;
        };

        for grid in grids.iter_mut() {
            let Some(filters) = grid
                .pointer_mut("/_props/filters")
                .and_then(Value::as_array_mut)
            else {
                continue;
            };

            for filter in filters.iter_mut() {
                let Some(allowed) = filter.get_mut("Filter").and_then(Value::as_array_mut) else {
                    continue;
                };
                for id in item_ids {
                    let id = id.as_ref();
                    if !allowed.iter().any(|v| v.as_str() == Some(id)) {
                        allowed.push(Value::String(id.to_string()));
                        outcome.inserted += 1;
                    }
                }
            }
        }
    }

    outcome
}
