//! Persisted loot baseline snapshot (`probabilities.json`).

use std::path::Path;

use cards_core::BaselineTable;

use crate::loaders::{LoadResult, read_json, write_atomic};

/// Reads and writes the baseline snapshot.
pub struct SnapshotLoader;

impl SnapshotLoader {
    /// Load the snapshot if the file exists.
    pub fn load(path: &Path) -> LoadResult<Option<BaselineTable>> {
        if !path.exists() {
            tracing::debug!("No baseline snapshot at {}", path.display());
            return Ok(None);
        }

        let table: BaselineTable = read_json(path)?;
        tracing::debug!(
            "Loaded baselines for {} map(s) from {}",
            table.len(),
            path.display()
        );
        Ok(Some(table))
    }

    /// Replace the snapshot atomically with pretty-printed JSON.
    pub fn save(path: &Path, table: &BaselineTable) -> LoadResult<()> {
        let bytes = serde_json::to_vec_pretty(table)
            .map_err(|e| anyhow::anyhow!("Failed to serialize baselines: {}", e))?;
        write_atomic(path, &bytes)
    }
}
