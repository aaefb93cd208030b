//! Content loaders for reading pipeline inputs from files.

pub mod config;
pub mod definitions;
pub mod factory;
pub mod shapes;
pub mod snapshot;
pub mod store;

pub use config::SettingsLoader;
pub use definitions::{DefinitionLoader, DefinitionSet, RejectedFile};
pub use factory::ContentFactory;
pub use shapes::ShapeLoader;
pub use snapshot::SnapshotLoader;
pub use store::StoreLoader;

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

/// Read and parse a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> LoadResult<T> {
    let content = read_file(path)?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse JSON at {}: {}", path.display(), e))
}

/// Write `bytes` next to `path` and rename over it, so readers never observe
/// a partially written file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> LoadResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", parent.display(), e))?;
    }

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, bytes)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", temp_path.display(), e))?;
    fs::rename(&temp_path, path)
        .map_err(|e| anyhow::anyhow!("Failed to replace {}: {}", path.display(), e))?;

    tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
