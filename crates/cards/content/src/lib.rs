//! Data-file loaders for the card injection pipeline.
//!
//! This crate reads everything `cards-core` consumes from disk:
//! - Pipeline settings (TOML)
//! - Card definitions, each merged over a shared base (JSON)
//! - Composite container shapes (JSON)
//! - The loot baseline snapshot (JSON, rewritten atomically)
//! - The content store itself (JSON)
//!
//! All loaders deserialize straight into `cards-core` types with serde.

pub mod loaders;

pub use loaders::{
    ContentFactory, DefinitionLoader, DefinitionSet, RejectedFile, SettingsLoader, ShapeLoader,
    SnapshotLoader, StoreLoader,
};
