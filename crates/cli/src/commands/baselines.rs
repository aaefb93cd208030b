//! Regenerate the loot baseline snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cards_content::{ContentFactory, StoreLoader};
use clap::Parser;
use console::style;

/// Regenerate probabilities.json from the store's loot tables
#[derive(Parser)]
pub struct Baselines {
    /// Content store JSON to scan
    #[arg(short, long, env = "CARDS_STORE_PATH", value_name = "FILE")]
    store: PathBuf,
}

impl Baselines {
    pub fn execute(self, factory: &ContentFactory) -> Result<()> {
        let store = StoreLoader::load(&self.store)
            .with_context(|| format!("Failed to load store {}", self.store.display()))?;

        let engine = factory.prepare_engine(&store, true)?;

        let containers: usize = engine.table().values().map(|c| c.len()).sum();
        println!(
            "{} {} map(s), {} container(s)",
            style("Baselines written:").bold().green(),
            engine.table().len(),
            containers
        );
        println!("{} {}", style("File:").bold().cyan(), factory.snapshot_path().display());
        Ok(())
    }
}
