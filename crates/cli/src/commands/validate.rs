//! Check configuration and definitions without writing anything.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cards_content::{ContentFactory, StoreLoader};
use cards_core::{Pipeline, ProbabilityEngine, RarityWeights, Settings};
use clap::Parser;
use console::style;

/// Check configuration and definitions without writing anything
#[derive(Parser)]
pub struct Validate {
    /// Content store JSON; when given, clone sources are checked against it
    #[arg(short, long, env = "CARDS_STORE_PATH", value_name = "FILE")]
    store: Option<PathBuf>,
}

impl Validate {
    pub fn execute(self, factory: &ContentFactory, settings: &Settings) -> Result<()> {
        RarityWeights::validate(&settings.rarity_weights).context("Invalid rarity_weights")?;
        let cards = factory.load_definitions()?;
        let shapes = factory.load_shapes()?;

        println!(
            "{} {} definition(s), {} themed binder shape(s)",
            style("Loaded:").bold().cyan(),
            cards.definitions.len(),
            shapes.binder_overrides.len()
        );

        let mut problems: Vec<(String, String)> = cards
            .rejected
            .iter()
            .map(|file| (file.path.display().to_string(), file.reason.clone()))
            .collect();

        if let Some(store_path) = self.store {
            let store = StoreLoader::load(&store_path)
                .with_context(|| format!("Failed to load store {}", store_path.display()))?;
            let engine = ProbabilityEngine::default();
            let failures =
                Pipeline::new(settings, &shapes, &engine).check(&store, &cards.definitions)?;
            problems.extend(
                failures
                    .into_iter()
                    .map(|failure| (failure.name, failure.error.to_string())),
            );
        }

        if problems.is_empty() {
            println!("{}", style("Configuration OK").bold().green());
            return Ok(());
        }

        println!("{}", style("Problems:").bold().red());
        for (name, reason) in &problems {
            println!("  {} - {}", name, reason);
        }
        anyhow::bail!("{} definition(s) would be skipped", problems.len())
    }
}
