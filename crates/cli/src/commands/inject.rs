//! Run the injection pipeline against a store file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cards_content::{ContentFactory, StoreLoader};
use cards_content::loaders::definitions::RejectedFile;
use cards_core::{InjectKind, Pipeline, RarityWeights, RunReport, Settings};
use clap::Parser;
use console::style;

/// Run the full pipeline and write the updated store
#[derive(Parser)]
pub struct Inject {
    /// Content store JSON to read
    #[arg(short, long, env = "CARDS_STORE_PATH", value_name = "FILE")]
    store: PathBuf,

    /// Where to write the updated store (defaults to overwriting --store)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Run everything but skip writing the store
    #[arg(long)]
    dry_run: bool,
}

impl Inject {
    pub fn execute(self, factory: &ContentFactory, settings: &Settings) -> Result<()> {
        // nothing is loaded or persisted under a bad weight table
        RarityWeights::validate(&settings.rarity_weights).context("Invalid rarity_weights")?;

        let mut store = StoreLoader::load(&self.store)
            .with_context(|| format!("Failed to load store {}", self.store.display()))?;

        let engine = factory.prepare_engine(&store, settings.auto_update_probabilities)?;
        let cards = factory.load_definitions()?;
        let shapes = factory.load_shapes()?;

        let report = Pipeline::new(settings, &shapes, &engine)
            .run(&mut store, cards.definitions)
            .context("Pipeline aborted")?;

        if self.dry_run {
            tracing::info!("Dry run, store not written");
        } else {
            let output = self.output.as_ref().unwrap_or(&self.store);
            StoreLoader::save(output, &store)
                .with_context(|| format!("Failed to write store {}", output.display()))?;
            tracing::info!("Store written to {}", output.display());
        }

        print_summary(&report, &cards.rejected);
        Ok(())
    }
}

fn print_summary(report: &RunReport, rejected: &[RejectedFile]) {
    let cards = report
        .injected
        .iter()
        .filter(|r| r.kind == InjectKind::Card)
        .count();
    let containers = report.injected.len() - cards;

    println!("{}", style("=== Injection Summary ===").bold().green());
    println!();
    println!("{}", style("By rarity:").bold().yellow());
    for (rarity, count) in report.loaded_counts.iter() {
        println!("  {:<10} {}", rarity, count);
    }
    println!();
    println!("{} {}", style("Cards injected:").bold().cyan(), cards);
    println!("{} {}", style("Composites injected:").bold().cyan(), containers);
    println!("{} {}", style("Loot entries:").bold().cyan(), report.loot_entries());
    println!(
        "{} {}",
        style("Storage filter ids added:").bold().cyan(),
        report.storage_filters.inserted
    );
    if let Some(booster) = &report.booster_id {
        println!(
            "{} {} ({} secure filter ids added)",
            style("Empty booster:").bold().cyan(),
            booster,
            report.secure_filters.inserted
        );
    }
    println!(
        "{} {}",
        style("Optional writes skipped:").bold().cyan(),
        report.skipped_writes()
    );

    if !report.failed.is_empty() || !rejected.is_empty() {
        println!();
        println!("{}", style("Failed:").bold().red());
        for file in rejected {
            println!("  {} - {}", file.path.display(), file.reason);
        }
        for failure in &report.failed {
            println!("  {} - {}", failure.name, failure.error);
        }
    }
}
