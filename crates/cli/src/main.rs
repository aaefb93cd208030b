//! Command-line host for the card injection pipeline.
//!
//! Run with: `card-injector <command> --store <database.json>`

mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use cards_content::ContentFactory;
use clap::{Parser, Subcommand};
use commands::{Baselines, Inject, Validate};

/// Inject trading cards into a content database
#[derive(Parser)]
#[command(name = "card-injector")]
#[command(about = "Trading card content injection", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding mod_config.toml, card and container files
    #[arg(long, global = true, env = "CARDS_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Also write logs to a file under the platform cache directory
    #[arg(long, global = true, env = "CARDS_LOG_FILE")]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline and write the updated store
    Inject(Inject),

    /// Regenerate probabilities.json from the store's loot tables
    Baselines(Baselines),

    /// Check configuration and definitions without writing anything
    Validate(Validate),
}

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let factory = ContentFactory::new(&cli.config_dir);
    let settings = factory.load_settings()?;

    logging::setup_logging(settings.debug, cli.log_file)?;

    match cli.command {
        Command::Inject(cmd) => cmd.execute(&factory, &settings),
        Command::Baselines(cmd) => cmd.execute(&factory),
        Command::Validate(cmd) => cmd.execute(&factory, &settings),
    }
}
