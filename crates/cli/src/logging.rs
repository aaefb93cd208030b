//! Tracing setup: stderr always, a log file on request.

use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Platform-specific log directory.
///
/// - macOS: `~/Library/Caches/card-injector/logs`
/// - Linux: `~/.cache/card-injector/logs` (or `$XDG_CACHE_HOME/card-injector/logs`)
/// - Windows: `%LOCALAPPDATA%\card-injector\cache\logs`
/// - Fallback: `/tmp/card-injector/logs`
pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "card-injector")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/card-injector"))
        .join("logs")
}

/// Default level is `info`, or `debug` when the config's debug switch is on.
/// `RUST_LOG` overrides both.
fn env_filter(debug: bool) -> EnvFilter {
    let default_level = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

pub fn setup_logging(debug: bool, log_to_file: bool) -> Result<()> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    if !log_to_file {
        tracing_subscriber::registry()
            .with(env_filter(debug))
            .with(stderr_layer)
            .init();
        return Ok(());
    }

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "card-injector.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(stderr_layer)
        .with(file_layer)
        .init();

    // Leak the guard to keep file writer alive
    std::mem::forget(guard);

    tracing::info!("Log file: {}/card-injector.log", log_dir.display());
    Ok(())
}
