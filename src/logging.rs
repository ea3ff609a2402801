//! File-based tracing setup
//!
//! The TUI owns stdout, so log output goes to
//! ~/.local/share/mindfulme/mindfulme.log instead.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "mindfulme.log";

/// Get the log file path
pub fn log_file_path() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .context("Could not determine data directory")?
        .join("mindfulme");
    Ok(data_dir.join(LOG_FILE_NAME))
}

/// Build the filter: RUST_LOG wins, otherwise `level` for this crate
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,mindfulme={}", level)))
}

/// Install the global subscriber. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init(level: &str) -> Result<WorkerGuard> {
    let path = log_file_path()?;
    let dir = path
        .parent()
        .context("Log file path has no parent directory")?;

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {:?}", dir))?;

    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name() {
        if let Ok(path) = log_file_path() {
            assert!(path.ends_with("mindfulme/mindfulme.log"));
        }
    }
}
