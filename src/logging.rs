//! Process logging: stderr console output plus an append-only log file

use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Result, SubwatchError};

/// Log file name inside the log directory
pub const LOG_FILE: &str = "subwatch.log";

/// Filter for the log file: our own events at debug, everyone else's at warn
pub fn file_filter() -> Targets {
    Targets::new()
        .with_target("subwatch", Level::DEBUG)
        .with_default(Level::WARN)
}

/// Install the global subscriber
///
/// The console layer honours `RUST_LOG` (default `warn`). The returned guard
/// must stay alive for buffered file output to be flushed.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(file_filter()),
        )
        .try_init()
        .map_err(|e| SubwatchError::ConfigError(format!("Failed to initialise logging: {}", e)))?;

    Ok(guard)
}
