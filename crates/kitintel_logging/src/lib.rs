//! Shared logging setup for the kitintel binary.
//!
//! Two sinks: a daily-rolling plain-text file under the logs directory that
//! records everything the filter allows, and stderr, which stays at `warn`
//! unless the user asked for verbose output. Stdout is left alone so command
//! output (JSON, CSV, artifact content) can be piped.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_FILTER: &str = "kitintel=info,kitintel_submit=info";

/// Logging configuration for a kitintel process.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Defaults to `~/.kitintel/logs` when unset.
    pub log_dir: Option<PathBuf>,
}

/// Keeps the background file writer alive; flushes on drop.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize tracing with a rolling file writer and stderr output.
///
/// A log directory that cannot be created only disables the file sink.
pub fn init_logging(config: LogConfig<'_>) -> Result<LogGuard> {
    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    } else {
        EnvFilter::new("warn")
    };

    let log_dir = config
        .log_dir
        .unwrap_or_else(kitintel_protocol::paths::default_logs_dir);

    let mut file_guard = None;
    let file_layer = match ensure_logs_dir(&log_dir) {
        Ok(dir) => {
            let appender =
                tracing_appender::rolling::daily(dir, log_file_name(config.app_name));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_guard = Some(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(file_filter),
            )
        }
        Err(err) => {
            eprintln!("Warning: file logging disabled: {:#}", err);
            None
        }
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LogGuard {
        _file_guard: file_guard,
    })
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create logs directory: {}", dir.display()))?;
    Ok(dir.to_path_buf())
}

fn log_file_name(app_name: &str) -> String {
    let base: String = app_name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    format!("{}.log", base)
}
