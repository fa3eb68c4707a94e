//! Logging initialization for the demo wallet.
//!
//! Logs go to stderr by default so they interleave with the step output;
//! with `logging.to_file` they go to `{logging.dir}/demo-wallet-{datetime}.log`
//! instead.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Result of logging initialization
pub struct LoggingHandle {
    /// Guard that must be kept alive for the duration of the program.
    /// When dropped, ensures all buffered logs are flushed.
    pub _guard: Option<WorkerGuard>,

    /// Path to the log file (only set with file logging enabled)
    pub log_file_path: Option<PathBuf>,
}

/// Level filter to use: `--debug` wins over the configured level.
fn effective_level(config: &Config, debug_override: bool) -> String {
    if debug_override {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    }
}

fn log_file_name(timestamp: chrono::DateTime<chrono::Utc>) -> String {
    format!("demo-wallet-{}.log", timestamp.format("%Y%m%dT%H%M%SZ"))
}

/// Initialize logging.
///
/// Fails if a global subscriber is already installed. The returned handle
/// must be kept alive for the duration of the program.
pub fn init_logging(config: &Config, debug_override: bool) -> Result<LoggingHandle> {
    let log_level = effective_level(config, debug_override);
    let filter = EnvFilter::new(std::env::var("RUST_LOG").unwrap_or(log_level));
    let to_file = config.logging.to_file;

    let (writer, handle) = if to_file {
        let logs_dir = config.logs_path();
        std::fs::create_dir_all(&logs_dir)
            .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

        let log_filename = log_file_name(chrono::Utc::now());
        let file_appender = tracing_appender::rolling::never(&logs_dir, &log_filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let handle = LoggingHandle {
            _guard: Some(guard),
            log_file_path: Some(logs_dir.join(log_filename)),
        };
        (BoxMakeWriter::new(non_blocking), handle)
    } else {
        let handle = LoggingHandle {
            _guard: None,
            log_file_path: None,
        };
        (BoxMakeWriter::new(std::io::stderr), handle)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(!to_file)
                .with_writer(writer),
        )
        .try_init()
        .context("Failed to install the log subscriber")?;

    if let Some(path) = &handle.log_file_path {
        tracing::info!(path = %path.display(), "logging to file");
    }
    Ok(handle)
}
