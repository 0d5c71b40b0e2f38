//! Logging setup with file rotation.

use crate::error::{CliError, CliResult};

use std::path::{Path, PathBuf};

use sidecar_config::LoggingConfig;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const MAX_LOG_FILES: usize = 7;

/// Setup logging with console and rotating file output.
///
/// # Log Layers
/// - Console: human-readable, or JSON when `logging.json` is set
/// - File: plain text, daily rotation, 7-day retention
///
/// `RUST_LOG` overrides the configured level.
pub(crate) fn setup_logging(config_dir: &Path, logging: &LoggingConfig) -> CliResult<()> {
    let logs_dir = log_dir(config_dir, logging);
    std::fs::create_dir_all(&logs_dir)
        .map_err(|e| CliError::logging(format!("{}: {e}", logs_dir.display())))?;

    let console_text = (!logging.json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(true)
    });
    let console_json = logging
        .json
        .then(|| fmt::layer().json().with_target(true).with_level(true));

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(logging.file_prefix.as_str())
        .filename_suffix("log")
        .build(&logs_dir)
        .map_err(|e| CliError::logging(e.to_string()))?;

    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(file_appender);

    tracing_subscriber::registry()
        .with(filter(logging))
        .with(console_text)
        .with(console_json)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::logging(e.to_string()))
}

/// Console-only logging for short-lived commands.
pub(crate) fn setup_console_logging(logging: &LoggingConfig) -> CliResult<()> {
    tracing_subscriber::registry()
        .with(filter(logging))
        .with(fmt::layer().with_target(false).without_time())
        .try_init()
        .map_err(|e| CliError::logging(e.to_string()))
}

pub(crate) fn log_dir(config_dir: &Path, logging: &LoggingConfig) -> PathBuf {
    config_dir.join(&logging.dir)
}

/// Get path to current log file.
pub(crate) fn current_log_path(config_dir: &Path, logging: &LoggingConfig) -> PathBuf {
    let today = chrono::Local::now().format("%Y-%m-%d");
    log_dir(config_dir, logging).join(format!("{}.{}.log", logging.file_prefix, today))
}

fn filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()))
}
