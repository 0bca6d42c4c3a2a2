use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_NAME: &str = "image_processing.log";

/// Install a console logger and a plain-text file logger in `log_dir`.
///
/// `RUST_LOG` takes precedence over `level`. Keep the returned guard alive
/// until exit or buffered file lines are lost.
pub fn init_logging(log_dir: &Path, level: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_writer(file_writer).with_ansi(false);
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("logger already initialized")?;

    Ok(guard)
}
