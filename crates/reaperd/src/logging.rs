//! Logging setup

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::{EnvFilter, prelude::*, registry};

const LOG_FILE_PREFIX: &str = "gpu-reaper.log";

fn filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Install the global subscriber: stdout always, plus a daily rolling file
/// in `log_dir` when given. The returned guard must live until exit.
pub fn init(log_level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let stdout_layer = layer().with_target(true).with_filter(filter(log_level));

    let Some(dir) = log_dir else {
        registry().with(stdout_layer).init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {:?}", dir))?;

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(dir, LOG_FILE_PREFIX));
    let file_layer = layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter(log_level));

    registry().with(stdout_layer).with(file_layer).init();
    Ok(Some(guard))
}
