//! Tracing subscriber setup.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::error::{AppError, AppResult};

const LOG_FILE_PREFIX: &str = "concord.log";

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. When `log_dir` is given a
/// daily-rolling file layer is added; keep the returned guard alive until exit
/// so buffered lines are flushed.
pub fn init_logging(default_level: &str, log_dir: Option<&Path>) -> AppResult<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_target(false).with_writer(writer);
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Logging(e.to_string()))?;
    tracing_log::LogTracer::init().map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(guard)
}
