//! Log file setup
//!
//! The terminal surface owns stdout and stderr, so all output goes to
//! `power-dial.log` in the platform cache directory
//! (`~/.cache/power-dial/` on Linux). The filter is read from
//! `POWER_DIAL_LOG` and defaults to `info`.
//!
//! ```rust,ignore
//! let _guard = logging::init()?;
//! // keep the guard alive until exit so buffered lines are flushed
//! ```

use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::app::controller::AppError;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "POWER_DIAL_LOG";

const LOG_FILE: &str = "power-dial.log";

/// Flushes the log file when dropped
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Directory the log file is written to
pub fn log_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("power-dial"))
        .unwrap_or_else(|| std::env::temp_dir().join("power-dial"))
}

pub fn log_path() -> PathBuf {
    log_dir().join(LOG_FILE)
}

/// Installs the global subscriber
pub fn init() -> Result<LoggingGuard, AppError> {
    let dir = log_dir();
    fs::create_dir_all(&dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(&dir)
        .map_err(|e| AppError::Logging(e.to_string()))?;
    let (writer, file_guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    tracing::info!(
        log_path = %dir.join(LOG_FILE).display(),
        version = env!("CARGO_PKG_VERSION"),
        "logging initialised"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
