use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::time::{LocalTime, UtcTime};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::config_directory;

const LOG_FILE_NAME: &str = "bulletin.log";
const LOG_ENV_VAR: &str = "BULLETIN_LOG";

/// Controls where structured logs are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingDestination {
    /// JSON lines to the persistent log file plus human-readable stderr.
    FileAndStderr,
    /// Human-readable stderr only.
    StderrOnly,
}

#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub destination: LoggingDestination,
    /// 0 = info, 1 = debug, 2+ = trace. Ignored when `BULLETIN_LOG` or `RUST_LOG` is set.
    pub verbosity: u8,
    /// Directory for the log file; defaults to `<config dir>/logs`.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            destination: LoggingDestination::FileAndStderr,
            verbosity: 0,
            log_dir: None,
        }
    }
}

#[derive(Debug)]
struct LoggingState {
    _guard: Option<WorkerGuard>,
    log_path: Option<PathBuf>,
}

static LOGGING_STATE: OnceLock<LoggingState> = OnceLock::new();

/// Errors that can arise while standing up structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to prepare log directory: {0}")]
    Io(#[from] io::Error),
    #[error("invalid logging filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install logging subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber. The first call wins; later calls return
/// the log file chosen by the first.
pub fn init_logging(options: &LoggingOptions) -> Result<Option<&'static PathBuf>, LoggingError> {
    if LOGGING_STATE.get().is_none() {
        let state = install_logging(options)?;
        if let Err(state) = LOGGING_STATE.set(state) {
            drop(state);
        }
    }
    Ok(current_log_path())
}

/// Log file selected during initialization, if any.
pub fn current_log_path() -> Option<&'static PathBuf> {
    LOGGING_STATE
        .get()
        .and_then(|state| state.log_path.as_ref())
}

fn install_logging(options: &LoggingOptions) -> Result<LoggingState, LoggingError> {
    let filter = build_filter(options.verbosity)?;
    let mut layers: Vec<BoxedLayer> = vec![stderr_layer()];

    let (guard, log_path) = match options.destination {
        LoggingDestination::FileAndStderr => {
            let dir = options
                .log_dir
                .clone()
                .unwrap_or_else(|| config_directory().join("logs"));
            let (layer, guard) = file_layer(&dir)?;
            layers.push(layer);
            (Some(guard), Some(dir.join(LOG_FILE_NAME)))
        }
        LoggingDestination::StderrOnly => (None, None),
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    if let Some(path) = log_path.as_ref() {
        info!(path = %path.display(), "Structured logging enabled");
    }

    Ok(LoggingState {
        _guard: guard,
        log_path,
    })
}

fn file_layer(dir: &Path) -> Result<(BoxedLayer, WorkerGuard), io::Error> {
    fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = tracing_subscriber::fmt::layer()
        .event_format(
            tracing_subscriber::fmt::format()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .with_level(true)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with_writer(writer)
        .with_ansi(false)
        .boxed();
    Ok((layer, guard))
}

fn stderr_layer() -> BoxedLayer {
    tracing_subscriber::fmt::layer()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_timer(LocalTime::rfc_3339())
                .with_level(true)
                .with_target(false)
                .with_ansi(false),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .boxed()
}

fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn build_filter(verbosity: u8) -> Result<EnvFilter, ParseError> {
    if let Ok(spec) = env::var(LOG_ENV_VAR) {
        if !spec.trim().is_empty() {
            return EnvFilter::try_new(spec);
        }
    }

    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_level(verbosity)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(default_level(0), "info");
        assert_eq!(default_level(1), "debug");
        assert_eq!(default_level(5), "trace");
    }

    #[test]
    fn default_options_log_to_file_and_stderr() {
        let options = LoggingOptions::default();
        assert_eq!(options.destination, LoggingDestination::FileAndStderr);
        assert!(options.log_dir.is_none());
    }
}
