use std::env::var;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;
use tracing::{level_filters::LevelFilter, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    Layer, Registry, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Log file path has no file name: {0}")]
    InvalidPath(PathBuf),
    #[error("Failed to open log file: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),
    #[error("Failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Output format of the console (and file) layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Compact,
}

impl LogFormat {
    /// Anything other than `json` falls back to the compact format.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Overrides applied on top of the environment (`RUST_LOG`, `RUST_LOG_FORMAT`).
#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    pub format: Option<LogFormat>,
    /// When set, events are also written to this file through a non-blocking writer.
    pub file: Option<PathBuf>,
}

pub fn init_with(settings: &LogSettings) -> Result<(), LoggerError> {
    initialize_tracing(LevelFilter::INFO, settings)
}

fn env_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder().with_default_directive(level.into()).from_env_lossy()
}

fn env_format() -> LogFormat {
    var("RUST_LOG_FORMAT")
        .inspect_err(|error| {
            warn!("Failed to read RUST_LOG_FORMAT, falling back to default: {error}")
        })
        .map(|value| LogFormat::parse(&value))
        .unwrap_or_default()
}

fn format_layer<W>(
    format: LogFormat,
    writer: W,
    ansi: bool,
    filter: EnvFilter,
) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(ansi)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
    }
}

/// Split a log file path into the directory and file name the appender expects.
fn split_log_path(path: &Path) -> Result<(PathBuf, String), LoggerError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| LoggerError::InvalidPath(path.to_path_buf()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((directory, file_name))
}

/// Initialize tracing subscriber with the console layer and an optional file layer.
fn initialize_tracing(level: LevelFilter, settings: &LogSettings) -> Result<(), LoggerError> {
    let format = settings.format.unwrap_or_else(env_format);

    let mut layers = vec![format_layer(format, std::io::stdout, true, env_filter(level))];

    if let Some(path) = &settings.file {
        let (directory, file_name) = split_log_path(path)?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name)
            .build(directory)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(format_layer(format, writer, false, env_filter(level)));
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(())
}
