#![warn(clippy::all)]

mod bootstrap;
mod config;
mod error;
mod monitoring;
mod notifier;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use logger::{LogFormat, LogSettings};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use bootstrap::{PidFile, RuntimeDirs};
use config::Config;
use error::AppError;
use monitoring::{MonitoringExecutor, MonitoringScheduler, build_monitors};
use notifier::{Dispatcher, TelegramNotifier};

const DEFAULT_PREFIX: &str = "/tmp/upmon";
const DEFAULT_LOG_FILE: &str = "upmon.log";
const TELEGRAM_API_URL_ENV: &str = "UPMON_TELEGRAM_API_URL";

#[derive(Debug, Parser)]
#[command(name = "upmon", version, about = "A simple server up/down monitoring tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the monitoring service
    #[command(alias = "s")]
    Start {
        /// Load configuration from FILE
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
        /// Prefix path for the running service
        #[arg(short, long, default_value = DEFAULT_PREFIX)]
        prefix: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Start { config, prefix } => start(&config, &prefix).await,
    }
}

/// Resolve file logging from the `[global.log]` section.
///
/// Relative paths live under `<prefix>/log`; file logging is skipped when that
/// directory is unusable.
fn log_settings(config: &Config, dirs: &RuntimeDirs) -> LogSettings {
    let Some(log) = config.global.log.as_ref() else {
        return LogSettings::default();
    };

    let format = log.format.as_deref().map(LogFormat::parse);
    if !log.enabled {
        return LogSettings { format, file: None };
    }

    let path = PathBuf::from(log.path.as_deref().unwrap_or(DEFAULT_LOG_FILE));
    let file = if path.is_absolute() {
        Some(path)
    } else if dirs.is_usable(&dirs.log) {
        Some(dirs.log.join(path))
    } else {
        None
    };

    LogSettings { format, file }
}

async fn start(config_path: &Path, prefix: &Path) -> Result<(), AppError> {
    let config = Config::from_file(config_path)?;
    let dirs = bootstrap::ensure_initialized(prefix)?;

    logger::init_with(&log_settings(&config, &dirs))?;
    for blocked in &dirs.blocked {
        warn!(path = %blocked.display(), "A file with the same name exists, directory not created");
    }
    debug!("{config}");

    let monitors = build_monitors(&config);
    info!(groups = config.monitor.len(), services = config.service_count(), "Configuration loaded");

    println!("=> prefix   : {}", prefix.display());
    println!("=> config   : {}", config_path.display());
    println!("=> monitors : {}", monitors.len());

    let _pid_file = if dirs.is_usable(&dirs.run) {
        PidFile::create(&dirs.run)
            .inspect(|pid_file| debug!(path = %pid_file.path().display(), "Pid file written"))
            .inspect_err(|error| warn!(%error, "Failed to write pid file"))
            .ok()
    } else {
        None
    };

    let dispatcher = Arc::new(Dispatcher::new(telegram_notifier()?));
    let executor = Arc::new(MonitoringExecutor::new(dispatcher)?);
    let scheduler = MonitoringScheduler::new(executor);

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    scheduler.run(monitors, shutdown).await;
    info!("Shutdown complete");
    Ok(())
}

/// Telegram transport, pointed at `UPMON_TELEGRAM_API_URL` when it is set
fn telegram_notifier() -> Result<TelegramNotifier, reqwest::Error> {
    let notifier = TelegramNotifier::new()?;
    match std::env::var(TELEGRAM_API_URL_ENV) {
        Ok(url) if !url.trim().is_empty() => {
            info!(%url, "Using custom Telegram API URL");
            Ok(notifier.with_base_url(url.trim()))
        }
        _ => Ok(notifier),
    }
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM
async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                warn!(%error, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_with_log(log: &str) -> Config {
        format!("[global.log]\n{log}").parse().unwrap()
    }

    #[test]
    fn test_cli_parses_start() {
        let cli = Cli::try_parse_from(["upmon", "start", "-c", "upmon.toml"]).unwrap();
        let Command::Start { config, prefix } = cli.command;
        assert_eq!(config, PathBuf::from("upmon.toml"));
        assert_eq!(prefix, PathBuf::from(DEFAULT_PREFIX));

        let cli = Cli::try_parse_from(["upmon", "s", "--config", "a.toml", "--prefix", "/srv"])
            .unwrap();
        let Command::Start { prefix, .. } = cli.command;
        assert_eq!(prefix, PathBuf::from("/srv"));
    }

    #[test]
    fn test_cli_requires_config() {
        assert!(Cli::try_parse_from(["upmon", "start"]).is_err());
    }

    #[test]
    fn test_log_settings_without_section() {
        let temp = tempdir().unwrap();
        let dirs = bootstrap::ensure_initialized(temp.path()).unwrap();

        let settings = log_settings(&Config::default(), &dirs);
        assert!(settings.format.is_none());
        assert!(settings.file.is_none());
    }

    #[test]
    fn test_log_settings_relative_path() {
        let temp = tempdir().unwrap();
        let dirs = bootstrap::ensure_initialized(temp.path()).unwrap();

        let settings = log_settings(&config_with_log("enabled = true\nformat = \"json\""), &dirs);
        assert_eq!(settings.format, Some(LogFormat::Json));
        assert_eq!(settings.file, Some(dirs.log.join(DEFAULT_LOG_FILE)));

        let settings = log_settings(&config_with_log("enabled = false\npath = \"x.log\""), &dirs);
        assert!(settings.file.is_none());
    }

    #[test]
    fn test_log_settings_blocked_log_dir() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("log"), "file").unwrap();
        let dirs = bootstrap::ensure_initialized(temp.path()).unwrap();

        let settings = log_settings(&config_with_log("enabled = true"), &dirs);
        assert!(settings.file.is_none());

        let settings = log_settings(&config_with_log("enabled = true\npath = \"/var/log/upmon.log\""), &dirs);
        assert_eq!(settings.file, Some(PathBuf::from("/var/log/upmon.log")));
    }
}
