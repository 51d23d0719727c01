use std::{fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::monitoring::types::Protocol;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(path::PathBuf),
    #[error("config file is a directory: {0}")]
    IsDirectory(path::PathBuf),
    #[error("failed to read config {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: std::io::Error },
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
}

/// Root of the configuration file
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub monitor: Vec<MonitorGroup>,
}

/// Settings shared by every monitor unless a service overrides them
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub interval: Option<i64>,
    pub timeout: Option<i64>,
    pub threshold: Option<i64>,
    pub log: Option<LogConfig>,
    pub alert: Option<AlertConfig>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Relative paths are resolved under `<prefix>/log`
    pub path: Option<String>,
    /// `json` or `compact`
    pub format: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    pub telegram: Option<TelegramAlert>,
    pub email: Option<EmailAlert>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TelegramAlert {
    #[serde(default)]
    pub enabled: bool,
    pub config: Option<TelegramConf>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TelegramConf {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub chat_id: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EmailAlert {
    #[serde(default)]
    pub enabled: bool,
    pub config: Option<EmailConf>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EmailConf {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub cc: Option<String>,
}

/// A named group of services; the group name is used as the monitor name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorGroup {
    pub name: String,
    #[serde(default)]
    pub service: Vec<ServiceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(rename = "type")]
    pub protocol: Protocol,
    pub upstream: String,
    pub interval: Option<i64>,
    pub threshold: Option<i64>,
    pub timeout: Option<i64>,
    #[serde(default)]
    pub add_header: Vec<HttpHeader>,
    pub alert: Option<AlertConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

impl GlobalConfig {
    /// Global telegram credentials, empty when not configured
    pub fn telegram_conf(&self) -> TelegramConf {
        self.alert
            .as_ref()
            .and_then(|alert| alert.telegram.as_ref())
            .and_then(|telegram| telegram.config.clone())
            .unwrap_or_default()
    }
}

fn display_or_default(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "default".to_string())
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_title_2 = write_title_indented(2);
        let write_1 = write_indented(1);
        let write_2 = write_indented(2);

        writeln!(f, "Current Configuration State:")?;
        write_title_1(f, "Global")?;
        write_1(f, "Interval", &display_or_default(self.global.interval))?;
        write_1(f, "Threshold", &display_or_default(self.global.threshold))?;
        write_1(f, "Timeout", &display_or_default(self.global.timeout))?;
        let log_enabled = self.global.log.as_ref().is_some_and(|log| log.enabled);
        write_1(f, "File Logging", &log_enabled)?;

        for group in &self.monitor {
            write_title_1(f, format!("Monitor \"{}\"", group.name).as_str())?;
            for service in &group.service {
                write_title_2(f, format!("{} {}", service.protocol, service.upstream).as_str())?;
                write_2(f, "Interval", &display_or_default(service.interval))?;
                write_2(f, "Threshold", &display_or_default(service.threshold))?;
                write_2(f, "Timeout", &display_or_default(service.timeout))?;
                write_2(f, "Headers", &service.add_header.len())?;
            }
        }

        Ok(())
    }
}

impl Config {
    /// Load the configuration from a TOML file
    ///
    /// ```rust,ignore
    /// let cfg = config::Config::from_file("upmon.toml")?;
    /// println!("{}", cfg);
    /// ```
    pub fn from_file(path: impl AsRef<path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::ReadFailed { path: path.to_path_buf(), source },
        })?;

        if metadata.is_dir() {
            return Err(ConfigError::IsDirectory(path.to_path_buf()));
        }

        let raw_string = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFailed { path: path.to_path_buf(), source })?;
        raw_string.parse()
    }

    /// Number of services across every monitor group
    pub fn service_count(&self) -> usize {
        self.monitor.iter().map(|group| group.service.len()).sum()
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    const SAMPLE: &str = r#"
[global]
interval = 20
threshold = 4

[global.log]
enabled = true
path = "upmon.log"
format = "json"

[global.alert.telegram]
enabled = true
config = { token = "123:global", chat_id = "-100" }

[[monitor]]
name = "api"

[[monitor.service]]
type = "http"
upstream = "https://api.example.com/health"
interval = 30
timeout = 5
add_header = [{ name = "Authorization", value = "Bearer x" }]

[monitor.service.alert.telegram]
enabled = true
config = { token = "  ", chat_id = "-200" }

[[monitor.service]]
type = "tcp"
upstream = "db.example.com:5432"

[[monitor]]
name = "web"

[[monitor.service]]
type = "http"
upstream = "https://www.example.com"
"#;

    #[test]
    fn test_parse_sample() {
        let config: Config = SAMPLE.parse().unwrap();

        assert_eq!(config.global.interval, Some(20));
        assert_eq!(config.global.threshold, Some(4));
        assert_eq!(config.global.timeout, None);
        assert_eq!(config.global.telegram_conf().token, "123:global");
        assert_eq!(config.monitor.len(), 2);
        assert_eq!(config.service_count(), 3);

        let api = &config.monitor[0];
        assert_eq!(api.name, "api");
        assert_eq!(api.service[0].protocol, Protocol::Http);
        assert_eq!(api.service[0].interval, Some(30));
        assert_eq!(api.service[0].add_header[0].name, "Authorization");
        assert_eq!(api.service[1].protocol, Protocol::Tcp);
        assert!(api.service[1].alert.is_none());

        let log = config.global.log.as_ref().unwrap();
        assert!(log.enabled);
        assert_eq!(log.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config: Config = "".parse().unwrap();
        assert!(config.monitor.is_empty());
        assert_eq!(config.global.telegram_conf().chat_id, "");
    }

    #[test]
    fn test_unknown_protocol_is_rejected() {
        let raw = r#"
[[monitor]]
name = "x"

[[monitor.service]]
type = "icmp"
upstream = "example.com"
"#;
        assert!(matches!(raw.parse::<Config>(), Err(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.service_count(), 3);
        assert!(config.to_string().contains("Monitor \"api\""));
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempdir().unwrap();
        let result = Config::from_file(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_from_file_directory() {
        let dir = tempdir().unwrap();
        let result = Config::from_file(dir.path());
        assert!(matches!(result, Err(ConfigError::IsDirectory(_))));
    }
}
