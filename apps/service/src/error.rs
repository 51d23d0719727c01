use std::io::Error as IoError;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Logger setup failed: {0}")]
    Logger(#[from] logger::LoggerError),
    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),
}
