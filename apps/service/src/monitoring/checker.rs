use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use super::monitor::Monitor;

/// Why a single probe failed
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("error response code: {0}")]
    Status(u16),

    #[error("probe timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Checker trait for the different probe protocols
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Probe the monitor's upstream once, without retrying
    async fn check(&self, monitor: &Monitor) -> Result<(), ProbeError>;
}

/// HTTP checker
///
/// A single client is shared by every HTTP monitor; the timeout is applied per
/// request from the monitor's own configuration.
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, monitor: &Monitor) -> Result<(), ProbeError> {
        let mut request = self.client.get(monitor.upstream()).timeout(monitor.timeout());
        for header in monitor.headers() {
            request = request.header(header.name.as_str(), header.value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();

        // Only 2xx counts as healthy
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}

/// TCP checker (placeholder - no connection is attempted)
pub struct TcpChecker;

#[async_trait::async_trait]
impl Checker for TcpChecker {
    async fn check(&self, monitor: &Monitor) -> Result<(), ProbeError> {
        debug!(monitor = %monitor.name(), upstream = %monitor.upstream(), "TCP probe is a stub, reporting success");
        Ok(())
    }
}
