use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use tracing::warn;

use super::debounce::DebounceState;
use super::types::{HealthState, ProbeOutcome, Protocol, Transition};
use super::validation::validate_upstream;
use crate::config::{AlertConfig, Config, GlobalConfig, HttpHeader, ServiceConfig};
use crate::notifier::AlertChannel;

pub const DEFAULT_INTERVAL_SECONDS: u64 = 15;
pub const DEFAULT_THRESHOLD: u32 = 3;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
/// Longest accepted interval or timeout, larger values are clamped to it
pub const MAX_TUNING_SECONDS: u64 = u32::MAX as u64;

/// A value below 1 falls back to the default rather than being clamped
fn at_least_one_or(value: Option<i64>, default: u64) -> u64 {
    match value {
        Some(v) if v >= 1 => (v as u64).min(MAX_TUNING_SECONDS),
        _ => default,
    }
}

/// Polling parameters of a monitor, validated at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuning {
    pub interval_seconds: u64,
    pub threshold: u32,
    pub timeout_seconds: u64,
}

impl Tuning {
    pub fn new(interval: Option<i64>, threshold: Option<i64>, timeout: Option<i64>) -> Self {
        let threshold = match threshold {
            Some(v) if v >= 1 => u32::try_from(v).unwrap_or(u32::MAX),
            _ => DEFAULT_THRESHOLD,
        };

        Self {
            interval_seconds: at_least_one_or(interval, DEFAULT_INTERVAL_SECONDS),
            threshold,
            timeout_seconds: at_least_one_or(timeout, DEFAULT_TIMEOUT_SECONDS),
        }
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub token: String,
    pub chat_id: String,
}

impl TelegramCredentials {
    pub fn is_complete(&self) -> bool {
        !self.token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

/// Where transitions of a monitor are delivered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertRoute {
    pub channel: AlertChannel,
    pub telegram: TelegramCredentials,
}

impl AlertRoute {
    /// Resolve the route from a service alert block.
    ///
    /// Blank (after trimming) telegram credentials fall back to the global
    /// telegram configuration.
    pub fn resolve(alert: Option<&AlertConfig>, global: &GlobalConfig) -> Self {
        let Some(alert) = alert else {
            return Self::default();
        };

        let channel = match (&alert.telegram, &alert.email) {
            (Some(telegram), Some(email)) if telegram.enabled && email.enabled => {
                AlertChannel::All
            }
            (Some(_), Some(_)) => AlertChannel::None,
            (Some(telegram), None) if telegram.enabled => AlertChannel::Telegram,
            (None, Some(email)) if email.enabled => AlertChannel::Email,
            _ => AlertChannel::None,
        };

        let telegram = match channel {
            AlertChannel::Telegram | AlertChannel::All => {
                let service_conf = alert
                    .telegram
                    .as_ref()
                    .and_then(|telegram| telegram.config.clone())
                    .unwrap_or_default();
                let global_conf = global.telegram_conf();

                let pick = |own: String, fallback: String| {
                    if own.trim().is_empty() { fallback } else { own }
                };

                TelegramCredentials {
                    token: pick(service_conf.token, global_conf.token),
                    chat_id: pick(service_conf.chat_id, global_conf.chat_id),
                }
            }
            AlertChannel::None | AlertChannel::Email => TelegramCredentials::default(),
        };

        Self { channel, telegram }
    }
}

/// Point-in-time copy of a monitor's runtime state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSnapshot {
    pub state: HealthState,
    pub failure_count: u32,
    pub last_down: Option<DateTime<Local>>,
    pub last_up: Option<DateTime<Local>>,
    pub threshold: u32,
    pub checks: u64,
}

/// One configured upstream being polled on its own schedule
#[derive(Debug)]
pub struct Monitor {
    name: String,
    protocol: Protocol,
    upstream: String,
    tuning: Tuning,
    headers: Vec<HttpHeader>,
    alert: AlertRoute,
    state: Mutex<DebounceState>,
}

impl Monitor {
    /// Create a monitor, replacing tuning values below 1 with their defaults
    pub fn new(
        name: impl Into<String>,
        upstream: impl Into<String>,
        protocol: Protocol,
        interval: Option<i64>,
        threshold: Option<i64>,
        timeout: Option<i64>,
    ) -> Self {
        let tuning = Tuning::new(interval, threshold, timeout);

        Self {
            name: name.into(),
            protocol,
            upstream: upstream.into(),
            tuning,
            headers: Vec::new(),
            alert: AlertRoute::default(),
            state: Mutex::new(DebounceState::new(tuning.threshold)),
        }
    }

    #[cfg(test)]
    pub fn http(
        name: impl Into<String>,
        upstream: impl Into<String>,
        interval: Option<i64>,
        threshold: Option<i64>,
        timeout: Option<i64>,
    ) -> Self {
        Self::new(name, upstream, Protocol::Http, interval, threshold, timeout)
    }

    #[cfg(test)]
    pub fn tcp(
        name: impl Into<String>,
        upstream: impl Into<String>,
        interval: Option<i64>,
        threshold: Option<i64>,
        timeout: Option<i64>,
    ) -> Self {
        Self::new(name, upstream, Protocol::Tcp, interval, threshold, timeout)
    }

    /// Build a monitor from a service definition.
    ///
    /// Each tuning value comes from the service, then the global section, then
    /// the built-in default.
    pub fn from_service(group: &str, service: &ServiceConfig, global: &GlobalConfig) -> Self {
        Self::new(
            group,
            service.upstream.clone(),
            service.protocol,
            service.interval.or(global.interval),
            service.threshold.or(global.threshold),
            service.timeout.or(global.timeout),
        )
        .with_headers(service.add_header.clone())
        .with_alert(AlertRoute::resolve(service.alert.as_ref(), global))
    }

    pub fn with_headers(mut self, headers: Vec<HttpHeader>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_alert(mut self, alert: AlertRoute) -> Self {
        self.alert = alert;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    pub fn tuning(&self) -> Tuning {
        self.tuning
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.tuning.interval_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.tuning.timeout_seconds)
    }

    pub fn threshold(&self) -> u32 {
        self.tuning.threshold
    }

    pub fn headers(&self) -> &[HttpHeader] {
        &self.headers
    }

    pub fn alert(&self) -> &AlertRoute {
        &self.alert
    }

    /// Apply one probe outcome under this monitor's lock
    pub fn apply(&self, outcome: &ProbeOutcome, now: DateTime<Local>) -> Option<Transition> {
        self.state.lock().apply(outcome, now)
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let state = self.state.lock();
        MonitorSnapshot {
            state: state.state(),
            failure_count: state.failure_count(),
            last_down: state.last_down(),
            last_up: state.last_up(),
            threshold: state.threshold(),
            checks: state.checks(),
        }
    }
}

/// Build one monitor per configured service, in configuration order
pub fn build_monitors(config: &Config) -> Vec<Arc<Monitor>> {
    config
        .monitor
        .iter()
        .flat_map(|group| {
            group.service.iter().map(|service| {
                if let Err(error) = validate_upstream(service.protocol, &service.upstream) {
                    warn!(monitor = %group.name, upstream = %service.upstream, %error, "Upstream looks invalid, probes will likely fail");
                }
                if service.protocol == Protocol::Tcp {
                    warn!(monitor = %group.name, upstream = %service.upstream, "TCP probes are not implemented yet and always report success");
                }
                Arc::new(Monitor::from_service(&group.name, service, &config.global))
            })
        })
        .collect()
}
