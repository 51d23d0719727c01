use chrono::{DateTime, Local, TimeDelta};
use serde::{Deserialize, Serialize};

/// Protocol used to probe an upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Tcp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Tcp => write!(f, "tcp"),
        }
    }
}

/// Debounced health of a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    #[default]
    Up,
    Down,
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthState::Up => write!(f, "up"),
            HealthState::Down => write!(f, "down"),
        }
    }
}

/// Raw result of a single probe, before debouncing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success,
    Failure { reason: String },
}

impl ProbeOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        ProbeOutcome::Failure { reason: reason.into() }
    }
}

impl<E: std::fmt::Display> From<Result<(), E>> for ProbeOutcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => ProbeOutcome::Success,
            Err(error) => ProbeOutcome::failure(error.to_string()),
        }
    }
}

/// Kind of state change reported to the alert channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Down,
    Up,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Down => write!(f, "DOWN"),
            EventKind::Up => write!(f, "UP"),
        }
    }
}

/// A state change produced by the debounce state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Down {
        /// When the monitor was declared down
        at: DateTime<Local>,
        /// Reason of the probe failure that crossed the threshold
        reason: String,
        failure_count: u32,
        threshold: u32,
    },
    Up {
        /// Start of the outage, if one was recorded
        down_at: Option<DateTime<Local>>,
        up_at: DateTime<Local>,
        /// `up_at - down_at`, only present when `down_at` is known
        down_duration: Option<TimeDelta>,
    },
}

impl Transition {
    pub fn kind(&self) -> EventKind {
        match self {
            Transition::Down { .. } => EventKind::Down,
            Transition::Up { .. } => EventKind::Up,
        }
    }
}
