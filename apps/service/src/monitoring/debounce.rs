//! Debounce state machine turning probe outcomes into UP/DOWN transitions.
//!
//! Declaring a monitor down is slow (`threshold` consecutive failures) while
//! recovery is fast (a single success). Failures keep being counted while the
//! monitor is down, but the DOWN transition is only reported once per outage.

use chrono::{DateTime, Local};

use super::types::{HealthState, ProbeOutcome, Transition};

/// Mutable health state of a single monitor.
///
/// Owned by the monitor behind its own mutex; every call to [`apply`] is one
/// critical section.
///
/// [`apply`]: DebounceState::apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceState {
    state: HealthState,
    failure_count: u32,
    threshold: u32,
    last_down: Option<DateTime<Local>>,
    last_up: Option<DateTime<Local>>,
    checks: u64,
}

impl DebounceState {
    /// Start in the UP state with no failures recorded
    pub fn new(threshold: u32) -> Self {
        Self {
            state: HealthState::Up,
            failure_count: 0,
            threshold: threshold.max(1),
            last_down: None,
            last_up: None,
            checks: 0,
        }
    }

    /// Feed one probe outcome observed at `now`.
    ///
    /// Returns the transition caused by this outcome, if any.
    pub fn apply(&mut self, outcome: &ProbeOutcome, now: DateTime<Local>) -> Option<Transition> {
        self.checks += 1;

        match (self.state, outcome) {
            (HealthState::Up, ProbeOutcome::Success) => {
                self.failure_count = 0;
                None
            }
            (HealthState::Up, ProbeOutcome::Failure { reason }) => {
                self.failure_count = self.failure_count.saturating_add(1);
                if self.failure_count < self.threshold {
                    return None;
                }

                self.state = HealthState::Down;
                self.last_down = Some(now);
                Some(Transition::Down {
                    at: now,
                    reason: reason.clone(),
                    failure_count: self.failure_count,
                    threshold: self.threshold,
                })
            }
            (HealthState::Down, ProbeOutcome::Success) => {
                self.state = HealthState::Up;
                self.failure_count = 0;
                self.last_up = Some(now);
                Some(Transition::Up {
                    down_at: self.last_down,
                    up_at: now,
                    down_duration: self.last_down.map(|down_at| now - down_at),
                })
            }
            (HealthState::Down, ProbeOutcome::Failure { .. }) => {
                self.failure_count = self.failure_count.saturating_add(1);
                None
            }
        }
    }

    pub fn state(&self) -> HealthState {
        self.state
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn last_down(&self) -> Option<DateTime<Local>> {
        self.last_down
    }

    pub fn last_up(&self) -> Option<DateTime<Local>> {
        self.last_up
    }

    /// Number of outcomes applied so far
    pub fn checks(&self) -> u64 {
        self.checks
    }
}
