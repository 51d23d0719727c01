use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::time::timeout;
use tokio_util::task::TaskTracker;
use tracing::{debug, error};

use super::checker::{Checker, HttpChecker, ProbeError, TcpChecker};
use super::monitor::Monitor;
use super::report;
use super::types::{ProbeOutcome, Protocol, Transition};
use crate::notifier::{Dispatcher, message};

/// Monitoring executor - runs one tick of a monitor
pub struct MonitoringExecutor {
    http_checker: Arc<dyn Checker>,
    tcp_checker: Arc<dyn Checker>,
    dispatcher: Arc<Dispatcher>,
    alerts: TaskTracker,
}

impl MonitoringExecutor {
    /// Create an executor with the default HTTP and TCP checkers
    pub fn new(dispatcher: Arc<Dispatcher>) -> Result<Self, reqwest::Error> {
        Ok(Self::with_checkers(Arc::new(HttpChecker::new()?), Arc::new(TcpChecker), dispatcher))
    }

    pub fn with_checkers(
        http_checker: Arc<dyn Checker>,
        tcp_checker: Arc<dyn Checker>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self { http_checker, tcp_checker, dispatcher, alerts: TaskTracker::new() }
    }

    /// Probe the monitor once, bounded by its timeout
    pub async fn probe(&self, monitor: &Monitor) -> ProbeOutcome {
        let checker: &dyn Checker = match monitor.protocol() {
            Protocol::Http => self.http_checker.as_ref(),
            Protocol::Tcp => self.tcp_checker.as_ref(),
        };

        let result = match timeout(monitor.timeout(), checker.check(monitor)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(monitor.timeout())),
        };

        if let Err(error) = &result {
            debug!(monitor = %monitor.name(), upstream = %monitor.upstream(), %error, "Probe failed");
        }

        result.into()
    }

    /// Run one scheduled check: report, probe, debounce and alert.
    ///
    /// The alert is sent on a separate task so a slow channel never delays
    /// the next tick.
    pub async fn execute_tick(&self, monitor: &Arc<Monitor>) -> Option<Transition> {
        report::emit_check(monitor, Local::now());

        let outcome = self.probe(monitor).await;
        let transition = monitor.apply(&outcome, Local::now())?;

        report::emit_transition(monitor, &transition, Local::now());
        self.notify(monitor, &transition);

        Some(transition)
    }

    fn notify(&self, monitor: &Arc<Monitor>, transition: &Transition) {
        let (event, payload) = message::render(monitor, transition);
        let dispatcher = self.dispatcher.clone();
        let monitor = Arc::clone(monitor);

        self.alerts.spawn(async move {
            if let Err(error) = dispatcher.send(&monitor, event, &payload).await {
                error!(
                    monitor = %monitor.name(),
                    channel = %monitor.alert().channel,
                    %event,
                    %error,
                    "Failed to deliver alert"
                );
            }
        });
    }

    /// Wait up to `grace` for alert sends that are still running.
    ///
    /// Returns `false` if some were still pending when `grace` elapsed.
    pub async fn flush_alerts(&self, grace: Duration) -> bool {
        self.alerts.close();
        timeout(grace, self.alerts.wait()).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::types::HealthState;
    use crate::notifier::TelegramNotifier;

    struct HangingChecker;

    #[async_trait::async_trait]
    impl Checker for HangingChecker {
        async fn check(&self, _monitor: &Monitor) -> Result<(), ProbeError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    fn executor(http: Arc<dyn Checker>) -> MonitoringExecutor {
        let dispatcher = Arc::new(Dispatcher::new(TelegramNotifier::new().unwrap()));
        MonitoringExecutor::with_checkers(http, Arc::new(TcpChecker), dispatcher)
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_is_bounded_by_timeout() {
        let executor = executor(Arc::new(HangingChecker));
        let monitor = Monitor::http("slow", "http://slow", None, None, Some(2));

        let outcome = executor.probe(&monitor).await;
        assert_eq!(outcome, ProbeOutcome::failure("probe timed out after 2s"));
    }

    #[tokio::test]
    async fn test_tcp_tick_stays_up() {
        let executor = executor(Arc::new(HangingChecker));
        let monitor = Arc::new(Monitor::tcp("db", "db:5432", None, Some(1), None));

        assert!(executor.execute_tick(&monitor).await.is_none());
        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.state, HealthState::Up);
        assert_eq!(snapshot.checks, 1);
    }
}
