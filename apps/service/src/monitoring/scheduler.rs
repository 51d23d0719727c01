use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::executor::MonitoringExecutor;
use super::monitor::Monitor;

/// How long shutdown waits for alerts that are still being delivered
const ALERT_GRACE: Duration = Duration::from_secs(5);

/// Monitoring scheduler - one independent periodic task per monitor
pub struct MonitoringScheduler {
    executor: Arc<MonitoringExecutor>,
}

impl MonitoringScheduler {
    /// Create a new monitoring scheduler
    pub fn new(executor: Arc<MonitoringExecutor>) -> Self {
        Self { executor }
    }

    /// Schedule a single monitor for periodic checking.
    ///
    /// The first check happens one interval after scheduling. Ticks missed
    /// while a probe was running are skipped rather than replayed.
    pub fn schedule_monitor(
        &self,
        monitor: Arc<Monitor>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let executor = self.executor.clone();

        tokio::spawn(async move {
            let period = monitor.interval();
            let Some(start) = Instant::now().checked_add(period) else {
                warn!(
                    monitor = %monitor.name(),
                    upstream = %monitor.upstream(),
                    interval = ?period,
                    "Interval is too large to schedule, monitor will never be checked"
                );
                shutdown.cancelled().await;
                return;
            };
            let mut timer = interval_at(start, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = timer.tick() => {}
                }

                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = executor.execute_tick(&monitor) => {}
                }
            }

            let snapshot = monitor.snapshot();
            debug!(
                monitor = %monitor.name(),
                upstream = %monitor.upstream(),
                state = %snapshot.state,
                failure_count = snapshot.failure_count,
                threshold = snapshot.threshold,
                checks = snapshot.checks,
                "Monitor task stopped"
            );
        })
    }

    /// Schedule multiple monitors
    pub fn schedule_monitors(
        &self,
        monitors: &[Arc<Monitor>],
        shutdown: &CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        monitors
            .iter()
            .map(|monitor| self.schedule_monitor(monitor.clone(), shutdown.clone()))
            .collect()
    }

    /// Run every monitor until `shutdown` is cancelled.
    ///
    /// With no monitors this simply waits for the shutdown signal.
    pub async fn run(&self, monitors: Vec<Arc<Monitor>>, shutdown: CancellationToken) {
        if monitors.is_empty() {
            warn!("No monitors configured, waiting for shutdown");
        }

        let handles = self.schedule_monitors(&monitors, &shutdown);
        info!(monitors = handles.len(), "Monitoring started");

        shutdown.cancelled().await;

        for result in join_all(handles).await {
            if let Err(error) = result {
                warn!(%error, "Monitor task ended abnormally");
            }
        }
        if !self.executor.flush_alerts(ALERT_GRACE).await {
            warn!(grace = ?ALERT_GRACE, "Some alerts were still in flight at shutdown");
        }
        info!("Monitoring stopped");
    }
}
