pub mod checker;
pub mod debounce;
/// Monitoring engine module - polls upstreams and tracks their health
///
/// This module is responsible for:
/// - Probing HTTP (and stub TCP) upstreams
/// - Debouncing probe outcomes into UP/DOWN transitions
/// - Scheduling one independent task per monitor
/// - Handing transitions to the notifier
pub mod executor;
pub mod monitor;
pub mod report;
pub mod scheduler;
pub mod types;
pub mod validation;


pub use executor::MonitoringExecutor;
pub use monitor::{Monitor, build_monitors};
pub use scheduler::MonitoringScheduler;
