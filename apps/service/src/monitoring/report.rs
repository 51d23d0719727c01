//! Plain one-line event records written to stdout and stderr.
//!
//! Check and UP lines go to stdout, DOWN lines to stderr. Every line starts
//! with an RFC 3339 timestamp in brackets.

use std::io::{self, Write};

use chrono::{DateTime, Local};

use super::monitor::Monitor;
use super::types::Transition;
use crate::notifier::message::format_duration;

fn timestamp(now: DateTime<Local>) -> String {
    now.to_rfc3339()
}

pub fn check_line(monitor: &Monitor, now: DateTime<Local>) -> String {
    let tuning = monitor.tuning();
    format!(
        "[{}] monitor {} CHECK! | type={}, upstream={}, interval={}, threshold={}, timeout={}",
        timestamp(now),
        monitor.name(),
        monitor.protocol(),
        monitor.upstream(),
        tuning.interval_seconds,
        monitor.threshold(),
        tuning.timeout_seconds,
    )
}

pub fn transition_line(monitor: &Monitor, transition: &Transition, now: DateTime<Local>) -> String {
    match transition {
        Transition::Down { at, reason, failure_count, threshold } => format!(
            "[{}] monitor {} DOWN! | type={}, upstream={}, error={}, down_time={}, fail_count={}, threshold={}",
            timestamp(now),
            monitor.name(),
            monitor.protocol(),
            monitor.upstream(),
            reason,
            at.to_rfc3339(),
            failure_count,
            threshold,
        ),
        Transition::Up { down_at, up_at, down_duration } => format!(
            "[{}] monitor {} UP! | type={}, upstream={}, down_time={}, up_time={}, down_duration={}",
            timestamp(now),
            monitor.name(),
            monitor.protocol(),
            monitor.upstream(),
            down_at.map(|at| at.to_rfc3339()).unwrap_or_else(|| "-".to_string()),
            up_at.to_rfc3339(),
            down_duration.map(format_duration).unwrap_or_else(|| "-".to_string()),
        ),
    }
}

pub fn emit_check(monitor: &Monitor, now: DateTime<Local>) {
    let _ = writeln!(io::stdout().lock(), "{}", check_line(monitor, now));
}

/// Write the transition line, DOWN to `err` and UP to `out`
fn write_transition(
    out: &mut impl Write,
    err: &mut impl Write,
    monitor: &Monitor,
    transition: &Transition,
    now: DateTime<Local>,
) -> io::Result<()> {
    let line = transition_line(monitor, transition, now);
    match transition {
        Transition::Down { .. } => writeln!(err, "{line}"),
        Transition::Up { .. } => writeln!(out, "{line}"),
    }
}

pub fn emit_transition(monitor: &Monitor, transition: &Transition, now: DateTime<Local>) {
    let _ = write_transition(
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
        monitor,
        transition,
        now,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeDelta, TimeZone};

    fn at(second: u32) -> DateTime<Local> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 9, 18, 16, second)
            .unwrap()
            .with_timezone(&Local)
    }

    fn rfc3339(second: u32) -> String {
        at(second).to_rfc3339()
    }

    #[test]
    fn test_check_line() {
        let monitor = Monitor::http("api", "https://api.example.com", Some(30), Some(2), Some(5));

        assert_eq!(
            check_line(&monitor, at(0)),
            format!(
                "[{}] monitor api CHECK! | type=http, upstream=https://api.example.com, interval=30, threshold=2, timeout=5",
                rfc3339(0)
            )
        );
    }

    #[test]
    fn test_down_line() {
        let monitor = Monitor::tcp("db", "db:5432", None, Some(1), None);
        let transition = Transition::Down {
            at: at(1),
            reason: "probe timed out after 10s".to_string(),
            failure_count: 1,
            threshold: 1,
        };

        let line = transition_line(&monitor, &transition, at(1));
        assert_eq!(
            line,
            format!(
                "[{0}] monitor db DOWN! | type=tcp, upstream=db:5432, error=probe timed out after 10s, down_time={0}, fail_count=1, threshold=1",
                rfc3339(1)
            )
        );
    }

    #[test]
    fn test_up_line() {
        let monitor = Monitor::http("api", "http://x", None, None, None);
        let transition = Transition::Up {
            down_at: Some(at(0)),
            up_at: at(30),
            down_duration: Some(TimeDelta::seconds(30)),
        };

        let line = transition_line(&monitor, &transition, at(30));
        assert!(line.contains("monitor api UP!"));
        assert!(line.ends_with(&format!(
            "down_time={}, up_time={}, down_duration=30s",
            rfc3339(0),
            rfc3339(30)
        )));
    }

    #[test]
    fn test_down_goes_to_stderr_and_up_to_stdout() {
        let monitor = Monitor::http("api", "http://x", None, Some(1), None);
        let down = Transition::Down {
            at: at(0),
            reason: "error response code: 502".to_string(),
            failure_count: 1,
            threshold: 1,
        };
        let up = Transition::Up { down_at: Some(at(0)), up_at: at(5), down_duration: None };

        let mut out = Vec::new();
        let mut err = Vec::new();
        write_transition(&mut out, &mut err, &monitor, &down, at(0)).unwrap();

        assert!(out.is_empty());
        let err_text = String::from_utf8(err.clone()).unwrap();
        assert!(err_text.contains("monitor api DOWN!"));
        assert!(err_text.ends_with('\n'));

        write_transition(&mut out, &mut err, &monitor, &up, at(5)).unwrap();

        let out_text = String::from_utf8(out).unwrap();
        assert!(out_text.contains("monitor api UP!"));
        assert!(out_text.contains("down_duration=-"));
        assert_eq!(String::from_utf8(err).unwrap(), err_text);
    }
}
