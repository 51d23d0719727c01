//! Alert payloads in the HTML subset accepted by Telegram
//! (`b`, `i`, `u`, `pre`, `code`).

use chrono::{DateTime, Local, TimeDelta};
use serde::Serialize;

use crate::monitoring::Monitor;
use crate::monitoring::types::{EventKind, Transition};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Render a duration like `1h2m3s`, `4m0s`, `12s` or `850ms`.
/// Negative durations render as `0s`.
pub fn format_duration(duration: TimeDelta) -> String {
    let millis = duration.num_milliseconds();
    if millis <= 0 {
        return "0s".to_string();
    }
    if millis < 1000 {
        return format!("{millis}ms");
    }

    let total_seconds = millis / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m{seconds}s"),
        _ => format!("{hours}h{minutes}m{seconds}s"),
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Serialize)]
struct DownDetails<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Type")]
    protocol: String,
    #[serde(rename = "Upstream")]
    upstream: &'a str,
    #[serde(rename = "Error")]
    error: &'a str,
    #[serde(rename = "Down Time")]
    down_time: String,
    #[serde(rename = "Fail Count")]
    failure_count: u32,
    #[serde(rename = "Threshold")]
    threshold: u32,
}

#[derive(Serialize)]
struct UpDetails<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Type")]
    protocol: String,
    #[serde(rename = "Upstream")]
    upstream: &'a str,
    #[serde(rename = "Down Time")]
    down_time: Option<String>,
    #[serde(rename = "Up Time")]
    up_time: String,
    #[serde(rename = "Down Duration")]
    down_duration: Option<String>,
}

fn details_block<T: Serialize>(details: &T) -> String {
    let json = serde_json::to_string_pretty(details).unwrap_or_default();
    format!("<pre><code>{}</code></pre>", escape_html(&json))
}

/// Build the alert payload for a transition of `monitor`
pub fn render(monitor: &Monitor, transition: &Transition) -> (EventKind, String) {
    let name = escape_html(monitor.name());

    let payload = match transition {
        Transition::Down { at, reason, failure_count, threshold } => {
            let down_time = format_timestamp(*at);
            let header = format!(
                "<b>🔴 Service DOWN !!</b>\n<i>We have detected that service <b>{name}</b> is down and unreachable at <u>{down_time}</u></i>\n\n"
            );
            let details = DownDetails {
                name: monitor.name(),
                protocol: monitor.protocol().to_string(),
                upstream: monitor.upstream(),
                error: reason,
                down_time,
                failure_count: *failure_count,
                threshold: *threshold,
            };
            header + &details_block(&details)
        }
        Transition::Up { down_at, up_at, down_duration } => {
            let up_time = format_timestamp(*up_at);
            let header = format!(
                "<b>🟢 Service UP !!</b>\n<i>We have detected that service <b>{name}</b> is up and reachable at <u>{up_time}</u></i>\n\n"
            );
            let details = UpDetails {
                name: monitor.name(),
                protocol: monitor.protocol().to_string(),
                upstream: monitor.upstream(),
                down_time: down_at.map(format_timestamp),
                up_time,
                down_duration: down_duration.map(format_duration),
            };
            header + &details_block(&details)
        }
    };

    (transition.kind(), payload)
}
