//! Terminal formatting helpers: durations, relative times, and the plain
//! report rendering.

use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;
use tt_engine::Report;
use tt_types::time::parse_timestamp;

/// Format milliseconds as `Xh Ym`, `Ym`, `<1m`, or `0m`.
pub fn format_duration_ms(ms: u64) -> String {
    if ms == 0 {
        return "0m".to_string();
    }
    if ms < 60_000 {
        return "<1m".to_string();
    }
    let total_minutes = ms / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Human-friendly age of a stored timestamp. Malformed values come back
/// verbatim; future timestamps (clock skew) read as "just now".
pub fn format_relative_time(timestamp: &str, now: DateTime<Utc>) -> String {
    let Some(ts) = parse_timestamp(timestamp) else {
        return timestamp.to_string();
    };

    let seconds = (now - ts).num_seconds();
    if seconds < 60 {
        "just now".to_string()
    } else if seconds < 3600 {
        plural(seconds / 60, "minute")
    } else if seconds < 86_400 {
        plural(seconds / 3600, "hour")
    } else {
        plural(seconds / 86_400, "day")
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

/// Render a report for the terminal. Groups come pre-sorted from the
/// aggregator; this only lays them out.
pub fn render_report(report: &Report, color: bool) -> String {
    let mut out = String::new();

    let window = format!(
        "{} to {}",
        report.start.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        report.end.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    out.push_str(&format!("Report {}\n", window));
    out.push_str(&format!(
        "Direct {}   Delegated {}\n",
        format_duration_ms(report.total_direct_ms),
        format_duration_ms(report.total_delegated_ms)
    ));

    if report.groups.is_empty() {
        out.push_str("\nNo time recorded in this window\n");
        return out;
    }

    for group in &report.groups {
        let label = format!("{:<20}", group.tag.as_deref().unwrap_or("untagged"));
        let label = if color {
            format!("{}", label.bold())
        } else {
            label
        };
        out.push_str(&format!(
            "\n{} {:>8} direct {:>8} delegated\n",
            label,
            format_duration_ms(group.direct_ms),
            format_duration_ms(group.delegated_ms)
        ));

        for stream in &group.streams {
            let name = stream
                .name
                .as_deref()
                .unwrap_or(&stream.stream_id[..stream.stream_id.len().min(8)]);
            out.push_str(&format!(
                "  {:<18} {:>8} {:>8}\n",
                name,
                format_duration_ms(stream.direct_ms),
                format_duration_ms(stream.delegated_ms)
            ));
        }
    }

    out
}
