use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use is_terminal::IsTerminal;
use tt_engine::{build_report, calculate_time, run_inference};
use tt_types::time::parse_timestamp;

use super::open_existing;
use crate::args::OutputFormat;
use crate::config::Config;
use crate::presentation::render_report;

pub fn handle(
    db_path: &Path,
    since: Option<&str>,
    until: Option<&str>,
    date: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let (start, end) = resolve_window(since, until, date)?;

    let store = open_existing(db_path)?;
    let config = Config::load_for_db(db_path)?;

    // New events first get a stream, then the window is attributed.
    run_inference(&store, &config.inference())?;
    let totals = calculate_time(&store, start, end, &config.attribution())?;

    let streams = store.streams()?;
    let tags = store.stream_tags(None)?;
    let report = build_report(start, end, &totals, &streams, &tags);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => {
            let color = std::io::stdout().is_terminal();
            print!("{}", render_report(&report, color));
        }
    }
    Ok(())
}

/// Explicit `--since/--until` window, a single `--date` day, or today.
/// Day boundaries follow the local timezone.
fn resolve_window(
    since: Option<&str>,
    until: Option<&str>,
    date: Option<&str>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    if let Some(since) = since {
        let until = until.context("--since requires --until")?;
        let start = parse_timestamp(since)
            .with_context(|| format!("Invalid --since value: {}", since))?;
        let end = parse_timestamp(until)
            .with_context(|| format!("Invalid --until value: {}", until))?;
        return Ok((start, end));
    }

    let day = match date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid --date value: {} (expected YYYY-MM-DD)", raw))?,
        None => Local::now().date_naive(),
    };
    let next = day
        .checked_add_days(Days::new(1))
        .context("Date out of range")?;

    Ok((local_midnight(day)?, local_midnight(next)?))
}

fn local_midnight(day: NaiveDate) -> Result<DateTime<Utc>> {
    let naive = day.and_time(NaiveTime::MIN);
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .with_context(|| format!("Could not resolve local midnight for {}", day))?;
    Ok(local.with_timezone(&Utc))
}
