use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tt_types::time::parse_timestamp;

use super::open_existing;

pub fn handle(
    db_path: &Path,
    since: Option<&str>,
    until: Option<&str>,
    event_type: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let store = open_existing(db_path)?;

    let since = parse_bound(since, "--since")?;
    let until = parse_bound(until, "--until")?;

    for event in store.events_in_range(since, until, event_type, limit)? {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

fn parse_bound(value: Option<&str>, flag: &str) -> Result<Option<DateTime<Utc>>> {
    match value {
        None => Ok(None),
        Some(raw) => parse_timestamp(raw)
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("Invalid {} value: {}", flag, raw)),
    }
}
