use std::path::Path;

use anyhow::Result;
use chrono::Utc;

use super::open_existing;
use crate::presentation::format_relative_time;

pub fn handle(db_path: &Path) -> Result<()> {
    let store = open_existing(db_path)?;
    let statuses = store.last_event_per_source()?;

    if statuses.is_empty() {
        println!("No events recorded");
        return Ok(());
    }

    let now = Utc::now();
    let mut total = 0;
    for status in &statuses {
        total += status.event_count;
        println!(
            "{:<20} {:>6} events   last {}",
            status.source,
            status.event_count,
            format_relative_time(&status.last_timestamp, now)
        );
    }
    println!();
    println!("Total events: {}", total);
    Ok(())
}
