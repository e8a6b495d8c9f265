use std::path::Path;

use anyhow::Result;
use tt_store::{EventStore, StreamRecord};

use super::open_existing;

fn resolve_stream(store: &EventStore, prefix: &str) -> Result<StreamRecord> {
    store
        .stream_by_prefix(prefix)?
        .ok_or_else(|| anyhow::anyhow!("No stream found matching '{}'", prefix))
}

pub fn add(db_path: &Path, prefix: &str, tag: &str) -> Result<()> {
    let store = open_existing(db_path)?;
    let stream = resolve_stream(&store, prefix)?;
    let short_id = &stream.id[..stream.id.len().min(8)];

    if store.add_tag(&stream.id, tag)? {
        println!("Tagged stream {} with '{}'", short_id, tag);
    } else {
        println!("Stream {} already has tag '{}'", short_id, tag);
    }
    Ok(())
}

pub fn remove(db_path: &Path, prefix: &str, tag: &str) -> Result<()> {
    let store = open_existing(db_path)?;
    let stream = resolve_stream(&store, prefix)?;
    let short_id = &stream.id[..stream.id.len().min(8)];

    if store.remove_tag(&stream.id, tag)? {
        println!("Removed tag '{}' from stream {}", tag, short_id);
    } else {
        println!("Stream {} doesn't have tag '{}'", short_id, tag);
    }
    Ok(())
}

pub fn list(db_path: &Path) -> Result<()> {
    let store = open_existing(db_path)?;
    let top = store.top_tags(20)?;

    if top.is_empty() {
        println!("No tags yet");
    } else {
        for (tag, count) in &top {
            let label = if *count == 1 { "stream" } else { "streams" };
            println!("{:<24} {} {}", tag, count, label);
        }
    }

    let untagged = store.untagged_streams()?;
    if !untagged.is_empty() {
        println!();
        println!("Untagged streams: {}", untagged.len());
    }
    Ok(())
}
