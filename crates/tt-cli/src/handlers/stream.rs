use std::path::Path;

use anyhow::Result;
use tt_engine::run_inference;

use super::open_existing;
use crate::config::Config;

pub fn list(db_path: &Path) -> Result<()> {
    let store = open_existing(db_path)?;
    let streams = store.streams()?;

    if streams.is_empty() {
        println!("No streams yet - run `tt stream infer` after importing events");
        return Ok(());
    }

    let tags = store.stream_tags(None)?;
    for stream in &streams {
        let short_id = &stream.id[..stream.id.len().min(8)];
        let name = stream.name.as_deref().unwrap_or("-");
        let tag_list = tags
            .get(&stream.id)
            .map(|t| t.join(", "))
            .unwrap_or_default();
        println!("{:<10} {:<24} {}", short_id, name, tag_list);
    }
    Ok(())
}

pub fn infer(db_path: &Path) -> Result<()> {
    let store = open_existing(db_path)?;
    let config = Config::load_for_db(db_path)?;
    let assigned = run_inference(&store, &config.inference())?;
    println!("Assigned {} events to streams", assigned);
    Ok(())
}

pub fn delete(db_path: &Path, prefix: &str) -> Result<()> {
    let store = open_existing(db_path)?;
    let Some(stream) = store.stream_by_prefix(prefix)? else {
        anyhow::bail!("No stream found matching '{}'", prefix);
    };

    store.delete_stream(&stream.id)?;
    println!(
        "Deleted stream {} ({}); its events are unassigned again",
        &stream.id[..stream.id.len().min(8)],
        stream.name.as_deref().unwrap_or("-")
    );
    Ok(())
}
