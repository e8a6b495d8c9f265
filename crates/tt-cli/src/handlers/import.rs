use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::error::Category;
use tt_store::EventStore;
use tt_types::ImportedEvent;

pub struct ImportSummary {
    pub imported: usize,
    pub valid: usize,
    pub had_input: bool,
}

/// Import events from stdin. Duplicate IDs are silently skipped; bad lines
/// get a line-scoped warning on stderr. Exits 1 when non-empty input yields
/// zero valid events.
pub fn handle(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let store = EventStore::open(db_path)?;

    let stdin = std::io::stdin();
    let summary = import_lines(&store, stdin.lock())?;

    println!("Imported {} events", summary.imported);

    if summary.had_input && summary.valid == 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Shared JSONL ingestion for `import` and `sync`.
pub fn import_lines(store: &EventStore, reader: impl BufRead) -> Result<ImportSummary> {
    let mut summary = ImportSummary {
        imported: 0,
        valid: 0,
        had_input: false,
    };

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        summary.had_input = true;

        match serde_json::from_str::<ImportedEvent>(trimmed) {
            Ok(event) => {
                summary.valid += 1;
                if store.insert_imported(&event)? {
                    summary.imported += 1;
                }
            }
            Err(err) => {
                let what = match err.classify() {
                    Category::Data => "validation error",
                    _ => "invalid JSON",
                };
                eprintln!("Warning: line {}: {}: {}", index + 1, what, err);
            }
        }
    }

    Ok(summary)
}
