use std::io::Cursor;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tt_store::EventStore;

use super::import::import_lines;

/// Pull events from a remote collector: `ssh <host> tt export`, then import
/// the JSONL it prints. The remote command is an argv list; nothing is
/// interpreted by a shell.
pub fn handle(db_path: &Path, host: &str) -> Result<()> {
    let output = Command::new("ssh")
        .arg(host)
        .arg("tt")
        .arg("export")
        .output()
        .context("Failed to run ssh")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // ssh itself reports 255 for connection-level failures.
        if output.status.code() == Some(255) {
            anyhow::bail!("SSH connection to {} failed: {}", host, stderr.trim());
        }
        anyhow::bail!("Remote export failed: {}", stderr.trim());
    }

    if output.stdout.iter().all(|b| b.is_ascii_whitespace()) {
        println!("No events to sync from {}", host);
        return Ok(());
    }

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let store = EventStore::open(db_path)?;
    let summary = import_lines(&store, Cursor::new(output.stdout))?;

    println!("Synced {} events from {}", summary.imported, host);

    if summary.had_input && summary.valid == 0 {
        std::process::exit(1);
    }
    Ok(())
}
