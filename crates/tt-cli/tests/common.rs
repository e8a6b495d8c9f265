//! Common test utilities shared across integration tests.
//!
//! Note: Clippy cannot track usage across integration test files,
//! hence the `allow(dead_code)` annotation.
#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

pub struct TestFixture {
    _temp_dir: TempDir,
    db_path: PathBuf,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("events.db");
        Self {
            _temp_dir: temp_dir,
            db_path,
        }
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("tt").expect("Failed to find tt binary");
        cmd.arg("--db").arg(&self.db_path);
        cmd
    }

    /// Import JSONL via stdin and expect success.
    pub fn import(&self, jsonl: &str) {
        self.command()
            .arg("import")
            .write_stdin(jsonl.to_string())
            .assert()
            .success();
    }

    /// Stdout of a successful command invocation.
    pub fn stdout_of(&self, args: &[&str]) -> String {
        let output = self
            .command()
            .args(args)
            .output()
            .expect("Failed to run tt");
        assert!(
            output.status.success(),
            "tt {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }
}

/// Build one JSONL event line.
pub fn event_line(
    id: &str,
    timestamp: &str,
    kind: &str,
    cwd: Option<&str>,
    session_id: Option<&str>,
    data: serde_json::Value,
) -> String {
    let mut event = serde_json::json!({
        "id": id,
        "timestamp": timestamp,
        "type": kind,
        "source": "remote.tmux",
        "data": data,
    });
    if let Some(cwd) = cwd {
        event["cwd"] = serde_json::json!(cwd);
    }
    if let Some(session_id) = session_id {
        event["session_id"] = serde_json::json!(session_id);
    }
    format!("{}\n", event)
}
