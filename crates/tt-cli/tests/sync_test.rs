//! Sync command tests using a stub `ssh` placed on PATH.
#![cfg(unix)]

mod common;

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use common::TestFixture;
use predicates::prelude::*;
use tempfile::TempDir;

/// Write a fake `ssh` that ignores its arguments and behaves per `script`.
fn stub_ssh(dir: &Path, script: &str) {
    let path = dir.join("ssh");
    fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
}

fn path_with(dir: &Path) -> String {
    let original = std::env::var("PATH").unwrap_or_default();
    format!("{}:{}", dir.display(), original)
}

#[test]
fn test_sync_imports_remote_events() {
    let fixture = TestFixture::new();
    let bin_dir = TempDir::new().unwrap();
    stub_ssh(
        bin_dir.path(),
        r#"echo '{"id":"r1","timestamp":"2025-01-25T10:00:00Z","type":"tmux_pane_focus","source":"remote.tmux","data":{}}'"#,
    );

    fixture
        .command()
        .env("PATH", path_with(bin_dir.path()))
        .args(["sync", "user@devserver"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Synced 1 events from user@devserver"));

    let events = fixture.stdout_of(&["events"]);
    assert_eq!(events.trim().lines().count(), 1);
}

#[test]
fn test_sync_is_idempotent() {
    let fixture = TestFixture::new();
    let bin_dir = TempDir::new().unwrap();
    stub_ssh(
        bin_dir.path(),
        r#"echo '{"id":"r1","timestamp":"2025-01-25T10:00:00Z","type":"t","source":"s","data":{}}'"#,
    );
    let path = path_with(bin_dir.path());

    for expected in ["Synced 1 events", "Synced 0 events"] {
        fixture
            .command()
            .env("PATH", &path)
            .args(["sync", "devserver"])
            .assert()
            .success()
            .stdout(predicate::str::contains(expected));
    }
}

#[test]
fn test_sync_empty_remote() {
    let fixture = TestFixture::new();
    let bin_dir = TempDir::new().unwrap();
    stub_ssh(bin_dir.path(), "exit 0");

    fixture
        .command()
        .env("PATH", path_with(bin_dir.path()))
        .args(["sync", "devserver"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No events to sync"));
}

#[test]
fn test_sync_connection_failure() {
    let fixture = TestFixture::new();
    let bin_dir = TempDir::new().unwrap();
    stub_ssh(
        bin_dir.path(),
        "echo 'ssh: connect to host devserver: Connection refused' >&2\nexit 255",
    );

    fixture
        .command()
        .env("PATH", path_with(bin_dir.path()))
        .args(["sync", "devserver"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SSH connection to devserver failed"));
}

#[test]
fn test_sync_remote_command_failure() {
    let fixture = TestFixture::new();
    let bin_dir = TempDir::new().unwrap();
    stub_ssh(bin_dir.path(), "echo 'tt: command not found' >&2\nexit 127");

    fixture
        .command()
        .env("PATH", path_with(bin_dir.path()))
        .args(["sync", "devserver"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Remote export failed"));
}

#[test]
fn test_sync_all_invalid_exits_nonzero() {
    let fixture = TestFixture::new();
    let bin_dir = TempDir::new().unwrap();
    stub_ssh(bin_dir.path(), "echo 'not valid json'");

    fixture
        .command()
        .env("PATH", path_with(bin_dir.path()))
        .args(["sync", "devserver"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Synced 0 events"));
}
