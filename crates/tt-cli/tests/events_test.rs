mod common;

use common::{TestFixture, event_line};
use predicates::prelude::*;

fn seeded_fixture() -> TestFixture {
    let fixture = TestFixture::new();
    let input = [
        event_line(
            "e1",
            "2025-01-25T10:00:00Z",
            "tmux_pane_focus",
            Some("/home/sami/project"),
            None,
            serde_json::json!({}),
        ),
        event_line(
            "e2",
            "2025-01-25T11:00:00Z",
            "agent_tool_use",
            None,
            Some("session-A"),
            serde_json::json!({}),
        ),
        event_line(
            "e3",
            "2025-01-25T12:00:00Z",
            "tmux_pane_focus",
            Some("/home/sami/project"),
            None,
            serde_json::json!({}),
        ),
    ]
    .concat();
    fixture.import(&input);
    fixture
}

#[test]
fn test_events_outputs_jsonl() {
    let fixture = seeded_fixture();
    let output = fixture.stdout_of(&["events"]);

    let lines: Vec<&str> = output.trim().lines().collect();
    assert_eq!(lines.len(), 3);

    let parsed: Vec<serde_json::Value> = lines
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(parsed[0]["id"], "e1");
    assert_eq!(parsed[0]["cwd"], "/home/sami/project");
    assert_eq!(parsed[1]["session_id"], "session-A");
    assert_eq!(parsed[2]["id"], "e3");
}

#[test]
fn test_events_since_filter() {
    let fixture = seeded_fixture();
    let output = fixture.stdout_of(&["events", "--since", "2025-01-25T11:00:00Z"]);

    let lines: Vec<&str> = output.trim().lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["id"], "e2");
}

#[test]
fn test_events_until_is_exclusive() {
    let fixture = seeded_fixture();
    let output = fixture.stdout_of(&["events", "--until", "2025-01-25T11:00:00Z"]);

    let lines: Vec<&str> = output.trim().lines().collect();
    assert_eq!(lines.len(), 1);
}

#[test]
fn test_events_type_filter_and_limit() {
    let fixture = seeded_fixture();

    let output = fixture.stdout_of(&["events", "--type", "tmux_pane_focus"]);
    assert_eq!(output.trim().lines().count(), 2);

    let output = fixture.stdout_of(&["events", "--type", "tmux_pane_focus", "--limit", "1"]);
    assert_eq!(output.trim().lines().count(), 1);

    let output = fixture.stdout_of(&["events", "--type", "nonexistent"]);
    assert_eq!(output.trim(), "");
}

#[test]
fn test_events_invalid_since_fails() {
    let fixture = seeded_fixture();
    fixture
        .command()
        .args(["events", "--since", "not-a-timestamp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --since"));
}

#[test]
fn test_events_without_database_fails() {
    let fixture = TestFixture::new();
    fixture
        .command()
        .arg("events")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No database found"));
}
