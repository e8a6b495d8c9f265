use rusqlite::Connection;

use crate::Result;

// Events' stream_id survives stream deletion as NULL so the events become
// eligible for re-inference; tag rows die with their stream.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS streams (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    name TEXT
);

CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    type TEXT NOT NULL,
    source TEXT NOT NULL,
    schema_version INTEGER DEFAULT 1,
    data TEXT NOT NULL,
    cwd TEXT,
    session_id TEXT,
    stream_id TEXT,
    assignment_source TEXT DEFAULT 'inferred',
    FOREIGN KEY (stream_id) REFERENCES streams(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS stream_tags (
    stream_id TEXT NOT NULL,
    tag TEXT NOT NULL,
    PRIMARY KEY (stream_id, tag),
    FOREIGN KEY (stream_id) REFERENCES streams(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp);
CREATE INDEX IF NOT EXISTS idx_events_type ON events(type);
CREATE INDEX IF NOT EXISTS idx_events_stream ON events(stream_id);
CREATE INDEX IF NOT EXISTS idx_events_cwd ON events(cwd);
CREATE INDEX IF NOT EXISTS idx_events_session ON events(session_id);
CREATE INDEX IF NOT EXISTS idx_streams_updated ON streams(updated_at);
CREATE INDEX IF NOT EXISTS idx_stream_tags_tag ON stream_tags(tag);
"#;

pub fn init(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
