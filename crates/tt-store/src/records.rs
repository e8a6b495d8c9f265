use serde::{Deserialize, Serialize};

/// A stream row. Streams are append-only from the engine's point of view;
/// only tags and names are edited after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRecord {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub name: Option<String>,
}

/// Last-seen summary for one event source, for the status panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStatus {
    pub source: String,
    pub last_timestamp: String,
    pub event_count: i64,
}
