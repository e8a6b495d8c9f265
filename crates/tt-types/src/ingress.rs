use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// A locally ingested event, before it has an ID.
///
/// The ID is derived from content so the same observation ingested twice is
/// the same event. All differentiating fields participate in the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: i64,
    pub data: Value,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

fn default_schema_version() -> i64 {
    1
}

impl RawEvent {
    /// Deterministic content hash, truncated to 32 hex chars.
    ///
    /// `data` is serialized with serde_json's default map ordering (sorted
    /// keys), so key order in the source JSON does not change the ID.
    pub fn compute_id(&self) -> String {
        let data_json = serde_json::to_string(&self.data).unwrap_or_default();
        let content = [
            self.source.as_str(),
            self.kind.as_str(),
            self.timestamp.as_str(),
            data_json.as_str(),
            self.cwd.as_deref().unwrap_or(""),
            self.session_id.as_deref().unwrap_or(""),
        ]
        .join("|");

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..32].to_string()
    }
}

/// An event exported by a peer collector, with a pre-computed ID.
///
/// `tt export` on the remote host outputs events with IDs already assigned;
/// they are trusted as given since it is our own collector producing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedEvent {
    pub id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub data: Value,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}
