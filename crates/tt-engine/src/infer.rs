//! Stream inference: clusters unassigned events into streams by working
//! directory and temporal adjacency.
//!
//! Events never cluster across distinct normalized working directories, and
//! a gap strictly greater than the threshold starts a new cluster. The run
//! commits all created streams and assignments in one transaction, so a
//! failure leaves nothing half-assigned. Re-running with no new unassigned
//! events is a no-op.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tt_store::EventStore;
use tt_types::{Event, UNCATEGORIZED};

use crate::Result;

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Maximum silence between successive events of one stream. A gap of
    /// exactly this many milliseconds still clusters together.
    pub gap_threshold_ms: i64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            gap_threshold_ms: 30 * 60 * 1000,
        }
    }
}

/// A group of events destined for one freshly created stream.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub name: String,
    pub event_ids: Vec<String>,
}

/// Normalize a working directory: trailing slashes are stripped (except for
/// the root directory itself), and null/empty collapse to `None`.
pub fn normalize_cwd(cwd: Option<&str>) -> Option<String> {
    let cwd = cwd?.trim();
    if cwd.is_empty() {
        return None;
    }
    let stripped = cwd.trim_end_matches('/');
    if stripped.is_empty() {
        Some("/".to_string())
    } else {
        Some(stripped.to_string())
    }
}

/// Stream name for a normalized cwd: the basename, `/` for the root, or the
/// Uncategorized sentinel when there is no cwd at all.
pub fn stream_name(normalized_cwd: Option<&str>) -> String {
    match normalized_cwd {
        None => UNCATEGORIZED.to_string(),
        Some("/") => "/".to_string(),
        Some(path) => path
            .rsplit('/')
            .next()
            .filter(|part| !part.is_empty())
            .unwrap_or(path)
            .to_string(),
    }
}

/// Partition unassigned events into clusters. Input order within a cwd group
/// must be ascending by timestamp (the store's canonical order guarantees
/// this).
pub fn cluster_events(events: &[Event], gap_threshold_ms: i64) -> Vec<Cluster> {
    // BTreeMap keeps cluster creation order stable across runs.
    let mut by_cwd: BTreeMap<Option<String>, Vec<&Event>> = BTreeMap::new();
    for event in events {
        by_cwd
            .entry(normalize_cwd(event.cwd.as_deref()))
            .or_default()
            .push(event);
    }

    let mut clusters = Vec::new();
    for (cwd, group) in by_cwd {
        let name = stream_name(cwd.as_deref());
        let mut current: Vec<String> = Vec::new();
        let mut last_ts: Option<DateTime<Utc>> = None;

        for event in group {
            if let Some(last) = last_ts {
                let gap = (event.timestamp - last).num_milliseconds();
                if gap > gap_threshold_ms {
                    clusters.push(Cluster {
                        name: name.clone(),
                        event_ids: std::mem::take(&mut current),
                    });
                }
            }
            current.push(event.id.clone());
            last_ts = Some(event.timestamp);
        }

        if !current.is_empty() {
            clusters.push(Cluster {
                name,
                event_ids: current,
            });
        }
    }

    clusters
}

/// Run stream inference over all unassigned events. Returns the number of
/// events assigned; zero when there was nothing to do.
pub fn run_inference(store: &EventStore, config: &InferenceConfig) -> Result<usize> {
    let unassigned = store.unassigned_events()?;
    if unassigned.is_empty() {
        return Ok(0);
    }

    let clusters = cluster_events(&unassigned, config.gap_threshold_ms);

    let assigned = store.with_transaction(|s| {
        let mut assigned = 0;
        for cluster in &clusters {
            let stream_id = s.create_stream(Some(&cluster.name))?;
            assigned += s.assign_events(&cluster.event_ids, &stream_id)?;
        }
        Ok(assigned)
    })?;

    Ok(assigned)
}
