//! Report aggregation: rolls per-stream totals up by tag.
//!
//! A stream with several tags counts once under each tag; header totals are
//! summed at the stream level so multi-tagged streams are not double-counted
//! at the top. Untagged streams group under a sentinel that always sorts
//! last.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tt_store::StreamRecord;

use crate::attribution::StreamTotals;

/// A stream's share within one tag group.
#[derive(Debug, Clone, Serialize)]
pub struct StreamSlice {
    pub stream_id: String,
    pub name: Option<String>,
    pub direct_ms: u64,
    pub delegated_ms: u64,
}

/// Totals for one tag. `tag` is `None` for the untagged group.
#[derive(Debug, Clone, Serialize)]
pub struct TagGroup {
    pub tag: Option<String>,
    pub direct_ms: u64,
    pub delegated_ms: u64,
    pub streams: Vec<StreamSlice>,
}

/// An attributed window rolled up by tag.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(with = "tt_types::time::ts_format")]
    pub start: DateTime<Utc>,
    #[serde(with = "tt_types::time::ts_format")]
    pub end: DateTime<Utc>,
    pub total_direct_ms: u64,
    pub total_delegated_ms: u64,
    pub groups: Vec<TagGroup>,
}

pub fn build_report(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    totals: &HashMap<String, StreamTotals>,
    streams: &[StreamRecord],
    tags: &HashMap<String, Vec<String>>,
) -> Report {
    let names: HashMap<&str, Option<&str>> = streams
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_deref()))
        .collect();

    let mut groups: HashMap<Option<String>, Vec<StreamSlice>> = HashMap::new();
    let mut total_direct_ms = 0;
    let mut total_delegated_ms = 0;

    for (stream_id, stream_totals) in totals {
        total_direct_ms += stream_totals.direct_ms;
        total_delegated_ms += stream_totals.delegated_ms;

        let slice = StreamSlice {
            stream_id: stream_id.clone(),
            name: names
                .get(stream_id.as_str())
                .copied()
                .flatten()
                .map(String::from),
            direct_ms: stream_totals.direct_ms,
            delegated_ms: stream_totals.delegated_ms,
        };

        match tags.get(stream_id).filter(|t| !t.is_empty()) {
            Some(stream_tags) => {
                for tag in stream_tags {
                    groups
                        .entry(Some(tag.clone()))
                        .or_default()
                        .push(slice.clone());
                }
            }
            None => groups.entry(None).or_default().push(slice),
        }
    }

    let mut groups: Vec<TagGroup> = groups
        .into_iter()
        .map(|(tag, mut streams)| {
            streams.sort_by(|a, b| {
                (b.direct_ms + b.delegated_ms)
                    .cmp(&(a.direct_ms + a.delegated_ms))
                    .then_with(|| a.stream_id.cmp(&b.stream_id))
            });
            let direct_ms = streams.iter().map(|s| s.direct_ms).sum();
            let delegated_ms = streams.iter().map(|s| s.delegated_ms).sum();
            TagGroup {
                tag,
                direct_ms,
                delegated_ms,
                streams,
            }
        })
        .collect();

    // Untagged sorts last regardless of magnitude; the rest by combined
    // time, then name for a stable order.
    groups.sort_by(|a, b| {
        a.tag
            .is_none()
            .cmp(&b.tag.is_none())
            .then_with(|| {
                (b.direct_ms + b.delegated_ms).cmp(&(a.direct_ms + a.delegated_ms))
            })
            .then_with(|| a.tag.cmp(&b.tag))
    });

    Report {
        start,
        end,
        total_direct_ms,
        total_delegated_ms,
        groups,
    }
}
