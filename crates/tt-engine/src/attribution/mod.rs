//! Time attribution: a deterministic event-driven replay over a closed
//! window, producing per-stream direct and delegated milliseconds.
//!
//! The result is a pure function of the event history intersected with
//! `[start - lookback, end]`, where the lookback is the larger of the
//! attention window and the session timeout. Replays on identical inputs
//! produce identical counts.

mod boundary;
mod replay;
mod state;

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tt_store::EventStore;
use tt_types::Event;

use crate::Result;

#[derive(Debug, Clone)]
pub struct AttributionConfig {
    /// Grace period after the last real activity before the user counts as
    /// idle.
    pub attention_window_ms: i64,
    /// Quiescence period after which an agent session counts as stale.
    pub session_timeout_ms: i64,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            attention_window_ms: 120_000,
            session_timeout_ms: 30 * 60 * 1000,
        }
    }
}

impl AttributionConfig {
    /// How far before the window start events can still influence the seed
    /// state.
    pub fn lookback_ms(&self) -> i64 {
        self.attention_window_ms.max(self.session_timeout_ms)
    }
}

/// Attributed milliseconds for one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamTotals {
    /// Wall-clock during which the user actively attended the stream.
    pub direct_ms: u64,
    /// Wall-clock during which an agent session tied to the stream was
    /// active. Sessions on different streams accrue in parallel, so the sum
    /// across streams can exceed the window length.
    pub delegated_ms: u64,
}

/// Attribute a window over an in-memory event slice.
///
/// `events` is the history intersected with `[start - lookback, end)` in any
/// order; pre-window events seed the state at `start`. An empty or inverted
/// window yields an empty result.
pub fn attribute_window(
    events: &[Event],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    session_map: &HashMap<String, String>,
    config: &AttributionConfig,
) -> HashMap<String, StreamTotals> {
    if start >= end {
        return HashMap::new();
    }

    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|event| event.sort_key());

    // Events older than the lookback horizon cannot influence the result;
    // dropping them here makes the locality guarantee structural rather
    // than a property of the caller's fetch.
    let horizon = start - Duration::milliseconds(config.lookback_ms());
    let pre_window: Vec<&Event> = ordered
        .iter()
        .copied()
        .filter(|event| event.timestamp >= horizon && event.timestamp < start)
        .collect();
    let window: Vec<&Event> = ordered
        .iter()
        .copied()
        .filter(|event| event.timestamp >= start && event.timestamp < end)
        .collect();

    let seed = state::seed_state(&pre_window, start, session_map, config);
    let markers = boundary::build_markers(&seed, &window, end, config);
    replay::replay(seed, &window, &markers, start, end, session_map, config)
}

/// Attribute a window against the store: fetch the history with lookback,
/// materialize the session→stream map once, then replay.
pub fn calculate_time(
    store: &EventStore,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    config: &AttributionConfig,
) -> Result<HashMap<String, StreamTotals>> {
    if start >= end {
        return Ok(HashMap::new());
    }

    let lookback = Duration::milliseconds(config.lookback_ms());
    let events = store.events_in_range(Some(start - lookback), Some(end), None, None)?;
    let session_map = store.session_stream_map()?;

    Ok(attribute_window(&events, start, end, &session_map, config))
}
