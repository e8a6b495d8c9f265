use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tt_types::Event;

use super::boundary::Marker;
use super::state::ReplayState;
use super::{AttributionConfig, StreamTotals};

/// One entry of the merged replay list. Synthetic markers order after all
/// real events at an equal timestamp, so an activity or session event at the
/// exact boundary instant wins over the marker it superseded.
enum ReplayEntry<'a> {
    Real(&'a Event),
    Synthetic(&'a Marker),
}

impl ReplayEntry<'_> {
    fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ReplayEntry::Real(event) => event.timestamp,
            ReplayEntry::Synthetic(marker) => marker.timestamp(),
        }
    }

    fn order_rank(&self) -> u8 {
        match self {
            ReplayEntry::Real(event) => event.kind.tiebreak(),
            ReplayEntry::Synthetic(_) => 2,
        }
    }
}

/// Single-pass replay: walk the merged event list, attributing the interval
/// since the previous event before applying each transition, then close out
/// the tail interval up to the window end.
pub(super) fn replay(
    mut state: ReplayState,
    window: &[&Event],
    markers: &[Marker],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    session_map: &HashMap<String, String>,
    config: &AttributionConfig,
) -> HashMap<String, StreamTotals> {
    let mut merged: Vec<ReplayEntry<'_>> = window
        .iter()
        .map(|event| ReplayEntry::Real(*event))
        .chain(markers.iter().map(ReplayEntry::Synthetic))
        .collect();
    merged.sort_by_key(|entry| (entry.timestamp(), entry.order_rank()));

    let mut results: HashMap<String, StreamTotals> = HashMap::new();
    let mut t_prev = start;

    for entry in &merged {
        let ts = entry.timestamp();
        let delta = (ts - t_prev).num_milliseconds().max(0);

        prune_stale_sessions(&mut state, t_prev, config);
        accrue(&mut results, &state, session_map, delta);

        match entry {
            ReplayEntry::Real(event) => state.apply(event, session_map),
            ReplayEntry::Synthetic(Marker::IdleStart(at)) => {
                // Superseded if activity arrived at the marker instant.
                let elapsed = state
                    .last_activity
                    .map_or(i64::MAX, |last| (*at - last).num_milliseconds());
                if elapsed >= config.attention_window_ms {
                    state.is_idle = true;
                }
            }
            ReplayEntry::Synthetic(Marker::SessionTimeout { at, session_id }) => {
                let stale = state
                    .active_sessions
                    .get(session_id)
                    .is_some_and(|last| (*at - *last).num_milliseconds() >= config.session_timeout_ms);
                if stale {
                    state.active_sessions.remove(session_id);
                }
            }
        }

        t_prev = t_prev.max(ts);
    }

    let delta = (end - t_prev).num_milliseconds().max(0);
    prune_stale_sessions(&mut state, t_prev, config);
    accrue(&mut results, &state, session_map, delta);

    results
}

fn prune_stale_sessions(state: &mut ReplayState, now: DateTime<Utc>, config: &AttributionConfig) {
    state
        .active_sessions
        .retain(|_, last| (now - *last).num_milliseconds() <= config.session_timeout_ms);
}

fn accrue(
    results: &mut HashMap<String, StreamTotals>,
    state: &ReplayState,
    session_map: &HashMap<String, String>,
    delta_ms: i64,
) {
    if delta_ms <= 0 {
        return;
    }
    let delta = delta_ms as u64;

    if !state.is_afk
        && !state.is_idle
        && let Some(stream) = &state.current_stream
    {
        results.entry(stream.clone()).or_default().direct_ms += delta;
    }

    for session_id in state.active_sessions.keys() {
        if let Some(stream) = session_map.get(session_id) {
            results.entry(stream.clone()).or_default().delegated_ms += delta;
        }
    }
}
