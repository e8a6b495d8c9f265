//! Synthetic boundary markers.
//!
//! Two state changes happen without a real event: the user going idle, and
//! an agent session timing out. Both are materialized as placeholder events
//! so the replay loop stays a flat dispatch over one merged event list
//! instead of checking clocks on every interval.

use chrono::{DateTime, Duration, Utc};
use tt_types::{Event, EventKind, SessionAction};

use super::AttributionConfig;
use super::state::ReplayState;

/// A synthesized boundary event. Markers order after all real events at an
/// equal timestamp and re-validate against the live state when applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Marker {
    /// The attention window elapsed without activity.
    IdleStart(DateTime<Utc>),
    /// An agent session went quiet for the whole session timeout.
    SessionTimeout {
        at: DateTime<Utc>,
        session_id: String,
    },
}

impl Marker {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Marker::IdleStart(at) => *at,
            Marker::SessionTimeout { at, .. } => *at,
        }
    }
}

/// Compute all markers for a window. `window` must be sorted in canonical
/// order and lie within the window; `seed` is the state at its start.
pub(super) fn build_markers(
    seed: &ReplayState,
    window: &[&Event],
    end: DateTime<Utc>,
    config: &AttributionConfig,
) -> Vec<Marker> {
    let mut markers = idle_markers(seed, window, end, config);
    markers.extend(session_timeout_markers(seed, window, end, config));
    markers.sort_by_key(|m| m.timestamp());
    markers
}

/// One idle marker per quiet gap: pending at `last_activity + attention`,
/// pushed forward by every activity event, materialized when an activity
/// event (or the window end) proves the gap ran its course.
fn idle_markers(
    seed: &ReplayState,
    window: &[&Event],
    end: DateTime<Utc>,
    config: &AttributionConfig,
) -> Vec<Marker> {
    let attention = Duration::milliseconds(config.attention_window_ms);

    let mut markers = Vec::new();
    let mut pending = if seed.is_idle {
        // Already idle at the boundary; nothing pends until activity resumes.
        None
    } else {
        seed.last_activity.map(|last| last + attention)
    };

    for event in window {
        if !event.kind.is_activity() {
            continue;
        }
        if let Some(at) = pending
            && at < event.timestamp
        {
            markers.push(Marker::IdleStart(at));
        }
        pending = Some(event.timestamp + attention);
    }

    if let Some(at) = pending
        && at <= end
    {
        markers.push(Marker::IdleStart(at));
    }

    markers
}

/// Session timeout markers, derived by simulating session lifecycles over
/// the window. A session that re-starts after going stale gets a marker for
/// the stale span and a fresh lease from the restart.
fn session_timeout_markers(
    seed: &ReplayState,
    window: &[&Event],
    end: DateTime<Utc>,
    config: &AttributionConfig,
) -> Vec<Marker> {
    let timeout = Duration::milliseconds(config.session_timeout_ms);

    let mut markers = Vec::new();
    let mut active = seed.active_sessions.clone();

    for event in window {
        let Some(sid) = &event.session_id else {
            continue;
        };
        match &event.kind {
            EventKind::AgentSession => match event.session_action() {
                Some(SessionAction::Started) => {
                    if let Some(last) = active.get(sid).copied()
                        && last + timeout < event.timestamp
                    {
                        markers.push(Marker::SessionTimeout {
                            at: last + timeout,
                            session_id: sid.clone(),
                        });
                    }
                    active.insert(sid.clone(), event.timestamp);
                }
                Some(SessionAction::Ended) => {
                    if let Some(last) = active.remove(sid)
                        && last + timeout < event.timestamp
                    {
                        markers.push(Marker::SessionTimeout {
                            at: last + timeout,
                            session_id: sid.clone(),
                        });
                    }
                }
                None => {}
            },
            EventKind::AgentToolUse => {
                if let Some(last) = active.get(sid).copied() {
                    if last + timeout < event.timestamp {
                        // Went stale before this tool use; a dead session is
                        // not revived by tool activity.
                        markers.push(Marker::SessionTimeout {
                            at: last + timeout,
                            session_id: sid.clone(),
                        });
                        active.remove(sid);
                    } else {
                        active.insert(sid.clone(), event.timestamp);
                    }
                }
            }
            _ => {}
        }
    }

    for (sid, last) in active {
        if last + timeout <= end {
            markers.push(Marker::SessionTimeout {
                at: last + timeout,
                session_id: sid,
            });
        }
    }

    markers
}
