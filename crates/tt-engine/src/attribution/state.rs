use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tt_types::{AfkStatus, Event, EventKind, SessionAction, TERMINAL_APP};

use super::AttributionConfig;

/// Replay state threaded through the attribution loop.
///
/// One value, mutated in place; every transition is a flat dispatch on the
/// event kind.
#[derive(Debug, Clone, Default)]
pub(super) struct ReplayState {
    /// Stream the user is attending, if any.
    pub current_stream: Option<String>,
    /// Stream focused before the last focus change; restored when the user
    /// returns to the terminal.
    pub previous_stream: Option<String>,
    /// Timestamp of the last activity-class event.
    pub last_activity: Option<DateTime<Utc>>,
    /// True once the attention window elapsed without activity.
    pub is_idle: bool,
    /// True while the away-from-keyboard signal is in effect.
    pub is_afk: bool,
    /// Active agent sessions and the timestamp of their last refreshing
    /// event (`agent_session started` or `agent_tool_use`).
    pub active_sessions: HashMap<String, DateTime<Utc>>,
}

impl ReplayState {
    /// Apply one event's state transition.
    pub fn apply(&mut self, event: &Event, session_map: &HashMap<String, String>) {
        match &event.kind {
            EventKind::TmuxPaneFocus => {
                self.previous_stream = self.current_stream.take();
                self.current_stream = event.stream_id.clone();
                self.touch_activity(event.timestamp);
            }
            EventKind::TmuxScroll => {
                self.touch_activity(event.timestamp);
            }
            EventKind::WindowFocus => {
                if event.window_app() == Some(TERMINAL_APP) {
                    // Back at the terminal: the stream focused before the
                    // window switch regains focus. Without a known prior
                    // stream there is nothing to restore.
                    if self.previous_stream.is_some() {
                        self.current_stream = self.previous_stream.clone();
                    }
                } else {
                    self.previous_stream = self.current_stream.take();
                }
            }
            EventKind::UserMessage => {
                // A message carries the strongest focus signal. Resolve its
                // session to a stream; fall back to the event's own stream
                // when the session is not mapped (e.g. the message precedes
                // agent_session started).
                let resolved = event
                    .session_id
                    .as_deref()
                    .and_then(|sid| session_map.get(sid).cloned())
                    .or_else(|| event.stream_id.clone());
                if resolved.is_some() {
                    self.current_stream = resolved;
                }
                self.touch_activity(event.timestamp);
            }
            EventKind::AgentSession => match (event.session_action(), &event.session_id) {
                (Some(SessionAction::Started), Some(sid)) => {
                    self.active_sessions.insert(sid.clone(), event.timestamp);
                }
                (Some(SessionAction::Ended), Some(sid)) => {
                    self.active_sessions.remove(sid);
                }
                _ => {}
            },
            EventKind::AgentToolUse => {
                if let Some(sid) = &event.session_id
                    && let Some(last) = self.active_sessions.get_mut(sid)
                {
                    *last = event.timestamp;
                }
            }
            EventKind::AfkChange => match event.afk_status() {
                Some(AfkStatus::Idle) => self.is_afk = true,
                // Returning from AFK is not activity: the idle flag and the
                // activity clock stay untouched until a real activity event.
                Some(AfkStatus::Active) => self.is_afk = false,
                None => {}
            },
            EventKind::Other(_) => {}
        }
    }

    fn touch_activity(&mut self, ts: DateTime<Utc>) {
        self.is_idle = false;
        self.last_activity = Some(ts);
    }
}

/// Reconstruct the state at the window start from the events preceding it.
///
/// The pre-window slice is replayed through the normal transitions, then the
/// boundary adjustments are applied: the previous stream is not
/// reconstructible, idleness is recomputed from the last activity (which
/// defaults to the window start), and sessions are kept only when their
/// latest session-bearing event is within the session timeout.
pub(super) fn seed_state(
    pre_window: &[&Event],
    window_start: DateTime<Utc>,
    session_map: &HashMap<String, String>,
    config: &AttributionConfig,
) -> ReplayState {
    let mut state = ReplayState::default();
    let mut session_last_seen: HashMap<String, DateTime<Utc>> = HashMap::new();

    for event in pre_window {
        if let Some(sid) = &event.session_id {
            session_last_seen.insert(sid.clone(), event.timestamp);
        }
        state.apply(event, session_map);
    }

    state.previous_stream = None;

    let last_activity = state.last_activity.unwrap_or(window_start);
    state.last_activity = Some(last_activity);
    state.is_idle =
        (window_start - last_activity).num_milliseconds() > config.attention_window_ms;

    // Any event bearing the session id counts as a sign of life at the
    // boundary, even ones that do not refresh the timeout during replay.
    for (sid, last) in state.active_sessions.iter_mut() {
        if let Some(seen) = session_last_seen.get(sid)
            && *seen > *last
        {
            *last = *seen;
        }
    }
    state
        .active_sessions
        .retain(|_, last| (window_start - *last).num_milliseconds() <= config.session_timeout_ms);

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_types::{AssignmentSource, time::parse_timestamp};

    fn ts(value: &str) -> DateTime<Utc> {
        parse_timestamp(value).unwrap()
    }

    fn event(kind: EventKind, at: &str) -> Event {
        Event {
            id: format!("e-{at}"),
            timestamp: ts(at),
            kind,
            source: "test".to_string(),
            data: serde_json::json!({}),
            cwd: None,
            session_id: None,
            stream_id: None,
            assignment_source: AssignmentSource::Imported,
        }
    }

    fn focus(at: &str, stream: &str) -> Event {
        let mut e = event(EventKind::TmuxPaneFocus, at);
        e.stream_id = Some(stream.to_string());
        e
    }

    #[test]
    fn test_pane_focus_tracks_previous_stream() {
        let mut state = ReplayState::default();
        let map = HashMap::new();

        state.apply(&focus("2025-01-25T10:00:00Z", "s1"), &map);
        state.apply(&focus("2025-01-25T10:01:00Z", "s2"), &map);

        assert_eq!(state.current_stream.as_deref(), Some("s2"));
        assert_eq!(state.previous_stream.as_deref(), Some("s1"));
        assert_eq!(state.last_activity, Some(ts("2025-01-25T10:01:00Z")));
    }

    #[test]
    fn test_window_focus_away_and_back() {
        let mut state = ReplayState::default();
        let map = HashMap::new();

        state.apply(&focus("2025-01-25T10:00:00Z", "s1"), &map);

        let mut away = event(EventKind::WindowFocus, "2025-01-25T10:01:00Z");
        away.data = serde_json::json!({"app": "Safari"});
        state.apply(&away, &map);
        assert_eq!(state.current_stream, None);
        assert_eq!(state.previous_stream.as_deref(), Some("s1"));

        let mut back = event(EventKind::WindowFocus, "2025-01-25T10:02:00Z");
        back.data = serde_json::json!({"app": "Terminal"});
        state.apply(&back, &map);
        assert_eq!(state.current_stream.as_deref(), Some("s1"));
    }

    #[test]
    fn test_terminal_focus_without_history_restores_nothing() {
        let mut state = ReplayState::default();
        let mut back = event(EventKind::WindowFocus, "2025-01-25T10:00:00Z");
        back.data = serde_json::json!({"app": "Terminal"});
        state.apply(&back, &HashMap::new());
        assert_eq!(state.current_stream, None);
    }

    #[test]
    fn test_user_message_prefers_session_map_over_own_stream() {
        let mut state = ReplayState::default();
        let mut map = HashMap::new();
        map.insert("session-A".to_string(), "mapped".to_string());

        let mut msg = event(EventKind::UserMessage, "2025-01-25T10:00:00Z");
        msg.session_id = Some("session-A".to_string());
        msg.stream_id = Some("own".to_string());
        state.apply(&msg, &map);
        assert_eq!(state.current_stream.as_deref(), Some("mapped"));
    }

    #[test]
    fn test_user_message_falls_back_to_own_stream() {
        let mut state = ReplayState::default();
        let mut msg = event(EventKind::UserMessage, "2025-01-25T10:00:00Z");
        msg.session_id = Some("unmapped".to_string());
        msg.stream_id = Some("own".to_string());
        state.apply(&msg, &HashMap::new());
        assert_eq!(state.current_stream.as_deref(), Some("own"));
    }

    #[test]
    fn test_user_message_without_streams_keeps_focus() {
        let mut state = ReplayState::default();
        let map = HashMap::new();
        state.apply(&focus("2025-01-25T10:00:00Z", "s1"), &map);

        let msg = event(EventKind::UserMessage, "2025-01-25T10:01:00Z");
        state.apply(&msg, &map);
        assert_eq!(state.current_stream.as_deref(), Some("s1"));
    }

    #[test]
    fn test_tool_use_only_refreshes_active_sessions() {
        let mut state = ReplayState::default();
        let map = HashMap::new();

        let mut tool = event(EventKind::AgentToolUse, "2025-01-25T10:00:00Z");
        tool.session_id = Some("ghost".to_string());
        state.apply(&tool, &map);
        assert!(state.active_sessions.is_empty());

        let mut started = event(EventKind::AgentSession, "2025-01-25T10:01:00Z");
        started.session_id = Some("live".to_string());
        started.data = serde_json::json!({"action": "started"});
        state.apply(&started, &map);

        let mut tool2 = event(EventKind::AgentToolUse, "2025-01-25T10:02:00Z");
        tool2.session_id = Some("live".to_string());
        state.apply(&tool2, &map);
        assert_eq!(
            state.active_sessions.get("live"),
            Some(&ts("2025-01-25T10:02:00Z"))
        );
    }

    #[test]
    fn test_afk_active_does_not_clear_idle() {
        let mut state = ReplayState::default();
        state.is_idle = true;

        let mut afk = event(EventKind::AfkChange, "2025-01-25T10:00:00Z");
        afk.data = serde_json::json!({"status": "idle"});
        state.apply(&afk, &HashMap::new());
        assert!(state.is_afk);

        let mut active = event(EventKind::AfkChange, "2025-01-25T10:05:00Z");
        active.data = serde_json::json!({"status": "active"});
        state.apply(&active, &HashMap::new());
        assert!(!state.is_afk);
        assert!(state.is_idle);
        assert_eq!(state.last_activity, None);
    }

    #[test]
    fn test_seed_defaults_with_no_history() {
        let config = AttributionConfig::default();
        let start = ts("2025-01-25T10:00:00Z");
        let state = seed_state(&[], start, &HashMap::new(), &config);

        assert_eq!(state.current_stream, None);
        assert_eq!(state.previous_stream, None);
        assert_eq!(state.last_activity, Some(start));
        assert!(!state.is_idle);
        assert!(!state.is_afk);
        assert!(state.active_sessions.is_empty());
    }

    #[test]
    fn test_seed_marks_idle_after_attention_window() {
        let config = AttributionConfig::default();
        let events = [focus("2025-01-25T09:50:00Z", "s1")];
        let refs: Vec<&Event> = events.iter().collect();
        let state = seed_state(
            &refs,
            ts("2025-01-25T10:00:00Z"),
            &HashMap::new(),
            &config,
        );

        assert_eq!(state.current_stream.as_deref(), Some("s1"));
        assert!(state.is_idle);
        assert_eq!(state.previous_stream, None);
    }

    #[test]
    fn test_seed_boundary_gap_exactly_attention_window_not_idle() {
        let config = AttributionConfig::default();
        let events = [focus("2025-01-25T09:58:00Z", "s1")];
        let refs: Vec<&Event> = events.iter().collect();
        let state = seed_state(
            &refs,
            ts("2025-01-25T10:00:00Z"),
            &HashMap::new(),
            &config,
        );
        assert!(!state.is_idle);
    }

    #[test]
    fn test_seed_drops_stale_sessions() {
        let config = AttributionConfig::default();

        let mut fresh = event(EventKind::AgentSession, "2025-01-25T09:45:00Z");
        fresh.session_id = Some("fresh".to_string());
        fresh.data = serde_json::json!({"action": "started"});

        let mut stale = event(EventKind::AgentSession, "2025-01-25T09:00:00Z");
        stale.session_id = Some("stale".to_string());
        stale.data = serde_json::json!({"action": "started"});

        let mut ended = event(EventKind::AgentSession, "2025-01-25T09:50:00Z");
        ended.session_id = Some("ended".to_string());
        ended.data = serde_json::json!({"action": "started"});
        let mut ended_end = event(EventKind::AgentSession, "2025-01-25T09:55:00Z");
        ended_end.session_id = Some("ended".to_string());
        ended_end.data = serde_json::json!({"action": "ended"});

        let events = [stale, fresh, ended, ended_end];
        let refs: Vec<&Event> = events.iter().collect();
        let state = seed_state(
            &refs,
            ts("2025-01-25T10:00:00Z"),
            &HashMap::new(),
            &config,
        );

        assert!(state.active_sessions.contains_key("fresh"));
        assert!(!state.active_sessions.contains_key("stale"));
        assert!(!state.active_sessions.contains_key("ended"));
    }

    #[test]
    fn test_seed_counts_any_session_bearing_event_as_life() {
        let config = AttributionConfig::default();

        // Started 40 minutes ago (past the timeout), but a user message
        // bearing the session id arrived 10 minutes ago.
        let mut started = event(EventKind::AgentSession, "2025-01-25T09:20:00Z");
        started.session_id = Some("session-A".to_string());
        started.data = serde_json::json!({"action": "started"});

        let mut msg = event(EventKind::UserMessage, "2025-01-25T09:50:00Z");
        msg.session_id = Some("session-A".to_string());

        let events = [started, msg];
        let refs: Vec<&Event> = events.iter().collect();
        let state = seed_state(
            &refs,
            ts("2025-01-25T10:00:00Z"),
            &HashMap::new(),
            &config,
        );

        assert_eq!(
            state.active_sessions.get("session-A"),
            Some(&ts("2025-01-25T09:50:00Z"))
        );
    }
}
