use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// `window_focus` events carry the activated application name; this one
/// means the user returned to the terminal and the prior stream is restored.
pub const TERMINAL_APP: &str = "Terminal";

/// Stream name for events without a working directory.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Type of a tracked event.
///
/// The set the attribution engine interprets is closed; everything else is
/// preserved as [`EventKind::Other`] and stays inert during replay (but still
/// participates in stream inference).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Focus shifted to a tmux pane (and therefore to its stream).
    TmuxPaneFocus,
    /// Scroll activity in the currently focused pane.
    TmuxScroll,
    /// OS-level window activation; `data.app` names the application.
    WindowFocus,
    /// The user sent input to an agent session.
    UserMessage,
    /// Agent session lifecycle; `data.action` is `started` or `ended`.
    AgentSession,
    /// An agent invoked a tool; keeps its session alive.
    AgentToolUse,
    /// Away-from-keyboard transition; `data.status` is `idle` or `active`.
    AfkChange,
    /// Any event type the core does not interpret.
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::TmuxPaneFocus => "tmux_pane_focus",
            EventKind::TmuxScroll => "tmux_scroll",
            EventKind::WindowFocus => "window_focus",
            EventKind::UserMessage => "user_message",
            EventKind::AgentSession => "agent_session",
            EventKind::AgentToolUse => "agent_tool_use",
            EventKind::AfkChange => "afk_change",
            EventKind::Other(s) => s.as_str(),
        }
    }

    pub fn parse(tag: &str) -> Self {
        match tag {
            "tmux_pane_focus" => EventKind::TmuxPaneFocus,
            "tmux_scroll" => EventKind::TmuxScroll,
            "window_focus" => EventKind::WindowFocus,
            "user_message" => EventKind::UserMessage,
            "agent_session" => EventKind::AgentSession,
            "agent_tool_use" => EventKind::AgentToolUse,
            "afk_change" => EventKind::AfkChange,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// Activity-class events reset the idle clock.
    pub fn is_activity(&self) -> bool {
        matches!(
            self,
            EventKind::TmuxPaneFocus | EventKind::TmuxScroll | EventKind::UserMessage
        )
    }

    /// Tiebreaker at equal timestamps: `user_message` orders after every
    /// other kind so that focus set by a message wins over a concurrent
    /// focus event.
    pub fn tiebreak(&self) -> u8 {
        match self {
            EventKind::UserMessage => 1,
            _ => 0,
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(EventKind::parse(&tag))
    }
}

/// Provenance of an event's stream assignment. Only `user` is immutable:
/// inference must never touch a pinned event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    Imported,
    Inferred,
    User,
}

impl AssignmentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentSource::Imported => "imported",
            AssignmentSource::Inferred => "inferred",
            AssignmentSource::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "imported" => Some(AssignmentSource::Imported),
            "inferred" => Some(AssignmentSource::Inferred),
            "user" => Some(AssignmentSource::User),
            _ => None,
        }
    }
}

/// `agent_session` lifecycle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Started,
    Ended,
}

/// `afk_change` status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfkStatus {
    Idle,
    Active,
}

/// A tracked event as stored. Maps 1:1 to an `events` table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,

    #[serde(with = "crate::time::ts_format")]
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "type")]
    pub kind: EventKind,

    pub source: String,

    /// Opaque attribute bag; only specific keys are inspected per kind.
    pub data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,

    pub assignment_source: AssignmentSource,
}

impl Event {
    /// Canonical replay order: `(timestamp, tiebreak)`.
    pub fn sort_key(&self) -> (DateTime<Utc>, u8) {
        (self.timestamp, self.kind.tiebreak())
    }

    /// The lifecycle action of an `agent_session` event, if recognizable.
    pub fn session_action(&self) -> Option<SessionAction> {
        match self.data.get("action")?.as_str()? {
            "started" => Some(SessionAction::Started),
            "ended" => Some(SessionAction::Ended),
            _ => None,
        }
    }

    /// The status of an `afk_change` event, if recognizable.
    pub fn afk_status(&self) -> Option<AfkStatus> {
        match self.data.get("status")?.as_str()? {
            "idle" => Some(AfkStatus::Idle),
            "active" => Some(AfkStatus::Active),
            _ => None,
        }
    }

    /// The application named by a `window_focus` event.
    pub fn window_app(&self) -> Option<&str> {
        self.data.get("app")?.as_str()
    }
}
