mod event;
mod ingress;
pub mod time;

pub use event::{
    AfkStatus, AssignmentSource, Event, EventKind, SessionAction, TERMINAL_APP, UNCATEGORIZED,
};
pub use ingress::{ImportedEvent, RawEvent};
