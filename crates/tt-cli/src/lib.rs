// NOTE: Command organization
//
// Flat verbs for the daily loop (import, sync, events, status, report) and
// namespaces for the noun-heavy operations (stream ..., tag ...). All
// commands accept a global --db so tests and multi-machine setups can point
// anywhere; the default lives under the platform data directory.

mod args;
mod commands;
pub mod config;
mod handlers;
pub mod presentation;

pub use args::{Cli, Commands, OutputFormat, StreamCommand, TagCommand};
pub use commands::run;
