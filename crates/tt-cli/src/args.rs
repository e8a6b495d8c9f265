use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tt")]
#[command(about = "Track terminal working time across streams", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the SQLite database (default: platform data dir)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import events from stdin (JSONL, as produced by `tt export`)
    Import,

    /// Pull events from a remote collector over SSH
    Sync {
        /// SSH destination, e.g. user@devserver
        host: String,
    },

    /// Dump stored events as JSONL
    Events {
        /// Inclusive lower bound (ISO 8601)
        #[arg(long)]
        since: Option<String>,

        /// Exclusive upper bound (ISO 8601)
        #[arg(long)]
        until: Option<String>,

        /// Filter by event type
        #[arg(long = "type", value_name = "TYPE")]
        event_type: Option<String>,

        /// Maximum number of events
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the last event per source
    Status,

    /// Stream operations
    Stream {
        #[command(subcommand)]
        command: StreamCommand,
    },

    /// Tag operations
    Tag {
        #[command(subcommand)]
        command: TagCommand,
    },

    /// Attribute time over a window and roll it up by tag
    Report {
        /// Window start (ISO 8601); requires --until
        #[arg(long, conflicts_with = "date")]
        since: Option<String>,

        /// Window end (ISO 8601)
        #[arg(long, requires = "since", conflicts_with = "date")]
        until: Option<String>,

        /// One local calendar day (YYYY-MM-DD); default is today
        #[arg(long)]
        date: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
pub enum StreamCommand {
    /// List streams with their tags
    List,

    /// Cluster unassigned events into streams
    Infer,

    /// Delete a stream; its events become unassigned again
    Delete {
        /// Stream id prefix
        prefix: String,
    },
}

#[derive(Subcommand)]
pub enum TagCommand {
    /// Add a tag to a stream
    Add {
        /// Stream id prefix
        prefix: String,
        tag: String,
    },

    /// Remove a tag from a stream
    Remove {
        /// Stream id prefix
        prefix: String,
        tag: String,
    },

    /// Show the most-used tags and the untagged stream count
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}
