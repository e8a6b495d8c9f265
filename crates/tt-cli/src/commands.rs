use std::path::PathBuf;

use anyhow::Result;

use crate::args::{Cli, Commands, StreamCommand, TagCommand};
use crate::{config, handlers};

pub fn run(cli: Cli) -> Result<()> {
    let db_path: PathBuf = match cli.db {
        Some(path) => path,
        None => config::default_db_path()?,
    };

    match cli.command {
        Commands::Import => handlers::import::handle(&db_path),

        Commands::Sync { host } => handlers::sync::handle(&db_path, &host),

        Commands::Events {
            since,
            until,
            event_type,
            limit,
        } => handlers::events::handle(
            &db_path,
            since.as_deref(),
            until.as_deref(),
            event_type.as_deref(),
            limit,
        ),

        Commands::Status => handlers::status::handle(&db_path),

        Commands::Stream { command } => match command {
            StreamCommand::List => handlers::stream::list(&db_path),
            StreamCommand::Infer => handlers::stream::infer(&db_path),
            StreamCommand::Delete { prefix } => handlers::stream::delete(&db_path, &prefix),
        },

        Commands::Tag { command } => match command {
            TagCommand::Add { prefix, tag } => handlers::tag::add(&db_path, &prefix, &tag),
            TagCommand::Remove { prefix, tag } => handlers::tag::remove(&db_path, &prefix, &tag),
            TagCommand::List => handlers::tag::list(&db_path),
        },

        Commands::Report {
            since,
            until,
            date,
            format,
        } => handlers::report::handle(
            &db_path,
            since.as_deref(),
            until.as_deref(),
            date.as_deref(),
            format,
        ),
    }
}
