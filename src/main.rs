mod commands;
mod context;
mod export;
mod render;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chalkboard_core::window::parse_date;
use chalkboard_core::{CalendarView, ChangeFeed, EventStore, MemoryStore, StoreBackend};
use clap::{Parser, Subcommand};

use crate::commands::EventArgs;
use crate::commands::events::OutputFormat;
use crate::context::Context;

#[derive(Parser)]
#[command(name = "chalkboard")]
#[command(about = "Plan your days: list, create, edit and delete calendar events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the events of a month, week or day
    Events {
        /// month, week or day
        #[arg(short, long, default_value = "month", value_parser = parse_view)]
        view: CalendarView,

        /// Any date inside the period to show (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write the CSV export to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Create a new event
    New {
        title: String,

        /// Start date or date/time (e.g. "2026-03-20", "2026-03-20T15:00", "tomorrow 3pm")
        #[arg(short, long)]
        start: String,

        #[command(flatten)]
        fields: EventArgs,
    },
    /// Change an event; occurrence ids change the whole series
    Edit {
        /// Event or occurrence id
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New start date or date/time; the duration is kept
        #[arg(short, long)]
        start: Option<String>,

        #[command(flatten)]
        fields: EventArgs,
    },
    /// Delete an event; occurrence ids delete the whole series
    Delete {
        /// Event or occurrence id
        id: String,
    },
    /// Show config paths and settings
    Config,
}

fn parse_view(s: &str) -> Result<CalendarView, String> {
    CalendarView::parse(s).ok_or_else(|| format!("unknown view '{s}' (use month, week or day)"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log = context::init_tracing();

    if let Commands::Config = cli.command {
        return commands::config::run(&log);
    }

    let ctx = Context::load(&log)?;

    match ctx.config.store.backend {
        StoreBackend::Memory => {
            let path = ctx.config.store.events_path();
            let store = MemoryStore::open(&path, ChangeFeed::new()).await?;
            run(cli.command, &ctx, Arc::new(store)).await
        }
        StoreBackend::Rest => {
            let store = ctx.rest_store()?;
            run(cli.command, &ctx, Arc::new(store)).await
        }
    }
}

async fn run<S: EventStore>(command: Commands, ctx: &Context, store: Arc<S>) -> Result<()> {
    match command {
        Commands::Events {
            view,
            date,
            format,
            output,
        } => {
            let date = date.as_deref().map(parse_date).transpose()?;
            commands::events::run(ctx, store.as_ref(), view, date, format, output).await
        }
        Commands::New {
            title,
            start,
            fields,
        } => commands::new::run(ctx, store, title, start, fields).await,
        Commands::Edit {
            id,
            title,
            start,
            fields,
        } => commands::edit::run(ctx, store, &id, title, start, fields).await,
        Commands::Delete { id } => commands::delete::run(ctx, store, &id).await,
        // Runs before a store is opened.
        Commands::Config => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_start() {
        let err = Cli::try_parse_from(["chalkboard", "new", "Dentist"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let args = ["chalkboard", "new", "Dentist", "--start", "2026-03-20T15:00"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Commands::New { start, .. } if start == "2026-03-20T15:00"));
    }

    #[test]
    fn test_edit_start_is_optional() {
        let args = ["chalkboard", "edit", "abc123", "--title", "Renamed"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Commands::Edit { start: None, .. }));
    }

    #[test]
    fn test_events_csv_flags() {
        let cli = Cli::try_parse_from([
            "chalkboard",
            "events",
            "--view",
            "week",
            "--format",
            "csv",
            "--output",
            "week.csv",
        ])
        .unwrap();

        let Commands::Events {
            view,
            format,
            output,
            ..
        } = cli.command
        else {
            panic!("expected events");
        };
        assert_eq!(view, CalendarView::Week);
        assert_eq!(format, OutputFormat::Csv);
        assert_eq!(output, Some(PathBuf::from("week.csv")));
    }
}
