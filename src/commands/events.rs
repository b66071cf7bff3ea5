use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chalkboard_core::{Applied, CalendarSession, CalendarView, DayCell, EventStore, Notifier};
use chrono::NaiveDate;
use clap::ValueEnum;
use owo_colors::OwoColorize;

use crate::context::Context;
use crate::{export, render};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Grouped by day, for the terminal
    #[default]
    Text,
    /// One row per occurrence
    Csv,
}

pub async fn run<S: EventStore>(
    ctx: &Context,
    store: &S,
    view: CalendarView,
    date: Option<NaiveDate>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    if output.is_some() && format != OutputFormat::Csv {
        anyhow::bail!("--output needs --format csv");
    }

    let today = ctx.today();
    let anchor = date.unwrap_or(today);
    let window = view.window(anchor, &ctx.tz);

    let (notifier, mut notices) = Notifier::channel();
    let mut session = CalendarSession::new(&ctx.user_id, window, ctx.tz, ctx.max_steps())
        .with_notifier(notifier);

    if session.refresh(store).await == Applied::Failed {
        let message = notices
            .try_recv()
            .map(|n| n.message)
            .unwrap_or_else(|_| "Could not load events".to_string());
        anyhow::bail!(message);
    }

    let cells: Vec<_> = session
        .cells(view, anchor)
        .into_iter()
        .filter(|cell| !cell.is_empty())
        .collect();

    if format == OutputFormat::Csv {
        return write_export(&cells, ctx, output);
    }

    println!("{}", render::view_title(view, anchor).bold());
    println!();

    if cells.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            println!();
        }
        for line in render::day_lines(cell, today, &ctx.tz) {
            println!("{line}");
        }
    }

    Ok(())
}

fn write_export(cells: &[DayCell], ctx: &Context, output: Option<PathBuf>) -> Result<()> {
    let Some(path) = output else {
        export::write_csv(std::io::stdout().lock(), cells, &ctx.tz)?;
        return Ok(());
    };

    let file = std::fs::File::create(&path)
        .with_context(|| format!("Could not create {}", path.display()))?;
    let count = export::write_csv(file, cells, &ctx.tz)?;
    println!(
        "{}",
        format!("Exported {count} events to {}", path.display()).green()
    );
    Ok(())
}
