use std::sync::Arc;

use anyhow::Result;
use chalkboard_core::{EventDraft, EventStore, is_synthetic, real_id};
use owo_colors::OwoColorize;

use crate::commands::EventArgs;
use crate::context::Context;
use crate::render;

/// Rewrite the series behind `id`. Occurrence ids edit the whole series.
pub async fn run<S: EventStore>(
    ctx: &Context,
    store: Arc<S>,
    id: &str,
    title: Option<String>,
    start: Option<String>,
    fields: EventArgs,
) -> Result<()> {
    let current = store.fetch_event(real_id(id)).await?;

    let mut draft = EventDraft::from(&current);
    if let Some(title) = title {
        draft.title = title;
    }
    fields.apply_to(start.as_deref(), &mut draft, &ctx.tz)?;

    if draft == EventDraft::from(&current) {
        println!("{}", "Nothing to change".dimmed());
        return Ok(());
    }

    let (gateway, mut notices) = ctx.gateway(store);
    let result = gateway.update(id, draft).await;
    render::print_notices(&mut notices);
    let event = result?;

    if is_synthetic(id) {
        println!(
            "  {}",
            format!("Applied to every occurrence of \"{}\"", event.title).dimmed()
        );
    }
    Ok(())
}
