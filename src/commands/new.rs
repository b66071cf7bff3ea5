use std::sync::Arc;

use anyhow::Result;
use chalkboard_core::{EventDraft, EventStore};
use chrono::{TimeDelta, Utc};
use owo_colors::OwoColorize;

use crate::commands::EventArgs;
use crate::context::Context;
use crate::render;

pub async fn run<S: EventStore>(
    ctx: &Context,
    store: Arc<S>,
    title: String,
    start: String,
    fields: EventArgs,
) -> Result<()> {
    // Placeholder times; `start` always replaces them. Timed events default to one hour.
    let now = Utc::now();
    let mut draft = EventDraft::new(&ctx.user_id, title, now, now + TimeDelta::hours(1));
    fields.apply_to(Some(&start), &mut draft, &ctx.tz)?;

    let (gateway, mut notices) = ctx.gateway(store);
    let result = gateway.create(draft).await;
    render::print_notices(&mut notices);
    let event = result?;

    println!("  {} {}", event.title, event.id.dimmed());
    Ok(())
}
