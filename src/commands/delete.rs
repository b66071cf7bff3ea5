use std::sync::Arc;

use anyhow::Result;
use chalkboard_core::{EventStore, is_synthetic};
use owo_colors::OwoColorize;

use crate::context::Context;
use crate::render;

/// Delete the record behind `id`. For a recurring event that is the whole series.
pub async fn run<S: EventStore>(ctx: &Context, store: Arc<S>, id: &str) -> Result<()> {
    let (gateway, mut notices) = ctx.gateway(store);
    let result = gateway.delete(id).await;
    render::print_notices(&mut notices);
    result?;

    if is_synthetic(id) {
        println!("  {}", "Removed every occurrence of the series".dimmed());
    }
    Ok(())
}
