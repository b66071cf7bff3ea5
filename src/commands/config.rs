use anyhow::Result;
use chalkboard_core::{ChalkboardConfig, StoreBackend};
use owo_colors::OwoColorize;

use crate::context::LogHandle;

pub fn run(log: &LogHandle) -> Result<()> {
    let config_path = ChalkboardConfig::config_path()?;
    let config = ChalkboardConfig::load()?;
    log.apply_level(&config.logging.level);

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    if config.store.backend == StoreBackend::Memory {
        println!("  Events:     {}", config.store.events_path().display());
    }

    println!();
    println!("{}", "Settings".bold());
    println!(
        "  User:       {}",
        config.user_id.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  Time zone:  {}",
        config.timezone.as_deref().unwrap_or("(system)")
    );
    match config.store.backend {
        StoreBackend::Memory => println!("  Store:      local file"),
        StoreBackend::Rest => println!(
            "  Store:      {}",
            config.store.url.as_deref().unwrap_or("(url not set)")
        ),
    }
    println!("  Max steps:  {}", config.max_steps());

    Ok(())
}
