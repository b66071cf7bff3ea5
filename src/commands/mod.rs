pub mod config;
pub mod delete;
pub mod edit;
pub mod events;
pub mod new;

use anyhow::Result;
use chalkboard_core::EventDraft;
use chalkboard_core::window::{end_of_day, local_to_utc, start_of_day};
use chrono_tz::Tz;
use clap::Args;

use crate::utils::{self, When};

/// Event fields shared by `new` and `edit`. Unset flags leave the field alone.
/// The start flag is declared by each command.
#[derive(Args, Debug, Default, Clone)]
pub struct EventArgs {
    /// End date or date/time
    #[arg(short, long, conflicts_with = "duration")]
    pub end: Option<String>,

    /// Duration (e.g. "30m", "1h", "2h30m")
    #[arg(short, long, conflicts_with = "end")]
    pub duration: Option<String>,

    /// Whole-day event (`--all-day false` to make it timed)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub all_day: Option<bool>,

    /// Color tag, e.g. "#60a5fa"
    #[arg(long)]
    pub color: Option<String>,

    /// event, meeting or deadline
    #[arg(short, long)]
    pub kind: Option<String>,

    /// Linked client reference (empty to clear)
    #[arg(long)]
    pub client: Option<String>,

    /// daily, weekly, monthly or none
    #[arg(short, long)]
    pub repeat: Option<String>,

    /// Last day of the series (YYYY-MM-DD, or none)
    #[arg(long)]
    pub until: Option<String>,

    /// Description (empty to clear)
    #[arg(long)]
    pub description: Option<String>,
}

impl EventArgs {
    /// Overlay `start` and the given flags on `draft`. Moving the start keeps
    /// the current duration unless an end or duration is given too.
    pub fn apply_to(&self, start: Option<&str>, draft: &mut EventDraft, tz: &Tz) -> Result<()> {
        let duration = draft.end - draft.start;

        if let Some(start) = start {
            match utils::parse_when(start)? {
                When::Date(date) => {
                    draft.start = start_of_day(date, tz);
                    draft.all_day = true;
                }
                When::DateTime(dt) => {
                    draft.start = local_to_utc(dt, tz);
                    draft.all_day = false;
                }
            }
            draft.end = draft.start + duration;
        }

        if let Some(end) = &self.end {
            draft.end = match utils::parse_when(end)? {
                When::Date(date) => end_of_day(date, tz),
                When::DateTime(dt) => local_to_utc(dt, tz),
            };
        }
        if let Some(duration) = &self.duration {
            draft.end = draft.start + utils::parse_duration(duration)?;
        }
        if let Some(all_day) = self.all_day {
            draft.all_day = all_day;
        }
        if let Some(color) = &self.color {
            draft.color = color.trim().to_string();
        }
        if let Some(kind) = &self.kind {
            draft.kind = Some(utils::parse_kind(kind)?);
        }
        if let Some(client) = &self.client {
            draft.client_id = utils::optional_text(client);
        }
        if let Some(repeat) = &self.repeat {
            draft.recurrence = utils::parse_repeat(repeat)?;
        }
        if let Some(until) = &self.until {
            draft.recurrence_end = utils::parse_until(until)?;
        }
        if let Some(description) = &self.description {
            draft.description = utils::optional_text(description);
        }

        Ok(())
    }
}
