//! Event persistence.
//!
//! The hosted database does the storing and filtering; this module only
//! defines the queries the calendar depends on and two ways of answering
//! them.

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use std::collections::HashSet;
use std::future::Future;

use chrono_tz::Tz;

use crate::error::ChalkboardResult;
use crate::event::{Event, EventDraft};
use crate::window::Window;

/// Queries and writes against the events table.
///
/// Implementations must uphold the inclusive range semantics of
/// [`EventStore::fetch_window`] and return rows ascending by start.
pub trait EventStore: Send + Sync {
    /// Rows of `user_id` whose start lies in `[window.start, window.end]`,
    /// ascending by start.
    fn fetch_window(
        &self,
        user_id: &str,
        window: &Window,
    ) -> impl Future<Output = ChalkboardResult<Vec<Event>>> + Send;

    /// Recurring rows of `user_id` that started before the window and whose
    /// recurrence end, if any, is not before the window's first day in `tz`.
    fn fetch_series_before(
        &self,
        user_id: &str,
        window: &Window,
        tz: &Tz,
    ) -> impl Future<Output = ChalkboardResult<Vec<Event>>> + Send;

    /// The stored record `id`.
    fn fetch_event(&self, id: &str) -> impl Future<Output = ChalkboardResult<Event>> + Send;

    fn insert(&self, draft: &EventDraft) -> impl Future<Output = ChalkboardResult<Event>> + Send;

    /// Replace every editable field of record `id`.
    fn update(
        &self,
        id: &str,
        draft: &EventDraft,
    ) -> impl Future<Output = ChalkboardResult<Event>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = ChalkboardResult<()>> + Send;
}

/// Everything the expander needs for `window`: in-window rows plus series
/// that began earlier and may still repeat into it.
pub async fn fetch_for_expansion<S: EventStore>(
    store: &S,
    user_id: &str,
    window: &Window,
    tz: &Tz,
) -> ChalkboardResult<Vec<Event>> {
    let in_window = store.fetch_window(user_id, window).await?;
    let earlier = store.fetch_series_before(user_id, window, tz).await?;
    Ok(merge_rows(earlier, in_window))
}

/// Union of two row sets, first occurrence of an id wins, ascending by start.
pub fn merge_rows(first: Vec<Event>, second: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    let mut rows: Vec<Event> = first
        .into_iter()
        .chain(second)
        .filter(|e| seen.insert(e.id.clone()))
        .collect();
    rows.sort_by_key(|e| e.start);
    rows
}

/// Whether a stored series that began before `window` can still reach it.
/// The recurrence end date is read in `tz`.
pub(crate) fn series_reaches(event: &Event, window: &Window, tz: &Tz) -> bool {
    event.recurrence.is_some()
        && event.start < window.start
        && event
            .recurrence_end
            .is_none_or(|until| until >= window.first_day(tz))
}
