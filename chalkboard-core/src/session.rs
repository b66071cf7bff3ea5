//! The occurrence list behind one calendar view.
//!
//! A session holds the expanded occurrences for one user and one window.
//! Every fetch is numbered; a response is applied only if no newer fetch was
//! started in the meantime, so rapid navigation never shows an older window.

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::error::ChalkboardResult;
use crate::event::Event;
use crate::notice::{Notice, Notifier};
use crate::notify::Subscription;
use crate::occurrence::{Occurrence, OccurrenceId};
use crate::recurrence::expand_occurrences_with_limit;
use crate::store::{EventStore, fetch_for_expansion};
use crate::view::{DayCell, view_cells};
use crate::window::{CalendarView, Window};

pub struct CalendarSession {
    user_id: String,
    window: Window,
    tz: Tz,
    max_steps: usize,
    generation: u64,
    occurrences: Vec<Occurrence>,
    notifier: Notifier,
}

/// Proof of a started fetch. Only the most recently issued ticket applies.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    user_id: String,
    window: Window,
    tz: Tz,
}

/// What [`CalendarSession::apply`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The occurrences were replaced.
    Current,
    /// A newer fetch was started; the response was dropped.
    Stale,
    /// The fetch failed; the previous occurrences are kept.
    Failed,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn time_zone(&self) -> &Tz {
        &self.tz
    }
}

/// Fetch the rows a ticket's window needs. Runs without borrowing the
/// session, so several loads may be in flight.
pub async fn load<S: EventStore>(store: &S, ticket: &FetchTicket) -> ChalkboardResult<Vec<Event>> {
    fetch_for_expansion(store, &ticket.user_id, &ticket.window, &ticket.tz).await
}

impl CalendarSession {
    pub fn new(user_id: impl Into<String>, window: Window, tz: Tz, max_steps: usize) -> Self {
        CalendarSession {
            user_id: user_id.into(),
            window,
            tz,
            max_steps,
            generation: 0,
            occurrences: Vec::new(),
            notifier: Notifier::silent(),
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The window of the occurrences currently held.
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn time_zone(&self) -> &Tz {
        &self.tz
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    /// Look up a held occurrence by its display id.
    pub fn find(&self, display_id: &str) -> Option<&Occurrence> {
        let id: OccurrenceId = display_id.parse().ok()?;
        self.occurrences.iter().find(|o| o.id == id)
    }

    /// Day cells of `view` around `anchor`, in the session's zone.
    pub fn cells(&self, view: CalendarView, anchor: NaiveDate) -> Vec<DayCell> {
        view_cells(view, &self.occurrences, anchor, &self.tz)
    }

    /// Start a fetch for `window`, superseding every earlier ticket.
    pub fn begin_fetch(&mut self, window: Window) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            generation: self.generation,
            user_id: self.user_id.clone(),
            window,
            tz: self.tz,
        }
    }

    /// Apply a fetch result if `ticket` is still the latest.
    pub fn apply(&mut self, ticket: FetchTicket, result: ChalkboardResult<Vec<Event>>) -> Applied {
        if ticket.generation != self.generation {
            tracing::debug!(
                ticket = ticket.generation,
                latest = self.generation,
                "Dropping stale fetch result"
            );
            return Applied::Stale;
        }

        match result {
            Ok(events) => {
                self.occurrences = expand_occurrences_with_limit(
                    &events,
                    &ticket.window,
                    &self.tz,
                    self.max_steps,
                );
                self.window = ticket.window;
                tracing::debug!(
                    rows = events.len(),
                    occurrences = self.occurrences.len(),
                    "Applied fetch result"
                );
                Applied::Current
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not load events");
                self.notifier
                    .send(Notice::error(format!("Could not load events: {e}")));
                Applied::Failed
            }
        }
    }

    /// Refetch and re-expand the current window.
    pub async fn refresh<S: EventStore>(&mut self, store: &S) -> Applied {
        self.navigate(store, self.window).await
    }

    /// Fetch and expand `window`, making it current on success.
    pub async fn navigate<S: EventStore>(&mut self, store: &S, window: Window) -> Applied {
        let ticket = self.begin_fetch(window);
        let result = load(store, &ticket).await;
        self.apply(ticket, result)
    }

    /// Wait for the next change on `subscription` and refresh. Returns
    /// `false` once the feed has closed.
    pub async fn sync_on_change<S: EventStore>(
        &mut self,
        store: &S,
        subscription: &mut Subscription,
    ) -> bool {
        let Some(change) = subscription.next().await else {
            return false;
        };
        tracing::debug!(kind = ?change.kind, record_id = ?change.record_id, "Change received");
        self.refresh(store).await;
        true
    }
}
