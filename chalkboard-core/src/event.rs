//! Stored event types.
//!
//! `Event` mirrors a row of the hosted `events` table. Field names on the wire
//! follow the table's column names so rows can be passed through unchanged.

use std::fmt;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::DEFAULT_EVENT_COLOR;
use crate::error::{ChalkboardError, ChalkboardResult};
use crate::window::{end_of_day, start_of_day};

/// A persisted calendar event (the base record of any series).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "start_time")]
    pub start: DateTime<Utc>,
    #[serde(rename = "end_time")]
    pub end: DateTime<Utc>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub all_day: bool,
    #[serde(rename = "event_type", default)]
    pub kind: Option<EventKind>,
    #[serde(default)]
    pub client_id: Option<String>,

    // Recurrence fields (base record only)
    #[serde(default, deserialize_with = "lenient_recurrence")]
    pub recurrence: Option<Recurrence>,
    /// Last day of the series, inclusive.
    #[serde(default, deserialize_with = "lenient_date")]
    pub recurrence_end: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// How an event repeats after its original start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

/// Event category shown as a badge in the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Event,
    Meeting,
    Deadline,
}

/// Insert/update payload: every stored field except the store-assigned ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "start_time")]
    pub start: DateTime<Utc>,
    #[serde(rename = "end_time")]
    pub end: DateTime<Utc>,
    pub color: String,
    pub all_day: bool,
    #[serde(rename = "event_type")]
    pub kind: Option<EventKind>,
    pub client_id: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub recurrence_end: Option<NaiveDate>,
}

fn default_color() -> String {
    DEFAULT_EVENT_COLOR.to_string()
}

/// Unknown or non-string recurrence values mean "does not repeat".
fn lenient_recurrence<'de, D>(deserializer: D) -> Result<Option<Recurrence>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(Recurrence::parse))
}

/// Accepts `YYYY-MM-DD` or a full timestamp (date part is kept); anything else is dropped.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| s.get(..10))
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()))
}

impl Recurrence {
    /// Parse a stored rule. Empty, "none" and unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Recurrence::Daily),
            "weekly" => Some(Recurrence::Weekly),
            "monthly" => Some(Recurrence::Monthly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EventKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "event" => Some(EventKind::Event),
            "meeting" => Some(EventKind::Meeting),
            "deadline" => Some(EventKind::Deadline),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Event => "event",
            EventKind::Meeting => "meeting",
            EventKind::Deadline => "deadline",
        }
    }
}

impl Event {
    /// `end - start` of the stored record. May be zero or negative for bad rows.
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// The instant after which no occurrence may start: local midnight of
    /// the recurrence end date in `tz`. All-day occurrences on that date
    /// still qualify.
    pub fn recurrence_end_instant(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        self.recurrence_end.map(|date| start_of_day(date, tz))
    }

    /// Build a stored record from a draft and store-assigned metadata.
    pub fn from_draft(id: String, draft: &EventDraft, now: DateTime<Utc>) -> Self {
        Event {
            id,
            user_id: draft.user_id.clone(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            start: draft.start,
            end: draft.end,
            color: draft.color.clone(),
            all_day: draft.all_day,
            kind: draft.kind,
            client_id: draft.client_id.clone(),
            recurrence: draft.recurrence,
            recurrence_end: draft.recurrence_end,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Overwrite every editable field with the draft's values.
    pub fn apply(&mut self, draft: &EventDraft, now: DateTime<Utc>) {
        self.title = draft.title.clone();
        self.description = draft.description.clone();
        self.start = draft.start;
        self.end = draft.end;
        self.color = draft.color.clone();
        self.all_day = draft.all_day;
        self.kind = draft.kind;
        self.client_id = draft.client_id.clone();
        self.recurrence = draft.recurrence;
        self.recurrence_end = draft.recurrence_end;
        self.updated_at = Some(now);
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

impl From<&Event> for EventDraft {
    fn from(event: &Event) -> Self {
        EventDraft {
            user_id: event.user_id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            start: event.start,
            end: event.end,
            color: event.color.clone(),
            all_day: event.all_day,
            kind: event.kind,
            client_id: event.client_id.clone(),
            recurrence: event.recurrence,
            recurrence_end: event.recurrence_end,
        }
    }
}

impl EventDraft {
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        EventDraft {
            user_id: user_id.into(),
            title: title.into(),
            description: None,
            start,
            end,
            color: default_color(),
            all_day: false,
            kind: Some(EventKind::Event),
            client_id: None,
            recurrence: None,
            recurrence_end: None,
        }
    }

    /// Reject drafts the store must never hold. The recurrence end is
    /// compared with the start's calendar date in `tz`.
    pub fn validate(&self, tz: &Tz) -> ChalkboardResult<()> {
        if self.title.trim().is_empty() {
            return Err(ChalkboardError::InvalidEvent("title must not be empty".into()));
        }
        if self.end < self.start {
            return Err(ChalkboardError::InvalidEvent(format!(
                "end {} is before start {}",
                self.end.to_rfc3339(),
                self.start.to_rfc3339()
            )));
        }
        if let (Some(_), Some(until)) = (self.recurrence, self.recurrence_end)
            && until < self.start.with_timezone(tz).date_naive()
        {
            return Err(ChalkboardError::InvalidEvent(format!(
                "recurrence ends on {until}, before the event starts"
            )));
        }
        Ok(())
    }

    /// All-day drafts span from 00:00:00 of the start day to 23:59:59 of the
    /// end day, both taken in `tz`. Timed drafts are returned unchanged.
    pub fn normalized(mut self, tz: &Tz) -> Self {
        if self.all_day {
            self.start = start_of_day(self.start.with_timezone(tz).date_naive(), tz);
            let end_day = self.end.with_timezone(tz).date_naive();
            self.end = end_of_day(end_day, tz).max(self.start);
        }
        // A recurrence end without a rule carries no meaning.
        if self.recurrence.is_none() {
            self.recurrence_end = None;
        }
        self
    }
}
