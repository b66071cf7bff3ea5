//! Inclusive time windows requested by calendar views.

use chrono::{
    DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone,
    Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::WEEK_START;
use crate::error::{ChalkboardError, ChalkboardResult};

/// An inclusive range of instants, `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Which grid the window feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    #[default]
    Month,
    Week,
    Day,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> ChalkboardResult<Self> {
        if end < start {
            return Err(ChalkboardError::InvalidWindow(format!(
                "end {} is before start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        Ok(Window { start, end })
    }

    /// Parse `YYYY-MM-DD` bounds: `from` at 00:00:00.000 and `to` at
    /// 23:59:59.999, both local to `tz`.
    pub fn from_args(from: &str, to: &str, tz: &Tz) -> ChalkboardResult<Self> {
        let from = parse_date(from)?;
        let to = parse_date(to)?;
        Window::new(start_of_day(from, tz), end_of_day(to, tz))
    }

    /// Whole calendar days from `first` through `last`.
    pub fn days(first: NaiveDate, last: NaiveDate, tz: &Tz) -> ChalkboardResult<Self> {
        Window::new(start_of_day(first, tz), end_of_day(last, tz))
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Calendar date of the window start in `tz`.
    pub fn first_day(&self, tz: &Tz) -> NaiveDate {
        self.start.with_timezone(tz).date_naive()
    }
}

impl CalendarView {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "month" => Some(CalendarView::Month),
            "week" => Some(CalendarView::Week),
            "day" => Some(CalendarView::Day),
            _ => None,
        }
    }

    /// First and last calendar day shown by this view around `anchor`.
    /// The month view extends to the full weeks it displays.
    pub fn date_span(&self, anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            CalendarView::Month => {
                let first = anchor.with_day(1).unwrap_or(anchor);
                let last = last_day_of_month(anchor);
                (week_start(first), week_end(last))
            }
            CalendarView::Week => (week_start(anchor), week_end(anchor)),
            CalendarView::Day => (anchor, anchor),
        }
    }

    /// Window of instants for the view around `anchor`, in `tz`.
    pub fn window(&self, anchor: NaiveDate, tz: &Tz) -> Window {
        let (first, last) = self.date_span(anchor);
        Window {
            start: start_of_day(first, tz),
            end: end_of_day(last, tz),
        }
    }

    /// Anchor date one view page forward or back.
    pub fn step(&self, anchor: NaiveDate, forward: bool) -> NaiveDate {
        let moved = match (self, forward) {
            (CalendarView::Month, true) => anchor.checked_add_months(Months::new(1)),
            (CalendarView::Month, false) => anchor.checked_sub_months(Months::new(1)),
            (CalendarView::Week, true) => anchor.checked_add_days(Days::new(7)),
            (CalendarView::Week, false) => anchor.checked_sub_days(Days::new(7)),
            (CalendarView::Day, true) => anchor.succ_opt(),
            (CalendarView::Day, false) => anchor.pred_opt(),
        };
        moved.unwrap_or(anchor)
    }
}

/// Parse YYYY-MM-DD.
pub fn parse_date(s: &str) -> ChalkboardResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ChalkboardError::InvalidDate(s.to_string()))
}

/// The Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_monday() - WEEK_START.num_days_from_monday()) % 7;
    date - Days::new(u64::from(offset))
}

/// The Saturday on or after `date`.
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + Days::new(6)
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// 00:00:00.000 of `date` in `tz`, as UTC.
pub fn start_of_day(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    local_to_utc(date.and_time(NaiveTime::MIN), tz)
}

/// 23:59:59.999 of `date` in `tz`, as UTC.
pub fn end_of_day(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    local_to_utc(date.and_time(time), tz)
}

/// Resolve a wall-clock time in `tz`. Ambiguous times take the earlier
/// instant; times skipped by a DST jump move forward by the gap.
pub fn local_to_utc(naive: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            let later = naive.checked_add_signed(TimeDelta::hours(1))?;
            tz.from_local_datetime(&later).earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}
