//! Arranges expanded occurrences into month, week and day layouts.

use chrono::{Datelike, NaiveDate, Timelike};
use chrono_tz::Tz;

use crate::constants::{TIMELINE_END_HOUR, TIMELINE_MIN_MINUTES, TIMELINE_START_HOUR};
use crate::occurrence::Occurrence;
use crate::window::CalendarView;

/// Occurrences starting on one local calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    /// False for leading/trailing days that belong to a neighbouring month.
    pub in_focus: bool,
    pub all_day: Vec<Occurrence>,
    pub timed: Vec<Occurrence>,
}

/// Vertical position of a timed occurrence on the day timeline, in minutes
/// from the top of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelinePlacement {
    pub offset_minutes: i64,
    pub height_minutes: i64,
}

impl DayCell {
    fn empty(date: NaiveDate, in_focus: bool) -> Self {
        DayCell {
            date,
            in_focus,
            all_day: Vec::new(),
            timed: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.all_day.len() + self.timed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All-day entries first, then timed ones.
    pub fn iter(&self) -> impl Iterator<Item = &Occurrence> {
        self.all_day.iter().chain(&self.timed)
    }
}

impl TimelinePlacement {
    /// Minutes since the grid top for the local start, with a minimum height
    /// so short entries stay visible.
    pub fn for_occurrence(occurrence: &Occurrence, tz: &Tz) -> Self {
        let start = occurrence.start().with_timezone(tz);
        let end = occurrence.end().with_timezone(tz);
        let start_min = i64::from(start.hour() * 60 + start.minute());
        let end_min = i64::from(end.hour() * 60 + end.minute());

        TimelinePlacement {
            offset_minutes: start_min - i64::from(TIMELINE_START_HOUR * 60),
            height_minutes: (end_min - start_min).max(TIMELINE_MIN_MINUTES),
        }
    }

    /// Whether any part of the block falls inside the drawn hours.
    pub fn is_visible(&self) -> bool {
        let grid = i64::from((TIMELINE_END_HOUR - TIMELINE_START_HOUR) * 60);
        self.offset_minutes < grid && self.offset_minutes + self.height_minutes > 0
    }
}

/// One cell per day from `first` through `last`. Cells keep the input order
/// of their occurrences, sorted by start.
fn cells(
    occurrences: &[Occurrence],
    first: NaiveDate,
    last: NaiveDate,
    tz: &Tz,
    in_focus: impl Fn(NaiveDate) -> bool,
) -> Vec<DayCell> {
    let mut cells: Vec<DayCell> = first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|d| DayCell::empty(d, in_focus(d)))
        .collect();

    for occurrence in occurrences {
        let date = occurrence.start().with_timezone(tz).date_naive();
        let Ok(index) = usize::try_from((date - first).num_days()) else {
            continue;
        };
        let Some(cell) = cells.get_mut(index) else {
            continue;
        };
        if occurrence.event.all_day {
            cell.all_day.push(occurrence.clone());
        } else {
            cell.timed.push(occurrence.clone());
        }
    }

    for cell in &mut cells {
        cell.all_day.sort_by_key(Occurrence::start);
        cell.timed.sort_by_key(Occurrence::start);
    }
    cells
}

/// Weeks of seven cells covering the month of `anchor`, Sunday first.
pub fn month_grid(occurrences: &[Occurrence], anchor: NaiveDate, tz: &Tz) -> Vec<Vec<DayCell>> {
    let (first, last) = CalendarView::Month.date_span(anchor);
    let month = (anchor.year(), anchor.month());
    let days = cells(occurrences, first, last, tz, |d| (d.year(), d.month()) == month);
    days.chunks(7).map(<[DayCell]>::to_vec).collect()
}

/// Sunday through Saturday of the week containing `anchor`.
pub fn week_columns(occurrences: &[Occurrence], anchor: NaiveDate, tz: &Tz) -> Vec<DayCell> {
    let (first, last) = CalendarView::Week.date_span(anchor);
    cells(occurrences, first, last, tz, |_| true)
}

pub fn day_cell(occurrences: &[Occurrence], date: NaiveDate, tz: &Tz) -> DayCell {
    cells(occurrences, date, date, tz, |_| true)
        .pop()
        .unwrap_or_else(|| DayCell::empty(date, true))
}

/// Cells for any view, flattened. Month cells outside the anchor month are
/// included and flagged.
pub fn view_cells(
    view: CalendarView,
    occurrences: &[Occurrence],
    anchor: NaiveDate,
    tz: &Tz,
) -> Vec<DayCell> {
    match view {
        CalendarView::Month => month_grid(occurrences, anchor, tz)
            .into_iter()
            .flatten()
            .collect(),
        CalendarView::Week => week_columns(occurrences, anchor, tz),
        CalendarView::Day => vec![day_cell(occurrences, anchor, tz)],
    }
}
