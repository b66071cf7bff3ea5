//! Terminal rendering for chalkboard types.

use chalkboard_core::constants::DEFAULT_EVENT_COLOR;
use chalkboard_core::notice::{Notice, NoticeLevel};
use chalkboard_core::{CalendarView, DayCell, Event, EventKind, Occurrence};
use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use tokio::sync::mpsc::UnboundedReceiver;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Notice {
    fn render(&self) -> String {
        match self.level {
            NoticeLevel::Success => format!("  {}", self.message).green().to_string(),
            NoticeLevel::Error => format!("  {}", self.message).red().to_string(),
        }
    }
}

impl Render for EventKind {
    fn render(&self) -> String {
        let badge = format!("[{}]", self.label());
        match self {
            EventKind::Event => badge.dimmed().to_string(),
            EventKind::Meeting => badge.cyan().to_string(),
            EventKind::Deadline => badge.red().to_string(),
        }
    }
}

/// Print pending success notices. Failures surface as the command's error.
pub fn print_notices(notices: &mut UnboundedReceiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        if !notice.is_error() {
            println!("{}", notice.render());
        }
    }
}

/// Heading for a view, e.g. "March 2026" or "Week of Sun Mar 15".
pub fn view_title(view: CalendarView, anchor: NaiveDate) -> String {
    match view {
        CalendarView::Month => anchor.format("%B %Y").to_string(),
        CalendarView::Week => {
            let (first, _) = view.date_span(anchor);
            format!("Week of {}", first.format("%a %b %-d"))
        }
        CalendarView::Day => anchor.format("%A %B %-d, %Y").to_string(),
    }
}

/// "Today", "Tomorrow", "Yesterday" or e.g. "Wed Feb 25".
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ if date.year() != today.year() => date.format("%a %b %-d %Y").to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// Local time range, or "all-day".
pub fn time_label(event: &Event, tz: &Tz) -> String {
    if event.all_day {
        return format!("{:>11}", "all-day");
    }
    let start = event.start.with_timezone(tz);
    let end = event.end.with_timezone(tz);
    if start.date_naive() == end.date_naive() {
        format!("{}–{}", start.format("%H:%M"), end.format("%H:%M"))
    } else {
        format!("{}–{}+", start.format("%H:%M"), end.format("%H:%M"))
    }
}

/// A colored dot unless the event keeps the default color.
fn color_mark(color: &str) -> String {
    let hex = color.trim_start_matches('#');
    if color.eq_ignore_ascii_case(DEFAULT_EVENT_COLOR) || hex.len() != 6 {
        return "●".yellow().to_string();
    }
    match u32::from_str_radix(hex, 16) {
        Ok(rgb) => "●"
            .truecolor((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
            .to_string(),
        Err(_) => "●".to_string(),
    }
}

/// One listing line: time, title, category, repeat and display id.
pub fn occurrence_line(occurrence: &Occurrence, tz: &Tz) -> String {
    let event = &occurrence.event;
    let mut line = format!(
        "  {} {} {}",
        time_label(event, tz),
        color_mark(&event.color),
        event.title
    );

    if let Some(kind) = event.kind.filter(|k| *k != EventKind::Event) {
        line.push(' ');
        line.push_str(&kind.render());
    }
    if let Some(rule) = event.recurrence {
        let repeat = match event.recurrence_end {
            Some(until) => format!("↻ {rule} until {until}"),
            None => format!("↻ {rule}"),
        };
        line.push(' ');
        line.push_str(&repeat.dimmed().to_string());
    }
    line.push(' ');
    line.push_str(&occurrence.display_id().dimmed().to_string());
    line
}

/// Day heading followed by its occurrences.
pub fn day_lines(cell: &DayCell, today: NaiveDate, tz: &Tz) -> Vec<String> {
    let label = date_label(cell.date, today);
    let heading = if cell.in_focus {
        label.bold().to_string()
    } else {
        label.dimmed().to_string()
    };

    std::iter::once(heading)
        .chain(cell.iter().map(|o| occurrence_line(o, tz)))
        .collect()
}
