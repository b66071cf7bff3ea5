//! CSV export of a listed period.

use std::io::Write;

use anyhow::Result;
use chalkboard_core::{DayCell, EventKind, Occurrence};
use chrono_tz::Tz;
use serde::Serialize;

const HEADER: [&str; 6] = ["title", "date", "start", "end", "type", "description"];

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    title: &'a str,
    date: String,
    start: String,
    end: String,
    kind: &'static str,
    description: &'a str,
}

impl<'a> ExportRow<'a> {
    fn new(occurrence: &'a Occurrence, tz: &Tz) -> Self {
        let event = &occurrence.event;
        let start = event.start.with_timezone(tz);
        let (start_label, end_label) = if event.all_day {
            ("all-day".to_string(), "-".to_string())
        } else {
            let end = event.end.with_timezone(tz);
            (start.format("%H:%M").to_string(), end.format("%H:%M").to_string())
        };

        ExportRow {
            title: &event.title,
            date: start.format("%Y-%m-%d").to_string(),
            start: start_label,
            end: end_label,
            kind: event.kind.unwrap_or(EventKind::Event).label(),
            description: event.description.as_deref().unwrap_or(""),
        }
    }
}

/// Write the occurrences of `cells`, day by day, as CSV. The header row is
/// written even when the period is empty.
pub fn write_csv<W: Write>(out: W, cells: &[DayCell], tz: &Tz) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(HEADER)?;

    let mut count = 0;
    for occurrence in cells.iter().flat_map(DayCell::iter) {
        writer.serialize(ExportRow::new(occurrence, tz))?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}
