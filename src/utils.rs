//! Parsing of command-line date, time and field values.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use chalkboard_core::window::parse_date;
use chalkboard_core::{EventKind, Recurrence};

/// A start or end as typed: a bare date or a wall-clock date and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse `2026-03-20`, `2026-03-20T15:00`, or natural language such as
/// "tomorrow 3pm". Input without a time of day is a date.
pub fn parse_when(input: &str) -> Result<When> {
    let input = input.trim();

    if let Ok(date) = parse_date(input) {
        return Ok(When::Date(date));
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(input, f).ok())
    {
        return Ok(When::DateTime(dt));
    }

    let dt = fuzzydate::parse(&input.to_lowercase())
        .map_err(|_| anyhow::anyhow!("Could not parse date/time: \"{}\"", input))?;

    if mentions_time_of_day(input) {
        Ok(When::DateTime(dt))
    } else {
        Ok(When::Date(dt.date()))
    }
}

/// Whether natural-language input names a time: `15:00`, `3pm`, `3 pm`,
/// `noon` or `midnight`.
fn mentions_time_of_day(input: &str) -> bool {
    let lower = input.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    words.iter().enumerate().any(|(i, word)| {
        if matches!(*word, "noon" | "midnight") {
            return true;
        }
        if let Some((h, m)) = word.split_once(':') {
            return h.ends_with(|c: char| c.is_ascii_digit())
                && m.starts_with(|c: char| c.is_ascii_digit());
        }
        if let Some(digits) = word.strip_suffix("am").or_else(|| word.strip_suffix("pm")) {
            if digits.is_empty() {
                return i > 0 && words[i - 1].chars().all(|c| c.is_ascii_digit());
            }
            return digits.chars().all(|c| c.is_ascii_digit());
        }
        false
    })
}

/// Parse a duration such as `30m`, `1h` or `2h30m`.
pub fn parse_duration(input: &str) -> Result<TimeDelta> {
    let std_dur = humantime::parse_duration(input.trim())
        .with_context(|| format!("Could not parse duration: \"{}\"", input))?;
    TimeDelta::from_std(std_dur).context("Duration too large")
}

/// `daily`, `weekly`, `monthly`, or `none` to stop repeating.
pub fn parse_repeat(input: &str) -> Result<Option<Recurrence>> {
    if is_none(input) {
        return Ok(None);
    }
    Recurrence::parse(input)
        .map(Some)
        .ok_or_else(|| anyhow::anyhow!("Unknown repeat '{}'. Use daily, weekly, monthly or none", input))
}

/// Last day of a series (`YYYY-MM-DD`), or `none` to repeat without end.
pub fn parse_until(input: &str) -> Result<Option<NaiveDate>> {
    if is_none(input) {
        return Ok(None);
    }
    Ok(Some(parse_date(input)?))
}

pub fn parse_kind(input: &str) -> Result<EventKind> {
    EventKind::parse(input)
        .ok_or_else(|| anyhow::anyhow!("Unknown kind '{}'. Use event, meeting or deadline", input))
}

/// Empty input clears an optional text field.
pub fn optional_text(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn is_none(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "" | "none" | "never")
}
