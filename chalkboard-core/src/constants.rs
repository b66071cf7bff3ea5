//! Shared constants.

use chrono::Weekday;

/// Upper bound on recurrence cursor steps per event and expansion.
pub const MAX_RECURRENCE_STEPS: usize = 500;

/// Separates the base event id from the occurrence start in a synthetic id.
/// Must stay outside the RFC 3339 and UUID alphabets.
pub const OCCURRENCE_SEPARATOR: char = '#';

/// Calendar grids start their weeks on Sunday.
pub const WEEK_START: Weekday = Weekday::Sun;

pub const DEFAULT_EVENT_COLOR: &str = "#f0c040";

/// Name of the events table in the hosted store and on the change feed.
pub const EVENTS_TABLE: &str = "events";

/// First and last hour shown on the week/day timeline grid.
pub const TIMELINE_START_HOUR: u32 = 6;
pub const TIMELINE_END_HOUR: u32 = 22;

/// Shortest block drawn on the timeline, in minutes.
pub const TIMELINE_MIN_MINUTES: i64 = 24;
