//! Occurrences and their display identities.
//!
//! A generated occurrence is shown under a synthetic id of the form
//! `<base id>#<start as RFC 3339 with milliseconds>`, e.g.
//! `abc123#2026-02-15T09:00:00.000Z`. Inside the crate the id is the typed
//! [`OccurrenceId`]; the delimited string only exists at the boundary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::OCCURRENCE_SEPARATOR;
use crate::error::{ChalkboardError, ChalkboardResult};
use crate::event::Event;

/// Identity of one occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OccurrenceId {
    /// The stored record itself.
    Base(String),
    /// A repetition generated from the base record.
    Generated {
        base_id: String,
        start: DateTime<Utc>,
    },
}

/// One concrete appearance of an event inside a window.
///
/// `event` carries the base record's fields with `start`/`end` shifted to this
/// occurrence; `event.id` is always the base id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub id: OccurrenceId,
    pub event: Event,
}

/// True iff `id` carries the occurrence separator.
pub fn is_synthetic(id: &str) -> bool {
    id.contains(OCCURRENCE_SEPARATOR)
}

/// The stored record id behind any display id: everything before the first
/// separator, or the id unchanged.
pub fn real_id(id: &str) -> &str {
    match id.split_once(OCCURRENCE_SEPARATOR) {
        Some((base, _)) => base,
        None => id,
    }
}

impl OccurrenceId {
    pub fn generated(base_id: impl Into<String>, start: DateTime<Utc>) -> Self {
        OccurrenceId::Generated {
            base_id: base_id.into(),
            start,
        }
    }

    pub fn base_id(&self) -> &str {
        match self {
            OccurrenceId::Base(id) => id,
            OccurrenceId::Generated { base_id, .. } => base_id,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, OccurrenceId::Generated { .. })
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccurrenceId::Base(id) => f.write_str(id),
            OccurrenceId::Generated { base_id, start } => write!(
                f,
                "{}{}{}",
                base_id,
                OCCURRENCE_SEPARATOR,
                start.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
        }
    }
}

impl FromStr for OccurrenceId {
    type Err = ChalkboardError;

    fn from_str(s: &str) -> ChalkboardResult<Self> {
        let Some((base_id, stamp)) = s.split_once(OCCURRENCE_SEPARATOR) else {
            return Ok(OccurrenceId::Base(s.to_string()));
        };

        if base_id.is_empty() {
            return Err(ChalkboardError::InvalidOccurrenceId(s.to_string()));
        }

        let start = DateTime::parse_from_rfc3339(stamp)
            .map_err(|_| ChalkboardError::InvalidOccurrenceId(s.to_string()))?
            .with_timezone(&Utc);

        Ok(OccurrenceId::generated(base_id, start))
    }
}

impl Serialize for OccurrenceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OccurrenceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Occurrence {
    /// The unmodified stored record.
    pub fn base(event: &Event) -> Self {
        Occurrence {
            id: OccurrenceId::Base(event.id.clone()),
            event: event.clone(),
        }
    }

    /// A repetition of `event` starting at `start`, keeping `duration`.
    /// `None` when the end falls outside the representable range.
    pub fn generated(
        event: &Event,
        start: DateTime<Utc>,
        duration: chrono::TimeDelta,
    ) -> Option<Self> {
        let mut shifted = event.clone();
        shifted.start = start;
        shifted.end = start.checked_add_signed(duration)?;
        Some(Occurrence {
            id: OccurrenceId::generated(event.id.clone(), start),
            event: shifted,
        })
    }

    pub fn display_id(&self) -> String {
        self.id.to_string()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.event.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.event.end
    }

    pub fn is_generated(&self) -> bool {
        self.id.is_generated()
    }
}
