//! Core of the chalkboard planner.
//!
//! - `event`, `window` and `occurrence` define the stored rows, the time
//!   ranges views ask for and the occurrences shown in them
//! - `recurrence` expands recurring events over a window
//! - `store` talks to the events table; `gateway` writes through it
//! - `session` and `view` keep and arrange the occurrences of one view
//! - `notify` carries change notifications that trigger refetches

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod gateway;
pub mod notice;
pub mod notify;
pub mod occurrence;
pub mod recurrence;
pub mod session;
pub mod store;
pub mod view;
pub mod window;

pub use config::{ChalkboardConfig, StoreBackend};
pub use error::{ChalkboardError, ChalkboardResult};
pub use event::{Event, EventDraft, EventKind, Recurrence};
pub use gateway::MutationGateway;
pub use notice::{Notice, NoticeLevel, Notifier};
pub use notify::{Change, ChangeFeed, ChangeKind, Subscription};
pub use occurrence::{Occurrence, OccurrenceId, is_synthetic, real_id};
pub use recurrence::{expand_occurrences, expand_occurrences_with_limit};
pub use session::{Applied, CalendarSession, FetchTicket};
pub use store::{EventStore, MemoryStore, RestStore};
pub use view::{DayCell, TimelinePlacement};
pub use window::{CalendarView, Window};
