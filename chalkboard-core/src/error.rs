//! Error types for the chalkboard planner.

use thiserror::Error;

/// Errors that can occur in chalkboard operations.
#[derive(Error, Debug)]
pub enum ChalkboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Invalid occurrence id '{0}'")]
    InvalidOccurrenceId(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for chalkboard operations.
pub type ChalkboardResult<T> = Result<T, ChalkboardError>;
