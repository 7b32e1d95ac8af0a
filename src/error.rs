//! Error type shared by ingestion, preferences and the CLI handlers.

use chrono::NaiveDate;

/// Library-level error type for triage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Task '{0}' appears more than once with different content")]
    DuplicateTask(String),

    #[error("Invalid date '{0}': expected YYYY-MM-DD, \"today\" or \"yesterday\"")]
    InvalidDate(String),

    #[error("Date range is empty: {from} is after {to}")]
    EmptyDateRange { from: NaiveDate, to: NaiveDate },

    #[error("No task group with ultimate parent '{0}'")]
    UnknownGroup(String),

    #[error("No task with id '{0}'")]
    UnknownTask(String),
}

/// Result type alias for triage operations.
pub type Result<T> = std::result::Result<T, Error>;
