//! Error types for timetable parsing.

use chrono::NaiveTime;

/// Error raised when timetable markup or serialized schedule data is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParsingError {
    #[error("Missing element: {0}")]
    MissingElement(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid time label: {0}")]
    InvalidTime(String),

    #[error("Event block has no height encoding in style {0:?}")]
    MissingHeight(String),

    #[error("Event block has no title attribute")]
    MissingTitle,

    #[error("Title does not match `name [location] shift`: {0:?}")]
    InvalidTitle(String),

    #[error("Location is not `campus-building-room`: {0:?}")]
    InvalidLocation(String),

    #[error("Column {column} has no weekday header ({headers} headers)")]
    ColumnOutOfRange { column: usize, headers: usize },

    #[error("Unknown weekday: {0}")]
    UnknownWeekday(String),

    #[error("Unexpected duration: {0}")]
    UnexpectedDuration(String),

    #[error("Event start {0} is not aligned to a 30 minute slot")]
    UnalignedStart(NaiveTime),

    #[error("Invalid schedule document at {path}: {message}")]
    InvalidDocument { path: String, message: String },
}
