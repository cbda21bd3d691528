//! Error types for scheduling operations.

use chrono::NaiveDate;
use thiserror::Error;

use crate::conflict::Conflict;
use crate::model::{GroupKey, TimeOfDay};

/// Why a request was rejected before any occurrence was generated or stored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    #[error("{start}-{end} falls outside operating hours {opening}-{closing}")]
    OutOfHours {
        start: TimeOfDay,
        end: TimeOfDay,
        opening: TimeOfDay,
        closing: TimeOfDay,
    },

    #[error("duration of {minutes} minutes must be at least {minimum} and a multiple of {slot}")]
    BadDuration { minutes: i64, minimum: u16, slot: u16 },

    #[error("start time {start} is not aligned to the {slot}-minute slot grid")]
    MisalignedStart { start: TimeOfDay, slot: u16 },

    #[error("weekday set is empty")]
    EmptyWeekdaySet,

    #[error("date range ends on {end}, before it starts on {start}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid time of day: {0:?} (expected HH:MM)")]
    InvalidTime(String),

    #[error("invalid weekday: {0:?}")]
    InvalidWeekday(String),

    #[error("invalid scheduling rules: {0}")]
    InvalidRules(String),
}

/// Errors returned by the scheduling engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// The request broke a business rule. Nothing was written.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationReason),

    /// A candidate occurrence collides with a committed booking or with an
    /// earlier candidate of the same batch. Nothing was written.
    #[error("Conflict: {0}")]
    Conflict(Box<Conflict>),

    /// No stored occurrence matches the group key.
    #[error("No occurrences found for series {0}")]
    NotFound(GroupKey),

    /// The underlying store failed. Any batch in flight was discarded whole.
    #[error("Store error: {0}")]
    Store(String),
}

impl ScheduleError {
    /// The date range of a pattern ends before it starts.
    pub fn is_invalid_range(&self) -> bool {
        matches!(
            self,
            ScheduleError::Validation(ValidationReason::InvertedDateRange { .. })
        )
    }

    /// The pattern selects no weekday at all.
    pub fn is_invalid_pattern(&self) -> bool {
        matches!(
            self,
            ScheduleError::Validation(ValidationReason::EmptyWeekdaySet)
        )
    }

    /// The conflict carried by this error, if it is one.
    pub fn conflict(&self) -> Option<&Conflict> {
        match self {
            ScheduleError::Conflict(conflict) => Some(conflict),
            _ => None,
        }
    }
}

impl From<Conflict> for ScheduleError {
    fn from(conflict: Conflict) -> Self {
        ScheduleError::Conflict(Box::new(conflict))
    }
}

impl From<std::io::Error> for ScheduleError {
    fn from(err: std::io::Error) -> Self {
        ScheduleError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for ScheduleError {
    fn from(err: serde_json::Error) -> Self {
        ScheduleError::Store(format!("serialization: {err}"))
    }
}

/// Convenience alias used throughout roombook-engine.
pub type Result<T> = std::result::Result<T, ScheduleError>;
