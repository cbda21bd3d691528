//! # roombook-engine
//!
//! Recurring room reservation scheduling with conflict detection.
//!
//! A booking request names a room, a class, a time slot, a date range and a set
//! of weekdays. The engine expands it into concrete occurrences, refuses the
//! whole batch if any occurrence collides with an existing booking of the same
//! room or the same class, and later rebuilds the recurring pattern from the
//! stored occurrences for display, editing, and bulk deletion.
//!
//! ## Modules
//!
//! - [`model`] — times of day, weekday sets, occurrences, group keys, patterns
//! - [`generator`] — pattern → ordered list of candidate occurrences
//! - [`validation`] — slot-grid and operating-hours rules
//! - [`conflict`] — half-open overlap test and batch conflict detection
//! - [`series`] — rebuild series descriptors from flat occurrences
//! - [`store`] — the occurrence store interface plus memory and JSON-file stores
//! - [`service`] — the scheduling service composing all of the above
//! - [`config`] — scheduling rules (operating hours, slot size)
//! - [`error`] — error types

pub mod config;
pub mod conflict;
pub mod error;
pub mod generator;
mod lock;
pub mod model;
pub mod series;
pub mod service;
pub mod store;
pub mod validation;

pub use config::SchedulingRules;
pub use conflict::{overlaps, Conflict, ConflictKind};
pub use error::{Result, ScheduleError, ValidationReason};
pub use generator::generate_occurrences;
pub use model::{GroupKey, Occurrence, Pattern, TimeOfDay, TimeRange, WeekdaySet};
pub use series::{group_series, series_gaps, Series};
pub use service::SchedulingService;
pub use store::{JsonFileStore, MemoryStore, OccurrenceFilter, OccurrenceStore, StoreLock};
