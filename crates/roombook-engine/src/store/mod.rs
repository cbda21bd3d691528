//! Occurrence persistence.
//!
//! The engine talks to storage through [`OccurrenceStore`]. Every batch
//! operation must be atomic: after a failed call the store holds exactly what
//! it held before. Two implementations ship with the engine: [`MemoryStore`]
//! and [`JsonFileStore`].
//!
//! A conflict check followed by a write is only sound if nobody else writes in
//! between. The service brackets every such sequence with
//! [`OccurrenceStore::lock_exclusive`], which lets a backend shared between
//! processes hold off other writers and reload what they committed.

mod file;
mod memory;

use std::collections::HashSet;
use std::fs::File;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::model::{GroupKey, Occurrence};

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Storage backend for committed occurrences.
pub trait OccurrenceStore: Send + Sync {
    /// Occurrences matching `filter`, ordered by `(date, start, room, class)`.
    fn query(&self, filter: &OccurrenceFilter) -> Result<Vec<Occurrence>>;

    /// Insert every occurrence of `batch`, or none of them.
    fn insert_batch(&self, batch: &[Occurrence]) -> Result<()>;

    /// Delete every occurrence matching `key`. Returns how many were removed.
    fn delete_batch(&self, key: &GroupKey) -> Result<usize>;

    /// Delete the occurrences matching `key` and insert `batch` as one atomic
    /// step. Returns how many were removed.
    fn replace_batch(&self, key: &GroupKey, batch: &[Occurrence]) -> Result<usize>;

    /// Block other writers until the returned guard drops, and bring this
    /// store's view up to date with what they committed. Stores that only
    /// live inside one process need nothing beyond their own locking, so the
    /// default guard holds nothing.
    fn lock_exclusive(&self) -> Result<StoreLock> {
        Ok(StoreLock::default())
    }
}

/// Exclusive access to a store, released on drop.
#[must_use = "the store is unlocked as soon as the guard is dropped"]
#[derive(Debug, Default)]
pub struct StoreLock {
    _file: Option<File>,
}

/// Narrows a [`OccurrenceStore::query`]. Unset fields match everything; date
/// bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceFilter {
    pub room_id: Option<String>,
    pub class_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl OccurrenceFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    pub fn class(mut self, class_id: impl Into<String>) -> Self {
        self.class_id = Some(class_id.into());
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn matches(&self, occurrence: &Occurrence) -> bool {
        self.room_id.as_ref().is_none_or(|r| *r == occurrence.room_id)
            && self.class_id.as_ref().is_none_or(|c| *c == occurrence.class_id)
            && self.date.is_none_or(|d| d == occurrence.date)
            && self.from.is_none_or(|d| occurrence.date >= d)
            && self.to.is_none_or(|d| occurrence.date <= d)
    }
}

fn select(rows: &[Occurrence], filter: &OccurrenceFilter) -> Vec<Occurrence> {
    let mut selected: Vec<Occurrence> = rows.iter().filter(|o| filter.matches(o)).cloned().collect();
    selected.sort_by(|a, b| {
        (a.date, a.start, &a.room_id, &a.class_id).cmp(&(b.date, b.start, &b.room_id, &b.class_id))
    });
    selected
}

/// Reject a batch whose ids collide with each other or with `rows`.
///
/// Ids encode `(room, class, date, start, end)` unambiguously, so a duplicate
/// id is a duplicate booking.
fn check_insert(rows: &[Occurrence], batch: &[Occurrence]) -> Result<()> {
    let mut ids: HashSet<&str> = rows.iter().map(|o| o.id.as_str()).collect();
    for occurrence in batch {
        if !ids.insert(occurrence.id.as_str()) {
            return Err(ScheduleError::Store(format!(
                "duplicate occurrence id: {}",
                occurrence.id
            )));
        }
    }
    Ok(())
}

/// Apply delete-then-insert to `rows` after validating the insert against the
/// rows that survive the delete. `rows` is untouched on error.
fn apply_replace(rows: &mut Vec<Occurrence>, key: &GroupKey, batch: &[Occurrence]) -> Result<usize> {
    let kept: Vec<Occurrence> = rows.iter().filter(|o| !key.matches(o)).cloned().collect();
    check_insert(&kept, batch)?;
    let removed = rows.len() - kept.len();
    *rows = kept;
    rows.extend_from_slice(batch);
    Ok(removed)
}

fn poisoned<T>(_: T) -> ScheduleError {
    ScheduleError::Store("store lock poisoned".to_string())
}
