//! The scheduling service: validation, generation, conflict detection, and
//! atomic persistence composed into the operations callers use.
//!
//! Every operation that writes holds the advisory locks of the affected room
//! and class, then the store's exclusive lock, from the conflict read through
//! the store write.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::config::SchedulingRules;
use crate::conflict::{self, Conflict};
use crate::error::{Result, ScheduleError};
use crate::generator::generate_occurrences;
use crate::lock::{LockKey, ResourceLocks};
use crate::model::{GroupKey, Occurrence, Pattern};
use crate::series::{group_series, Series};
use crate::store::{OccurrenceFilter, OccurrenceStore};
use crate::validation::validate_pattern;

/// Orchestrates recurring bookings against an injected store.
///
/// The caller owns the store's lifecycle. Share one service between threads
/// with `Arc`. The service's room and class locks only coordinate callers of
/// the same instance; separate instances (or processes) sharing a backend are
/// serialized by [`OccurrenceStore::lock_exclusive`].
#[derive(Debug)]
pub struct SchedulingService<S> {
    store: S,
    rules: SchedulingRules,
    locks: ResourceLocks,
}

impl<S: OccurrenceStore> SchedulingService<S> {
    /// # Errors
    /// Returns `ValidationReason::InvalidRules` if `rules` are incoherent.
    pub fn new(store: S, rules: SchedulingRules) -> Result<Self> {
        rules.validate()?;
        Ok(Self {
            store,
            rules,
            locks: ResourceLocks::default(),
        })
    }

    pub fn rules(&self) -> &SchedulingRules {
        &self.rules
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate, expand, and commit a recurring booking as one batch.
    ///
    /// Returns every committed occurrence in date order. If any candidate
    /// collides with a committed occurrence, or with an earlier candidate of the
    /// same batch, nothing is written and the first conflict is returned. A
    /// pattern matching no date commits nothing and returns an empty list.
    pub fn create_series(&self, pattern: &Pattern) -> Result<Vec<Occurrence>> {
        let candidates = self.prepare(pattern)?;
        if candidates.is_empty() {
            warn!(series = %pattern.group_key(), "pattern matches no date, nothing to book");
            return Ok(candidates);
        }

        let _guard = self.locks.acquire(lock_keys([pattern.group_key()].iter()))?;
        let _store = self.store.lock_exclusive()?;
        let committed = self.committed_near(pattern, None)?;
        if let Some(found) = conflict::first_batch_conflict(&candidates, &committed) {
            warn!(series = %pattern.group_key(), date = %found.date, kind = %found.kind, "series rejected");
            return Err(found.into());
        }

        self.store.insert_batch(&candidates)?;
        info!(
            series = %pattern.group_key(),
            count = candidates.len(),
            "series created"
        );
        Ok(candidates)
    }

    /// Dry run of [`create_series`](Self::create_series): every candidate date
    /// that would conflict, first conflict per date. Nothing is written.
    pub fn preview_conflicts(&self, pattern: &Pattern) -> Result<Vec<Conflict>> {
        let candidates = self.prepare(pattern)?;
        let committed = self.committed_near(pattern, None)?;
        Ok(conflict::all_batch_conflicts(&candidates, &committed))
    }

    /// Pass-through query.
    pub fn list_occurrences(&self, filter: &OccurrenceFilter) -> Result<Vec<Occurrence>> {
        self.store.query(filter)
    }

    /// Query, then rebuild the series the matching occurrences form.
    pub fn list_series(&self, filter: &OccurrenceFilter) -> Result<Vec<Series>> {
        Ok(group_series(&self.store.query(filter)?))
    }

    /// Delete every occurrence of a series in one atomic batch.
    ///
    /// # Errors
    /// Returns `ScheduleError::NotFound` if no occurrence matches `key`.
    pub fn delete_series(&self, key: &GroupKey) -> Result<usize> {
        let _guard = self.locks.acquire(lock_keys([key.clone()].iter()))?;
        let _store = self.store.lock_exclusive()?;
        let removed = self.store.delete_batch(key)?;
        if removed == 0 {
            return Err(ScheduleError::NotFound(key.clone()));
        }
        info!(series = %key, count = removed, "series deleted");
        Ok(removed)
    }

    /// Edit a series: delete the occurrences of `key` and create `pattern` in
    /// their place, atomically. The old occurrences do not count as conflicts
    /// for the new ones. On any failure the old series stays as it was.
    ///
    /// A valid pattern that matches no date still removes the old series and
    /// returns an empty list, which makes the edit equivalent to a delete.
    pub fn replace_series(&self, key: &GroupKey, pattern: &Pattern) -> Result<Vec<Occurrence>> {
        let candidates = self.prepare(pattern)?;

        let _guard = self
            .locks
            .acquire(lock_keys([key.clone(), pattern.group_key()].iter()))?;
        let _store = self.store.lock_exclusive()?;

        let existing = self
            .store
            .query(&OccurrenceFilter::all().room(&key.room_id).class(&key.class_id))?;
        if !existing.iter().any(|o| key.matches(o)) {
            return Err(ScheduleError::NotFound(key.clone()));
        }
        if candidates.is_empty() {
            warn!(
                old = %key,
                new = %pattern.group_key(),
                "pattern matches no date, series will only be removed"
            );
        }

        let committed = self.committed_near(pattern, Some(key))?;
        if let Some(found) = conflict::first_batch_conflict(&candidates, &committed) {
            warn!(series = %pattern.group_key(), date = %found.date, kind = %found.kind, "series edit rejected");
            return Err(found.into());
        }

        let removed = self.store.replace_batch(key, &candidates)?;
        info!(
            old = %key,
            new = %pattern.group_key(),
            removed,
            count = candidates.len(),
            "series replaced"
        );
        Ok(candidates)
    }

    fn prepare(&self, pattern: &Pattern) -> Result<Vec<Occurrence>> {
        validate_pattern(pattern, &self.rules)?;
        generate_occurrences(pattern)
    }

    /// Committed occurrences in the pattern's date range that share its room or
    /// its class, minus those belonging to `ignore`.
    fn committed_near(&self, pattern: &Pattern, ignore: Option<&GroupKey>) -> Result<Vec<Occurrence>> {
        let by_room = OccurrenceFilter::all()
            .room(&pattern.room_id)
            .between(pattern.date_start, pattern.date_end);
        let by_class = OccurrenceFilter::all()
            .class(&pattern.class_id)
            .between(pattern.date_start, pattern.date_end);

        let mut seen = HashSet::new();
        let mut committed = Vec::new();
        for occurrence in self
            .store
            .query(&by_room)?
            .into_iter()
            .chain(self.store.query(&by_class)?)
        {
            if ignore.is_some_and(|key| key.matches(&occurrence)) {
                continue;
            }
            if seen.insert(occurrence.id.clone()) {
                committed.push(occurrence);
            }
        }
        Ok(committed)
    }
}

fn lock_keys<'a>(keys: impl Iterator<Item = &'a GroupKey>) -> Vec<LockKey> {
    keys.flat_map(|key| {
        [
            LockKey::Room(key.room_id.clone()),
            LockKey::Class(key.class_id.clone()),
        ]
    })
    .collect()
}
