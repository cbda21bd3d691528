use std::sync::{PoisonError, RwLock};

use super::{apply_replace, check_insert, poisoned, select, OccurrenceFilter, OccurrenceStore};
use crate::error::Result;
use crate::model::{GroupKey, Occurrence};

/// Process-local store. Batches are validated before anything is mutated.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<Occurrence>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing occurrences (e.g. fixtures) without validation.
    pub fn with_occurrences(occurrences: Vec<Occurrence>) -> Self {
        Self {
            rows: RwLock::new(occurrences),
        }
    }

    /// Number of stored occurrences. Batches never leave the rows half
    /// written, so a poisoned lock still guards a consistent list.
    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OccurrenceStore for MemoryStore {
    fn query(&self, filter: &OccurrenceFilter) -> Result<Vec<Occurrence>> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(select(&rows, filter))
    }

    fn insert_batch(&self, batch: &[Occurrence]) -> Result<()> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        check_insert(&rows, batch)?;
        rows.extend_from_slice(batch);
        Ok(())
    }

    fn delete_batch(&self, key: &GroupKey) -> Result<usize> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        let before = rows.len();
        rows.retain(|o| !key.matches(o));
        Ok(before - rows.len())
    }

    fn replace_batch(&self, key: &GroupKey, batch: &[Occurrence]) -> Result<usize> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        apply_replace(&mut rows, key, batch)
    }
}
