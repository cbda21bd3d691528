use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use fs2::FileExt;
use tracing::{debug, info};

use super::{apply_replace, check_insert, poisoned, select, OccurrenceFilter, OccurrenceStore, StoreLock};
use crate::error::{Result, ScheduleError};
use crate::model::{GroupKey, Occurrence};

/// Store persisted as a single JSON array of occurrences.
///
/// Each batch is applied to a copy, written to a sibling temp file, and renamed
/// over the original. The in-memory rows only change after the rename succeeds,
/// so a failed write leaves both the file and the store as they were.
///
/// Several processes may open the same file. [`lock_exclusive`] takes an
/// exclusive lock on a sibling `.lock` file and reloads the rows from disk, so
/// a check-then-write made under that guard sees every earlier commit and
/// cannot be overwritten by a concurrent one.
///
/// [`lock_exclusive`]: OccurrenceStore::lock_exclusive
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    rows: RwLock<Vec<Occurrence>>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let rows = load(&path)?;
        info!(path = %path.display(), occurrences = rows.len(), "occurrence store opened");
        Ok(Self {
            path,
            rows: RwLock::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the rows, persist it, then publish it.
    fn commit<T>(&self, change: impl FnOnce(&mut Vec<Occurrence>) -> Result<T>) -> Result<T> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        let mut next = rows.clone();
        let out = change(&mut next)?;
        self.persist(&next)?;
        *rows = next;
        Ok(out)
    }

    fn persist(&self, rows: &[Occurrence]) -> Result<()> {
        self.ensure_dir()?;
        let tmp = self.sibling(".tmp");

        let json = serde_json::to_string_pretty(rows)?;
        let mut file = File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            ScheduleError::Store(format!("failed to replace {}: {e}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), occurrences = rows.len(), "occurrence store written");
        Ok(())
    }

    fn ensure_dir(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// `<store file name><suffix>` next to the store file.
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

fn load(path: &Path) -> Result<Vec<Occurrence>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .map_err(|e| ScheduleError::Store(format!("failed to read {}: {e}", path.display())))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&content)?)
}

impl OccurrenceStore for JsonFileStore {
    fn query(&self, filter: &OccurrenceFilter) -> Result<Vec<Occurrence>> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(select(&rows, filter))
    }

    fn insert_batch(&self, batch: &[Occurrence]) -> Result<()> {
        self.commit(|rows| {
            check_insert(rows, batch)?;
            rows.extend_from_slice(batch);
            Ok(())
        })
    }

    fn delete_batch(&self, key: &GroupKey) -> Result<usize> {
        self.commit(|rows| {
            let before = rows.len();
            rows.retain(|o| !key.matches(o));
            Ok(before - rows.len())
        })
    }

    fn replace_batch(&self, key: &GroupKey, batch: &[Occurrence]) -> Result<usize> {
        self.commit(|rows| apply_replace(rows, key, batch))
    }

    fn lock_exclusive(&self) -> Result<StoreLock> {
        self.ensure_dir()?;
        let lock_path = self.sibling(".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| {
                ScheduleError::Store(format!("failed to open {}: {e}", lock_path.display()))
            })?;
        FileExt::lock_exclusive(&file).map_err(|e| {
            ScheduleError::Store(format!("failed to lock {}: {e}", lock_path.display()))
        })?;

        let fresh = load(&self.path)?;
        let mut rows = self.rows.write().map_err(poisoned)?;
        if fresh.len() != rows.len() {
            debug!(
                path = %self.path.display(),
                before = rows.len(),
                after = fresh.len(),
                "occurrence store reloaded"
            );
        }
        *rows = fresh;

        Ok(StoreLock { _file: Some(file) })
    }
}
