//! Tests for the store implementations' atomic batch semantics.

use std::path::PathBuf;

use chrono::NaiveDate;
use roombook_engine::{
    GroupKey, JsonFileStore, MemoryStore, Occurrence, OccurrenceFilter, OccurrenceStore, ScheduleError,
    TimeRange,
};

fn occ(room: &str, class: &str, day: u32, start: &str, end: &str) -> Occurrence {
    Occurrence::new(
        room,
        class,
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        TimeRange::new(start.parse().unwrap(), end.parse().unwrap()),
    )
}

/// A fresh store path under the system temp dir, unique per test.
fn temp_store(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("roombook-store-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("occurrences.json")
}

fn key(room: &str, class: &str, start: &str, end: &str) -> GroupKey {
    GroupKey::new(room, class, TimeRange::new(start.parse().unwrap(), end.parse().unwrap()))
}

#[test]
fn memory_store_rejects_duplicate_batch_whole() {
    let store = MemoryStore::new();
    store.insert_batch(&[occ("R1", "C1", 4, "09:00", "10:00")]).unwrap();

    let batch = vec![
        occ("R1", "C1", 6, "09:00", "10:00"),
        occ("R1", "C1", 4, "09:00", "10:00"),
    ];
    let err = store.insert_batch(&batch).unwrap_err();
    assert!(matches!(err, ScheduleError::Store(_)));
    assert_eq!(store.len(), 1);
}

#[test]
fn memory_store_query_is_sorted() {
    let store = MemoryStore::new();
    store
        .insert_batch(&[
            occ("R2", "C2", 6, "09:00", "10:00"),
            occ("R1", "C1", 6, "11:00", "12:00"),
            occ("R1", "C1", 4, "09:00", "10:00"),
            occ("R1", "C3", 6, "09:00", "10:00"),
        ])
        .unwrap();

    let ids: Vec<String> = store
        .query(&OccurrenceFilter::all())
        .unwrap()
        .into_iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(
        ids,
        vec![
            "R1/C1/2024-03-04/09:00-10:00",
            "R1/C3/2024-03-06/09:00-10:00",
            "R2/C2/2024-03-06/09:00-10:00",
            "R1/C1/2024-03-06/11:00-12:00",
        ]
    );
}

#[test]
fn replace_batch_removes_then_inserts() {
    let store = MemoryStore::new();
    store
        .insert_batch(&[
            occ("R1", "C1", 4, "09:00", "10:00"),
            occ("R1", "C1", 6, "09:00", "10:00"),
        ])
        .unwrap();

    // Re-inserting an id that the delete half removes is allowed.
    let removed = store
        .replace_batch(
            &key("R1", "C1", "09:00", "10:00"),
            &[occ("R1", "C1", 4, "09:00", "10:00")],
        )
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(store.len(), 1);
}

#[test]
fn memory_store_len_tracks_batches() {
    let store = MemoryStore::new();
    assert!(store.is_empty());
    store
        .insert_batch(&[
            occ("R1", "C1", 4, "09:00", "10:00"),
            occ("R1", "C1", 6, "09:00", "10:00"),
        ])
        .unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.insert_batch(&[occ("R1", "C1", 4, "09:00", "10:00")]).is_err());
    assert_eq!(store.len(), 2);
}

#[test]
fn json_store_persists_across_reopen() {
    let path = temp_store("reopen");
    {
        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.query(&OccurrenceFilter::all()).unwrap().is_empty());
        store
            .insert_batch(&[
                occ("R1", "C1", 4, "09:00", "10:00"),
                occ("R1", "C1", 6, "09:00", "10:00"),
                occ("R2", "C2", 6, "09:00", "10:00"),
            ])
            .unwrap();
    }

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(reopened.query(&OccurrenceFilter::all()).unwrap().len(), 3);

    let removed = reopened.delete_batch(&key("R1", "C1", "09:00", "10:00")).unwrap();
    assert_eq!(removed, 2);

    let again = JsonFileStore::open(&path).unwrap();
    let left = again.query(&OccurrenceFilter::all()).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].room_id, "R2");
    assert!(!path.with_file_name("occurrences.json.tmp").exists());
}

#[test]
fn json_store_failed_batch_changes_nothing() {
    let path = temp_store("failed");
    let store = JsonFileStore::open(&path).unwrap();
    store.insert_batch(&[occ("R1", "C1", 4, "09:00", "10:00")]).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let err = store
        .insert_batch(&[
            occ("R1", "C1", 6, "09:00", "10:00"),
            occ("R1", "C1", 4, "09:00", "10:00"),
        ])
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Store(_)));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    assert_eq!(store.query(&OccurrenceFilter::all()).unwrap().len(), 1);
}

#[test]
fn json_store_lock_reloads_rows_written_elsewhere() {
    let path = temp_store("reload");
    let stale = JsonFileStore::open(&path).unwrap();
    let writer = JsonFileStore::open(&path).unwrap();
    writer.insert_batch(&[occ("R1", "C1", 4, "09:00", "10:00")]).unwrap();
    assert!(stale.query(&OccurrenceFilter::all()).unwrap().is_empty());

    {
        let _lock = stale.lock_exclusive().unwrap();
        assert_eq!(stale.query(&OccurrenceFilter::all()).unwrap().len(), 1);
        stale.insert_batch(&[occ("R2", "C2", 4, "09:00", "10:00")]).unwrap();
    }

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(reopened.query(&OccurrenceFilter::all()).unwrap().len(), 2);
    assert!(path.with_file_name("occurrences.json.lock").exists());
}

#[test]
fn json_store_rejects_corrupt_file() {
    let path = temp_store("corrupt");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "not json").unwrap();
    assert!(matches!(JsonFileStore::open(&path), Err(ScheduleError::Store(_))));
}
