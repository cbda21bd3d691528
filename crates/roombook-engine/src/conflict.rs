//! Detect double bookings of a room or a class.
//!
//! Intervals are half-open, so adjacent bookings (where one ends exactly when
//! another starts) are NOT conflicts. Two occurrences conflict when they fall on
//! the same date, their intervals overlap, and they share the room, the class,
//! or both. A class cannot be in two rooms at once.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Occurrence, TimeRange};

/// Half-open overlap test: `[a.start, a.end)` and `[b.start, b.end)` overlap
/// iff `a.start < b.end && b.start < a.end`.
pub fn overlaps(a: &TimeRange, b: &TimeRange) -> bool {
    a.start < b.end && b.start < a.end
}

/// Which shared resource made two occurrences collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Room,
    Class,
    RoomAndClass,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictKind::Room => "room",
            ConflictKind::Class => "class",
            ConflictKind::RoomAndClass => "room and class",
        })
    }
}

/// A detected collision between a candidate and an occurrence that was there first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub date: NaiveDate,
    pub kind: ConflictKind,
    /// The occurrence that was being scheduled.
    pub candidate: Occurrence,
    /// The committed occurrence, or earlier candidate of the same batch, it hit.
    pub existing: Occurrence,
    pub overlap_minutes: i64,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} overlaps room {} / class {} {} ({} shared, {} min)",
            self.date,
            self.candidate.time_range(),
            self.existing.room_id,
            self.existing.class_id,
            self.existing.time_range(),
            self.kind,
            self.overlap_minutes
        )
    }
}

/// Compare a candidate with one other occurrence.
pub fn check_pair(candidate: &Occurrence, other: &Occurrence) -> Option<Conflict> {
    if candidate.date != other.date {
        return None;
    }

    let kind = match (
        candidate.room_id == other.room_id,
        candidate.class_id == other.class_id,
    ) {
        (true, true) => ConflictKind::RoomAndClass,
        (true, false) => ConflictKind::Room,
        (false, true) => ConflictKind::Class,
        (false, false) => return None,
    };

    let a = candidate.time_range();
    let b = other.time_range();
    if !overlaps(&a, &b) {
        return None;
    }

    let overlap_minutes =
        i64::from(a.end.min(b.end).minutes()) - i64::from(a.start.max(b.start).minutes());

    Some(Conflict {
        date: candidate.date,
        kind,
        candidate: candidate.clone(),
        existing: other.clone(),
        overlap_minutes,
    })
}

/// Find the first occurrence that `candidate` collides with, checking committed
/// occurrences before earlier candidates of the same batch.
pub fn find_conflict<'a>(
    candidate: &Occurrence,
    committed: impl IntoIterator<Item = &'a Occurrence>,
    accepted: impl IntoIterator<Item = &'a Occurrence>,
) -> Option<Conflict> {
    committed
        .into_iter()
        .chain(accepted)
        .find_map(|other| check_pair(candidate, other))
}

/// Check a batch in order and stop at the first conflicting candidate.
///
/// Each candidate is tested against the committed occurrences on its date and
/// against every earlier candidate that was accepted.
pub fn first_batch_conflict(candidates: &[Occurrence], committed: &[Occurrence]) -> Option<Conflict> {
    scan_batch(candidates, committed, true).into_iter().next()
}

/// Check a whole batch and report every conflicting candidate (its first
/// conflict only). Conflicting candidates are not treated as accepted, so they
/// cannot cause follow-on conflicts of their own.
pub fn all_batch_conflicts(candidates: &[Occurrence], committed: &[Occurrence]) -> Vec<Conflict> {
    scan_batch(candidates, committed, false)
}

fn scan_batch(candidates: &[Occurrence], committed: &[Occurrence], stop_at_first: bool) -> Vec<Conflict> {
    let mut committed_by_date: BTreeMap<NaiveDate, Vec<&Occurrence>> = BTreeMap::new();
    for occurrence in committed {
        committed_by_date.entry(occurrence.date).or_default().push(occurrence);
    }

    let mut accepted_by_date: BTreeMap<NaiveDate, Vec<&Occurrence>> = BTreeMap::new();
    let mut conflicts = Vec::new();

    for candidate in candidates {
        let same_day = committed_by_date.get(&candidate.date).into_iter().flatten().copied();
        let same_batch = accepted_by_date.get(&candidate.date).into_iter().flatten().copied();

        match find_conflict(candidate, same_day, same_batch) {
            Some(conflict) => {
                conflicts.push(conflict);
                if stop_at_first {
                    break;
                }
            }
            None => accepted_by_date.entry(candidate.date).or_default().push(candidate),
        }
    }

    conflicts
}
