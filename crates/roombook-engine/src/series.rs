//! Rebuild recurring series from flat occurrence lists.
//!
//! Series are never stored. A series is whatever the occurrences sharing a
//! [`GroupKey`] say it is: the earliest and latest date among them and the
//! distinct weekdays they fall on. Grouping is pure and order-independent, so
//! grouping the same occurrences twice gives identical descriptors.
//!
//! Grouping the output of [`generate_occurrences`] reproduces the pattern's
//! weekday set and range, as long as every weekday of the set occurs at least
//! once and the range starts and ends on matching weekdays. Occurrences that
//! went missing outside a series delete silently narrow the rebuilt range or
//! weekday set; [`series_gaps`] makes that visible.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generator::generate_occurrences;
use crate::model::{GroupKey, Occurrence, Pattern, WeekdaySet};

/// A recurring booking rebuilt from its occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub key: GroupKey,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub weekdays: WeekdaySet,
    pub occurrence_count: usize,
}

impl Series {
    fn seed(occurrence: &Occurrence) -> Self {
        let mut weekdays = WeekdaySet::EMPTY;
        weekdays.insert(occurrence.date.weekday());
        Self {
            key: occurrence.group_key(),
            date_start: occurrence.date,
            date_end: occurrence.date,
            weekdays,
            occurrence_count: 1,
        }
    }

    fn absorb(&mut self, occurrence: &Occurrence) {
        self.date_start = self.date_start.min(occurrence.date);
        self.date_end = self.date_end.max(occurrence.date);
        self.weekdays.insert(occurrence.date.weekday());
        self.occurrence_count += 1;
    }

    /// The pattern this series describes, e.g. to fill an edit form.
    pub fn to_pattern(&self) -> Pattern {
        Pattern {
            room_id: self.key.room_id.clone(),
            class_id: self.key.class_id.clone(),
            date_start: self.date_start,
            date_end: self.date_end,
            weekdays: self.weekdays,
            start: self.key.start,
            end: self.key.end,
        }
    }
}

/// Partition occurrences by `(room, class, start, end)` and describe each group.
///
/// Series come back sorted by group key.
pub fn group_series(occurrences: &[Occurrence]) -> Vec<Series> {
    let mut groups: BTreeMap<GroupKey, Series> = BTreeMap::new();

    for occurrence in occurrences {
        groups
            .entry(occurrence.group_key())
            .and_modify(|series| series.absorb(occurrence))
            .or_insert_with(|| Series::seed(occurrence));
    }

    groups.into_values().collect()
}

/// Dates `expected` implies that have no matching occurrence in `occurrences`.
///
/// Pass the originally requested pattern to find every missing date. Passing a
/// rebuilt [`Series::to_pattern`] only finds interior gaps, because gaps at the
/// edges have already narrowed the rebuilt range.
pub fn series_gaps(expected: &Pattern, occurrences: &[Occurrence]) -> Result<Vec<NaiveDate>> {
    let key = expected.group_key();
    let present: BTreeSet<NaiveDate> = occurrences
        .iter()
        .filter(|o| key.matches(o))
        .map(|o| o.date)
        .collect();

    Ok(generate_occurrences(expected)?
        .into_iter()
        .map(|o| o.date)
        .filter(|date| !present.contains(date))
        .collect())
}
