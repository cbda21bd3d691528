//! Occurrence generation -- expands a pattern into concrete dated occurrences.
//!
//! Generation is pure: the same pattern always yields the same list, ids
//! included, so it is safe to call for previews and dry runs.

use chrono::Datelike;
use tracing::debug;

use crate::error::{Result, ValidationReason};
use crate::model::{Occurrence, Pattern};

/// Expand a pattern into one occurrence per matching date, in ascending date order.
///
/// A date matches when it lies in `[date_start, date_end]` (both inclusive) and
/// its weekday is in the pattern's weekday set. A range holding no matching
/// weekday produces an empty list, not an error.
///
/// # Errors
/// Returns `ValidationReason::InvertedDateRange` if `date_end < date_start`.
/// Returns `ValidationReason::EmptyWeekdaySet` if no weekday is selected.
pub fn generate_occurrences(pattern: &Pattern) -> Result<Vec<Occurrence>> {
    if pattern.date_end < pattern.date_start {
        return Err(ValidationReason::InvertedDateRange {
            start: pattern.date_start,
            end: pattern.date_end,
        }
        .into());
    }
    if pattern.weekdays.is_empty() {
        return Err(ValidationReason::EmptyWeekdaySet.into());
    }

    let time = pattern.time_range();
    let occurrences: Vec<Occurrence> = pattern
        .date_start
        .iter_days()
        .take_while(|date| *date <= pattern.date_end)
        .filter(|date| pattern.weekdays.contains(date.weekday()))
        .map(|date| Occurrence::new(&pattern.room_id, &pattern.class_id, date, time))
        .collect();

    debug!(
        room = %pattern.room_id,
        class = %pattern.class_id,
        from = %pattern.date_start,
        to = %pattern.date_end,
        weekdays = %pattern.weekdays,
        count = occurrences.len(),
        "generated occurrences"
    );

    Ok(occurrences)
}
