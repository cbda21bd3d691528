//! Business-rule checks run once per request, before any occurrence is generated.
//!
//! All occurrences of a pattern share one interval, so the interval is checked
//! once rather than per occurrence.

use crate::config::SchedulingRules;
use crate::error::{Result, ValidationReason};
use crate::model::{Pattern, TimeRange};

/// Check an interval against operating hours and the slot grid.
///
/// Checks run in a fixed order and the first failure wins: out-of-hours,
/// misaligned start, then bad duration. An interval whose end does not follow
/// its start is reported as a bad duration.
pub fn validate_time_range(range: &TimeRange, rules: &SchedulingRules) -> Result<()> {
    rules.validate()?;

    if range.start < rules.opening || range.end > rules.closing || range.start >= rules.closing {
        return Err(ValidationReason::OutOfHours {
            start: range.start,
            end: range.end,
            opening: rules.opening,
            closing: rules.closing,
        }
        .into());
    }

    let slot = rules.slot_minutes;
    if range.start.minutes() % slot != 0 {
        return Err(ValidationReason::MisalignedStart {
            start: range.start,
            slot,
        }
        .into());
    }

    let minutes = range.duration_minutes();
    if minutes < i64::from(rules.min_duration_minutes) || minutes % i64::from(slot) != 0 {
        return Err(ValidationReason::BadDuration {
            minutes,
            minimum: rules.min_duration_minutes,
            slot,
        }
        .into());
    }

    Ok(())
}

/// Check a whole pattern: its interval, its weekday set, and its date range.
pub fn validate_pattern(pattern: &Pattern, rules: &SchedulingRules) -> Result<()> {
    validate_time_range(&pattern.time_range(), rules)?;

    if pattern.weekdays.is_empty() {
        return Err(ValidationReason::EmptyWeekdaySet.into());
    }
    if pattern.date_end < pattern.date_start {
        return Err(ValidationReason::InvertedDateRange {
            start: pattern.date_start,
            end: pattern.date_end,
        }
        .into());
    }
    Ok(())
}
