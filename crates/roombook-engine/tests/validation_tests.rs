//! Tests for slot-grid and operating-hours validation.

use roombook_engine::validation::{validate_pattern, validate_time_range};
use roombook_engine::{Pattern, ScheduleError, SchedulingRules, TimeOfDay, TimeRange, ValidationReason};

fn t(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

fn range(start: &str, end: &str) -> TimeRange {
    TimeRange::new(t(start), t(end))
}

fn reason(result: Result<(), ScheduleError>) -> ValidationReason {
    match result {
        Err(ScheduleError::Validation(reason)) => reason,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn default_rules_open_seven_to_ten_on_a_quarter_hour_grid() {
    let rules = SchedulingRules::default();
    assert_eq!(rules.opening.to_string(), "07:00");
    assert_eq!(rules.closing.to_string(), "22:00");
    assert_eq!(rules.slot_minutes, 15);
    assert_eq!(rules.min_duration_minutes, 15);
    assert!(rules.validate().is_ok());
}

#[test]
fn aligned_interval_inside_hours_passes() {
    let rules = SchedulingRules::default();
    assert!(validate_time_range(&range("09:00", "10:00"), &rules).is_ok());
    assert!(validate_time_range(&range("07:00", "07:15"), &rules).is_ok());
    assert!(validate_time_range(&range("21:00", "22:00"), &rules).is_ok());
}

#[test]
fn misaligned_start_is_rejected() {
    let rules = SchedulingRules::default();
    let reason = reason(validate_time_range(&range("08:05", "09:05"), &rules));
    assert_eq!(
        reason,
        ValidationReason::MisalignedStart {
            start: t("08:05"),
            slot: 15
        }
    );
}

#[test]
fn outside_operating_hours_is_rejected() {
    let rules = SchedulingRules::default();
    assert!(matches!(
        reason(validate_time_range(&range("06:45", "08:00"), &rules)),
        ValidationReason::OutOfHours { .. }
    ));
    assert!(matches!(
        reason(validate_time_range(&range("21:30", "22:15"), &rules)),
        ValidationReason::OutOfHours { .. }
    ));
}

#[test]
fn duration_off_the_grid_is_rejected() {
    let rules = SchedulingRules::default();
    assert_eq!(
        reason(validate_time_range(&range("09:00", "09:50"), &rules)),
        ValidationReason::BadDuration {
            minutes: 50,
            minimum: 15,
            slot: 15
        }
    );
}

#[test]
fn too_short_or_inverted_interval_is_bad_duration() {
    let rules = SchedulingRules {
        min_duration_minutes: 30,
        ..SchedulingRules::default()
    };
    assert!(matches!(
        reason(validate_time_range(&range("09:00", "09:15"), &rules)),
        ValidationReason::BadDuration { minutes: 15, .. }
    ));
    assert!(matches!(
        reason(validate_time_range(&range("10:00", "09:00"), &rules)),
        ValidationReason::BadDuration { minutes: -60, .. }
    ));
    assert!(matches!(
        reason(validate_time_range(&range("09:00", "09:00"), &rules)),
        ValidationReason::BadDuration { minutes: 0, .. }
    ));
}

#[test]
fn custom_slot_size() {
    let rules = SchedulingRules {
        slot_minutes: 30,
        min_duration_minutes: 60,
        ..SchedulingRules::default()
    };
    assert!(validate_time_range(&range("09:30", "11:00"), &rules).is_ok());
    assert!(matches!(
        reason(validate_time_range(&range("09:15", "10:15"), &rules)),
        ValidationReason::MisalignedStart { slot: 30, .. }
    ));
}

#[test]
fn incoherent_rules_are_rejected() {
    let zero_slot = SchedulingRules {
        slot_minutes: 0,
        ..SchedulingRules::default()
    };
    assert!(matches!(
        zero_slot.validate(),
        Err(ScheduleError::Validation(ValidationReason::InvalidRules(_)))
    ));

    let inverted = SchedulingRules {
        opening: t("18:00"),
        closing: t("08:00"),
        ..SchedulingRules::default()
    };
    assert!(inverted.validate().is_err());

    let off_grid_minimum = SchedulingRules {
        min_duration_minutes: 20,
        ..SchedulingRules::default()
    };
    assert!(off_grid_minimum.validate().is_err());
}

#[test]
fn pattern_checks_weekdays_and_range() {
    let rules = SchedulingRules::default();
    let mut pattern = Pattern {
        room_id: "R1".to_string(),
        class_id: "C1".to_string(),
        date_start: "2024-03-04".parse().unwrap(),
        date_end: "2024-03-15".parse().unwrap(),
        weekdays: "mon".parse().unwrap(),
        start: t("09:00"),
        end: t("10:00"),
    };
    assert!(validate_pattern(&pattern, &rules).is_ok());

    pattern.weekdays = "".parse().unwrap();
    assert_eq!(
        reason(validate_pattern(&pattern, &rules)),
        ValidationReason::EmptyWeekdaySet
    );

    pattern.weekdays = "mon".parse().unwrap();
    std::mem::swap(&mut pattern.date_start, &mut pattern.date_end);
    assert!(matches!(
        reason(validate_pattern(&pattern, &rules)),
        ValidationReason::InvertedDateRange { .. }
    ));
}

#[test]
fn rules_deserialize_with_partial_overrides() {
    let rules: SchedulingRules = serde_json::from_str(r#"{"slot_minutes":30,"min_duration_minutes":30}"#).unwrap();
    assert_eq!(rules.slot_minutes, 30);
    assert_eq!(rules.opening, SchedulingRules::default().opening);
    assert_eq!(rules.closing.to_string(), "22:00");
}
