//! Tests for occurrence generation.

use chrono::{Datelike, NaiveDate, Weekday};
use roombook_engine::{generate_occurrences, Pattern, WeekdaySet};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn pattern(from: NaiveDate, to: NaiveDate, days: &str) -> Pattern {
    Pattern {
        room_id: "R1".to_string(),
        class_id: "C1".to_string(),
        date_start: from,
        date_end: to,
        weekdays: days.parse().unwrap(),
        start: "09:00".parse().unwrap(),
        end: "10:00".parse().unwrap(),
    }
}

#[test]
fn mondays_and_wednesdays_over_two_weeks() {
    let p = pattern(date(2024, 3, 4), date(2024, 3, 15), "mon,wed");

    let occurrences = generate_occurrences(&p).unwrap();

    let dates: Vec<NaiveDate> = occurrences.iter().map(|o| o.date).collect();
    assert_eq!(
        dates,
        vec![
            date(2024, 3, 4),
            date(2024, 3, 6),
            date(2024, 3, 11),
            date(2024, 3, 13)
        ]
    );
    for o in &occurrences {
        assert_eq!(o.room_id, "R1");
        assert_eq!(o.class_id, "C1");
        assert_eq!(o.start.to_string(), "09:00");
        assert_eq!(o.end.to_string(), "10:00");
    }
}

#[test]
fn range_bounds_are_inclusive() {
    // 2024-03-04 is a Monday, 2024-03-08 a Friday.
    let p = pattern(date(2024, 3, 4), date(2024, 3, 8), "mon,fri");
    let occurrences = generate_occurrences(&p).unwrap();
    assert_eq!(occurrences.len(), 2);
    assert_eq!(occurrences[0].date, date(2024, 3, 4));
    assert_eq!(occurrences[1].date, date(2024, 3, 8));
}

#[test]
fn single_day_range() {
    let p = pattern(date(2024, 3, 6), date(2024, 3, 6), "wed");
    assert_eq!(generate_occurrences(&p).unwrap().len(), 1);
}

#[test]
fn no_matching_weekday_yields_empty_list() {
    // Mon..Fri never contains a Sunday.
    let p = pattern(date(2024, 3, 4), date(2024, 3, 8), "sun");
    assert!(generate_occurrences(&p).unwrap().is_empty());
}

#[test]
fn inverted_range_is_rejected() {
    let p = pattern(date(2024, 3, 15), date(2024, 3, 4), "mon");
    let err = generate_occurrences(&p).unwrap_err();
    assert!(err.is_invalid_range(), "got {err:?}");
}

#[test]
fn empty_weekday_set_is_rejected() {
    let mut p = pattern(date(2024, 3, 4), date(2024, 3, 15), "mon");
    p.weekdays = WeekdaySet::EMPTY;
    let err = generate_occurrences(&p).unwrap_err();
    assert!(err.is_invalid_pattern(), "got {err:?}");
}

#[test]
fn every_day_over_a_year_crossing_a_leap_day() {
    let all = "sun,mon,tue,wed,thu,fri,sat";
    let p = pattern(date(2024, 1, 1), date(2024, 12, 31), all);
    let occurrences = generate_occurrences(&p).unwrap();
    assert_eq!(occurrences.len(), 366);
    assert!(occurrences.iter().any(|o| o.date == date(2024, 2, 29)));
}

#[test]
fn generation_is_deterministic() {
    let p = pattern(date(2024, 3, 1), date(2024, 6, 30), "tue,thu");
    let first = generate_occurrences(&p).unwrap();
    let second = generate_occurrences(&p).unwrap();
    assert_eq!(first, second);
    assert!(first
        .iter()
        .all(|o| matches!(o.date.weekday(), Weekday::Tue | Weekday::Thu)));
    assert!(first.windows(2).all(|w| w[0].date < w[1].date));
}
