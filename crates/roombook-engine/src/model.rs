//! Booking vocabulary: times of day, weekday sets, occurrences, and the keys
//! that tie occurrences back to the recurring pattern that produced them.
//!
//! Rooms and classes are referenced by id only. Their existence is checked by
//! the caller before a request reaches the engine.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ValidationReason};

/// Number of minutes in a day; also the largest valid [`TimeOfDay`].
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A wall-clock time with minute granularity, stored as minutes since midnight.
///
/// `24:00` is representable so that a booking may end at the close of the day.
/// Serialized as an `"HH:MM"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(MINUTES_PER_DAY);

    /// A fixed time for constants; out-of-range input fails const evaluation.
    pub(crate) const fn hm(hour: u16, minute: u16) -> Self {
        assert!((hour < 24 && minute < 60) || (hour == 24 && minute == 0));
        TimeOfDay(hour * 60 + minute)
    }

    /// Build from minutes since midnight. Returns `None` past `24:00`.
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes <= MINUTES_PER_DAY).then_some(TimeOfDay(minutes))
    }

    /// Build from an hour and a minute. Returns `None` for out-of-range values.
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if minute >= 60 {
            return None;
        }
        hour.checked_mul(60)
            .and_then(|m| m.checked_add(minute))
            .and_then(Self::from_minutes)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::from(ValidationReason::InvalidTime(s.to_string()));

        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(h) || h.len() > 2 || !digits(m) || m.len() != 2 {
            return Err(invalid());
        }

        let hour: u16 = h.parse().map_err(|_| invalid())?;
        let minute: u16 = m.parse().map_err(|_| invalid())?;
        TimeOfDay::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

/// A time interval within one day, treated as half-open: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Length in minutes. Negative when `end` precedes `start`.
    pub fn duration_minutes(&self) -> i64 {
        i64::from(self.end.minutes()) - i64::from(self.start.minutes())
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// A set of weekdays, iterated Sunday first.
///
/// Serialized as a list of weekday names, e.g. `["Mon", "Wed"]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_sunday()
    }

    /// Add a weekday. Returns `false` if it was already present.
    pub fn insert(&mut self, day: Weekday) -> bool {
        let present = self.contains(day);
        self.0 |= Self::bit(day);
        !present
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> {
        let set = *self;
        SUNDAY_FIRST.into_iter().filter(move |day| set.contains(*day))
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|d| d.to_string()).collect();
        f.write_str(&names.join(","))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl From<Vec<Weekday>> for WeekdaySet {
    fn from(days: Vec<Weekday>) -> Self {
        days.into_iter().collect()
    }
}

impl From<WeekdaySet> for Vec<Weekday> {
    fn from(set: WeekdaySet) -> Self {
        set.iter().collect()
    }
}

/// Parses a comma-separated list of weekday names (`"mon,wed"`, `"Monday, Friday"`).
/// Blank input yields the empty set.
impl FromStr for WeekdaySet {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<Weekday>().map_err(|_| {
                    ScheduleError::from(ValidationReason::InvalidWeekday(part.to_string()))
                })
            })
            .collect()
    }
}

/// One concrete booking: one room, one class, one date, one time interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: String,
    pub room_id: String,
    pub class_id: String,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl Occurrence {
    /// Build an occurrence with its deterministic id
    /// (`{room}/{class}/{date}/{start}-{end}`).
    ///
    /// `/` and `\` inside the room or class id are escaped with a backslash,
    /// so two occurrences share an id only if they share every field.
    pub fn new(
        room_id: impl Into<String>,
        class_id: impl Into<String>,
        date: NaiveDate,
        time: TimeRange,
    ) -> Self {
        let room_id = room_id.into();
        let class_id = class_id.into();
        let mut id = String::new();
        push_id_part(&mut id, &room_id);
        id.push('/');
        push_id_part(&mut id, &class_id);
        id.push_str(&format!("/{date}/{time}"));
        Self {
            id,
            room_id,
            class_id,
            date,
            start: time.start,
            end: time.end,
        }
    }

    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            room_id: self.room_id.clone(),
            class_id: self.class_id.clone(),
            start: self.start,
            end: self.end,
        }
    }
}

fn push_id_part(id: &mut String, part: &str) {
    for c in part.chars() {
        if matches!(c, '/' | '\\') {
            id.push('\\');
        }
        id.push(c);
    }
}

/// `(room, class, start, end)`: the identity of a series and the target of a
/// bulk delete.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub room_id: String,
    pub class_id: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl GroupKey {
    pub fn new(
        room_id: impl Into<String>,
        class_id: impl Into<String>,
        time: TimeRange,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            class_id: class_id.into(),
            start: time.start,
            end: time.end,
        }
    }

    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    pub fn matches(&self, occurrence: &Occurrence) -> bool {
        occurrence.room_id == self.room_id
            && occurrence.class_id == self.class_id
            && occurrence.start == self.start
            && occurrence.end == self.end
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "room {} / class {} {}",
            self.room_id,
            self.class_id,
            self.time_range()
        )
    }
}

/// A recurring booking request: every date in `[date_start, date_end]` whose
/// weekday is in `weekdays`, booked for `start..end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub room_id: String,
    pub class_id: String,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub weekdays: WeekdaySet,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl Pattern {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(self.room_id.clone(), self.class_id.clone(), self.time_range())
    }
}
