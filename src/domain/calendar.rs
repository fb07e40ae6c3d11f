/// Calendar day value type
///
/// All date handling in the engine goes through `CalendarDay`: a date with no
/// time component. Timestamps are reduced to their local date exactly once, at
/// the boundary, so comparisons never depend on hours or timezones.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::DomainError;

const ISO_FORMAT: &str = "%Y-%m-%d";
const LOCALE_FORMAT: &str = "%d.%m.%Y";

/// A single calendar date (local-midnight semantics)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    /// Build a day from year/month/day parts
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DomainError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| DomainError::InvalidDate(format!("{:04}-{:02}-{:02} is not a valid date", year, month, day)))
    }

    /// Parse either `yyyy-mm-dd` or `dd.mm.yyyy`
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();

        NaiveDate::parse_from_str(trimmed, ISO_FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(trimmed, LOCALE_FORMAT))
            .map(Self)
            .map_err(|_| DomainError::InvalidDate(format!(
                "'{}' is not a date (expected yyyy-mm-dd or dd.mm.yyyy)", input
            )))
    }

    /// The underlying chrono date
    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day_of_month(&self) -> u32 {
        self.0.day()
    }

    /// Weekday index with Monday=0 .. Sunday=6
    pub fn canonical_weekday(&self) -> u8 {
        self.0.weekday().num_days_from_monday() as u8
    }

    /// Number of days in this day's month (28..=31)
    pub fn days_in_month(&self) -> u32 {
        let (next_year, next_month) = if self.month() == 12 {
            (self.year() + 1, 1)
        } else {
            (self.year(), self.month() + 1)
        };

        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|first_of_next| first_of_next.pred_opt())
            .map(|last| last.day())
            .unwrap_or(28)
    }

    /// Whole days from `earlier` to `self` (negative if `earlier` is later)
    pub fn days_since(&self, earlier: CalendarDay) -> i64 {
        (self.0 - earlier.0).num_days()
    }

    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// The day before this one
    pub fn pred(&self) -> Self {
        self.add_days(-1)
    }

    /// The day after this one
    pub fn succ(&self) -> Self {
        self.add_days(1)
    }

    /// Locale rendering (`dd.mm.yyyy`)
    pub fn to_locale_string(&self) -> String {
        self.0.format(LOCALE_FORMAT).to_string()
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(ISO_FORMAT))
    }
}

impl FromStr for CalendarDay {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<NaiveDateTime> for CalendarDay {
    fn from(datetime: NaiveDateTime) -> Self {
        Self(datetime.date())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for CalendarDay {
    /// Uses the date in the timestamp's own offset, i.e. its local midnight
    fn from(datetime: DateTime<Tz>) -> Self {
        Self(datetime.date_naive())
    }
}

impl Serialize for CalendarDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CalendarDay::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Anything that can be reduced to a calendar day
///
/// Returns `None` when the input cannot be understood as a date; callers such
/// as the recurrence evaluator treat that as "not due" rather than failing.
pub trait DateInput {
    fn to_calendar_day(&self) -> Option<CalendarDay>;
}

impl DateInput for CalendarDay {
    fn to_calendar_day(&self) -> Option<CalendarDay> {
        Some(*self)
    }
}

impl DateInput for NaiveDate {
    fn to_calendar_day(&self) -> Option<CalendarDay> {
        Some(CalendarDay(*self))
    }
}

impl DateInput for NaiveDateTime {
    fn to_calendar_day(&self) -> Option<CalendarDay> {
        Some(CalendarDay(self.date()))
    }
}

impl<Tz: TimeZone> DateInput for DateTime<Tz> {
    fn to_calendar_day(&self) -> Option<CalendarDay> {
        Some(CalendarDay(self.date_naive()))
    }
}

impl DateInput for str {
    fn to_calendar_day(&self) -> Option<CalendarDay> {
        CalendarDay::parse(self).ok()
    }
}

impl DateInput for String {
    fn to_calendar_day(&self) -> Option<CalendarDay> {
        CalendarDay::parse(self).ok()
    }
}

impl<T: DateInput + ?Sized> DateInput for &T {
    fn to_calendar_day(&self) -> Option<CalendarDay> {
        (**self).to_calendar_day()
    }
}
