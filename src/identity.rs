//! Canonical record keys.
//!
//! Daily check-ins are keyed by the local calendar date (`YYYY-MM-DD`) and
//! weekly surveys by the ISO-8601 week (`YYYY-Www`). Both are derived from the
//! clock, never chosen by the user.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, TimeZone, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid week id '{0}', expected YYYY-Www")]
    InvalidWeek(String),
}

// ============================================================================
// Clock
// ============================================================================

/// Source of the current instant, carrying the local UTC offset.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the process's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now();
        now.with_timezone(now.offset())
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

#[cfg(test)]
impl FixedClock {
    /// Parse an RFC 3339 instant, e.g. `2024-06-10T09:30:00+02:00`.
    pub fn at(rfc3339: &str) -> Self {
        Self(DateTime::parse_from_rfc3339(rfc3339).expect("valid RFC 3339 instant"))
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

// ============================================================================
// Calendar date
// ============================================================================

/// Key of a daily check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// The date of `instant` as seen in its own time zone.
    pub fn of<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self(instant.date_naive())
    }

    #[allow(dead_code)]
    pub fn naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CalendarDate {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| KeyError::InvalidDate(s.to_string()))?;
        let parsed = Self(date);
        // chrono accepts unpadded fields; keys must be canonical
        if parsed.to_string() != s {
            return Err(KeyError::InvalidDate(s.to_string()));
        }
        Ok(parsed)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// ISO week
// ============================================================================

/// Key of a weekly survey: ISO week-numbering year plus week number.
///
/// Stored as the Monday that opens the week, so ordering is chronological and
/// every value names a week that exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekId(NaiveDate);

impl WeekId {
    /// The ISO week containing `instant`, evaluated in its own time zone.
    pub fn of<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self::from_date(instant.date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        let offset = date.weekday().num_days_from_monday() as i64;
        Self(date - chrono::Duration::days(offset))
    }

    /// Fails when `week` does not exist in ISO year `year` (e.g. 2021-W53).
    pub fn new(year: i32, week: u32) -> Result<Self, KeyError> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(Self)
            .ok_or_else(|| KeyError::InvalidWeek(format!("{}-W{:02}", year, week)))
    }

    /// ISO week-numbering year, which differs from the calendar year around
    /// New Year.
    pub fn year(&self) -> i32 {
        self.0.iso_week().year()
    }

    pub fn week(&self) -> u32 {
        self.0.iso_week().week()
    }

    /// Monday of the week.
    #[allow(dead_code)]
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// Sunday of the week.
    #[allow(dead_code)]
    pub fn last_day(&self) -> NaiveDate {
        self.0 + chrono::Duration::days(6)
    }

    #[allow(dead_code)]
    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::from_date(date) == *self
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year(), self.week())
    }
}

impl FromStr for WeekId {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || KeyError::InvalidWeek(s.to_string());
        let (year, week) = s.split_once("-W").ok_or_else(invalid)?;
        if year.len() != 4 || week.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let week: u32 = week.parse().map_err(|_| invalid())?;
        let parsed = Self::new(year, week).map_err(|_| invalid())?;
        // integer parsing accepts a sign; keys must be canonical
        if parsed.to_string() != s {
            return Err(invalid());
        }
        Ok(parsed)
    }
}

impl Serialize for WeekId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Today's date in the process's local time zone.
pub fn today() -> CalendarDate {
    CalendarDate::of(&SystemClock.now())
}

/// The ISO week of the current instant in the process's local time zone.
pub fn current_week_id() -> WeekId {
    WeekId::of(&SystemClock.now())
}

/// True iff both instants fall in the same ISO week-numbering year and week.
pub fn same_iso_week<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    WeekId::of(a) == WeekId::of(b)
}
