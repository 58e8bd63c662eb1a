//! Scheduling value objects: calendar dates and one-hour laundry slots.

use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use renthub_core::ValueObject;

use crate::error::{NegotiationError, NegotiationResult};

/// One of the 24 canonical one-hour windows a laundry day is sliced into.
///
/// The wire form is `"HH:00-HH+1:00"` (`"00:00-01:00"` through
/// `"23:00-24:00"`); internally only the start hour is stored. Partial or
/// overlapping windows are unrepresentable.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot(u8);

impl TimeSlot {
    /// Number of slots in a day.
    pub const COUNT: u8 = 24;

    pub fn from_start_hour(hour: u8) -> NegotiationResult<Self> {
        if hour < Self::COUNT {
            Ok(Self(hour))
        } else {
            Err(NegotiationError::invalid_slot(format!(
                "start hour {hour} is out of range (0-23)"
            )))
        }
    }

    /// Parse the canonical `"HH:00-HH+1:00"` form.
    pub fn parse(s: &str) -> NegotiationResult<Self> {
        let invalid = || NegotiationError::invalid_slot(format!("'{s}' is not a valid time slot"));

        let (start, end) = s.split_once('-').ok_or_else(invalid)?;
        let start = parse_hour_mark(start).ok_or_else(invalid)?;
        let end = parse_hour_mark(end).ok_or_else(invalid)?;

        if start >= Self::COUNT || end != start + 1 {
            return Err(invalid());
        }
        Ok(Self(start))
    }

    pub fn start_hour(&self) -> u8 {
        self.0
    }

    /// All 24 slots in day order.
    pub fn all() -> impl Iterator<Item = TimeSlot> {
        (0..Self::COUNT).map(TimeSlot)
    }
}

/// `"HH:00"` with two-digit hours; the end bound of the last slot is `"24:00"`.
fn parse_hour_mark(part: &str) -> Option<u8> {
    let (hh, mm) = part.split_once(':')?;
    if hh.len() != 2 || mm != "00" {
        return None;
    }
    let hour: u8 = hh.parse().ok()?;
    (hour <= 24).then_some(hour)
}

impl core::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.0, self.0 + 1)
    }
}

impl FromStr for TimeSlot {
    type Err = NegotiationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = NegotiationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeSlot> for String {
    fn from(value: TimeSlot) -> Self {
        value.to_string()
    }
}

impl ValueObject for TimeSlot {}

/// A civil calendar date (`YYYY-MM-DD`), compared against an injected
/// "today", never against a system clock, so the engine stays deterministic.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse an ISO `YYYY-MM-DD` date.
    pub fn parse(s: &str) -> NegotiationResult<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|e| NegotiationError::invalid_date(format!("'{s}': {e}")))
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    pub fn is_on_or_after(&self, other: CalendarDate) -> bool {
        self.0 >= other.0
    }
}

impl core::fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CalendarDate {
    type Err = NegotiationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl ValueObject for CalendarDate {}

/// A concrete date + slot pair: the unit the two parties negotiate over.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Terms {
    pub date: CalendarDate,
    pub slot: TimeSlot,
}

impl Terms {
    pub fn new(date: CalendarDate, slot: TimeSlot) -> Self {
        Self { date, slot }
    }
}

impl core::fmt::Display for Terms {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.date, self.slot)
    }
}

impl ValueObject for Terms {}
