//! Inclusive calendar-date ranges and the interval overlap predicate.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::dates::inclusive_days;

/// Inclusive `[start, end]` range of calendar days. `end >= start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

/// Wire shape; normalized through [`DateRange::new`].
#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl From<RawDateRange> for DateRange {
    fn from(raw: RawDateRange) -> Self {
        Self::new(raw.start, Some(raw.end))
    }
}

impl DateRange {
    /// Build a range; a missing `end` means a single-day range. An `end`
    /// before `start` is also collapsed to a single day.
    #[must_use]
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        let end = end.filter(|e| *e >= start).unwrap_or(start);
        Self { start, end }
    }

    #[must_use]
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive day count (a single-day range lasts 1 day).
    #[must_use]
    pub fn duration_days(&self) -> u32 {
        inclusive_days(self.start, self.end)
    }

    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Overlapping part of two ranges, if any.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Self { start, end })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// `true` iff the two inclusive ranges share at least one day.
#[inline]
#[must_use]
pub fn overlaps(a: &DateRange, b: &DateRange) -> bool {
    a.start <= b.end && a.end >= b.start
}
