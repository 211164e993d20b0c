//! Calendar helpers: entry date parsing and month arithmetic.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime};

use crate::core::errors::{Result, TimelaneError};

/// Date key format used by day cells (`2024-03-15`).
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Month label format used by the header (`March 2024`).
pub const MONTH_LABEL_FORMAT: &str = "%B %Y";

/// Parse a raw entry date.
///
/// Accepts a bare `YYYY-MM-DD`, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` timestamp,
/// or an RFC 3339 timestamp. Only the calendar date is kept. Returns `None`
/// for empty or unparseable input.
pub fn parse_entry_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_KEY_FORMAT) {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(stamp.date_naive());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Some(stamp.date());
        }
    }
    None
}

/// First day of the month containing `date`.
#[must_use]
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`.
#[must_use]
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    start_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Shift `date` by a signed number of calendar months, clamping the day of
/// month to the target month's length.
pub fn shift_months(date: NaiveDate, months: i64) -> Result<NaiveDate> {
    let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| {
        TimelaneError::DateOutOfRange {
            details: format!("month shift {months} is too large"),
        }
    })?;
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(magnitude))
    } else {
        date.checked_sub_months(Months::new(magnitude))
    };
    shifted.ok_or_else(|| TimelaneError::DateOutOfRange {
        details: format!("{date} shifted by {months} months"),
    })
}

/// Inclusive number of days in `[start, end]`. Zero when `end < start`.
#[must_use]
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let span = (end - start).num_days() + 1;
    u32::try_from(span.max(0)).unwrap_or(u32::MAX)
}

/// Day-cell key for a date.
#[must_use]
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Header label for the month containing `date`.
#[must_use]
pub fn month_label(date: NaiveDate) -> String {
    date.format(MONTH_LABEL_FORMAT).to_string()
}

/// Every day in `[start, end]`, in order.
pub fn each_day(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}
