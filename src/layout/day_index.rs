//! Per-day index of which entries to draw on which date.
//!
//! The index is rebuilt from scratch whenever the lane assignment or the
//! materialized window changes; cells are never patched in place.

#![allow(missing_docs)]

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::core::config::LayoutConfig;
use crate::core::dates::{each_day, end_of_month, inclusive_days};
use crate::layout::entry::TimeRangedEntry;
use crate::layout::lanes::LaneAssignment;
use crate::layout::overlap::DateRange;

/// Where on its span an item sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// The entry's real start date.
    Start,
    /// Any later day of a short-span entry, including the first visible day
    /// when the real start lies before the window.
    Span,
    /// First day of a month for a long-span entry.
    Continuation,
}

/// How entries are spread over the days they cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexPolicy {
    /// Entries lasting more days than this are long spans.
    pub long_span_threshold_days: u32,
}

impl Default for IndexPolicy {
    fn default() -> Self {
        Self::from(&LayoutConfig::default())
    }
}

impl From<&LayoutConfig> for IndexPolicy {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            long_span_threshold_days: config.long_span_threshold_days,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayItem {
    pub entry: Arc<TimeRangedEntry>,
    pub lane: usize,
    /// Days the card drawn here should cover, inclusive of this date.
    pub display_length: u32,
    pub placement: Placement,
}

impl DayItem {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.entry.id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    /// Ordered by lane, then by assignment order.
    pub items: Vec<DayItem>,
}

/// One cell per materialized day, in date order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DayIndex {
    days: Vec<DayCell>,
}

impl DayIndex {
    #[must_use]
    pub fn days(&self) -> &[DayCell] {
        &self.days
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.first().map(|c| c.date)
    }

    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|c| c.date)
    }

    /// Row position of `date`, if it is inside the index.
    #[must_use]
    pub fn position_of(&self, date: NaiveDate) -> Option<usize> {
        let first = self.first_date()?;
        let offset = usize::try_from((date - first).num_days()).ok()?;
        (offset < self.days.len()).then_some(offset)
    }

    #[must_use]
    pub fn cell(&self, date: NaiveDate) -> Option<&DayCell> {
        self.position_of(date).map(|idx| &self.days[idx])
    }

    /// Total number of `(entry, date)` items across all cells.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.days.iter().map(|c| c.items.len()).sum()
    }
}

/// Build the day index for `window` from a lane assignment.
#[must_use]
pub fn build_day_index(
    assignment: &LaneAssignment,
    window: &DateRange,
    policy: &IndexPolicy,
) -> DayIndex {
    let mut days: Vec<DayCell> = each_day(window.start(), window.end())
        .map(|date| DayCell {
            date,
            items: Vec::new(),
        })
        .collect();

    for laned in assignment.entries() {
        let range = laned.parsed.range;
        let Some(visible) = range.intersect(window) else {
            continue;
        };
        let long_span = range.duration_days() > policy.long_span_threshold_days;

        for date in each_day(visible.start(), visible.end()) {
            let slot = if long_span {
                long_span_slot(&range, date)
            } else {
                Some(short_span_slot(&range, date, policy))
            };
            let Some((display_length, placement)) = slot else {
                continue;
            };
            let Ok(row) = usize::try_from((date - window.start()).num_days()) else {
                continue;
            };
            if let Some(cell) = days.get_mut(row) {
                cell.items.push(DayItem {
                    entry: Arc::clone(&laned.parsed.entry),
                    lane: laned.lane,
                    display_length,
                    placement,
                });
            }
        }
    }

    // Items were pushed in assignment order; a stable sort keeps it within a lane.
    for cell in &mut days {
        cell.items.sort_by_key(|item| item.lane);
    }

    DayIndex { days }
}

fn short_span_slot(range: &DateRange, date: NaiveDate, policy: &IndexPolicy) -> (u32, Placement) {
    let remaining = inclusive_days(date, range.end()).min(policy.long_span_threshold_days);
    let placement = if date == range.start() {
        Placement::Start
    } else {
        Placement::Span
    };
    (remaining, placement)
}

fn long_span_slot(range: &DateRange, date: NaiveDate) -> Option<(u32, Placement)> {
    let placement = if date == range.start() {
        Placement::Start
    } else if date.day() == 1 {
        Placement::Continuation
    } else {
        return None;
    };
    let segment_end = end_of_month(date).min(range.end());
    Some((inclusive_days(date, segment_end), placement))
}
