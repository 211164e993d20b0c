//! Date window manager: anchor date plus past/future extents in months.

#![allow(missing_docs)]

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::config::WindowConfig;
use crate::core::dates::{
    date_key, each_day, end_of_month, inclusive_days, shift_months, start_of_month,
};
use crate::core::errors::{Result, TimelaneError};
use crate::layout::overlap::DateRange;

/// Which side of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Past,
    Future,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Past => "past",
            Self::Future => "future",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an extension request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendOutcome {
    /// The extent grew from `from` to `to` months.
    Extended { from: u32, to: u32 },
    /// The extent was already at its maximum.
    AtBound,
    /// Zero months requested.
    Unchanged,
}

impl ExtendOutcome {
    #[must_use]
    pub const fn extended(self) -> bool {
        matches!(self, Self::Extended { .. })
    }
}

/// Ordered span of days the window currently covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializedWindow {
    pub range: DateRange,
    /// End date before the safety cap was applied.
    pub requested_end: NaiveDate,
    /// `true` when the span exceeded the safety cap and `range.end()` was pulled in.
    pub clamped: bool,
}

impl MaterializedWindow {
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.range.start()
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.range.end()
    }

    #[must_use]
    pub fn day_count(&self) -> u32 {
        self.range.duration_days()
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        each_day(self.range.start(), self.range.end())
    }
}

/// Owns the window state. Single writer.
#[derive(Debug, Clone)]
pub struct DateWindowManager {
    anchor: NaiveDate,
    past_months: u32,
    future_months: u32,
    config: WindowConfig,
    generation: u64,
}

impl DateWindowManager {
    /// New window around `anchor` using the configured default extents.
    #[must_use]
    pub fn new(anchor: NaiveDate, config: WindowConfig) -> Self {
        let max = config.max_months;
        Self {
            anchor,
            past_months: config.default_past_months.min(max),
            future_months: config.default_future_months.min(max),
            config,
            generation: 0,
        }
    }

    #[must_use]
    pub const fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    #[must_use]
    pub const fn past_months(&self) -> u32 {
        self.past_months
    }

    #[must_use]
    pub const fn future_months(&self) -> u32 {
        self.future_months
    }

    #[must_use]
    pub const fn extent(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Past => self.past_months,
            Direction::Future => self.future_months,
        }
    }

    #[must_use]
    pub const fn max_months(&self) -> u32 {
        self.config.max_months
    }

    /// Counter bumped by every state change.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Replace anchor and extents; extents are clamped to `[0, max_months]`.
    pub fn set_window(&mut self, anchor: NaiveDate, past_months: u32, future_months: u32) {
        let max = self.config.max_months;
        self.anchor = anchor;
        self.past_months = past_months.min(max);
        self.future_months = future_months.min(max);
        self.generation += 1;
    }

    /// Reset extents to the configured defaults around a new anchor.
    pub fn recenter(&mut self, anchor: NaiveDate) {
        self.set_window(
            anchor,
            self.config.default_past_months,
            self.config.default_future_months,
        );
    }

    /// Grow one extent; `false` when nothing changed.
    pub fn extend(&mut self, direction: Direction, delta_months: u32) -> bool {
        self.extend_outcome(direction, delta_months).extended()
    }

    pub fn extend_outcome(&mut self, direction: Direction, delta_months: u32) -> ExtendOutcome {
        if delta_months == 0 {
            return ExtendOutcome::Unchanged;
        }
        let max = self.config.max_months;
        let slot = match direction {
            Direction::Past => &mut self.past_months,
            Direction::Future => &mut self.future_months,
        };
        let from = *slot;
        if from >= max {
            return ExtendOutcome::AtBound;
        }
        let to = from.saturating_add(delta_months).min(max);
        *slot = to;
        self.generation += 1;
        ExtendOutcome::Extended { from, to }
    }

    /// Resolve the window into concrete dates, applying the safety cap.
    pub fn materialize(&self) -> Result<MaterializedWindow> {
        let start = start_of_month(shift_months(self.anchor, -i64::from(self.past_months))?);
        let requested_end = end_of_month(shift_months(self.anchor, i64::from(self.future_months))?);

        if inclusive_days(start, requested_end) <= self.config.max_span_days {
            return Ok(MaterializedWindow {
                range: DateRange::new(start, Some(requested_end)),
                requested_end,
                clamped: false,
            });
        }

        let keep = i64::from(self.config.safety_cap_months.max(1)) - 1;
        let capped_end = end_of_month(shift_months(start, keep)?).min(requested_end);
        let capped_days = inclusive_days(start, capped_end);
        if capped_days > self.config.max_span_days {
            return Err(TimelaneError::Materialize {
                details: format!(
                    "{} months from {} span {capped_days} days, over the {} day limit",
                    keep + 1,
                    date_key(start),
                    self.config.max_span_days
                ),
            });
        }
        Ok(MaterializedWindow {
            range: DateRange::new(start, Some(capped_end)),
            requested_end,
            clamped: true,
        })
    }

    /// First day of every month in the materialized window.
    pub fn months(&self) -> Result<Vec<NaiveDate>> {
        let window = self.materialize()?;
        Ok(month_starts(&window.range))
    }
}

/// First day of every month intersecting `range`, in order.
#[must_use]
pub fn month_starts(range: &DateRange) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut month = start_of_month(range.start());
    while month <= range.end() {
        out.push(month);
        match shift_months(month, 1) {
            Ok(next) => month = next,
            Err(_) => break,
        }
    }
    out
}
