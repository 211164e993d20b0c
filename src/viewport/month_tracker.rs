//! Which month is under the viewport, and the floating month label.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::core::dates::{month_label, start_of_month};
use crate::layout::geometry::LayoutGeometry;

/// Offset of a month's first day in scaled content pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthMarker {
    pub month: NaiveDate,
    pub offset: f64,
}

/// Visibility flag for the floating month label. Set by any scroll
/// activity, cleared after a quiet period.
#[derive(Debug, Clone)]
pub struct FloatingLabel {
    timeout: Duration,
    last_activity: Option<Instant>,
}

impl FloatingLabel {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_activity: None,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_activity = Some(now);
    }

    #[must_use]
    pub fn visible(&self, now: Instant) -> bool {
        self.last_activity
            .is_some_and(|last| now.saturating_duration_since(last) < self.timeout)
    }

    /// Drop the activity mark once the timeout has passed. Returns `true`
    /// when the label just went hidden.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.last_activity.is_some() && !self.visible(now) {
            self.last_activity = None;
            return true;
        }
        false
    }
}

/// Tracks the month nearest the viewport midpoint.
#[derive(Debug, Clone)]
pub struct MonthTracker {
    markers: Vec<MonthMarker>,
    anchor_month: NaiveDate,
    current: Option<NaiveDate>,
    label: FloatingLabel,
}

impl MonthTracker {
    #[must_use]
    pub fn new(anchor: NaiveDate, label_timeout: Duration) -> Self {
        Self {
            markers: Vec::new(),
            anchor_month: start_of_month(anchor),
            current: None,
            label: FloatingLabel::new(label_timeout),
        }
    }

    #[must_use]
    pub fn markers(&self) -> &[MonthMarker] {
        &self.markers
    }

    pub fn set_anchor(&mut self, anchor: NaiveDate) {
        self.anchor_month = start_of_month(anchor);
    }

    /// Rebuild marker offsets assuming uniform rows from `window_start`.
    pub fn rebuild_uniform(
        &mut self,
        months: &[NaiveDate],
        window_start: NaiveDate,
        geometry: &LayoutGeometry,
    ) {
        self.markers = months
            .iter()
            .filter_map(|&month| {
                let row = usize::try_from((month - window_start).num_days()).ok()?;
                Some(MonthMarker {
                    month,
                    offset: geometry.row_offset(row),
                })
            })
            .collect();
    }

    /// Replace marker offsets with host-measured ones. Non-finite offsets
    /// are dropped.
    pub fn set_measured(&mut self, markers: impl IntoIterator<Item = MonthMarker>) {
        let mut measured: Vec<MonthMarker> = markers
            .into_iter()
            .filter(|m| m.offset.is_finite())
            .map(|m| MonthMarker {
                month: start_of_month(m.month),
                offset: m.offset,
            })
            .collect();
        measured.sort_by_key(|m| m.month);
        measured.dedup_by_key(|m| m.month);
        self.markers = measured;
    }

    #[must_use]
    pub fn marker_offset(&self, month: NaiveDate) -> Option<f64> {
        let month = start_of_month(month);
        self.markers
            .iter()
            .find(|m| m.month == month)
            .map(|m| m.offset)
    }

    /// Month whose marker is closest to the viewport midpoint; the anchor
    /// month when there are no markers.
    #[must_use]
    pub fn month_at(&self, offset: f64, viewport_height: f64) -> NaiveDate {
        let midpoint = offset + viewport_height / 2.0;
        let mut best: Option<(f64, NaiveDate)> = None;
        for marker in &self.markers {
            let distance = (marker.offset - midpoint).abs();
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, marker.month));
            }
        }
        best.map_or(self.anchor_month, |(_, month)| month)
    }

    /// Feed a scroll sample. Returns the new label when the visible month
    /// changed.
    pub fn observe(&mut self, offset: f64, viewport_height: f64, now: Instant) -> Option<String> {
        self.label.touch(now);
        let month = self.month_at(offset, viewport_height);
        if self.current == Some(month) {
            return None;
        }
        self.current = Some(month);
        Some(month_label(month))
    }

    /// Label of the last observed month, or the anchor month.
    #[must_use]
    pub fn current_label(&self) -> String {
        month_label(self.current.unwrap_or(self.anchor_month))
    }

    #[must_use]
    pub fn show_floating_label(&self, now: Instant) -> bool {
        self.label.visible(now)
    }

    pub fn expire_label(&mut self, now: Instant) -> bool {
        self.label.expire(now)
    }
}
