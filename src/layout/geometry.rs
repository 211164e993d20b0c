//! Pixel geometry of the lane grid.
//!
//! Positions are in unscaled content pixels except where a method says it
//! is scaled; the host applies the zoom factor as a uniform transform, so
//! only the quantities the host reads back after transforming (row offsets,
//! content height, column width) are multiplied by it here.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::config::LayoutConfig;

/// Geometry for one zoom factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutGeometry {
    pub row_height: f64,
    pub column_width: f64,
    pub lane_inset: f64,
    pub card_width: f64,
    pub card_gap: f64,
    pub min_content_width: f64,
    pub content_padding: f64,
    pub long_span_threshold_days: u32,
    pub zoom: f64,
}

impl LayoutGeometry {
    #[must_use]
    pub fn new(config: &LayoutConfig, zoom: f64) -> Self {
        Self {
            row_height: config.row_height_px,
            column_width: config.column_width_px,
            lane_inset: config.lane_inset_px,
            card_width: config.card_width_px,
            card_gap: config.card_gap_px,
            min_content_width: config.min_content_width_px,
            content_padding: config.content_padding_px,
            long_span_threshold_days: config.long_span_threshold_days,
            zoom,
        }
    }

    /// Column width after zoom.
    #[must_use]
    pub fn scaled_column_width(&self) -> f64 {
        self.column_width * self.zoom
    }

    /// Left edge of a lane's card.
    #[must_use]
    pub fn lane_left(&self, lane: usize) -> f64 {
        as_f64(lane) * self.column_width + self.lane_inset
    }

    /// Card height for a display length, never taller than one threshold
    /// period of rows.
    #[must_use]
    pub fn card_height(&self, display_length: u32) -> f64 {
        let rows = display_length.min(self.long_span_threshold_days);
        (f64::from(rows) * self.row_height - self.card_gap).max(0.0)
    }

    /// Minimum content width for `lane_count` lanes.
    #[must_use]
    pub fn content_width(&self, lane_count: usize) -> f64 {
        let lanes = as_f64(lane_count.max(1));
        self.min_content_width
            .max(lanes * self.column_width + self.content_padding)
    }

    /// Top of a day row after zoom.
    #[must_use]
    pub fn row_offset(&self, row: usize) -> f64 {
        as_f64(row) * self.row_height * self.zoom
    }

    /// Full content height after zoom.
    #[must_use]
    pub fn content_height(&self, rows: usize) -> f64 {
        self.row_offset(rows)
    }

    /// Row under a scaled content offset.
    #[must_use]
    pub fn row_at(&self, offset: f64) -> usize {
        let row_px = self.row_height * self.zoom;
        if !(offset.is_finite() && row_px > 0.0) || offset <= 0.0 {
            return 0;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let row = (offset / row_px).floor() as usize;
        row
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(n: usize) -> f64 {
    n as f64
}
