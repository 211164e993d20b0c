//! Zoom factor with center-preserving scroll correction.

#![allow(missing_docs)]

use crate::core::config::ZoomConfig;
use crate::core::errors::{Result, TimelaneError};

/// Pinch distances shorter than this cannot anchor a ratio.
const MIN_PINCH_DISTANCE: f64 = 1e-6;

/// Stepped factors are snapped to this resolution to avoid float drift.
const STEP_RESOLUTION: f64 = 1_000.0;

/// A touch point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Current scroll position and visible height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub offset: f64,
    pub height: f64,
}

/// Result of a zoom operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomChange {
    pub old_factor: f64,
    pub new_factor: f64,
    /// Offset that keeps the content under the viewport center in place.
    pub new_offset: f64,
}

impl ZoomChange {
    #[must_use]
    pub fn changed(&self) -> bool {
        (self.new_factor - self.old_factor).abs() > f64::EPSILON
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pinch {
    initial_distance: f64,
    initial_factor: f64,
}

/// Scroll offset after a zoom from `old` to `new` that keeps the content at
/// the viewport center fixed. Floored at zero.
#[must_use]
pub fn center_preserving_offset(viewport: Viewport, old: f64, new: f64) -> f64 {
    if !(old.is_finite() && new.is_finite()) || old <= 0.0 {
        return viewport.offset.max(0.0);
    }
    let half = viewport.height / 2.0;
    let center = viewport.offset + half;
    (center * (new / old) - half).max(0.0)
}

/// Owns the zoom factor. Single writer.
#[derive(Debug, Clone)]
pub struct ZoomController {
    factor: f64,
    config: ZoomConfig,
    pinch: Option<Pinch>,
}

impl ZoomController {
    /// Start at `initial`, or the configured default when `initial` is not a
    /// usable factor.
    #[must_use]
    pub fn new(config: ZoomConfig, initial: f64) -> Self {
        let factor = if initial.is_finite() {
            initial.clamp(config.min_factor, config.max_factor)
        } else {
            config.default_factor
        };
        Self {
            factor,
            config,
            pinch: None,
        }
    }

    #[must_use]
    pub const fn factor(&self) -> f64 {
        self.factor
    }

    #[must_use]
    pub const fn config(&self) -> &ZoomConfig {
        &self.config
    }

    #[must_use]
    pub const fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// `true` when `value` is a factor this controller would accept as-is.
    #[must_use]
    pub fn in_bounds(&self, value: f64) -> bool {
        value.is_finite() && value >= self.config.min_factor && value <= self.config.max_factor
    }

    /// Set the factor directly, clamped to bounds.
    pub fn set_zoom(&mut self, factor: f64, viewport: Viewport) -> Result<ZoomChange> {
        if !factor.is_finite() {
            return Err(TimelaneError::InvalidZoom {
                value: factor,
                details: "zoom factor must be finite".to_string(),
            });
        }
        Ok(self.apply(factor, viewport))
    }

    /// Step the factor by `delta` (typically `±step`).
    pub fn zoom_by(&mut self, delta: f64, viewport: Viewport) -> Result<ZoomChange> {
        if !delta.is_finite() {
            return Err(TimelaneError::InvalidZoom {
                value: delta,
                details: "zoom step must be finite".to_string(),
            });
        }
        let target = ((self.factor + delta) * STEP_RESOLUTION).round() / STEP_RESOLUTION;
        Ok(self.apply(target, viewport))
    }

    pub fn zoom_in(&mut self, viewport: Viewport) -> ZoomChange {
        let target = ((self.factor + self.config.step) * STEP_RESOLUTION).round() / STEP_RESOLUTION;
        self.apply(target, viewport)
    }

    pub fn zoom_out(&mut self, viewport: Viewport) -> ZoomChange {
        let target = ((self.factor - self.config.step) * STEP_RESOLUTION).round() / STEP_RESOLUTION;
        self.apply(target, viewport)
    }

    /// Back to the configured default factor.
    pub fn reset_zoom(&mut self, viewport: Viewport) -> ZoomChange {
        self.apply(self.config.default_factor, viewport)
    }

    /// Start a pinch gesture. A degenerate initial distance ignores the
    /// gesture and returns `false`.
    pub fn begin_pinch(&mut self, p1: TouchPoint, p2: TouchPoint) -> bool {
        let distance = p1.distance(p2);
        if !distance.is_finite() || distance < MIN_PINCH_DISTANCE {
            self.pinch = None;
            return false;
        }
        self.pinch = Some(Pinch {
            initial_distance: distance,
            initial_factor: self.factor,
        });
        true
    }

    /// Track a pinch move. `None` when no gesture is active or the points
    /// are unusable.
    pub fn update_pinch(
        &mut self,
        p1: TouchPoint,
        p2: TouchPoint,
        viewport: Viewport,
    ) -> Option<ZoomChange> {
        let pinch = self.pinch?;
        let distance = p1.distance(p2);
        if !distance.is_finite() {
            return None;
        }
        let target = pinch.initial_factor * distance / pinch.initial_distance;
        Some(self.apply(target, viewport))
    }

    /// Finish the gesture. Returns whether one was active.
    pub fn end_pinch(&mut self) -> bool {
        self.pinch.take().is_some()
    }

    fn apply(&mut self, target: f64, viewport: Viewport) -> ZoomChange {
        let old_factor = self.factor;
        let new_factor = target.clamp(self.config.min_factor, self.config.max_factor);
        self.factor = new_factor;
        let new_offset = if (new_factor - old_factor).abs() > f64::EPSILON {
            center_preserving_offset(viewport, old_factor, new_factor)
        } else {
            viewport.offset
        };
        ZoomChange {
            old_factor,
            new_factor,
            new_offset,
        }
    }
}
