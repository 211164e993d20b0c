//! Per-edge extension trigger.
//!
//! Each edge of the window runs a small state machine:
//!
//! ```text
//! Idle ──fire──▶ Pending ──grew──▶ Cooldown ──elapsed──▶ Idle
//!                   │
//!                   └──no growth / at bound──▶ Disabled (until reset)
//! ```
//!
//! A scroll sample fires an edge only when the viewport is near that edge,
//! moved far enough toward it since the previous sample, and is not resting
//! on the absolute top or bottom. Only one edge may be pending at a time.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

use crate::core::config::ScrollConfig;
use crate::window::manager::Direction;

/// Lifecycle of one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeState {
    Idle,
    /// An extension fired at `since` and awaits its layout report.
    Pending { since: Instant },
    /// Last extension fired at `since`; no new trigger until the cooldown ends.
    Cooldown { since: Instant },
    /// No further extension this session.
    Disabled,
}

/// Viewport measurements taken from one scroll sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    pub offset: f64,
    pub viewport_height: f64,
    pub content_height: f64,
}

impl ScrollSample {
    #[must_use]
    pub fn distance_to_bottom(&self) -> f64 {
        self.content_height - (self.offset + self.viewport_height)
    }
}

/// Thresholds read from [`ScrollConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeThresholds {
    pub edge_buffer_px: f64,
    pub min_scroll_delta_px: f64,
    pub edge_epsilon_px: f64,
    pub cooldown: Duration,
}

impl From<&ScrollConfig> for EdgeThresholds {
    fn from(config: &ScrollConfig) -> Self {
        Self {
            edge_buffer_px: config.edge_buffer_px,
            min_scroll_delta_px: config.min_scroll_delta_px,
            edge_epsilon_px: config.edge_epsilon_px,
            cooldown: Duration::from_millis(config.cooldown_ms),
        }
    }
}

/// Both edges plus the last observed offset.
#[derive(Debug, Clone)]
pub struct EdgeGuard {
    past: EdgeState,
    future: EdgeState,
    last_offset: Option<f64>,
    thresholds: EdgeThresholds,
}

impl EdgeGuard {
    #[must_use]
    pub const fn new(thresholds: EdgeThresholds) -> Self {
        Self {
            past: EdgeState::Idle,
            future: EdgeState::Idle,
            last_offset: None,
            thresholds,
        }
    }

    #[must_use]
    pub const fn state(&self, direction: Direction) -> EdgeState {
        match direction {
            Direction::Past => self.past,
            Direction::Future => self.future,
        }
    }

    fn slot(&mut self, direction: Direction) -> &mut EdgeState {
        match direction {
            Direction::Past => &mut self.past,
            Direction::Future => &mut self.future,
        }
    }

    /// `true` while either edge awaits its layout report.
    #[must_use]
    pub const fn in_flight(&self) -> bool {
        matches!(self.past, EdgeState::Pending { .. })
            || matches!(self.future, EdgeState::Pending { .. })
    }

    /// Feed one scroll sample. Returns the edge that fired, already moved to
    /// `Pending`.
    pub fn observe(&mut self, metrics: &ScrollSample, now: Instant) -> Option<Direction> {
        self.decay(now);
        let delta = self
            .last_offset
            .map_or(0.0, |previous| metrics.offset - previous);
        self.last_offset = Some(metrics.offset);

        if self.in_flight() || !metrics.offset.is_finite() {
            return None;
        }

        let t = self.thresholds;
        let candidate = if metrics.offset <= t.edge_buffer_px
            && delta <= -t.min_scroll_delta_px
            && metrics.offset > t.edge_epsilon_px
        {
            Some(Direction::Past)
        } else if metrics.distance_to_bottom() <= t.edge_buffer_px
            && delta >= t.min_scroll_delta_px
            && metrics.distance_to_bottom() > t.edge_epsilon_px
        {
            Some(Direction::Future)
        } else {
            None
        };

        let direction = candidate?;
        if self.state(direction) != EdgeState::Idle {
            return None;
        }
        *self.slot(direction) = EdgeState::Pending { since: now };
        Some(direction)
    }

    /// Fire an edge without a scroll sample (host-driven "load more").
    /// Cooldown does not apply. Returns `false` if the edge is disabled or
    /// any edge is pending.
    pub fn fire(&mut self, direction: Direction, now: Instant) -> bool {
        self.decay(now);
        if self.in_flight()
            || !matches!(
                self.state(direction),
                EdgeState::Idle | EdgeState::Cooldown { .. }
            )
        {
            return false;
        }
        *self.slot(direction) = EdgeState::Pending { since: now };
        true
    }

    /// Settle a pending edge after its layout report. `grew` is whether the
    /// content height increased. Returns `true` when this call disabled the
    /// edge.
    pub fn settle(&mut self, direction: Direction, grew: bool) -> bool {
        let slot = self.slot(direction);
        match *slot {
            EdgeState::Pending { since } if grew => {
                *slot = EdgeState::Cooldown { since };
                false
            }
            EdgeState::Pending { .. } => {
                *slot = EdgeState::Disabled;
                true
            }
            _ => false,
        }
    }

    /// Release a pending edge into cooldown without judging growth.
    pub fn release(&mut self, direction: Direction) {
        let slot = self.slot(direction);
        if let EdgeState::Pending { since } = *slot {
            *slot = EdgeState::Cooldown { since };
        }
    }

    /// Disable an edge outright, e.g. after an `extend` at bound. Returns
    /// `true` on the transition, `false` if it was already disabled.
    pub fn disable(&mut self, direction: Direction) -> bool {
        let slot = self.slot(direction);
        if *slot == EdgeState::Disabled {
            return false;
        }
        *slot = EdgeState::Disabled;
        true
    }

    /// Replace the previous-sample baseline after a programmatic scroll
    /// (zoom or anchor correction) so the jump is not read as user motion.
    pub fn rebase(&mut self, offset: f64) {
        self.last_offset = offset.is_finite().then_some(offset);
    }

    /// Back to `Idle` on both edges; used on recenter.
    pub fn reset(&mut self) {
        self.past = EdgeState::Idle;
        self.future = EdgeState::Idle;
        self.last_offset = None;
    }

    fn decay(&mut self, now: Instant) {
        let cooldown = self.thresholds.cooldown;
        for slot in [&mut self.past, &mut self.future] {
            if let EdgeState::Cooldown { since } = *slot
                && now.saturating_duration_since(since) >= cooldown
            {
                *slot = EdgeState::Idle;
            }
        }
    }
}
