//! Scroll position compensation around window extensions.
//!
//! Prepending days above the viewport pushes the visible content down by the
//! height of the new rows. The anchor records the offset and content height
//! before the extension; once the host reports the post-layout height, the
//! offset is shifted by the growth so the same content stays in view.
//!
//! When the safety cap trims days off the bottom in the same commit, the net
//! height change understates what was prepended; the trimmed height is added
//! back so only the rows above the viewport count.

#![allow(missing_docs)]

use crate::window::manager::Direction;

/// Snapshot taken immediately before an extension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnchor {
    pub direction: Direction,
    pub offset_before: f64,
    pub content_height_before: f64,
    /// Height of rows the safety cap removed from the far end.
    pub trimmed_px: f64,
    /// Whether the extended edge of the materialized window actually moved.
    pub edge_moved: bool,
    /// Window generation right after the extension was committed.
    pub generation: u64,
}

/// Outcome of consuming an anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorResolution {
    pub direction: Direction,
    /// Net change in content height.
    pub height_delta: f64,
    /// New content appeared on the extended edge.
    pub grew: bool,
    /// Offset the host should scroll to. `None` when no correction applies
    /// (future extensions, or the window changed underneath the anchor).
    pub new_offset: Option<f64>,
    /// The window generation moved on for another reason before the report.
    pub stale: bool,
}

/// `offset_before + (height_after - height_before)`, floored at zero.
#[must_use]
pub fn compensated_offset(offset_before: f64, height_before: f64, height_after: f64) -> f64 {
    (offset_before + (height_after - height_before)).max(0.0)
}

/// Holds at most one pending anchor.
#[derive(Debug, Clone, Default)]
pub struct ScrollAnchorController {
    pending: Option<ScrollAnchor>,
}

impl ScrollAnchorController {
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub const fn pending(&self) -> Option<&ScrollAnchor> {
        self.pending.as_ref()
    }

    /// Record an anchor. Refused (returns `false`) while one is pending.
    pub fn capture(&mut self, anchor: ScrollAnchor) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(anchor);
        true
    }

    /// Consume the pending anchor against the reported post-layout height.
    /// The slot is always released.
    pub fn resolve(
        &mut self,
        content_height_after: f64,
        current_generation: u64,
    ) -> Option<AnchorResolution> {
        let anchor = self.pending.take()?;
        let height_delta = content_height_after - anchor.content_height_before;
        let stale = anchor.generation != current_generation;
        let grew = anchor.edge_moved && height_delta + anchor.trimmed_px > 0.0;
        let new_offset = match anchor.direction {
            Direction::Past if !stale => Some(compensated_offset(
                anchor.offset_before + anchor.trimmed_px,
                anchor.content_height_before,
                content_height_after,
            )),
            _ => None,
        };
        Some(AnchorResolution {
            direction: anchor.direction,
            height_delta,
            grew,
            new_offset,
            stale,
        })
    }
}
