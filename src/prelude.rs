//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use timelane::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, TimelaneError};

// Layout
pub use crate::layout::day_index::{DayCell, DayIndex, DayItem, IndexPolicy, Placement, build_day_index};
pub use crate::layout::entry::{SkipReason, SkippedEntry, TimeRangedEntry};
pub use crate::layout::geometry::LayoutGeometry;
pub use crate::layout::lanes::{LaneAssignment, assign_lanes};
pub use crate::layout::overlap::{DateRange, overlaps};

// Window
pub use crate::window::edge_trigger::{EdgeState, ScrollSample};
pub use crate::window::manager::{DateWindowManager, Direction, ExtendOutcome, MaterializedWindow};
pub use crate::window::scroll_anchor::{ScrollAnchorController, compensated_offset};

// Viewport
pub use crate::viewport::month_tracker::MonthMarker;
pub use crate::viewport::zoom::{TouchPoint, Viewport, ZoomController};
pub use crate::viewport::zoom_store::{FileZoomStore, LoadOutcome, MemoryZoomStore, ZoomStore};

// Engine
pub use crate::engine::{
    EngineEvent, Extension, LayoutReport, ScrollCorrection, ScrollOutcome, TimelineEngine,
};

// Logger
pub use crate::logger::jsonl::{JsonlWriter, Severity};
