#![forbid(unsafe_code)]

//! timelane: timeline layout and windowing engine for scrollable,
//! incrementally-loaded calendar views.
//!
//! Four cooperating pieces:
//! 1. **Lane layout**: overlapping date-ranged entries get conflict-free lanes
//!    and a per-day index of what to draw where
//! 2. **Date window**: a month-granular window that grows at its edges as the
//!    user scrolls, with the scroll position compensated on past extensions
//! 3. **Zoom**: bounded, persisted zoom factor that keeps the viewport
//!    center fixed
//! 4. **Month tracking**: which month is under the viewport, for a floating
//!    label
//!
//! # Library usage
//!
//! ```rust,no_run
//! use timelane::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use timelane::layout::lanes::assign_lanes;
//! use timelane::window::manager::{DateWindowManager, Direction};
//! ```

pub mod prelude;

pub mod core;
pub mod engine;
pub mod layout;
pub mod logger;
pub mod viewport;
pub mod window;
