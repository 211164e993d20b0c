//! Viewport state: zoom, zoom persistence, month tracking, scroll throttling.

pub mod month_tracker;
pub mod throttle;
pub mod zoom;
pub mod zoom_store;
