//! Date window state, edge triggers and scroll compensation.

pub mod edge_trigger;
pub mod manager;
pub mod scroll_anchor;
