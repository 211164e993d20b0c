//! Pure layout: overlap test, lane assignment, day index and grid geometry.

pub mod day_index;
pub mod entry;
pub mod geometry;
pub mod lanes;
pub mod overlap;
