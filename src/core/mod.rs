//! Core types: errors, configuration, calendar helpers.

pub mod config;
pub mod dates;
pub mod errors;
