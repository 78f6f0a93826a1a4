//! Command-line front end for the reelgen job tracker.

pub mod args;
pub mod config;
pub mod render;
