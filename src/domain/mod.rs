//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the affordability bands and fixed contract constants
//! - the raw input table (`RawTable`)
//! - the four output tables' row types
//! - front-end configuration (`AppConfig`)

pub mod types;

pub use types::*;
