//! `housing-affordability` library crate.
//!
//! The binary (`afford`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - the tables can be reused by other front-ends (notebooks, services)
//!
//! The core pipeline lives in `analysis` (classify, derive, composite,
//! summary, band counts); `app::pipeline` chains it. Everything else is
//! presentation or plumbing.

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod tui;
