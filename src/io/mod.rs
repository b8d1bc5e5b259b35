//! Input/output helpers.
//!
//! - CSV ingest into a raw string table (`ingest`)
//! - content-fingerprinted load cache (`cache`)
//! - table dumps as CSV/JSON (`export`)

pub mod cache;
pub mod export;
pub mod ingest;

pub use cache::*;
pub use export::*;
pub use ingest::*;
