//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - per-country series exports (JSON/CSV) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
