//! Text reports for terminal output.
//!
//! Formatting lives here so the statistics code stays free of presentation
//! concerns.

pub mod format;

pub use format::*;
