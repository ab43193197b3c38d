//! Country statistics engine.
//!
//! - rolling-window primitives over series with explicit "no data" (`window`)
//! - the per-country view and its derived metrics (`country`)

pub mod country;
pub mod window;

pub use country::*;
