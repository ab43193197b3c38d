//! Remote data sources.

pub mod owid;

pub use owid::{OwidClient, load_dataset};
