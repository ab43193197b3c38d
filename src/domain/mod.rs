//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw dataset rows (`Observation`, `Dataset`)
//! - date-keyed numeric series with explicit "no data" (`Series`)
//! - dashboard/run configuration (`SourceConfig`, `DashboardConfig`, `Metric`)

pub mod types;

pub use types::*;
