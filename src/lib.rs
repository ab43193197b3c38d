//! `covid-dashboard` library crate.
//!
//! The binary (`covid`) is a thin wrapper around this library so that:
//!
//! - the statistics engine is testable without spawning processes
//! - the dashboard, text reports and exports share one computation pipeline

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod stats;
pub mod tui;
