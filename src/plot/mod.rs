//! Terminal plotting helpers.

pub mod ascii;
pub mod palette;

pub use ascii::render_ascii_series;
