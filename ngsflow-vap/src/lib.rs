//! # Aggregation through vap
//!
//! For every length split of a sample, hand its coverage track to the external
//! `vap` engine and gather one value per gene and split into a heatmap.
pub mod consts;
pub mod driver;
pub mod heatmap;
pub mod output;
pub mod params;

// Re-exports
pub use driver::{VapRequest, aggregate, vap_command};
pub use heatmap::write_heatmap;
pub use params::{ParameterValues, rewrite_parameters};
