//! # ngsflow-core
//!
//! Shared building blocks of the ngsflow pipeline:
//!
//! - [`models`]: interval records, strands and gene catalogs
//! - [`manifest`]: sample, merge and dataset manifests
//! - [`bed`]: counting, sorting and rewriting interval files
//! - [`workspace`]: the working directory and its filename conventions
//!
pub mod bed;
pub mod consts;
pub mod errors;
pub mod manifest;
pub mod models;
pub mod utils;
pub mod workspace;

// re-exports
pub use errors::{PipelineError, Result};
pub use workspace::{Split, Workspace};
