//! # Length splitting
//!
//! Partition a sample's intervals into fixed-width fragment-length bins. Each
//! bin becomes a derived sample, a *split*, named `{sample}-{start}-{end}`.
pub mod consts;
pub mod split;

// Re-exports
pub use split::*;
