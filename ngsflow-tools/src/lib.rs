//! # ngsflow-tools
//!
//! External programs (aligners, samtools, bedtools, SRA download, the
//! aggregation engine) are opaque processes to the pipeline. This crate gives
//! them a typed shape: a [`Tool`] knows its subcommand and how to spell a thread
//! budget, a [`ToolCommand`] collects arguments, and a [`Runner`] executes it.
//!
pub mod runner;
pub mod scratch;
pub mod tool;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// re-exports
pub use runner::{Runner, SystemRunner};
pub use scratch::scratch_file;
pub use tool::{Bedtools, Samtools, Tool, ToolCommand, Toolbox};
