//! # Coverage tracks
//!
//! Turn a sample's intervals into a normalized base-pair coverage signal:
//!
//! 1. [`forcov`] prepares the records fed to the coverage engine (1 bp centers
//!    or strand-symmetrized copies).
//! 2. [`scale`] derives the counts-per-million factor from those records.
//! 3. [`genomecov`] computes the signal, through `bedtools genomecov` or in process.
//! 4. [`track`] sorts the result, adds a track line and converts it with [`bigwig`].
//!
//! [`bigwig::merge_bigwigs`] sums finished tracks of several samples.
pub mod bigwig;
pub mod consts;
pub mod forcov;
pub mod genomecov;
pub mod scale;
pub mod track;

// Re-exports
pub use bigwig::{bedgraph_to_bigwig, merge_bigwigs};
pub use forcov::{ForcovPolicy, coverage_input, prepare_forcov};
pub use genomecov::{CoverageEngine, CoverageOptions};
pub use scale::normalized_scale;
pub use track::{CoverageTrack, coverage_track};
