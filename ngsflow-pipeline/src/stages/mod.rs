//! One module per group of pipeline verbs.

pub mod aggregate;
pub mod align;
pub mod coverage;
pub mod download;
pub mod dyad;
pub mod filter;
pub mod intervals;
pub mod merge_bam;
pub mod statistics;

pub use aggregate::Vap;
pub use align::{Align, Aligner};
pub use coverage::{GenomeCov, MergeBigWig, PrepCoverage, SplitStage};
pub use download::Download;
pub use dyad::{DyadCov, FitGaussian};
pub use filter::FilterBam;
pub use intervals::{BamToBed, Intersect, MergeBed};
pub use merge_bam::MergeBam;
pub use statistics::Statistics;
