pub const PREP_COVERAGE_CMD: &str = "prep-coverage";
pub const GENOME_COV_CMD: &str = "genome-cov";
pub const MERGE_BW_CMD: &str = "merge-bw";

/// Zoom levels written into every bigWig.
pub const BIGWIG_ZOOMS: u32 = 8;

/// Bases summed at a time when merging bigWig files.
pub const MERGE_WINDOW: u32 = 1 << 20;
