pub const DOWNLOAD_CMD: &str = "download";
pub const ALIGN_CMD: &str = "align";
pub const FILTER_BAM_CMD: &str = "filter-bam";
pub const BAM_TO_BED_CMD: &str = "bam-to-bed";
pub const MERGE_CMD: &str = "merge";
pub const MERGE_BAM_CMD: &str = "merge-bam";
pub const INTERSECT_CMD: &str = "intersect";
pub const STATISTICS_CMD: &str = "statistics";

pub const DEFAULT_STATISTICS_FILE: &str = "statistics.txt";

/// SAM flags dropped by the BAM filter: unmapped, secondary, QC fail, supplementary.
pub const EXCLUDED_FLAGS: &str = "2308";
/// SAM flag required of paired reads: properly paired.
pub const PROPER_PAIR_FLAG: &str = "2";
