/// Counts-per-million numerator of the coverage scale.
pub const BASE_SCALE: f64 = 1_000_000.0;

/// Column of the aggregation engine output holding the per-gene value.
pub const DEFAULT_VALUE_COLUMN: &str = "W0_0";

pub const DEFAULT_SAMPLES_FILE: &str = "samples.txt";
pub const DEFAULT_MERGE_FILE: &str = "merge.txt";
