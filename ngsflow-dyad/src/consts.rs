pub const DYAD_COV_CMD: &str = "dyad-cov";
pub const FIT_GAUSSIAN_CMD: &str = "fit-gaussian";
pub const FIT_DOUBLE_GAUSSIAN_CMD: &str = "fit-double-gaussian";

pub const DEFAULT_MIN_POSITION: i64 = -75;
pub const DEFAULT_MAX_POSITION: i64 = 75;

pub const GENE_COLUMN: &str = "Gene";
pub const POSITION_COLUMN: &str = "Position";
pub const FREQUENCY_COLUMN: &str = "Frequency";
pub const RELATIVE_FREQUENCY_COLUMN: &str = "RelativeFrequency";

pub const PLOT_SIZE: (u32, u32) = (800, 600);
