pub const SPLIT_CMD: &str = "split";

pub const DEFAULT_BIN_LENGTH: u32 = 10;
pub const DEFAULT_BIN_MIN_LENGTH: u32 = 50;
pub const DEFAULT_BIN_MAX_LENGTH: u32 = 500;
