pub const VAP_CMD: &str = "vap";

pub const DATASET_PATH: &str = "dataset_path";
pub const OUTPUT_DIRECTORY: &str = "output_directory";
pub const PREFIX_FILENAME: &str = "prefix_filename";
pub const SELECTION_PATH: &str = "selection_path";

/// Prefix of every engine directive line.
pub const DIRECTIVE_PREFIX: &str = "~~@";
/// Separates key and value in a directive.
pub const DIRECTIVE_SEPARATOR: &str = ":=:";
/// Replicate label given to every dataset line.
pub const REPLICATE_LABEL: &str = "R1";

pub const PARAMETERS_FILE: &str = "parameters.txt";
