use clap::{Command, arg};

use ngsflow_core::consts::{DEFAULT_SAMPLES_FILE, DEFAULT_VALUE_COLUMN};
pub use ngsflow_vap::consts::*;

use crate::common::{manifest_args, pass_through};

pub fn create_vap_cli() -> Command {
    let command = Command::new(VAP_CMD)
        .about("Run the aggregation engine over every split and merge its values into {sample}-heatmap.txt.")
        .arg(arg!(--parameters <PATH> "Engine parameter template").required(true))
        .arg(arg!(--genes <PATH> "Gene catalog giving the heatmap rows").required(true))
        .arg(arg!(--selection <PATH> "Only genes listed in this file"))
        .arg(
            arg!(--"value-column" <COLUMN> "Engine output column holding the per-gene value")
                .default_value(DEFAULT_VALUE_COLUMN),
        );
    pass_through(manifest_args(command, DEFAULT_SAMPLES_FILE))
}
