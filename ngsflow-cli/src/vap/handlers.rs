use anyhow::Result;
use clap::ArgMatches;

use ngsflow_core::consts::DEFAULT_VALUE_COLUMN;
use ngsflow_pipeline::stages::Vap;
use ngsflow_tools::SystemRunner;
use ngsflow_vap::VapRequest;

use crate::common::{context, extra_args, optional_path, required_path, run_stage};

pub fn run_vap(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let mut request = VapRequest::new(required_path(matches, "parameters")?, required_path(matches, "genes")?);
    request.selection = optional_path(matches, "selection");
    request.value_column = matches
        .get_one::<String>("value-column")
        .cloned()
        .unwrap_or_else(|| DEFAULT_VALUE_COLUMN.to_string());
    request.extra_args = extra_args(matches);

    run_stage(matches, &context, &mut Vap { request })
}
