use clap::{Arg, ArgAction, Command, arg, value_parser};

use ngsflow_core::consts::{DEFAULT_MERGE_FILE, DEFAULT_SAMPLES_FILE};
pub use ngsflow_coverage::consts::*;
use ngsflow_pipeline::consts::MERGE_CMD;
pub use ngsflow_split::consts::*;

use crate::common::{manifest_args, pass_through, strand_arg};

pub const CENTER_ANNOTATIONS_CMD: &str = "center-annotations";

pub fn create_split_cli() -> Command {
    let command = Command::new(SPLIT_CMD)
        .about("Partition {sample}.bed into length bins {sample}-{start}-{end}.bed.")
        .arg(
            arg!(--"bin-length" <LENGTH> "Width of each length bin [default: 10]")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"bin-min" <LENGTH> "Shortest interval kept [default: 50]")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"bin-max" <LENGTH> "Intervals this long or longer are dropped [default: 500]")
                .value_parser(value_parser!(u32)),
        );
    manifest_args(command, DEFAULT_SAMPLES_FILE)
}

pub fn create_prep_coverage_cli() -> Command {
    let command = Command::new(PREP_COVERAGE_CMD)
        .about("Write {sample}-forcov.bed for every sample and split.")
        .arg(
            arg!(--policy <POLICY> "center: 1 bp at each midpoint; symmetrize: each interval on both strands")
                .value_parser(["center", "symmetrize", "both-strands"])
                .default_value("center"),
        );
    manifest_args(command, DEFAULT_SAMPLES_FILE)
}

pub fn create_genome_cov_cli() -> Command {
    let command = Command::new(GENOME_COV_CMD)
        .about("Normalized coverage bedGraph and bigWig for every sample and split.")
        .arg(arg!(--sizes <PATH> "Chromosome sizes file").required(true))
        .arg(
            arg!(--engine <ENGINE> "bedtools or the in-process native engine")
                .value_parser(["bedtools", "native"])
                .default_value("bedtools"),
        )
        .arg(arg!(--"five-prime" "Count 5' ends only").action(ArgAction::SetTrue))
        .arg(arg!(--"three-prime" "Count 3' ends only").action(ArgAction::SetTrue))
        .arg(
            arg!(--scale <SCALE> "Explicit scale instead of counts per million")
                .value_parser(value_parser!(f64)),
        )
        .arg(strand_arg());
    pass_through(manifest_args(command, DEFAULT_SAMPLES_FILE))
}

pub fn create_merge_cli() -> Command {
    let command = Command::new(MERGE_CMD)
        .about("Concatenate and sort the interval files of each group into {group}.bed.");
    manifest_args(command, DEFAULT_MERGE_FILE)
}

pub fn create_merge_bw_cli() -> Command {
    let command = Command::new(MERGE_BW_CMD)
        .about("Sum the coverage bigWigs of each group into {group}-cov.bw.")
        .arg(arg!(--sizes <PATH> "Chromosome sizes file").required(true))
        .arg(strand_arg());
    manifest_args(command, DEFAULT_MERGE_FILE)
}

pub fn create_center_annotations_cli() -> Command {
    Command::new(CENTER_ANNOTATIONS_CMD)
        .about("Replace each interval of a file by its 1 bp midpoint.")
        .arg(Arg::new("input").required(true))
        .arg(Arg::new("output").required(true))
}
