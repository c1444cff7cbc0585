use anyhow::Result;
use clap::ArgMatches;

use ngsflow_pipeline::stages::{Align, Aligner, BamToBed, Download, FilterBam, Intersect, MergeBam, Statistics};
use ngsflow_pipeline::consts::DEFAULT_STATISTICS_FILE;
use ngsflow_tools::SystemRunner;

use crate::common::{context, extra_args, required_path, run_group_stage, run_stage};

pub fn run_download(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let manifest = required_path(matches, "samples")?;
    let mut stage = Download::from_manifest(&manifest, extra_args(matches))?;
    run_stage(matches, &context, &mut stage)
}

pub fn run_align(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let aligner = matches
        .get_one::<String>("aligner")
        .map(|a| a.parse::<Aligner>())
        .transpose()?
        .unwrap_or_default();
    let mut stage = Align {
        aligner,
        index: required_path(matches, "genome")?,
        extra_args: extra_args(matches),
    };
    run_stage(matches, &context, &mut stage)
}

pub fn run_filter_bam(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let mut stage = FilterBam {
        paired: matches.get_flag("paired"),
        min_quality: matches.get_one::<u32>("mapq").copied(),
        dedup: matches.get_flag("dedup"),
        extra_args: extra_args(matches),
    };
    run_stage(matches, &context, &mut stage)
}

pub fn run_bam_to_bed(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let mut stage = BamToBed {
        paired: matches.get_flag("paired"),
        extra_args: extra_args(matches),
    };
    run_stage(matches, &context, &mut stage)
}

pub fn run_merge_bam(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let mut stage = MergeBam {
        extra_args: extra_args(matches),
    };
    run_group_stage(matches, &context, &mut stage)
}

pub fn run_intersect(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let mut stage = Intersect {
        annotations: required_path(matches, "annotations")?,
        extra_args: extra_args(matches),
    };
    run_stage(matches, &context, &mut stage)
}

pub fn run_statistics(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let output = context.workspace.path(
        matches
            .get_one::<String>("output")
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_STATISTICS_FILE),
    );
    let mut stage = Statistics::new(output);
    run_stage(matches, &context, &mut stage)
}
