use anyhow::{Context as _, Result};
use clap::ArgMatches;

use ngsflow_coverage::forcov::apply_policy;
use ngsflow_coverage::{CoverageEngine, CoverageOptions, ForcovPolicy};
use ngsflow_pipeline::stages::{GenomeCov, MergeBed, MergeBigWig, PrepCoverage, SplitStage};
use ngsflow_split::BinSpec;
use ngsflow_split::consts::{DEFAULT_BIN_LENGTH, DEFAULT_BIN_MAX_LENGTH, DEFAULT_BIN_MIN_LENGTH};
use ngsflow_tools::SystemRunner;

use crate::common::{context, extra_args, required_path, run_group_stage, run_stage, strands};

pub fn run_split(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let value = |id: &str, default: u32| matches.get_one::<u32>(id).copied().unwrap_or(default);
    let spec = BinSpec::new(
        value("bin-length", DEFAULT_BIN_LENGTH),
        value("bin-min", DEFAULT_BIN_MIN_LENGTH),
        value("bin-max", DEFAULT_BIN_MAX_LENGTH),
    )?;
    run_stage(matches, &context, &mut SplitStage { spec })
}

fn policy(matches: &ArgMatches) -> Result<ForcovPolicy> {
    let policy = matches
        .get_one::<String>("policy")
        .map(|p| p.parse::<ForcovPolicy>())
        .transpose()?;
    Ok(policy.unwrap_or(ForcovPolicy::Center))
}

pub fn run_prep_coverage(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let mut stage = PrepCoverage {
        policy: policy(matches)?,
    };
    run_stage(matches, &context, &mut stage)
}

pub fn run_genome_cov(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let engine = matches
        .get_one::<String>("engine")
        .map(|e| e.parse::<CoverageEngine>())
        .transpose()?
        .unwrap_or_default();
    let mut stage = GenomeCov {
        sizes: required_path(matches, "sizes")?,
        engine,
        options: CoverageOptions {
            five_prime: matches.get_flag("five-prime"),
            three_prime: matches.get_flag("three-prime"),
            strand: None,
            scale: matches.get_one::<f64>("scale").copied(),
            extra_args: extra_args(matches),
        },
        strands: strands(matches)?,
    };
    run_stage(matches, &context, &mut stage)
}

pub fn run_merge(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    run_group_stage(matches, &context, &mut MergeBed)
}

pub fn run_merge_bw(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let mut stage = MergeBigWig {
        sizes: required_path(matches, "sizes")?,
        strands: strands(matches)?,
    };
    run_group_stage(matches, &context, &mut stage)
}

pub fn run_center_annotations(matches: &ArgMatches) -> Result<()> {
    let input = required_path(matches, "input")?;
    let output = required_path(matches, "output")?;
    apply_policy(&input, &output, ForcovPolicy::Center)
        .with_context(|| format!("Could not center {}", input.display()))?;
    Ok(())
}
