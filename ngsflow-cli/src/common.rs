//! Arguments shared by every verb and the glue from parsed arguments to a
//! pipeline [`Context`].

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, arg, value_parser};

use ngsflow_core::Workspace;
use ngsflow_core::models::Strand;
use ngsflow_pipeline::{Context, Dispatcher, GroupStage, PipelineConfig, Stage};
use ngsflow_tools::Runner;

pub const SAMPLES_ARG: &str = "samples";
pub const INDEX_ARG: &str = "index";
pub const EXTRA_ARG: &str = "extra";

///
/// Global options: working directory, configuration file, log file, threads.
///
pub fn global_args(command: Command) -> Command {
    command
        .arg(
            arg!(--workdir <DIR> "Directory holding every artifact")
                .default_value(".")
                .global(true),
        )
        .arg(arg!(--config <FILE> "TOML file overriding tool executables and defaults").global(true))
        .arg(arg!(--"log-file" <FILE> "Log file, ngsflow.log in the working directory by default").global(true))
        .arg(
            arg!(--threads <N> "Thread budget handed to external tools")
                .value_parser(value_parser!(usize))
                .global(true),
        )
}

///
/// `--samples` and `--index`, with the manifest defaulting to `manifest`.
///
pub fn manifest_args(command: Command, manifest: &'static str) -> Command {
    command
        .arg(arg!(--samples <FILE> "Tab-separated manifest, one row per sample").default_value(manifest))
        .arg(
            arg!(--index <INDEX> "Process only the row at this zero-based position")
                .value_parser(value_parser!(usize)),
        )
}

///
/// Trailing arguments handed verbatim to the wrapped tool.
///
pub fn pass_through(command: Command) -> Command {
    command.arg(
        Arg::new(EXTRA_ARG)
            .help("Arguments appended to the external tool command")
            .num_args(0..)
            .last(true)
            .allow_hyphen_values(true),
    )
}

pub fn strand_arg() -> Arg {
    arg!(--strand <STRAND> "Strand-specific track (+ or -); repeat for both")
        .action(ArgAction::Append)
        .allow_hyphen_values(true)
}

pub fn extra_args(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>(EXTRA_ARG)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

pub fn required_path(matches: &ArgMatches, id: &str) -> Result<PathBuf> {
    matches
        .get_one::<String>(id)
        .map(PathBuf::from)
        .with_context(|| format!("--{} is required", id))
}

pub fn optional_path(matches: &ArgMatches, id: &str) -> Option<PathBuf> {
    matches.get_one::<String>(id).map(PathBuf::from)
}

///
/// Requested strands, or a single combined track when none is given.
///
pub fn strands(matches: &ArgMatches) -> Result<Vec<Option<Strand>>> {
    match matches.get_many::<String>("strand") {
        None => Ok(vec![None]),
        Some(values) => values
            .map(|v| {
                v.parse::<Strand>()
                    .map(Some)
                    .with_context(|| format!("Invalid strand '{}'", v))
            })
            .collect(),
    }
}

pub fn workdir(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<String>("workdir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn load_config(matches: &ArgMatches) -> Result<PipelineConfig> {
    match matches.get_one::<String>("config") {
        Some(path) => PipelineConfig::try_from(Path::new(path))
            .with_context(|| format!("Could not load configuration {}", path)),
        None => Ok(PipelineConfig::default()),
    }
}

///
/// Build the stage context: command-line threads win over the configuration.
///
pub fn context<'r>(matches: &ArgMatches, runner: &'r dyn Runner) -> Result<Context<'r>> {
    let config = load_config(matches)?;
    let threads = matches
        .get_one::<usize>("threads")
        .copied()
        .or(config.threads)
        .unwrap_or(1);
    Ok(Context::new(
        Workspace::new(workdir(matches)),
        runner,
        config.toolbox(),
        threads,
    ))
}

fn manifest(matches: &ArgMatches) -> Result<(PathBuf, Option<usize>)> {
    let manifest = required_path(matches, SAMPLES_ARG)?;
    let index = matches.get_one::<usize>(INDEX_ARG).copied();
    Ok((manifest, index))
}

pub fn run_stage(matches: &ArgMatches, context: &Context, stage: &mut dyn Stage) -> Result<()> {
    let (manifest, index) = manifest(matches)?;
    Dispatcher::new(context, &manifest, index)
        .run(stage)
        .with_context(|| format!("{} failed", stage.name()))?;
    Ok(())
}

pub fn run_group_stage(matches: &ArgMatches, context: &Context, stage: &mut dyn GroupStage) -> Result<()> {
    let (manifest, index) = manifest(matches)?;
    Dispatcher::new(context, &manifest, index)
        .run_groups(stage)
        .with_context(|| format!("{} failed", stage.name()))?;
    Ok(())
}
