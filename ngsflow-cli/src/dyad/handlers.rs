use anyhow::Result;
use clap::ArgMatches;

use ngsflow_core::models::{GeneCatalog, read_selection};
use ngsflow_dyad::consts::{DEFAULT_MAX_POSITION, DEFAULT_MIN_POSITION};
use ngsflow_dyad::{ComponentSettings, FitPlotOptions, FitRequest, FitSettings, Model, ProfileSettings};
use ngsflow_pipeline::stages::{DyadCov, FitGaussian};
use ngsflow_tools::SystemRunner;

use crate::common::{context, optional_path, required_path, run_stage};

fn suffix(matches: &ArgMatches) -> String {
    matches.get_one::<String>("suffix").cloned().unwrap_or_default()
}

pub fn run_dyad_cov(matches: &ArgMatches) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let catalog = GeneCatalog::from_path(required_path(matches, "genes")?)?;
    let selection = match optional_path(matches, "selection") {
        Some(path) => Some(read_selection(path)?),
        None => None,
    };
    let settings = ProfileSettings {
        min_position: matches
            .get_one::<i64>("min-position")
            .copied()
            .unwrap_or(DEFAULT_MIN_POSITION),
        max_position: matches
            .get_one::<i64>("max-position")
            .copied()
            .unwrap_or(DEFAULT_MAX_POSITION),
        smoothing: matches.get_one::<u32>("smoothing").copied().unwrap_or(0),
        absolute: matches.get_flag("absolute"),
        suffix: suffix(matches),
        selection,
    };
    run_stage(matches, &context, &mut DyadCov { catalog, settings })
}

///
/// Starting values and bounds of component `k`; flags of the second one end in `2`.
///
fn component(matches: &ArgMatches, k: usize) -> ComponentSettings {
    let tag = if k == 0 { "" } else { "2" };
    let value = |name: &str| matches.get_one::<f64>(&format!("{name}{tag}")).copied();
    let bound = |name: &str, side: &str| matches.get_one::<f64>(&format!("{name}{tag}-{side}")).copied();
    ComponentSettings {
        amplitude: value("amplitude"),
        mean: value("mean"),
        sigma: value("sigma"),
        amplitude_min: bound("amplitude", "min"),
        mean_min: bound("mean", "min"),
        mean_max: bound("mean", "max"),
        sigma_min: bound("sigma", "min"),
    }
}

fn flag(matches: &ArgMatches, id: &str) -> bool {
    matches
        .try_get_one::<bool>(id)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
}

fn fit(matches: &ArgMatches, model: Model) -> Result<()> {
    let context = context(matches, &SystemRunner)?;
    let mut settings = FitSettings::new(model);
    settings.baseline = matches.get_one::<f64>("baseline").copied();
    settings.components = (0..model.components()).map(|k| component(matches, k)).collect();

    let request = FitRequest {
        settings,
        suffix: suffix(matches),
        absolute: matches.get_flag("absolute"),
        plot: FitPlotOptions {
            initial_curve: matches.get_flag("initial-curve"),
            components: flag(matches, "components"),
            components_with_baseline: flag(matches, "components-with-baseline"),
            baseline: matches.get_flag("show-baseline"),
            svg: matches.get_flag("svg"),
        },
    };
    run_stage(matches, &context, &mut FitGaussian::new(request))
}

pub fn run_fit_gaussian(matches: &ArgMatches) -> Result<()> {
    fit(matches, Model::Single)
}

pub fn run_fit_double_gaussian(matches: &ArgMatches) -> Result<()> {
    fit(matches, Model::Double)
}
