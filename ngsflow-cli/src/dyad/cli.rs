use clap::{Arg, ArgAction, Command, arg, value_parser};

use ngsflow_core::consts::DEFAULT_SAMPLES_FILE;
pub use ngsflow_dyad::consts::*;

use crate::common::manifest_args;

fn suffix_args(command: Command) -> Command {
    command
        .arg(arg!(--suffix <SUFFIX> "Appended to the sample name in output file names").default_value(""))
        .arg(arg!(--absolute "Use absolute instead of relative frequency").action(ArgAction::SetTrue))
}

fn float(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
}

pub fn create_dyad_cov_cli() -> Command {
    let command = Command::new(DYAD_COV_CMD)
        .about("Coverage around the dyad of every gene, summed into a relative-frequency profile.")
        .arg(arg!(--genes <PATH> "Gene catalog with dyad positions").required(true))
        .arg(arg!(--selection <PATH> "Only genes listed in this file"))
        .arg(
            arg!(--"min-position" <OFFSET> "First offset from the dyad [default: -75]")
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true),
        )
        .arg(
            arg!(--"max-position" <OFFSET> "Last offset from the dyad [default: 75]")
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true),
        )
        .arg(
            arg!(--smoothing <WINDOW> "Moving-average window in base pairs")
                .value_parser(value_parser!(u32))
                .default_value("0"),
        );
    manifest_args(suffix_args(command), DEFAULT_SAMPLES_FILE)
}

fn fit_cli(name: &'static str, about: &'static str, double: bool) -> Command {
    let mut command = Command::new(name)
        .about(about)
        .arg(float("baseline", "Initial baseline"))
        .arg(float("amplitude", "Initial amplitude of the first Gaussian"))
        .arg(float("mean", "Initial mean of the first Gaussian"))
        .arg(float("sigma", "Initial standard deviation of the first Gaussian"))
        .arg(float("amplitude-min", "Lower bound of the first amplitude"))
        .arg(float("mean-min", "Lower bound of the first mean"))
        .arg(float("mean-max", "Upper bound of the first mean"))
        .arg(float("sigma-min", "Lower bound of the first standard deviation"))
        .arg(arg!(--svg "Also write an SVG plot").action(ArgAction::SetTrue))
        .arg(arg!(--"initial-curve" "Draw the curve of the starting parameters").action(ArgAction::SetTrue))
        .arg(arg!(--"show-baseline" "Draw the fitted baseline").action(ArgAction::SetTrue));
    if double {
        command = command
            .arg(float("amplitude2", "Initial amplitude of the second Gaussian"))
            .arg(float("mean2", "Initial mean of the second Gaussian"))
            .arg(float("sigma2", "Initial standard deviation of the second Gaussian"))
            .arg(float("amplitude2-min", "Lower bound of the second amplitude"))
            .arg(float("mean2-min", "Lower bound of the second mean"))
            .arg(float("mean2-max", "Upper bound of the second mean"))
            .arg(float("sigma2-min", "Lower bound of the second standard deviation"))
            .arg(arg!(--components "Draw each Gaussian separately").action(ArgAction::SetTrue))
            .arg(
                arg!(--"components-with-baseline" "Draw each Gaussian on top of the baseline")
                    .action(ArgAction::SetTrue),
            );
    }
    manifest_args(suffix_args(command), DEFAULT_SAMPLES_FILE)
}

pub fn create_fit_gaussian_cli() -> Command {
    fit_cli(
        FIT_GAUSSIAN_CMD,
        "Fit a Gaussian plus baseline to each dyad profile.",
        false,
    )
}

pub fn create_fit_double_gaussian_cli() -> Command {
    fit_cli(
        FIT_DOUBLE_GAUSSIAN_CMD,
        "Fit two Gaussians plus baseline to each dyad profile.",
        true,
    )
}
