//! Single and double Gaussian fits with a constant baseline.
//!
//! The model is `y = c + Σ A_k φ((x - μ_k) / σ_k)` where `φ` is the standard
//! normal density. Parameters are found with a bounded Levenberg-Marquardt
//! search; bounds are enforced by projecting every step back into the box.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::path::Path;

use log::{info, warn};
use ndarray::{Array1, Array2};

use ngsflow_core::{PipelineError, Result, Workspace};

use crate::plot::{FitFigure, FitPlotOptions, plot_fit};
use crate::profile::read_dyad_table;

const SQRT_2PI: f64 = 2.506_628_274_631_000_7;
const MIN_SIGMA: f64 = 1e-6;
const FTOL: f64 = 1e-10;
const XTOL: f64 = 1e-10;
const INITIAL_DAMPING: f64 = 1e-3;
const MIN_DAMPING: f64 = 1e-15;
const MAX_DAMPING: f64 = 1e12;
/// Floor of each normal-matrix diagonal entry scaled by the damping.
const DIAGONAL_FLOOR: f64 = 1e-12;
/// Pivots smaller than this in magnitude make the damped system singular.
const PIVOT_TOLERANCE: f64 = f64::MIN_POSITIVE;
const STALL_LIMIT: usize = 3;
pub const DEFAULT_MAX_ITERATIONS: usize = 2000;

fn kernel(z: f64) -> f64 {
    (-0.5 * z * z).exp() / SQRT_2PI
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub amplitude: f64,
    pub mean: f64,
    pub sigma: f64,
}

impl Gaussian {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.amplitude * kernel((x - self.mean) / self.sigma)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitParameters {
    pub baseline: f64,
    pub components: Vec<Gaussian>,
}

impl FitParameters {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.baseline + self.components.iter().map(|g| g.evaluate(x)).sum::<f64>()
    }

    /// Component `k` alone, without the baseline.
    pub fn component(&self, k: usize, x: f64) -> f64 {
        self.components[k].evaluate(x)
    }

    fn to_vector(&self) -> Array1<f64> {
        let mut v = vec![self.baseline];
        for g in &self.components {
            v.extend([g.amplitude, g.mean, g.sigma]);
        }
        Array1::from(v)
    }

    fn from_vector(p: &Array1<f64>) -> FitParameters {
        FitParameters {
            baseline: p[0],
            components: (0..(p.len() - 1) / 3)
                .map(|k| Gaussian {
                    amplitude: p[1 + 3 * k],
                    mean: p[2 + 3 * k],
                    sigma: p[3 + 3 * k],
                })
                .collect(),
        }
    }
}

impl Display for FitParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "baseline={}", self.baseline)?;
        for (k, g) in self.components.iter().enumerate() {
            write!(
                f,
                " amplitude{n}={} mean{n}={} sigma{n}={}",
                g.amplitude,
                g.mean,
                g.sigma,
                n = k + 1
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Single,
    Double,
}

impl Model {
    pub fn components(&self) -> usize {
        match self {
            Model::Single => 1,
            Model::Double => 2,
        }
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Model::Double)
    }
}

///
/// Caller-provided starting values and bounds of one component.
///
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComponentSettings {
    pub amplitude: Option<f64>,
    pub mean: Option<f64>,
    pub sigma: Option<f64>,
    pub amplitude_min: Option<f64>,
    pub mean_min: Option<f64>,
    pub mean_max: Option<f64>,
    pub sigma_min: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitSettings {
    pub model: Model,
    pub baseline: Option<f64>,
    /// Indexed by component; missing entries use defaults.
    pub components: Vec<ComponentSettings>,
    pub max_iterations: usize,
}

impl FitSettings {
    pub fn new(model: Model) -> FitSettings {
        FitSettings {
            model,
            baseline: None,
            components: vec![],
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    fn component(&self, k: usize) -> ComponentSettings {
        self.components.get(k).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Converged(FitParameters),
    Failed(String),
}

impl FitOutcome {
    pub fn parameters(&self) -> Option<&FitParameters> {
        match self {
            FitOutcome::Converged(p) => Some(p),
            FitOutcome::Failed(_) => None,
        }
    }
}

///
/// Starting point of a fit: caller values where given, otherwise
/// `μ=0, σ=max(x)/2, A=100·max(y)` for one component and
/// `μ=∓max(x)/4, σ=max(x)/5, A=50·max(y)` for two. The baseline starts at `min(y)`.
///
pub fn initial_parameters(x: &[f64], y: &[f64], settings: &FitSettings) -> FitParameters {
    let max_x = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let max_y = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_y = y.iter().copied().fold(f64::INFINITY, f64::min);

    let defaults: Vec<Gaussian> = match settings.model {
        Model::Single => vec![Gaussian {
            amplitude: max_y * 100.0,
            mean: 0.0,
            sigma: max_x / 2.0,
        }],
        Model::Double => vec![
            Gaussian {
                amplitude: max_y * 50.0,
                mean: -max_x / 4.0,
                sigma: max_x / 5.0,
            },
            Gaussian {
                amplitude: max_y * 50.0,
                mean: max_x / 4.0,
                sigma: max_x / 5.0,
            },
        ],
    };

    FitParameters {
        baseline: settings.baseline.unwrap_or(min_y),
        components: defaults
            .into_iter()
            .enumerate()
            .map(|(k, g)| {
                let c = settings.component(k);
                Gaussian {
                    amplitude: c.amplitude.unwrap_or(g.amplitude),
                    mean: c.mean.unwrap_or(g.mean),
                    sigma: c.sigma.unwrap_or(g.sigma),
                }
            })
            .collect(),
    }
}

struct Bounds {
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl Bounds {
    fn new(y: &[f64], settings: &FitSettings) -> Bounds {
        let min_y = y.iter().copied().fold(f64::INFINITY, f64::min);
        let max_y = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut lower = vec![min_y];
        let mut upper = vec![max_y];
        for k in 0..settings.model.components() {
            let c = settings.component(k);
            lower.extend([
                c.amplitude_min.unwrap_or(f64::NEG_INFINITY),
                c.mean_min.unwrap_or(f64::NEG_INFINITY),
                c.sigma_min.unwrap_or(0.0).max(MIN_SIGMA),
            ]);
            upper.extend([
                f64::INFINITY,
                c.mean_max.unwrap_or(f64::INFINITY),
                f64::INFINITY,
            ]);
        }
        Bounds {
            lower: Array1::from(lower),
            upper: Array1::from(upper),
        }
    }

    fn project(&self, p: &mut Array1<f64>) {
        for i in 0..p.len() {
            p[i] = p[i].max(self.lower[i]).min(self.upper[i]);
        }
    }
}

fn model_value(p: &Array1<f64>, x: f64) -> f64 {
    let mut value = p[0];
    for k in 0..(p.len() - 1) / 3 {
        let (a, mu, sigma) = (p[1 + 3 * k], p[2 + 3 * k], p[3 + 3 * k]);
        value += a * kernel((x - mu) / sigma);
    }
    value
}

fn residuals(x: &Array1<f64>, y: &Array1<f64>, p: &Array1<f64>) -> Array1<f64> {
    Array1::from_iter(x.iter().zip(y.iter()).map(|(xi, yi)| yi - model_value(p, *xi)))
}

fn cost(x: &Array1<f64>, y: &Array1<f64>, p: &Array1<f64>) -> f64 {
    residuals(x, y, p).iter().map(|r| r * r).sum()
}

fn jacobian(x: &Array1<f64>, p: &Array1<f64>) -> Array2<f64> {
    let mut j = Array2::zeros((x.len(), p.len()));
    for (i, xi) in x.iter().enumerate() {
        j[[i, 0]] = 1.0;
        for k in 0..(p.len() - 1) / 3 {
            let (a, mu, sigma) = (p[1 + 3 * k], p[2 + 3 * k], p[3 + 3 * k]);
            let z = (xi - mu) / sigma;
            let g = kernel(z);
            j[[i, 1 + 3 * k]] = g;
            j[[i, 2 + 3 * k]] = a * g * z / sigma;
            j[[i, 3 + 3 * k]] = a * g * z * z / sigma;
        }
    }
    j
}

/// Gaussian elimination with partial pivoting; `None` when the system is
/// singular to within [`PIVOT_TOLERANCE`] or the solution is not finite.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &k| {
            a[[i, col]]
                .abs()
                .partial_cmp(&a[[k, col]].abs())
                .unwrap_or(Ordering::Equal)
        })?;
        if !a[[pivot, col]].is_finite() || a[[pivot, col]].abs() < PIVOT_TOLERANCE {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let tail: f64 = (i + 1..n).map(|k| a[[i, k]] * x[k]).sum();
        x[i] = (b[i] - tail) / a[[i, i]];
    }
    x.iter().all(|v: &f64| v.is_finite()).then_some(x)
}

fn levenberg_marquardt(
    x: &Array1<f64>,
    y: &Array1<f64>,
    start: Array1<f64>,
    bounds: &Bounds,
    max_iterations: usize,
) -> Result<Array1<f64>> {
    let mut p = start;
    bounds.project(&mut p);
    let mut current = cost(x, y, &p);
    if !current.is_finite() {
        return Err(PipelineError::FitFailed(
            "model is not finite at the starting point".to_string(),
        ));
    }
    let mut damping = INITIAL_DAMPING;
    let mut stalled = 0;

    for _ in 0..max_iterations {
        let j = jacobian(x, &p);
        let r = residuals(x, y, &p);
        let jtj = j.t().dot(&j);
        let jtr = j.t().dot(&r);

        loop {
            let mut a = jtj.clone();
            for i in 0..p.len() {
                a[[i, i]] += damping * jtj[[i, i]].max(DIAGONAL_FLOOR);
            }
            if let Some(step) = solve(a, jtr.clone()) {
                let mut candidate = &p + &step;
                bounds.project(&mut candidate);
                let next = cost(x, y, &candidate);
                if next.is_finite() && next < current {
                    let moved = (&candidate - &p).iter().map(|d| d * d).sum::<f64>().sqrt();
                    let scale = p.iter().map(|v| v * v).sum::<f64>().sqrt();
                    let improvement = current - next;
                    let previous = current;
                    p = candidate;
                    current = next;
                    damping = (damping / 10.0).max(MIN_DAMPING);
                    if improvement <= FTOL * previous || moved <= XTOL * (scale + XTOL) {
                        stalled += 1;
                        if stalled == STALL_LIMIT {
                            return Ok(p);
                        }
                    } else {
                        stalled = 0;
                    }
                    break;
                }
            }
            damping *= 10.0;
            if damping > MAX_DAMPING {
                // no step lowers the cost any more
                return Ok(p);
            }
        }
    }

    Err(PipelineError::FitFailed(format!(
        "no convergence after {} iterations",
        max_iterations
    )))
}

///
/// Starting values and result of one fit.
///
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub initial: FitParameters,
    pub outcome: FitOutcome,
}

pub fn fit_curve(x: &[f64], y: &[f64], settings: &FitSettings) -> FitReport {
    let initial = initial_parameters(x, y, settings);
    let outcome = match try_fit(x, y, &initial, settings) {
        Ok(p) => FitOutcome::Converged(p),
        Err(e) => FitOutcome::Failed(match e {
            PipelineError::FitFailed(reason) => reason,
            other => other.to_string(),
        }),
    };
    FitReport { initial, outcome }
}

fn try_fit(x: &[f64], y: &[f64], initial: &FitParameters, settings: &FitSettings) -> Result<FitParameters> {
    let n = 1 + 3 * settings.model.components();
    if x.len() != y.len() {
        return Err(PipelineError::FitFailed(format!(
            "{} positions but {} values",
            x.len(),
            y.len()
        )));
    }
    if x.len() < n {
        return Err(PipelineError::FitFailed(format!(
            "{} points are not enough for {} parameters",
            x.len(),
            n
        )));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(PipelineError::FitFailed("data contains non-finite values".to_string()));
    }

    let bounds = Bounds::new(y, settings);
    let x = Array1::from(x.to_vec());
    let y = Array1::from(y.to_vec());
    let p = levenberg_marquardt(&x, &y, initial.to_vector(), &bounds, settings.max_iterations)?;
    if p.iter().any(|v| !v.is_finite()) {
        return Err(PipelineError::FitFailed("parameters diverged".to_string()));
    }
    Ok(FitParameters::from_vector(&p))
}

///
/// What [`fit_dyad_profile`] fits and draws.
///
#[derive(Debug, Clone, PartialEq)]
pub struct FitRequest {
    pub settings: FitSettings,
    pub suffix: String,
    /// Fit the absolute frequency instead of the relative one.
    pub absolute: bool,
    pub plot: FitPlotOptions,
}

///
/// Fit the summary table of `sample` and draw `-dyad[-double]-gaussian.png`.
/// A failed fit is logged and the plot shows the data without a fitted curve.
///
pub fn fit_dyad_profile(workspace: &Workspace, sample: &str, request: &FitRequest) -> Result<FitOutcome> {
    let table = workspace.dyad_table(sample, &request.suffix);
    let curve = read_dyad_table(&table)?;
    let y = if request.absolute {
        &curve.frequency
    } else {
        &curve.relative_frequency
    };

    let report = fit_curve(&curve.positions, y, &request.settings);
    match &report.outcome {
        FitOutcome::Converged(p) => info!("{}{}: {}", sample, request.suffix, p),
        FitOutcome::Failed(reason) => warn!("{}{}: fit failed: {}", sample, request.suffix, reason),
    }

    let double = request.settings.model.is_double();
    let png = workspace.gaussian_plot(sample, &request.suffix, double, "png");
    draw(&png, sample, request, &curve.positions, y, &report);

    Ok(report.outcome)
}

fn draw(png: &Path, sample: &str, request: &FitRequest, x: &[f64], y: &[f64], report: &FitReport) {
    let title = format!("{}{}", sample, request.suffix);
    let figure = FitFigure {
        title: &title,
        x,
        y,
        y_label: if request.absolute { "Frequency" } else { "Relative frequency" },
        fitted: report.outcome.parameters(),
        initial: Some(&report.initial),
        options: request.plot,
    };
    if let Err(e) = plot_fit(png, &figure) {
        warn!("Could not draw {}: {}", png.display(), e);
    }
}
