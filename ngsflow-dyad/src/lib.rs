//! # Dyad profiles
//!
//! Aggregate coverage around per-gene dyad positions and fit the resulting
//! curve with one or two Gaussians on a constant baseline.
//!
//! ```text
//! {sample}-cov.bw ──profile──> {sample}-genes.txt, {sample}-dyad.txt, {sample}-dyad.png
//! {sample}-dyad.txt ──fit──> {sample}-dyad-gaussian.png / -dyad-double-gaussian.png
//! ```
pub mod consts;
pub mod fit;
pub mod plot;
pub mod profile;
pub mod signal;

// Re-exports
pub use fit::{
    ComponentSettings, FitOutcome, FitParameters, FitRequest, FitSettings, Gaussian, Model,
    fit_curve, fit_dyad_profile,
};
pub use plot::FitPlotOptions;
pub use profile::{DyadProfile, ProfileSettings, dyad_profile, profile_genes};
pub use signal::{BedGraphSignal, BigWigSignal, SignalSource};
