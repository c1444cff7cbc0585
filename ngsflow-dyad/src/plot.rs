//! Line plots of dyad profiles and Gaussian fits.

use std::error::Error;
use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::consts::PLOT_SIZE;
use crate::fit::FitParameters;

type PlotResult = std::result::Result<(), Box<dyn Error>>;

///
/// Which curves a fit plot shows besides the data.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FitPlotOptions {
    pub initial_curve: bool,
    pub components: bool,
    /// Draw components on top of the baseline instead of from zero.
    pub components_with_baseline: bool,
    pub baseline: bool,
    pub svg: bool,
}

///
/// Everything drawn on a fit plot.
///
pub struct FitFigure<'a> {
    pub title: &'a str,
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub y_label: &'a str,
    pub fitted: Option<&'a FitParameters>,
    pub initial: Option<&'a FitParameters>,
    pub options: FitPlotOptions,
}

pub fn plot_profile(path: &Path, title: &str, positions: &[i64], values: &[f64], absolute: bool) -> PlotResult {
    let x: Vec<f64> = positions.iter().map(|p| *p as f64).collect();
    let y_label = if absolute { "Frequency" } else { "Relative frequency" };
    let root = BitMapBackend::new(path, PLOT_SIZE).into_drawing_area();
    draw_lines(&root, title, y_label, &[(x.as_slice(), values, BLACK)])?;
    root.present()?;
    Ok(())
}

///
/// Draw a fit figure to `png`, and to the same path with an `svg` extension
/// when asked.
///
pub fn plot_fit(png: &Path, figure: &FitFigure) -> PlotResult {
    {
        let root = BitMapBackend::new(png, PLOT_SIZE).into_drawing_area();
        draw_fit(&root, figure)?;
        root.present()?;
    }
    if figure.options.svg {
        let svg = png.with_extension("svg");
        let root = SVGBackend::new(&svg, PLOT_SIZE).into_drawing_area();
        draw_fit(&root, figure)?;
        root.present()?;
    }
    Ok(())
}

fn draw_fit<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &FitFigure) -> PlotResult
where
    DB::ErrorType: 'static,
{
    let x = figure.x;
    let mut curves: Vec<(Vec<f64>, RGBColor)> = Vec::new();

    if let (true, Some(initial)) = (figure.options.initial_curve, figure.initial) {
        curves.push((x.iter().map(|v| initial.evaluate(*v)).collect(), GREEN));
    }
    if let Some(fitted) = figure.fitted {
        curves.push((x.iter().map(|v| fitted.evaluate(*v)).collect(), RED));
        if figure.options.components {
            let palette = [BLUE, MAGENTA];
            for (k, color) in (0..fitted.components.len()).zip(palette.iter().cycle()) {
                let offset = if figure.options.components_with_baseline {
                    fitted.baseline
                } else {
                    0.0
                };
                curves.push((
                    x.iter().map(|v| offset + fitted.component(k, *v)).collect(),
                    *color,
                ));
            }
        }
        if figure.options.baseline {
            curves.push((vec![fitted.baseline; x.len()], RGBColor(128, 128, 128)));
        }
    }

    let mut lines: Vec<(&[f64], &[f64], RGBColor)> = vec![(x, figure.y, BLACK)];
    for (values, color) in &curves {
        lines.push((x, values.as_slice(), *color));
    }
    draw_lines(root, figure.title, figure.y_label, &lines)
}

fn draw_lines<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    y_label: &str,
    lines: &[(&[f64], &[f64], RGBColor)],
) -> PlotResult
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let x_range = padded_range(lines.iter().flat_map(|l| l.0.iter().copied()));
    let y_range = padded_range(lines.iter().flat_map(|l| l.1.iter().copied()));

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .margin(10)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Position relative to dyad (bp)")
        .y_desc(y_label)
        .draw()?;

    for (x, y, color) in lines {
        chart.draw_series(LineSeries::new(
            x.iter().copied().zip(y.iter().copied()).filter(|(_, v)| v.is_finite()),
            color,
        ))?;
    }

    Ok(())
}

fn padded_range<I: Iterator<Item = f64>>(values: I) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.05 };
    (lo - pad)..(hi + pad)
}
