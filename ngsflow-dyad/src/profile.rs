use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use ngsflow_core::models::{Gene, GeneCatalog, Strand};
use ngsflow_core::utils::{AtomicFile, get_dynamic_reader};
use ngsflow_core::{PipelineError, Result, Workspace};

use crate::consts::*;
use crate::plot::plot_profile;
use crate::signal::{BigWigSignal, SignalSource};

///
/// Window and filters of a dyad profile.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSettings {
    pub min_position: i64,
    pub max_position: i64,
    /// Smoothing window as given by the user; half of it, rounded up, is used.
    pub smoothing: u32,
    /// Plot absolute instead of relative frequency.
    pub absolute: bool,
    /// Appended to the sample name in every output file name.
    pub suffix: String,
    pub selection: Option<HashSet<String>>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        ProfileSettings {
            min_position: DEFAULT_MIN_POSITION,
            max_position: DEFAULT_MAX_POSITION,
            smoothing: 0,
            absolute: false,
            suffix: String::new(),
            selection: None,
        }
    }
}

impl ProfileSettings {
    pub fn half_window(&self) -> i64 {
        (self.smoothing as i64 + 1) / 2
    }

    /// First raw offset, `min_position - half_window`.
    pub fn first_offset(&self) -> i64 {
        self.min_position - self.half_window()
    }

    /// Number of raw offsets per gene.
    pub fn width(&self) -> usize {
        (self.max_position - self.min_position + 2 * self.half_window() + 1) as usize
    }

    fn validate(&self) -> Result<()> {
        if self.min_position > self.max_position {
            return Err(PipelineError::invalid(format!(
                "Minimum position {} is above maximum position {}",
                self.min_position, self.max_position
            )));
        }
        Ok(())
    }
}

///
/// Signal around the dyads of a gene set.
///
#[derive(Debug, Clone, PartialEq)]
pub struct DyadProfile {
    /// Offset of the first raw column.
    pub first_offset: i64,
    /// Per gene, one value per raw offset.
    pub genes: Vec<(String, Vec<f64>)>,
    /// Column sums over genes, one per raw offset.
    pub raw_frequency: Vec<f64>,
    /// Positions `min_position..=max_position`.
    pub positions: Vec<i64>,
    /// Smoothed frequency per position.
    pub frequency: Vec<f64>,
    /// `frequency` divided by its total.
    pub relative_frequency: Vec<f64>,
}

///
/// Signal vector of one gene: offset `p` holds the signal at `d + p` on the
/// positive strand and at `d - p` on the negative strand. Bases outside the
/// chromosome, or without data, are zero.
///
pub fn gene_signal(
    source: &mut dyn SignalSource,
    gene: &Gene,
    dyad: i64,
    settings: &ProfileSettings,
) -> Result<Vec<f64>> {
    let width = settings.width();
    let s = settings.half_window();
    let (lo, hi) = match gene.strand {
        Strand::Plus => (
            dyad + settings.min_position - s,
            dyad + settings.max_position + s + 1,
        ),
        Strand::Minus => (
            dyad - settings.max_position - s,
            dyad - settings.min_position + s + 1,
        ),
    };

    let mut row = vec![0f64; width];
    let length = match source.chrom_length(&gene.chromosome) {
        Some(length) => length as i64,
        None => {
            debug!("{}: chromosome {} has no signal", gene.name, gene.chromosome);
            return Ok(row);
        }
    };
    let start = lo.max(0);
    let end = hi.min(length);
    if start >= end {
        return Ok(row);
    }

    let values = source.values(&gene.chromosome, start as u32, end as u32)?;
    let offset = (start - lo) as usize;
    for (i, v) in values.into_iter().enumerate() {
        if v.is_finite() {
            row[offset + i] = v as f64;
        }
    }
    if gene.strand == Strand::Minus {
        row.reverse();
    }

    Ok(row)
}

///
/// Profile every selected gene of `catalog` that has a dyad position.
///
pub fn profile_genes(
    catalog: &GeneCatalog,
    source: &mut dyn SignalSource,
    settings: &ProfileSettings,
) -> Result<DyadProfile> {
    settings.validate()?;
    let width = settings.width();
    let s = settings.half_window() as usize;

    let mut genes = Vec::new();
    let mut raw_frequency = vec![0f64; width];
    for gene in catalog.select(settings.selection.as_ref()) {
        let Some(dyad) = gene.dyad_position() else {
            continue;
        };
        let row = gene_signal(source, gene, dyad, settings)?;
        for (acc, v) in raw_frequency.iter_mut().zip(&row) {
            *acc += v;
        }
        genes.push((gene.name.clone(), row));
    }

    let positions: Vec<i64> = (settings.min_position..=settings.max_position).collect();
    let frequency: Vec<f64> = (0..positions.len())
        .map(|i| {
            let window = &raw_frequency[i..=i + 2 * s];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect();
    let total: f64 = frequency.iter().sum();
    let relative_frequency = frequency
        .iter()
        .map(|f| if total > 0.0 { f / total } else { 0.0 })
        .collect();

    Ok(DyadProfile {
        first_offset: settings.first_offset(),
        genes,
        raw_frequency,
        positions,
        frequency,
        relative_frequency,
    })
}

///
/// Per-gene table: `Gene` then one column per raw offset.
///
pub fn write_genes_table(path: &Path, profile: &DyadProfile) -> Result<()> {
    let mut out = AtomicFile::create(path)?;
    let width = profile.raw_frequency.len() as i64;
    let header: Vec<String> = (0..width)
        .map(|i| (profile.first_offset + i).to_string())
        .collect();
    writeln!(out, "{}\t{}", GENE_COLUMN, header.join("\t"))?;
    for (name, row) in &profile.genes {
        let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{}\t{}", name, values.join("\t"))?;
    }
    out.commit()?;
    Ok(())
}

///
/// Summary table: `Position`, `Frequency`, `RelativeFrequency`.
///
pub fn write_dyad_table(path: &Path, profile: &DyadProfile) -> Result<()> {
    let mut out = AtomicFile::create(path)?;
    writeln!(
        out,
        "{}\t{}\t{}",
        POSITION_COLUMN, FREQUENCY_COLUMN, RELATIVE_FREQUENCY_COLUMN
    )?;
    for i in 0..profile.positions.len() {
        writeln!(
            out,
            "{}\t{}\t{}",
            profile.positions[i], profile.frequency[i], profile.relative_frequency[i]
        )?;
    }
    out.commit()?;
    Ok(())
}

///
/// A summary table read back: positions with both frequency series.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DyadCurve {
    pub positions: Vec<f64>,
    pub frequency: Vec<f64>,
    pub relative_frequency: Vec<f64>,
}

pub fn read_dyad_table(path: &Path) -> Result<DyadCurve> {
    let reader = get_dynamic_reader(path)?;
    let mut curve = DyadCurve::default();
    let mut columns: Option<(usize, usize, usize)> = None;

    for line in reader.lines() {
        let line = line?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
        let Some((p, f, r)) = columns else {
            let find = |name: &str| {
                fields.iter().position(|c| *c == name).ok_or_else(|| {
                    PipelineError::invalid(format!("{}: no {} column", path.display(), name))
                })
            };
            columns = Some((
                find(POSITION_COLUMN)?,
                find(FREQUENCY_COLUMN)?,
                find(RELATIVE_FREQUENCY_COLUMN)?,
            ));
            continue;
        };
        let number = |i: usize| -> Result<f64> {
            fields
                .get(i)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .ok_or_else(|| {
                    PipelineError::invalid(format!("{}: malformed row {:?}", path.display(), line))
                })
        };
        curve.positions.push(number(p)?);
        curve.frequency.push(number(f)?);
        curve.relative_frequency.push(number(r)?);
    }

    if columns.is_none() {
        return Err(PipelineError::invalid(format!("{}: empty dyad table", path.display())));
    }
    Ok(curve)
}

///
/// Outputs of [`dyad_profile`].
///
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileOutputs {
    pub genes_table: PathBuf,
    pub dyad_table: PathBuf,
    pub plot: PathBuf,
}

///
/// Profile `{sample}-cov.bw` and write the genes table, the summary table and
/// the plot. A plot that cannot be drawn is reported and skipped.
///
pub fn dyad_profile(
    workspace: &Workspace,
    sample: &str,
    catalog: &GeneCatalog,
    settings: &ProfileSettings,
) -> Result<ProfileOutputs> {
    let mut source = BigWigSignal::open(&workspace.bigwig(sample, None))?;
    let profile = profile_genes(catalog, &mut source, settings)?;
    write_profile(workspace, sample, &profile, settings)
}

pub fn write_profile(
    workspace: &Workspace,
    sample: &str,
    profile: &DyadProfile,
    settings: &ProfileSettings,
) -> Result<ProfileOutputs> {
    let outputs = ProfileOutputs {
        genes_table: workspace.genes_table(sample, &settings.suffix),
        dyad_table: workspace.dyad_table(sample, &settings.suffix),
        plot: workspace.dyad_plot(sample, &settings.suffix),
    };
    write_genes_table(&outputs.genes_table, profile)?;
    write_dyad_table(&outputs.dyad_table, profile)?;
    debug!(
        "{} and {} written",
        outputs.genes_table.display(),
        outputs.dyad_table.display()
    );

    let series = if settings.absolute {
        &profile.frequency
    } else {
        &profile.relative_frequency
    };
    let title = format!("{}{}", sample, settings.suffix);
    if let Err(e) = plot_profile(&outputs.plot, &title, &profile.positions, series, settings.absolute) {
        warn!("Could not draw {}: {}", outputs.plot.display(), e);
    }

    info!("{}: dyad profile over {} genes", sample, profile.genes.len());
    Ok(outputs)
}
