use std::io::BufRead;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use ngsflow_core::bed::{coordinate_order, read_regions, sort_by_size, write_regions};
use ngsflow_core::models::{Region, is_header_line};
use ngsflow_core::utils::{get_dynamic_reader, require};
use ngsflow_core::{PipelineError, Result, Split, Workspace};
use ngsflow_tools::scratch_file;

use crate::consts::*;

///
/// Bin geometry: width `bin_length` over lengths `[bin_min, bin_max)`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinSpec {
    pub bin_length: u32,
    pub bin_min: u32,
    pub bin_max: u32,
}

impl Default for BinSpec {
    fn default() -> Self {
        BinSpec {
            bin_length: DEFAULT_BIN_LENGTH,
            bin_min: DEFAULT_BIN_MIN_LENGTH,
            bin_max: DEFAULT_BIN_MAX_LENGTH,
        }
    }
}

impl BinSpec {
    pub fn new(bin_length: u32, bin_min: u32, bin_max: u32) -> Result<BinSpec> {
        if bin_length == 0 {
            return Err(PipelineError::invalid("Bin length must be positive"));
        }
        if bin_min >= bin_max {
            return Err(PipelineError::invalid(format!(
                "Minimum length {} must be below maximum length {}",
                bin_min, bin_max
            )));
        }
        Ok(BinSpec {
            bin_length,
            bin_min,
            bin_max,
        })
    }

    ///
    /// `[b, min(b + w, max))` for `b = min, min + w, ...`; the last bin may be narrower.
    ///
    pub fn bins(&self) -> Vec<(u32, u32)> {
        (self.bin_min..self.bin_max)
            .step_by(self.bin_length as usize)
            .map(|start| (start, start.saturating_add(self.bin_length).min(self.bin_max)))
            .collect()
    }
}

///
/// Partition `{sample}.bed` into one `{sample}-{start}-{end}.bed` per length bin.
///
/// Records are walked once in length order. Each record with
/// `bin_min <= end - start < bin_max` lands in exactly one bin; shorter, longer and
/// degenerate (`end <= start`) records are discarded. Every bin is written, empty
/// bins included, each sorted by (chromosome, start, end) and carrying the
/// sample's header lines.
///
pub fn split_sample(workspace: &Workspace, sample: &str, spec: &BinSpec) -> Result<Vec<Split>> {
    let input = workspace.bed(sample);
    require(&input)?;

    let headers = read_headers(&input)?;
    let by_size = scratch_file(workspace.root(), ".bed")?;
    sort_by_size(&input, &by_size)?;

    let bins = spec.bins();
    let pb = ProgressBar::new(bins.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{bar:40}] {pos}/{len} bins")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_prefix(sample.to_string());

    let mut splits = Vec::with_capacity(bins.len());
    let mut current = 0usize;
    let mut members: Vec<Region> = Vec::new();
    let mut discarded: u64 = 0;

    let (_, sorted) = read_regions(&by_size)?;
    for region in sorted {
        let length = region.length();
        if length < spec.bin_min as i64 || length >= spec.bin_max as i64 {
            discarded += 1;
            continue;
        }
        while length >= bins[current].1 as i64 {
            splits.push(close_bin(workspace, sample, bins[current], &headers, &mut members)?);
            pb.inc(1);
            current += 1;
        }
        members.push(region);
    }
    while current < bins.len() {
        splits.push(close_bin(workspace, sample, bins[current], &headers, &mut members)?);
        pb.inc(1);
        current += 1;
    }
    pb.finish_and_clear();

    info!(
        "{}: {} length bins written, {} records outside [{}, {})",
        sample,
        splits.len(),
        discarded,
        spec.bin_min,
        spec.bin_max
    );
    workspace.invalidate_splits(sample);

    Ok(splits)
}

fn close_bin(
    workspace: &Workspace,
    sample: &str,
    (start, end): (u32, u32),
    headers: &[String],
    members: &mut Vec<Region>,
) -> Result<Split> {
    let split = Split::new(sample, start, end);
    let output = workspace.bed(&split.name());
    members.sort_by(coordinate_order);
    write_regions(&output, headers, members.iter())?;
    debug!("{}: {} records", output.display(), members.len());
    members.clear();
    Ok(split)
}

fn read_headers(path: &Path) -> Result<Vec<String>> {
    let reader = get_dynamic_reader(path)?;
    let mut headers = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if is_header_line(&line) {
            headers.push(line);
        }
    }
    Ok(headers)
}
