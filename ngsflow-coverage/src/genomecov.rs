use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

use log::warn;

use ngsflow_core::models::{Region, Strand, is_header_line};
use ngsflow_core::utils::{get_dynamic_reader, read_chrom_sizes};
use ngsflow_core::{PipelineError, Result};
use ngsflow_tools::{Bedtools, Tool, ToolCommand, Toolbox};

///
/// Which implementation computes base-pair coverage.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverageEngine {
    /// `bedtools genomecov -bg`
    #[default]
    Bedtools,
    /// The in-process equivalent.
    Native,
}

impl FromStr for CoverageEngine {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bedtools" => Ok(CoverageEngine::Bedtools),
            "native" => Ok(CoverageEngine::Native),
            _ => Err(PipelineError::invalid(format!(
                "Unknown coverage engine '{}', expected bedtools or native",
                s
            ))),
        }
    }
}

impl Display for CoverageEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageEngine::Bedtools => write!(f, "bedtools"),
            CoverageEngine::Native => write!(f, "native"),
        }
    }
}

///
/// Options shared by both engines.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageOptions {
    /// Count only the 5' end of each record.
    pub five_prime: bool,
    /// Count only the 3' end of each record.
    pub three_prime: bool,
    /// Keep only records on this strand.
    pub strand: Option<Strand>,
    /// Explicit scale; counts per million of the input when unset.
    pub scale: Option<f64>,
    /// Appended verbatim to the external command.
    pub extra_args: Vec<String>,
}

///
/// `bedtools genomecov -bg -i {input} -g {sizes} [-5] [-3] [-strand s] -scale x`
///
pub fn genomecov_command(
    toolbox: &Toolbox,
    input: &Path,
    sizes: &Path,
    options: &CoverageOptions,
    scale: f64,
) -> ToolCommand {
    let mut command = toolbox
        .command(Tool::Bedtools(Bedtools::Genomecov))
        .arg("-bg")
        .path_option("-i", input)
        .path_option("-g", sizes);
    if options.five_prime {
        command = command.arg("-5");
    }
    if options.three_prime {
        command = command.arg("-3");
    }
    if let Some(strand) = options.strand {
        command = command.option("-strand", strand.symbol());
    }
    command
        .option("-scale", scale.to_string())
        .args(options.extra_args.iter().cloned())
}

///
/// Base-pair coverage of `input` as bedGraph records, chromosomes in the order
/// of the sizes file, runs of equal depth merged and zero-depth runs omitted.
///
/// Records are clipped to their chromosome; records on chromosomes missing from
/// the sizes file are skipped.
///
pub fn native_genomecov(
    input: &Path,
    sizes: &Path,
    options: &CoverageOptions,
    scale: f64,
) -> Result<Vec<Region>> {
    let chroms = read_chrom_sizes(sizes)?;
    let lengths: HashMap<&str, u32> = chroms.iter().map(|(c, l)| (c.as_str(), *l)).collect();

    let mut events: HashMap<String, Vec<(u32, i64)>> = HashMap::new();
    let mut unknown: HashSet<String> = HashSet::new();

    let reader = get_dynamic_reader(input)?;
    for line in reader.lines() {
        let line = line?;
        if is_header_line(&line) || line.trim().is_empty() {
            continue;
        }
        let region = Region::parse(&line)?;
        let record_strand = region.strand();
        if options.strand.is_some() && record_strand != options.strand {
            continue;
        }
        let Some(&length) = lengths.get(region.chr.as_str()) else {
            if unknown.insert(region.chr.clone()) {
                warn!("{}: chromosome {} not in sizes file", input.display(), region.chr);
            }
            continue;
        };
        if let Some((start, end)) = counted_span(&region, record_strand, options, length) {
            let chrom_events = events.entry(region.chr).or_default();
            chrom_events.push((start, 1));
            chrom_events.push((end, -1));
        }
    }

    let mut records = Vec::new();
    for (chrom, _) in &chroms {
        if let Some(mut chrom_events) = events.remove(chrom) {
            chrom_events.sort_unstable_by_key(|e| e.0);
            sweep(chrom, &chrom_events, scale, &mut records);
        }
    }

    Ok(records)
}

/// The bases a record contributes, clipped to `[0, length)`.
fn counted_span(
    region: &Region,
    strand: Option<Strand>,
    options: &CoverageOptions,
    length: u32,
) -> Option<(u32, u32)> {
    let end = region.end.min(length);
    if region.start >= end {
        return None;
    }
    let reverse = strand == Some(Strand::Minus);
    let (start, end) = if options.five_prime {
        if reverse { (end - 1, end) } else { (region.start, region.start + 1) }
    } else if options.three_prime {
        if reverse { (region.start, region.start + 1) } else { (end - 1, end) }
    } else {
        (region.start, end)
    };
    Some((start, end))
}

fn sweep(chrom: &str, events: &[(u32, i64)], scale: f64, out: &mut Vec<Region>) {
    let mut depth: i64 = 0;
    let mut last = 0u32;
    let mut run: Option<(u32, u32, i64)> = None;

    let mut i = 0;
    while i < events.len() {
        let pos = events[i].0;
        if depth > 0 && pos > last {
            run = match run {
                Some((s, e, d)) if e == last && d == depth => Some((s, pos, d)),
                Some(done) => {
                    out.push(bedgraph_record(chrom, done, scale));
                    Some((last, pos, depth))
                }
                None => Some((last, pos, depth)),
            };
        }
        while i < events.len() && events[i].0 == pos {
            depth += events[i].1;
            i += 1;
        }
        last = pos;
    }
    if let Some(done) = run {
        out.push(bedgraph_record(chrom, done, scale));
    }
}

fn bedgraph_record(chrom: &str, (start, end, depth): (u32, u32, i64), scale: f64) -> Region {
    Region {
        chr: chrom.to_string(),
        start,
        end,
        rest: Some((depth as f64 * scale).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::fs;
    use std::path::PathBuf;

    #[fixture]
    fn sizes() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sizes.txt");
        fs::write(&path, "chr2\t100\nchr1\t200\n").unwrap();
        (dir, path)
    }

    fn coverage(sizes: &Path, bed: &str, options: CoverageOptions, scale: f64) -> Vec<String> {
        let input = sizes.with_file_name("in.bed");
        fs::write(&input, bed).unwrap();
        native_genomecov(&input, sizes, &options, scale)
            .unwrap()
            .iter()
            .map(|r| r.to_string())
            .collect()
    }

    #[rstest]
    fn single_base_record_gets_full_scale(sizes: (tempfile::TempDir, PathBuf)) {
        let out = coverage(
            &sizes.1,
            "chr1\t125\t126\ta\t0\t+\n",
            CoverageOptions::default(),
            1_000_000.0,
        );
        assert_eq!(out, vec!["chr1\t125\t126\t1000000"]);
    }

    #[rstest]
    fn overlapping_records_stack(sizes: (tempfile::TempDir, PathBuf)) {
        let out = coverage(
            &sizes.1,
            "track x\nchr1\t10\t20\nchr1\t15\t25\nchr1\t20\t30\nchr2\t0\t5\n",
            CoverageOptions::default(),
            1.0,
        );
        assert_eq!(
            out,
            vec![
                "chr2\t0\t5\t1",
                "chr1\t10\t15\t1",
                "chr1\t15\t25\t2",
                "chr1\t25\t30\t1",
            ]
        );
    }

    #[rstest]
    fn gaps_are_omitted_and_records_clipped(sizes: (tempfile::TempDir, PathBuf)) {
        let out = coverage(
            &sizes.1,
            "chr2\t10\t20\nchr2\t30\t140\nchrX\t1\t2\n",
            CoverageOptions::default(),
            0.5,
        );
        assert_eq!(out, vec!["chr2\t10\t20\t0.5", "chr2\t30\t100\t0.5"]);
    }

    #[rstest]
    fn five_prime_ends_follow_strand(sizes: (tempfile::TempDir, PathBuf)) {
        let options = CoverageOptions {
            five_prime: true,
            ..Default::default()
        };
        let out = coverage(
            &sizes.1,
            "chr1\t10\t20\ta\t0\t+\nchr1\t10\t20\tb\t0\t-\n",
            options,
            1.0,
        );
        assert_eq!(out, vec!["chr1\t10\t11\t1", "chr1\t19\t20\t1"]);
    }

    #[rstest]
    fn strand_filter_accepts_numeric_encoding(sizes: (tempfile::TempDir, PathBuf)) {
        let options = CoverageOptions {
            strand: Some(Strand::Minus),
            ..Default::default()
        };
        let out = coverage(
            &sizes.1,
            "chr1\t10\t20\ta\t0\t+\nchr1\t30\t40\tb\t0\t-1\n",
            options,
            1.0,
        );
        assert_eq!(out, vec!["chr1\t30\t40\t1"]);
    }

    #[rstest]
    fn external_command_carries_every_flag() {
        let options = CoverageOptions {
            five_prime: true,
            strand: Some(Strand::Plus),
            extra_args: vec!["-max".to_string(), "5".to_string()],
            ..Default::default()
        };
        let command = genomecov_command(
            &Toolbox::default(),
            Path::new("s-forcov.bed"),
            Path::new("sizes.txt"),
            &options,
            0.25,
        );
        assert_eq!(
            command.argv(),
            vec![
                "bedtools", "genomecov", "-bg", "-i", "s-forcov.bed", "-g", "sizes.txt", "-5",
                "-strand", "+", "-scale", "0.25", "-max", "5",
            ]
        );
    }
}
