use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};

use bigtools::beddata::BedParserStreamingIterator;
use bigtools::utils::reopen::ReopenableFile;
use bigtools::{BigWigRead, BigWigWrite, InputSortType, Value};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use tokio::runtime;

use ngsflow_core::bed::read_regions;
use ngsflow_core::utils::{get_chrom_sizes, read_chrom_sizes, require};
use ngsflow_core::{PipelineError, Result};
use ngsflow_tools::scratch_file;

use crate::consts::{BIGWIG_ZOOMS, MERGE_WINDOW};

///
/// Convert a bedGraph (track line allowed) into a bigWig over the chromosomes
/// of `sizes`. Records on other chromosomes are dropped with a warning.
///
pub fn bedgraph_to_bigwig(bedgraph: &Path, bigwig: &Path, sizes: &Path) -> Result<()> {
    let chrom_map = get_chrom_sizes(sizes)?;
    let (_, regions) = read_regions(bedgraph)?;

    let mut values = Vec::with_capacity(regions.len());
    let mut dropped = 0u64;
    for region in regions {
        if !chrom_map.contains_key(&region.chr) {
            dropped += 1;
            continue;
        }
        let value = region
            .extra(0)
            .and_then(|v| v.trim().parse::<f32>().ok())
            .ok_or_else(|| {
                PipelineError::invalid(format!(
                    "{}: bedGraph record without a value: {}",
                    bedgraph.display(),
                    region
                ))
            })?;
        values.push((
            region.chr,
            Value {
                start: region.start,
                end: region.end,
                value,
            },
        ));
    }
    if dropped > 0 {
        warn!(
            "{}: {} records on chromosomes missing from {}",
            bedgraph.display(),
            dropped,
            sizes.display()
        );
    }

    write_bigwig(bigwig, chrom_map, values.into_iter().map(Ok))
}

///
/// Write `(chromosome, value)` pairs, sorted by start within each chromosome, as
/// a bigWig. Values are pulled from `values` while the file is written and the
/// file appears at `output` only once it is complete.
///
pub fn write_bigwig<I>(output: &Path, chrom_map: HashMap<String, u32>, values: I) -> Result<()>
where
    I: IntoIterator<Item = io::Result<(String, Value)>>,
{
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let partial = scratch_file(dir, ".bw")?;

    let mut outb = BigWigWrite::create_file(partial.to_string_lossy().to_string(), chrom_map)
        .map_err(|e| PipelineError::Signal(format!("{}: {}", output.display(), e)))?;
    outb.options.max_zooms = BIGWIG_ZOOMS;
    outb.options.input_sort_type = InputSortType::START;
    outb.options.channel_size = 0;

    let runtime = runtime::Builder::new_current_thread().build()?;
    let data = BedParserStreamingIterator::wrap_iter(values.into_iter(), true);
    outb.write(data, runtime)
        .map_err(|e| PipelineError::Signal(format!("{}: {}", output.display(), e)))?;

    partial.persist(output).map_err(|e| PipelineError::Io(e.error))?;
    debug!("{} written", output.display());
    Ok(())
}

///
/// Sum bigWig signals base by base over the chromosomes of `sizes`.
///
/// Each input is read over `[0, min(size, length in that bigWig))`; missing
/// values count as zero and chromosomes absent from an input contribute nothing.
/// Runs of equal sum are written as one record and zero runs are left out.
///
pub fn merge_bigwigs(inputs: &[PathBuf], sizes: &Path, output: &Path) -> Result<()> {
    if inputs.is_empty() {
        return Err(PipelineError::invalid("No bigWig files to merge"));
    }
    let chroms = read_chrom_sizes(sizes)?;

    let mut readers = Vec::with_capacity(inputs.len());
    for input in inputs {
        require(input)?;
        let reader = BigWigRead::open_file(&*input.to_string_lossy())
            .map_err(|e| PipelineError::Signal(format!("{}: {}", input.display(), e)))?;
        readers.push((input.clone(), reader));
    }

    let pb = ProgressBar::new(chroms.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("merging [{bar:40}] {pos}/{len} chromosomes")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let chrom_map = chroms.iter().cloned().collect();
    let merged = MergedSignal::new(readers, chroms, pb.clone());
    write_bigwig(output, chrom_map, merged)?;
    pb.finish_and_clear();

    info!("Merged {} bigWig files into {}", inputs.len(), output.display());
    Ok(())
}

///
/// Summed signal of several bigWig files, produced one window of
/// [`MERGE_WINDOW`] bases at a time.
///
struct MergedSignal {
    inputs: Vec<(PathBuf, BigWigRead<ReopenableFile>)>,
    chroms: std::vec::IntoIter<(String, u32)>,
    /// Chromosome being summed, its size and the start of the next window.
    current: Option<(String, u32, u32)>,
    /// Run reaching the end of the last window.
    open: Option<Value>,
    ready: VecDeque<(String, Value)>,
    progress: ProgressBar,
    failed: bool,
}

impl MergedSignal {
    fn new(
        inputs: Vec<(PathBuf, BigWigRead<ReopenableFile>)>,
        chroms: Vec<(String, u32)>,
        progress: ProgressBar,
    ) -> MergedSignal {
        MergedSignal {
            inputs,
            chroms: chroms.into_iter(),
            current: None,
            open: None,
            ready: VecDeque::new(),
            progress,
            failed: false,
        }
    }

    fn window_sums(&mut self, chrom: &str, start: u32, end: u32) -> io::Result<Vec<f32>> {
        let mut sums = vec![0f32; (end - start) as usize];
        for (input, reader) in self.inputs.iter_mut() {
            let length = reader
                .chroms()
                .iter()
                .find(|c| c.name == chrom)
                .map(|c| c.length);
            let stop = match length {
                Some(length) => length.min(end),
                None => {
                    if start == 0 {
                        debug!("No {} in {}", chrom, input.display());
                    }
                    continue;
                }
            };
            if stop <= start {
                continue;
            }
            let signal = reader
                .values(chrom, start, stop)
                .map_err(|e| io::Error::other(format!("{}: {}", input.display(), e)))?;
            for (acc, v) in sums.iter_mut().zip(signal) {
                if !v.is_nan() {
                    *acc += v;
                }
            }
        }
        Ok(sums)
    }
}

impl Iterator for MergedSignal {
    type Item = io::Result<(String, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                return Some(Ok(record));
            }
            if self.failed {
                return None;
            }
            let Some((chrom, size, start)) = self.current.take() else {
                let (chrom, size) = self.chroms.next()?;
                self.current = Some((chrom, size, 0));
                continue;
            };
            if start >= size {
                if let Some(run) = self.open.take() {
                    self.ready.push_back((chrom, run));
                }
                self.progress.inc(1);
                continue;
            }
            let end = start.saturating_add(MERGE_WINDOW).min(size);
            match self.window_sums(&chrom, start, end) {
                Ok(sums) => {
                    push_runs(&chrom, start, &sums, &mut self.open, &mut self.ready);
                    self.current = Some((chrom, size, end));
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

///
/// Extend `open` with `sums` (which start at `offset`), moving every run that
/// ends before the last base into `out`. Zero runs are never opened.
///
fn push_runs(
    chrom: &str,
    offset: u32,
    sums: &[f32],
    open: &mut Option<Value>,
    out: &mut VecDeque<(String, Value)>,
) {
    for (i, &value) in sums.iter().enumerate() {
        let pos = offset + i as u32;
        let extends = matches!(open, Some(run) if run.value == value && run.end == pos);
        if extends {
            if let Some(run) = open.as_mut() {
                run.end = pos + 1;
            }
            continue;
        }
        if let Some(run) = open.take() {
            out.push_back((chrom.to_string(), run));
        }
        if value != 0.0 {
            *open = Some(Value {
                start: pos,
                end: pos + 1,
                value,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::fs;

    #[rstest]
    fn runs_skip_zeros_and_coalesce() {
        let mut open = None;
        let mut out = VecDeque::new();
        push_runs("chr1", 0, &[0.0, 1.0, 1.0, 0.0, 2.5], &mut open, &mut out);
        let runs: Vec<(u32, u32, f32)> = out.iter().map(|(_, v)| (v.start, v.end, v.value)).collect();
        assert_eq!(runs, vec![(1, 3, 1.0)]);
        let last = open.unwrap();
        assert_eq!((last.start, last.end, last.value), (4, 5, 2.5));
    }

    #[rstest]
    fn runs_continue_across_windows() {
        let mut open = None;
        let mut out = VecDeque::new();
        push_runs("chr1", 10, &[0.0, 2.0, 2.0], &mut open, &mut out);
        push_runs("chr1", 13, &[2.0, 3.0], &mut open, &mut out);
        let runs: Vec<(u32, u32, f32)> = out.iter().map(|(_, v)| (v.start, v.end, v.value)).collect();
        assert_eq!(runs, vec![(11, 14, 2.0)]);
        let last = open.unwrap();
        assert_eq!((last.start, last.end, last.value), (14, 15, 3.0));
    }

    #[rstest]
    fn bedgraph_converts_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let sizes = dir.path().join("sizes.txt");
        let bedgraph = dir.path().join("s-cov.bed");
        let bigwig = dir.path().join("s-cov.bw");
        fs::write(&sizes, "chr1\t200\n").unwrap();
        fs::write(
            &bedgraph,
            "track type=bedGraph name=\"s\"\nchr1\t125\t126\t1000000\nchr9\t1\t2\t3\n",
        )
        .unwrap();

        bedgraph_to_bigwig(&bedgraph, &bigwig, &sizes).unwrap();

        let mut reader = BigWigRead::open_file(&*bigwig.to_string_lossy()).unwrap();
        let values = reader.values("chr1", 124, 127).unwrap();
        assert!(values[0].is_nan());
        assert_eq!(values[1], 1_000_000.0);
        assert!(values[2].is_nan());
    }

    #[rstest]
    fn merge_sums_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let sizes = dir.path().join("sizes.txt");
        fs::write(&sizes, "chr1\t50\n").unwrap();

        let a = dir.path().join("a.bed");
        let b = dir.path().join("b.bed");
        fs::write(&a, "chr1\t10\t20\t1\n").unwrap();
        fs::write(&b, "chr1\t15\t25\t2\n").unwrap();
        let a_bw = dir.path().join("a.bw");
        let b_bw = dir.path().join("b.bw");
        bedgraph_to_bigwig(&a, &a_bw, &sizes).unwrap();
        bedgraph_to_bigwig(&b, &b_bw, &sizes).unwrap();

        let merged = dir.path().join("m.bw");
        merge_bigwigs(&[a_bw, b_bw], &sizes, &merged).unwrap();

        let mut reader = BigWigRead::open_file(&*merged.to_string_lossy()).unwrap();
        let values = reader.values("chr1", 9, 26).unwrap();
        assert!(values[0].is_nan());
        assert_eq!(values[1], 1.0);
        assert_eq!(values[6], 3.0);
        assert_eq!(values[11], 2.0);
        assert!(values[16].is_nan());
    }

    #[rstest]
    fn merge_streams_runs_across_windows() {
        let dir = tempfile::tempdir().unwrap();
        let sizes = dir.path().join("sizes.txt");
        fs::write(&sizes, "chr1\t2100000\nchr2\t100\n").unwrap();

        let boundary = MERGE_WINDOW;
        let a = dir.path().join("a.bed");
        let b = dir.path().join("b.bed");
        fs::write(&a, format!("chr1\t{}\t{}\t1\n", boundary - 10, boundary + 10)).unwrap();
        fs::write(&b, format!("chr1\t{}\t{}\t1\nchr2\t5\t6\t4\n", boundary - 5, boundary + 5)).unwrap();
        let a_bw = dir.path().join("a.bw");
        let b_bw = dir.path().join("b.bw");
        bedgraph_to_bigwig(&a, &a_bw, &sizes).unwrap();
        bedgraph_to_bigwig(&b, &b_bw, &sizes).unwrap();

        let merged = dir.path().join("m.bw");
        merge_bigwigs(&[a_bw, b_bw], &sizes, &merged).unwrap();

        let mut reader = BigWigRead::open_file(&*merged.to_string_lossy()).unwrap();
        let values = reader.values("chr1", boundary - 10, boundary + 10).unwrap();
        assert_eq!(values[0], 1.0);
        assert_eq!(values[5], 2.0);
        assert_eq!(values[14], 2.0);
        assert_eq!(values[15], 1.0);
        assert_eq!(reader.values("chr2", 5, 6).unwrap(), vec![4.0]);
    }

    #[rstest]
    fn merge_without_inputs_is_invalid() {
        let err = merge_bigwigs(&[], Path::new("sizes.txt"), Path::new("m.bw")).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }
}
