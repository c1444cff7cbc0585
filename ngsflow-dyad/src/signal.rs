//! Random-access coverage signal.

use std::collections::HashMap;
use std::path::Path;

use bigtools::BigWigRead;
use bigtools::utils::reopen::ReopenableFile;

use ngsflow_core::bed::read_regions;
use ngsflow_core::utils::{get_chrom_sizes, require};
use ngsflow_core::{PipelineError, Result};

///
/// A per-base signal that can be queried over a chromosome range.
///
pub trait SignalSource {
    /// Length of `chrom`, or `None` when the signal does not know it.
    fn chrom_length(&self, chrom: &str) -> Option<u32>;

    /// One value per base of `[start, end)`; positions without data are NaN.
    fn values(&mut self, chrom: &str, start: u32, end: u32) -> Result<Vec<f32>>;
}

pub struct BigWigSignal {
    reader: BigWigRead<ReopenableFile>,
    name: String,
}

impl BigWigSignal {
    pub fn open(path: &Path) -> Result<BigWigSignal> {
        require(path)?;
        let name = path.to_string_lossy().to_string();
        let reader = BigWigRead::open_file(&name)
            .map_err(|e| PipelineError::Signal(format!("{}: {}", name, e)))?;
        Ok(BigWigSignal { reader, name })
    }
}

impl SignalSource for BigWigSignal {
    fn chrom_length(&self, chrom: &str) -> Option<u32> {
        self.reader
            .chroms()
            .iter()
            .find(|c| c.name == chrom)
            .map(|c| c.length)
    }

    fn values(&mut self, chrom: &str, start: u32, end: u32) -> Result<Vec<f32>> {
        self.reader
            .values(chrom, start, end)
            .map_err(|e| PipelineError::Signal(format!("{} {}:{}-{}: {}", self.name, chrom, start, end, e)))
    }
}

///
/// A bedGraph held in memory, with chromosome lengths from a sizes file.
///
#[derive(Debug, Clone, Default)]
pub struct BedGraphSignal {
    lengths: HashMap<String, u32>,
    intervals: HashMap<String, Vec<(u32, u32, f32)>>,
}

impl BedGraphSignal {
    pub fn new(lengths: HashMap<String, u32>) -> BedGraphSignal {
        BedGraphSignal {
            lengths,
            intervals: HashMap::new(),
        }
    }

    pub fn from_path(bedgraph: &Path, sizes: &Path) -> Result<BedGraphSignal> {
        let mut signal = BedGraphSignal::new(get_chrom_sizes(sizes)?);
        let (_, regions) = read_regions(bedgraph)?;
        for region in regions {
            let value = region
                .extra(0)
                .and_then(|v| v.trim().parse::<f32>().ok())
                .ok_or_else(|| {
                    PipelineError::invalid(format!("bedGraph record without a value: {}", region))
                })?;
            signal.insert(&region.chr, region.start, region.end, value);
        }
        Ok(signal)
    }

    pub fn insert(&mut self, chrom: &str, start: u32, end: u32, value: f32) {
        self.intervals
            .entry(chrom.to_string())
            .or_default()
            .push((start, end, value));
    }
}

impl SignalSource for BedGraphSignal {
    fn chrom_length(&self, chrom: &str) -> Option<u32> {
        self.lengths.get(chrom).copied()
    }

    fn values(&mut self, chrom: &str, start: u32, end: u32) -> Result<Vec<f32>> {
        let mut out = vec![f32::NAN; end.saturating_sub(start) as usize];
        if let Some(intervals) = self.intervals.get(chrom) {
            for &(s, e, value) in intervals {
                let lo = s.max(start);
                let hi = e.min(end);
                for pos in lo..hi {
                    out[(pos - start) as usize] = value;
                }
            }
        }
        Ok(out)
    }
}
