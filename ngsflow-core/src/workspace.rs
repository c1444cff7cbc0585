//! The working directory of a pipeline run and its filename conventions.
//!
//! Every artifact lives directly under the workspace root and is named from the
//! sample (or split) name. Stages ask the workspace for paths instead of
//! formatting file names themselves.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::errors::{PipelineError, Result};
use crate::models::Strand;

///
/// A length-bin subset of a sample, `{sample}-{bin_start}-{bin_end}`.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Split {
    pub sample: String,
    pub bin_start: u32,
    pub bin_end: u32,
}

impl Split {
    pub fn new(sample: &str, bin_start: u32, bin_end: u32) -> Split {
        Split {
            sample: sample.to_string(),
            bin_start,
            bin_end,
        }
    }

    pub fn name(&self) -> String {
        format!("{}-{}-{}", self.sample, self.bin_start, self.bin_end)
    }

    /// `{bin_start}-{bin_end}`, used as a column label.
    pub fn suffix(&self) -> String {
        format!("{}-{}", self.bin_start, self.bin_end)
    }
}

impl Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

///
/// Explicit handle on the directory holding all artifacts.
///
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    splits: RefCell<HashMap<String, Vec<Split>>>,
}

impl Workspace {
    pub fn new<P: AsRef<Path>>(root: P) -> Workspace {
        Workspace {
            root: root.as_ref().to_path_buf(),
            splits: RefCell::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path<S: AsRef<str>>(&self, file_name: S) -> PathBuf {
        self.root.join(file_name.as_ref())
    }

    pub fn raw_bam(&self, sample: &str) -> PathBuf {
        self.path(format!("{sample}-raw.bam"))
    }

    pub fn filtered_bam(&self, sample: &str) -> PathBuf {
        self.path(format!("{sample}-filtered.bam"))
    }

    pub fn dedup_bam(&self, sample: &str) -> PathBuf {
        self.path(format!("{sample}-dedup.bam"))
    }

    pub fn bam(&self, sample: &str) -> PathBuf {
        self.path(format!("{sample}.bam"))
    }

    pub fn bed(&self, sample: &str) -> PathBuf {
        self.path(format!("{sample}.bed"))
    }

    pub fn intersected(&self, sample: &str) -> PathBuf {
        self.path(format!("{sample}-inter.bed"))
    }

    pub fn forcov(&self, sample: &str) -> PathBuf {
        self.path(format!("{sample}-forcov.bed"))
    }

    /// `{sample}-cov.bed`, `-cov-pos.bed` or `-cov-neg.bed`.
    pub fn coverage(&self, sample: &str, strand: Option<Strand>) -> PathBuf {
        self.path(format!("{}.bed", coverage_stem(sample, strand)))
    }

    pub fn bigwig(&self, sample: &str, strand: Option<Strand>) -> PathBuf {
        self.path(format!("{}.bw", coverage_stem(sample, strand)))
    }

    pub fn genes_table(&self, sample: &str, suffix: &str) -> PathBuf {
        self.path(format!("{sample}{suffix}-genes.txt"))
    }

    pub fn dyad_table(&self, sample: &str, suffix: &str) -> PathBuf {
        self.path(format!("{sample}{suffix}-dyad.txt"))
    }

    pub fn dyad_plot(&self, sample: &str, suffix: &str) -> PathBuf {
        self.path(format!("{sample}{suffix}-dyad.png"))
    }

    /// `-dyad-gaussian.{ext}` or `-dyad-double-gaussian.{ext}`.
    pub fn gaussian_plot(&self, sample: &str, suffix: &str, double: bool, ext: &str) -> PathBuf {
        let kind = if double { "double-gaussian" } else { "gaussian" };
        self.path(format!("{sample}{suffix}-dyad-{kind}.{ext}"))
    }

    pub fn heatmap(&self, sample: &str) -> PathBuf {
        self.path(format!("{sample}-heatmap.txt"))
    }

    ///
    /// Read files of a sample following `{sample}_(R?)[12].fastq(.gz)?`, mate 1 first.
    ///
    pub fn reads(&self, sample: &str) -> Result<Vec<PathBuf>> {
        let pattern = Regex::new(&format!(
            r"^{}_(R?)([12])\.fastq(\.gz)?$",
            regex::escape(sample)
        ))
        .map_err(|e| PipelineError::invalid(e.to_string()))?;

        let mut found: Vec<(String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            if let Some(caps) = pattern.captures(&file_name) {
                found.push((caps[2].to_string(), entry.path()));
            }
        }
        found.sort();
        found.dedup_by(|a, b| a.0 == b.0);

        Ok(found.into_iter().map(|(_, p)| p).collect())
    }

    ///
    /// Splits of a sample found on disk, sorted by `bin_start` ascending.
    ///
    /// The listing is cached per sample; stages that create splits call
    /// [`Workspace::invalidate_splits`] afterwards.
    ///
    pub fn splits_of(&self, sample: &str) -> Result<Vec<Split>> {
        if let Some(cached) = self.splits.borrow().get(sample) {
            return Ok(cached.clone());
        }
        let splits = self.scan_splits(sample, ".bed")?;
        self.splits
            .borrow_mut()
            .insert(sample.to_string(), splits.clone());
        Ok(splits)
    }

    pub fn invalidate_splits(&self, sample: &str) {
        self.splits.borrow_mut().remove(sample);
    }

    ///
    /// Uncached scan for `{sample}-\d+-\d+{extension}`.
    ///
    pub fn scan_splits(&self, sample: &str, extension: &str) -> Result<Vec<Split>> {
        let pattern = Regex::new(&format!(
            r"^{}-(\d+)-(\d+){}$",
            regex::escape(sample),
            regex::escape(extension)
        ))
        .map_err(|e| PipelineError::invalid(e.to_string()))?;

        let mut splits = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            if let Some(caps) = pattern.captures(&file_name) {
                let start = caps[1].parse::<u32>();
                let end = caps[2].parse::<u32>();
                match (start, end) {
                    (Ok(start), Ok(end)) if start < end => {
                        splits.push(Split::new(sample, start, end))
                    }
                    _ => continue,
                }
            }
        }
        splits.sort_by_key(|s| (s.bin_start, s.bin_end));

        Ok(splits)
    }
}

fn coverage_stem(sample: &str, strand: Option<Strand>) -> String {
    match strand {
        Some(strand) => format!("{}{}", sample, strand.coverage_marker()),
        None => format!("{}-cov", sample),
    }
}
