use std::fmt::{self, Display};

use crate::errors::{PipelineError, Result};
use crate::models::strand::Strand;

/// Prefixes of lines that every rewriter passes through unchanged.
pub const HEADER_PREFIXES: [&str; 3] = ["track", "browser", "#"];

/// Is this line a track/browser/comment header rather than a record?
pub fn is_header_line(line: &str) -> bool {
    HEADER_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

///
/// One interval record of a BED-like file: half-open, 0-based coordinates
/// followed by any number of extra tab-separated columns kept verbatim in `rest`.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct Region {
    pub chr: String,
    pub start: u32,
    pub end: u32,

    pub rest: Option<String>,
}

impl Region {
    ///
    /// Parse a single non-header line.
    ///
    pub fn parse(line: &str) -> Result<Region> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut parts = line.splitn(4, '\t');

        let chr = parts.next().filter(|c| !c.is_empty());
        let start = parts.next().and_then(|s| s.parse::<u32>().ok());
        let end = parts.next().and_then(|s| s.parse::<u32>().ok());

        match (chr, start, end) {
            (Some(chr), Some(start), Some(end)) => Ok(Region {
                chr: chr.to_string(),
                start,
                end,
                rest: parts.next().map(|r| r.to_string()),
            }),
            _ => Err(PipelineError::invalid(format!(
                "Malformed interval record: {:?}",
                line
            ))),
        }
    }

    ///
    /// Length of the interval, or `-1` when `end <= start`.
    ///
    pub fn length(&self) -> i64 {
        if self.end <= self.start {
            -1
        } else {
            (self.end - self.start) as i64
        }
    }

    ///
    /// Extra column by zero-based position within `rest` (name is 0, score 1, strand 2).
    ///
    pub fn extra(&self, index: usize) -> Option<&str> {
        self.rest.as_deref()?.split('\t').nth(index)
    }

    /// Raw text of column 6.
    pub fn strand_field(&self) -> Option<&str> {
        self.extra(2)
    }

    pub fn strand(&self) -> Option<Strand> {
        self.strand_field().and_then(|s| s.parse().ok())
    }

    ///
    /// Copy of this record with column 6 replaced. Records with fewer than six
    /// columns are padded with `.` placeholders.
    ///
    pub fn with_strand(&self, strand: Strand) -> Region {
        let mut extras: Vec<String> = self
            .rest
            .as_deref()
            .map(|r| r.split('\t').map(|s| s.to_string()).collect())
            .unwrap_or_default();
        while extras.len() < 3 {
            extras.push(".".to_string());
        }
        extras[2] = strand.symbol().to_string();

        Region {
            chr: self.chr.clone(),
            start: self.start,
            end: self.end,
            rest: Some(extras.join("\t")),
        }
    }

    ///
    /// The 1 bp record at `floor((start + end) / 2)`, extra columns preserved.
    ///
    pub fn center(&self) -> Region {
        let mid = ((self.start as u64 + self.end as u64) / 2) as u32;
        Region {
            chr: self.chr.clone(),
            start: mid,
            end: mid + 1,
            rest: self.rest.clone(),
        }
    }

    pub fn as_string(&self) -> String {
        format!(
            "{}\t{}\t{}{}",
            self.chr,
            self.start,
            self.end,
            self.rest
                .as_deref()
                .map_or(String::new(), |s| format!("\t{}", s)),
        )
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}
