//! Tab-separated manifests: `samples`, `merge` and `dataset` files.
//!
//! Lines starting with `#` are comments and blank lines are ignored. No header
//! row is assumed and empty cells are kept as empty strings. Row order is
//! significant because callers may select a single row by index.

use std::io::BufRead;
use std::path::Path;

use log::debug;

use crate::errors::{PipelineError, Result};
use crate::utils::get_dynamic_reader;

///
/// All rows of a manifest, or only the `index`-th one when an index is given.
///
pub fn columns(path: &Path, index: Option<usize>) -> Result<Vec<Vec<String>>> {
    let reader = get_dynamic_reader(path)?;
    let mut rows: Vec<Vec<String>> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.starts_with('#') || line.is_empty() {
            continue;
        }
        rows.push(line.split('\t').map(|c| c.to_string()).collect());
    }

    match index {
        None => Ok(rows),
        Some(i) => {
            let total = rows.len();
            rows.into_iter().nth(i).map(|row| vec![row]).ok_or_else(|| {
                PipelineError::invalid(format!(
                    "Index {} is out of range for {} ({} rows)",
                    i,
                    path.display(),
                    total
                ))
            })
        }
    }
}

///
/// Column 0 of every row (or of the selected row).
///
pub fn first_column(path: &Path, index: Option<usize>) -> Result<Vec<String>> {
    Ok(columns(path, index)?
        .into_iter()
        .map(|mut row| row.swap_remove(0))
        .collect())
}

pub trait ManifestRow: Sized {
    fn from_columns(columns: Vec<String>) -> Result<Self>;

    fn name(&self) -> &str;
}

///
/// Row of a sample manifest: the sample name and an optional SRA accession.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRow {
    pub name: String,
    pub accession: Option<String>,
}

impl ManifestRow for SampleRow {
    fn from_columns(columns: Vec<String>) -> Result<Self> {
        let mut columns = columns.into_iter();
        let name = columns.next().unwrap_or_default();
        if name.is_empty() {
            return Err(PipelineError::invalid("Sample manifest row has no sample name"));
        }
        let accession = columns.next().filter(|a| !a.is_empty());
        Ok(SampleRow { name, accession })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

///
/// Row of a merge or dataset manifest: a group name followed by member samples.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    pub name: String,
    pub members: Vec<String>,
}

impl ManifestRow for GroupRow {
    fn from_columns(columns: Vec<String>) -> Result<Self> {
        let mut columns = columns.into_iter();
        let name = columns.next().unwrap_or_default();
        if name.is_empty() {
            return Err(PipelineError::invalid("Group manifest row has no group name"));
        }
        let members = columns.filter(|m| !m.is_empty()).collect();
        Ok(GroupRow { name, members })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

///
/// Parse a manifest into typed rows.
///
pub fn read_manifest<R: ManifestRow>(path: &Path, index: Option<usize>) -> Result<Vec<R>> {
    let rows = columns(path, index)?
        .into_iter()
        .map(R::from_columns)
        .collect::<Result<Vec<R>>>()?;
    debug!("Read {} rows from {}", rows.len(), path.display());

    Ok(rows)
}
