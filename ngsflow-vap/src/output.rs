//! Per-split engine output files.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use glob::{Pattern, glob};
use log::warn;

use ngsflow_core::utils::get_dynamic_reader;
use ngsflow_core::{PipelineError, Result};

///
/// First file under `dir` (at any depth) named `ind_data_{split}*.txt`, where the
/// split name is not continued by another digit.
///
pub fn find_split_output(dir: &Path, split: &str) -> Result<Option<PathBuf>> {
    let pattern = format!(
        "{}/**/ind_data_{}*.txt",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(split)
    );
    let prefix = format!("ind_data_{}", split);

    let mut found = Vec::new();
    for entry in glob(&pattern).map_err(|e| PipelineError::invalid(e.to_string()))? {
        let path = entry.map_err(|e| PipelineError::Io(e.into_error()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let continued = name[prefix.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit());
        if !continued {
            found.push(path);
        }
    }
    found.sort();
    Ok(found.into_iter().next())
}

///
/// Map each row's first column (the gene) to its value in `column`.
/// Comment lines are skipped and the first remaining line is the header.
/// Rows whose value is missing, non-numeric or not finite are left out.
///
pub fn read_column(path: &Path, column: &str) -> Result<HashMap<String, f64>> {
    let reader = get_dynamic_reader(path)?;
    let mut index: Option<usize> = None;
    let mut values = HashMap::new();

    for line in reader.lines() {
        let line = line?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
        let Some(i) = index else {
            index = Some(fields.iter().position(|f| *f == column).ok_or_else(|| {
                PipelineError::invalid(format!("{}: no {} column", path.display(), column))
            })?);
            continue;
        };
        match fields.get(i).and_then(|v| v.trim().parse::<f64>().ok()) {
            Some(value) if value.is_finite() => {
                values.insert(fields[0].to_string(), value);
            }
            _ => warn!(
                "{}: no numeric {} for {}, counted as 0",
                path.display(),
                column,
                fields[0]
            ),
        }
    }

    Ok(values)
}
