//! Engine parameter files: lines of `~~@{key}:=:{value}`, everything else kept.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use ngsflow_core::Result;
use ngsflow_core::utils::{AtomicFile, get_dynamic_reader};

use crate::consts::*;

pub fn directive(key: &str, value: &str) -> String {
    format!("{DIRECTIVE_PREFIX}{key}{DIRECTIVE_SEPARATOR}{value}")
}

fn directive_key(line: &str) -> Option<&str> {
    let body = line.strip_prefix(DIRECTIVE_PREFIX)?;
    body.split_once(DIRECTIVE_SEPARATOR).map(|(key, _)| key)
}

///
/// Where the rewritten parameters point the engine.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterValues {
    /// One coverage bedGraph per split, in split order.
    pub datasets: Vec<PathBuf>,
    pub output_directory: PathBuf,
    pub selection: Option<PathBuf>,
}

impl ParameterValues {
    fn dataset_lines(&self) -> Vec<String> {
        self.datasets
            .iter()
            .map(|d| {
                directive(
                    DATASET_PATH,
                    &format!("{}{}{}", REPLICATE_LABEL, DIRECTIVE_SEPARATOR, d.display()),
                )
            })
            .collect()
    }

    fn replacement(&self, key: &str) -> Option<Vec<String>> {
        match key {
            DATASET_PATH => Some(self.dataset_lines()),
            OUTPUT_DIRECTORY => Some(vec![directive(
                OUTPUT_DIRECTORY,
                &self.output_directory.to_string_lossy(),
            )]),
            PREFIX_FILENAME => Some(vec![directive(PREFIX_FILENAME, "")]),
            SELECTION_PATH => Some(vec![directive(
                SELECTION_PATH,
                &self
                    .selection
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_default(),
            )]),
            _ => None,
        }
    }
}

const REWRITTEN: [&str; 4] = [DATASET_PATH, OUTPUT_DIRECTORY, PREFIX_FILENAME, SELECTION_PATH];

///
/// Copy `template` to `output`, replacing the dataset, output directory, prefix
/// and selection directives. Every dataset line of the template is replaced by
/// the whole dataset list at the position of the first one. Directives the
/// template lacks are appended.
///
pub fn rewrite_parameters(template: &Path, output: &Path, values: &ParameterValues) -> Result<()> {
    let reader = get_dynamic_reader(template)?;
    let mut out = AtomicFile::create(output)?;
    let mut written: Vec<&str> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        let key = directive_key(line).and_then(|k| REWRITTEN.iter().find(|r| **r == k).copied());
        match key {
            Some(key) => {
                if written.contains(&key) {
                    continue;
                }
                for replaced in values.replacement(key).unwrap_or_default() {
                    writeln!(out, "{}", replaced)?;
                }
                written.push(key);
            }
            None => writeln!(out, "{}", line)?,
        }
    }

    for key in REWRITTEN.iter().filter(|k| !written.contains(k)) {
        for replaced in values.replacement(key).unwrap_or_default() {
            writeln!(out, "{}", replaced)?;
        }
    }

    out.commit()?;
    Ok(())
}
