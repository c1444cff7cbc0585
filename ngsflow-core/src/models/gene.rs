use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

use crate::errors::{PipelineError, Result};
use crate::manifest::first_column;
use crate::models::strand::Strand;
use crate::utils::get_dynamic_reader;

/// Dyad column value meaning "no dyad position known for this gene".
pub const NO_DYAD: i64 = -1;

///
/// A row of a gene catalog: `(spacer, chromosome, name, TSS, strand, TES[, dyad])`.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Gene {
    pub chromosome: String,
    pub name: String,
    pub tss: i64,
    pub strand: Strand,
    pub tes: i64,
    pub dyad: Option<i64>,
}

impl Gene {
    ///
    /// The dyad coordinate, or `None` when the column is absent or holds the sentinel.
    ///
    pub fn dyad_position(&self) -> Option<i64> {
        self.dyad.filter(|d| *d != NO_DYAD)
    }

    fn parse(line: &str) -> Result<Gene> {
        let columns: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
        if columns.len() < 6 {
            return Err(PipelineError::invalid(format!(
                "Gene catalog row needs at least 6 columns: {:?}",
                line
            )));
        }

        let number = |raw: &str, what: &str| -> Result<i64> {
            raw.trim().parse::<i64>().map_err(|_| {
                PipelineError::invalid(format!("Cannot parse {} in gene row: {:?}", what, line))
            })
        };

        let dyad = match columns.get(6).map(|c| c.trim()) {
            Some(raw) if !raw.is_empty() => Some(number(raw, "dyad position")?),
            _ => None,
        };

        Ok(Gene {
            chromosome: columns[1].to_string(),
            name: columns[2].to_string(),
            tss: number(columns[3], "TSS")?,
            strand: columns[4].parse()?,
            tes: number(columns[5], "TES")?,
            dyad,
        })
    }
}

///
/// Ordered list of genes read from a tab-separated catalog file.
///
#[derive(Debug, Clone, Default)]
pub struct GeneCatalog {
    pub genes: Vec<Gene>,
}

impl GeneCatalog {
    ///
    /// Read a catalog. Comment lines are skipped; a first row whose TSS column is
    /// not numeric is taken as a column header.
    ///
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<GeneCatalog> {
        let path = path.as_ref();
        let reader = get_dynamic_reader(path)?;
        let mut genes = Vec::new();
        let mut first_row = true;

        for line in reader.lines() {
            let line = line?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            if first_row {
                first_row = false;
                let tss = line.split('\t').nth(3).unwrap_or_default();
                if tss.trim().parse::<i64>().is_err() {
                    continue;
                }
            }
            genes.push(Gene::parse(&line)?);
        }

        Ok(GeneCatalog { genes })
    }

    ///
    /// Genes kept by an optional name selection, catalog order preserved.
    ///
    pub fn select<'a>(
        &'a self,
        selection: Option<&'a HashSet<String>>,
    ) -> impl Iterator<Item = &'a Gene> + 'a {
        self.genes
            .iter()
            .filter(move |g| selection.is_none_or(|names| names.contains(&g.name)))
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

///
/// Read a selection list: the first column of every non-comment line.
///
pub fn read_selection<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    Ok(first_column(path.as_ref(), None)?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::fs;

    #[fixture]
    fn catalog_file() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genes.txt");
        fs::write(
            &path,
            "#comment\n\
             spacer\tchromosome\tname\ttss\tstrand\ttes\tdyad\n\
             x\tchrI\tg1\t100\t+\t900\t150\n\
             x\tchrI\tg2\t5000\t-1\t4000\t-1\n\
             x\tchrII\tg3\t10\t1\t300\n",
        )
        .unwrap();
        (dir, path)
    }

    #[rstest]
    fn reads_catalog_with_header(catalog_file: (tempfile::TempDir, std::path::PathBuf)) {
        let catalog = GeneCatalog::from_path(&catalog_file.1).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.genes[0].dyad_position(), Some(150));
        assert_eq!(catalog.genes[1].strand, Strand::Minus);
        assert_eq!(catalog.genes[1].dyad_position(), None);
        assert_eq!(catalog.genes[2].dyad, None);
    }

    #[rstest]
    fn selection_keeps_catalog_order(catalog_file: (tempfile::TempDir, std::path::PathBuf)) {
        let catalog = GeneCatalog::from_path(&catalog_file.1).unwrap();
        let selection: HashSet<String> = ["g3".to_string(), "g1".to_string()].into();
        let names: Vec<&str> = catalog
            .select(Some(&selection))
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(names, vec!["g1", "g3"]);
    }
}
