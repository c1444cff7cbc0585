use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use ngsflow_core::Result;
use ngsflow_core::utils::AtomicFile;

///
/// Gene × split table in the clustering tools' layout:
///
/// ```text
/// UNIQID  Name  100-110  110-120
/// EWEIGHT       1        1
/// g1      g1    2.5      0
/// ```
///
/// A split without output, or without a finite value for a gene, gives `0`.
///
pub fn write_heatmap(
    output: &Path,
    genes: &[&str],
    columns: &[String],
    values: &[Option<HashMap<String, f64>>],
) -> Result<()> {
    let mut out = AtomicFile::create(output)?;

    writeln!(out, "UNIQID\tName\t{}", columns.join("\t"))?;
    let weights = vec!["1"; columns.len()];
    writeln!(out, "EWEIGHT\t\t{}", weights.join("\t"))?;

    for gene in genes {
        let cells: Vec<String> = values
            .iter()
            .map(|split| {
                split
                    .as_ref()
                    .and_then(|v| v.get(*gene))
                    .copied()
                    .filter(|v| v.is_finite())
                    .unwrap_or(0.0)
                    .to_string()
            })
            .collect();
        writeln!(out, "{}\t{}\t{}", gene, gene, cells.join("\t"))?;
    }

    out.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::fs;

    #[rstest]
    fn missing_values_are_zero() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("s-heatmap.txt");
        let first = HashMap::from([("g1".to_string(), 2.5), ("g2".to_string(), 0.0)]);

        write_heatmap(
            &output,
            &["g1", "g2", "g3"],
            &["100-110".to_string(), "110-120".to_string()],
            &[Some(first), None],
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "UNIQID\tName\t100-110\t110-120\n\
             EWEIGHT\t\t1\t1\n\
             g1\tg1\t2.5\t0\n\
             g2\tg2\t0\t0\n\
             g3\tg3\t0\t0\n"
        );
    }

    #[rstest]
    fn non_finite_values_are_zero() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("s-heatmap.txt");
        let split = HashMap::from([
            ("g1".to_string(), f64::NAN),
            ("g2".to_string(), f64::INFINITY),
        ]);

        write_heatmap(&output, &["g1", "g2"], &["100-110".to_string()], &[Some(split)]).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        let rows: Vec<&str> = text.lines().skip(2).collect();
        assert_eq!(rows, vec!["g1\tg1\t0", "g2\tg2\t0"]);
    }
}
