use std::path::Path;

use ngsflow_core::Result;
use ngsflow_core::bed::count;
use ngsflow_core::consts::BASE_SCALE;
use ngsflow_core::models::Strand;

/// Counts-per-million factor for `count` records.
pub fn normalized_scale(count: u64) -> f64 {
    BASE_SCALE / count.max(1) as f64
}

///
/// The explicit scale if one is given, otherwise the normalized scale of the
/// records in `input` (only those on `strand` when a strand is requested).
///
pub fn resolve_scale(input: &Path, strand: Option<Strand>, explicit: Option<f64>) -> Result<f64> {
    match explicit {
        Some(scale) => Ok(scale),
        None => Ok(normalized_scale(count(input, strand)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::fs;

    #[rstest]
    #[case(0, 1_000_000.0)]
    #[case(1, 1_000_000.0)]
    #[case(4, 250_000.0)]
    fn scale_is_counts_per_million(#[case] n: u64, #[case] expected: f64) {
        assert_eq!(normalized_scale(n), expected);
    }

    #[rstest]
    fn resolve_scale_counts_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.bed");
        fs::write(
            &path,
            "track x\nchr1\t1\t2\ta\t0\t+\nchr1\t3\t4\tb\t0\t-\nchr1\t5\t6\tc\t0\t1\n",
        )
        .unwrap();

        assert_eq!(resolve_scale(&path, None, None).unwrap(), 1_000_000.0 / 3.0);
        assert_eq!(
            resolve_scale(&path, Some(Strand::Plus), None).unwrap(),
            500_000.0
        );
    }

    #[rstest]
    fn explicit_scale_skips_counting() {
        let missing = Path::new("/does/not/exist.bed");
        assert_eq!(resolve_scale(missing, None, Some(2.5)).unwrap(), 2.5);
    }
}
