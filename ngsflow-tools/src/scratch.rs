use std::path::Path;

use tempfile::TempPath;

use ngsflow_core::Result;

///
/// Reserve a uniquely named file in `dir`. The file is removed when the
/// returned guard is dropped, whichever way the caller exits.
///
pub fn scratch_file(dir: &Path, suffix: &str) -> Result<TempPath> {
    let file = tempfile::Builder::new()
        .prefix(".ngsflow-")
        .suffix(suffix)
        .tempfile_in(dir)?;
    Ok(file.into_temp_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    fn scratch_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let kept_path;
        {
            let scratch = scratch_file(dir.path(), ".bed").unwrap();
            kept_path = scratch.to_path_buf();
            assert!(kept_path.exists());
            assert!(kept_path.to_string_lossy().ends_with(".bed"));
        }
        assert!(!kept_path.exists());
    }

    #[rstest]
    fn scratch_file_is_removed_on_error_path() {
        fn failing(dir: &Path) -> Result<()> {
            let _scratch = scratch_file(dir, ".sam")?;
            Err(ngsflow_core::PipelineError::invalid("boom"))
        }
        let dir = tempfile::tempdir().unwrap();
        assert!(failing(dir.path()).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
