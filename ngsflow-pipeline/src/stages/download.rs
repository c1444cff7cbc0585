use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info};

use ngsflow_core::manifest::{SampleRow, read_manifest};
use ngsflow_core::{PipelineError, Result};
use ngsflow_tools::Tool;

use crate::consts::DOWNLOAD_CMD;
use crate::dispatch::{Context, Stage};

///
/// Fetch the reads of each sample from SRA with `fastq-dump` and rename them
/// after the sample.
///
pub struct Download {
    accessions: HashMap<String, Option<String>>,
    extra_args: Vec<String>,
}

impl Download {
    pub fn from_manifest(manifest: &Path, extra_args: Vec<String>) -> Result<Download> {
        let rows: Vec<SampleRow> = read_manifest(manifest, None)?;
        Ok(Download {
            accessions: rows.into_iter().map(|r| (r.name, r.accession)).collect(),
            extra_args,
        })
    }
}

impl Stage for Download {
    fn name(&self) -> &'static str {
        DOWNLOAD_CMD
    }

    fn run(&mut self, context: &Context, sample: &str) -> Result<()> {
        let accession = self
            .accessions
            .get(sample)
            .cloned()
            .flatten()
            .ok_or_else(|| PipelineError::invalid(format!("{} has no SRA accession", sample)))?;
        let root = context.workspace.root();

        let command = context
            .toolbox
            .command(Tool::FastqDump)
            .arg("--split-files")
            .arg("--gzip")
            .args(self.extra_args.iter().cloned())
            .arg(accession.as_str())
            .current_dir(root);
        context.runner.run(&command)?;

        let mut renamed = 0;
        for mate in ["1", "2"] {
            let dumped = context.workspace.path(format!("{accession}_{mate}.fastq.gz"));
            if dumped.exists() {
                let target = context.workspace.path(format!("{sample}_{mate}.fastq.gz"));
                fs::rename(&dumped, &target)?;
                debug!("{} -> {}", dumped.display(), target.display());
                renamed += 1;
            }
        }
        if renamed == 0 {
            return Err(PipelineError::MissingArtifact(
                context.workspace.path(format!("{accession}_1.fastq.gz")),
            ));
        }
        info!("{}: {} read file(s) from {}", sample, renamed, accession);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::tests::context;
    use ngsflow_tools::testing::RecordingRunner;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn manifest(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("samples.txt");
        fs::write(&path, "wt\tSRR100\nmutant\n").unwrap();
        path
    }

    #[rstest]
    fn dumps_and_renames_mates() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new().with_effect(|cmd| {
            let root = cmd.current_dir.clone().unwrap();
            fs::write(root.join("SRR100_1.fastq.gz"), "")?;
            fs::write(root.join("SRR100_2.fastq.gz"), "")?;
            Ok(())
        });
        let context = context(dir.path(), &runner);
        let mut stage = Download::from_manifest(&manifest(dir.path()), vec![]).unwrap();

        stage.run(&context, "wt").unwrap();

        assert_eq!(
            runner.argvs(),
            vec![vec!["fastq-dump", "--split-files", "--gzip", "SRR100"]]
        );
        assert!(dir.path().join("wt_1.fastq.gz").exists());
        assert!(dir.path().join("wt_2.fastq.gz").exists());
        assert!(!dir.path().join("SRR100_1.fastq.gz").exists());
    }

    #[rstest]
    fn sample_without_accession_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let context = context(dir.path(), &runner);
        let mut stage = Download::from_manifest(&manifest(dir.path()), vec![]).unwrap();

        let err = stage.run(&context, "mutant").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert!(runner.argvs().is_empty());
    }

    #[rstest]
    fn nothing_dumped_is_a_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let context = context(dir.path(), &runner);
        let mut stage = Download::from_manifest(&manifest(dir.path()), vec![]).unwrap();
        assert!(matches!(
            stage.run(&context, "wt").unwrap_err(),
            PipelineError::MissingArtifact(_)
        ));
    }
}
