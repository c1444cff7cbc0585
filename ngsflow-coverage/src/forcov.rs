use std::fmt::{self, Display};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, warn};

use ngsflow_core::bed::rewrite;
use ngsflow_core::models::{Region, Strand};
use ngsflow_core::utils::require;
use ngsflow_core::{PipelineError, Result, Workspace};

///
/// How intervals become coverage input records.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcovPolicy {
    /// One 1 bp record at the midpoint of each interval.
    Center,
    /// Every interval once per strand.
    Symmetrize,
}

impl ForcovPolicy {
    pub fn apply(&self, region: Region) -> Vec<Region> {
        match self {
            ForcovPolicy::Center => vec![region.center()],
            ForcovPolicy::Symmetrize => {
                let strand = region.strand().unwrap_or(Strand::Plus);
                vec![region.with_strand(strand), region.with_strand(strand.flip())]
            }
        }
    }
}

impl FromStr for ForcovPolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "center" => Ok(ForcovPolicy::Center),
            "symmetrize" | "both-strands" => Ok(ForcovPolicy::Symmetrize),
            _ => Err(PipelineError::invalid(format!(
                "Unknown forcov policy '{}', expected center or symmetrize",
                s
            ))),
        }
    }
}

impl Display for ForcovPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForcovPolicy::Center => write!(f, "center"),
            ForcovPolicy::Symmetrize => write!(f, "symmetrize"),
        }
    }
}

///
/// Write `{sample}-forcov.bed` from `{sample}.bed`.
///
pub fn prepare_forcov(workspace: &Workspace, sample: &str, policy: ForcovPolicy) -> Result<PathBuf> {
    let input = workspace.bed(sample);
    require(&input)?;
    let output = workspace.forcov(sample);
    apply_policy(&input, &output, policy)?;
    debug!("{} ({}) written", output.display(), policy);
    Ok(output)
}

///
/// Apply a policy to any interval file; header lines are kept.
///
pub fn apply_policy(input: &Path, output: &Path, policy: ForcovPolicy) -> Result<()> {
    rewrite(input, output, |region| policy.apply(region))
}

///
/// The file the coverage engine reads for `sample`: its forcov file, or the raw
/// `.bed` when no forcov file was prepared.
///
pub fn coverage_input(workspace: &Workspace, sample: &str) -> Result<PathBuf> {
    let forcov = workspace.forcov(sample);
    if forcov.exists() {
        return Ok(forcov);
    }
    let bed = workspace.bed(sample);
    require(&bed)?;
    warn!(
        "{} not found, computing coverage from {}",
        forcov.display(),
        bed.display()
    );
    Ok(bed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::fs;

    #[fixture]
    fn workspace() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        (dir, ws)
    }

    #[rstest]
    fn center_policy_emits_midpoints(workspace: (tempfile::TempDir, Workspace)) {
        let ws = workspace.1;
        fs::write(ws.bed("s"), "track name=s\nchr1\t100\t151\ta\t0\t+\n").unwrap();
        let output = prepare_forcov(&ws, "s", ForcovPolicy::Center).unwrap();
        assert_eq!(
            fs::read_to_string(output).unwrap(),
            "track name=s\nchr1\t125\t126\ta\t0\t+\n"
        );
    }

    #[rstest]
    fn symmetrize_policy_emits_both_strands(workspace: (tempfile::TempDir, Workspace)) {
        let ws = workspace.1;
        fs::write(ws.bed("s"), "chr1\t100\t150\ta\t0\t+\n").unwrap();
        let output = prepare_forcov(&ws, "s", ForcovPolicy::Symmetrize).unwrap();
        assert_eq!(
            fs::read_to_string(output).unwrap(),
            "chr1\t100\t150\ta\t0\t+\nchr1\t100\t150\ta\t0\t-\n"
        );
    }

    #[rstest]
    fn symmetrize_pads_unstranded_records() {
        let region = Region::parse("chr2\t5\t9").unwrap();
        let out: Vec<String> = ForcovPolicy::Symmetrize
            .apply(region)
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(out, vec!["chr2\t5\t9\t.\t.\t+", "chr2\t5\t9\t.\t.\t-"]);
    }

    #[rstest]
    fn coverage_input_falls_back_to_raw_bed(workspace: (tempfile::TempDir, Workspace)) {
        let ws = workspace.1;
        fs::write(ws.bed("s"), "chr1\t1\t2\n").unwrap();
        assert_eq!(coverage_input(&ws, "s").unwrap(), ws.bed("s"));

        fs::write(ws.forcov("s"), "chr1\t1\t2\n").unwrap();
        assert_eq!(coverage_input(&ws, "s").unwrap(), ws.forcov("s"));
    }

    #[rstest]
    fn coverage_input_without_any_file_is_missing(workspace: (tempfile::TempDir, Workspace)) {
        let err = coverage_input(&workspace.1, "s").unwrap_err();
        assert!(matches!(err, PipelineError::MissingArtifact(_)));
    }

    #[rstest]
    #[case("center", ForcovPolicy::Center)]
    #[case("symmetrize", ForcovPolicy::Symmetrize)]
    fn policy_from_str(#[case] text: &str, #[case] expected: ForcovPolicy) {
        assert_eq!(text.parse::<ForcovPolicy>().unwrap(), expected);
    }
}
