use std::path::{Path, PathBuf};

use log::{debug, info};

use ngsflow_core::bed::{coordinate_order, read_regions, track_header, write_regions};
use ngsflow_core::utils::require;
use ngsflow_core::{Result, Workspace};
use ngsflow_tools::{Runner, Toolbox, scratch_file};

use crate::bigwig::bedgraph_to_bigwig;
use crate::forcov::coverage_input;
use crate::genomecov::{CoverageEngine, CoverageOptions, genomecov_command, native_genomecov};
use crate::scale::resolve_scale;

///
/// Files produced for one sample (or split) and the scale applied.
///
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageTrack {
    pub bedgraph: PathBuf,
    pub bigwig: PathBuf,
    pub scale: f64,
}

///
/// Compute the normalized coverage of `sample` and write
/// `{sample}-cov[-pos|-neg].bed` with its bigWig twin.
///
pub fn coverage_track(
    workspace: &Workspace,
    runner: &dyn Runner,
    toolbox: &Toolbox,
    sample: &str,
    sizes: &Path,
    engine: CoverageEngine,
    options: &CoverageOptions,
) -> Result<CoverageTrack> {
    require(sizes)?;
    let input = coverage_input(workspace, sample)?;
    let scale = resolve_scale(&input, options.strand, options.scale)?;
    debug!("{}: scale {} from {}", sample, scale, input.display());

    let mut records = match engine {
        CoverageEngine::Bedtools => {
            let raw = scratch_file(workspace.root(), ".bedgraph")?;
            let command = genomecov_command(toolbox, &input, sizes, options, scale).stdout_to(&raw);
            runner.run(&command)?;
            read_regions(&raw)?.1
        }
        CoverageEngine::Native => native_genomecov(&input, sizes, options, scale)?,
    };
    records.sort_by(coordinate_order);

    let bedgraph = workspace.coverage(sample, options.strand);
    write_regions(&bedgraph, &[track_header(sample, options.strand)], &records)?;
    debug!("{} written", bedgraph.display());

    let bigwig = workspace.bigwig(sample, options.strand);
    bedgraph_to_bigwig(&bedgraph, &bigwig, sizes)?;
    info!("{}: coverage track {}", sample, bigwig.display());

    Ok(CoverageTrack {
        bedgraph,
        bigwig,
        scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngsflow_core::models::Strand;
    use ngsflow_tools::testing::RecordingRunner;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::fs;

    use crate::forcov::{ForcovPolicy, prepare_forcov};

    #[fixture]
    fn workspace() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sizes.txt"), "chr1\t200\nchr2\t300\n").unwrap();
        let ws = Workspace::new(dir.path());
        (dir, ws)
    }

    #[rstest]
    fn center_policy_then_native_coverage(workspace: (tempfile::TempDir, Workspace)) {
        let ws = workspace.1;
        fs::write(ws.bed("s"), "chr1\t100\t151\ta\t0\t+\n").unwrap();
        prepare_forcov(&ws, "s", ForcovPolicy::Center).unwrap();

        let track = coverage_track(
            &ws,
            &RecordingRunner::new(),
            &Toolbox::default(),
            "s",
            &ws.path("sizes.txt"),
            CoverageEngine::Native,
            &CoverageOptions::default(),
        )
        .unwrap();

        assert_eq!(track.scale, 1_000_000.0);
        assert_eq!(
            fs::read_to_string(&track.bedgraph).unwrap(),
            "track type=bedGraph name=\"s\"\nchr1\t125\t126\t1000000\n"
        );
        assert!(track.bigwig.exists());
        assert_eq!(track.bigwig, ws.path("s-cov.bw"));
    }

    #[rstest]
    fn external_output_is_sorted_and_labelled(workspace: (tempfile::TempDir, Workspace)) {
        let ws = workspace.1;
        fs::write(
            ws.forcov("s"),
            "chr2\t1\t2\ta\t0\t-\nchr1\t1\t2\tb\t0\t-\nchr1\t5\t6\tc\t0\t+\n",
        )
        .unwrap();
        let runner = RecordingRunner::new().with_effect(|command| {
            if let Some(stdout) = &command.stdout {
                fs::write(stdout, "chr2\t1\t2\t500000\nchr1\t1\t2\t500000\n")?;
            }
            Ok(())
        });

        let options = CoverageOptions {
            strand: Some(Strand::Minus),
            ..Default::default()
        };
        let track = coverage_track(
            &ws,
            &runner,
            &Toolbox::default(),
            "s",
            &ws.path("sizes.txt"),
            CoverageEngine::Bedtools,
            &options,
        )
        .unwrap();

        assert_eq!(track.scale, 500_000.0);
        assert_eq!(track.bedgraph, ws.path("s-cov-neg.bed"));
        assert_eq!(
            fs::read_to_string(&track.bedgraph).unwrap(),
            "track type=bedGraph name=\"s Minus\"\nchr1\t1\t2\t500000\nchr2\t1\t2\t500000\n"
        );

        let argv = &runner.argvs()[0];
        assert!(argv.contains(&"-strand".to_string()));
        assert!(argv.contains(&"500000".to_string()));
    }

    #[rstest]
    fn tool_failure_propagates(workspace: (tempfile::TempDir, Workspace)) {
        let ws = workspace.1;
        fs::write(ws.bed("s"), "chr1\t1\t2\n").unwrap();
        let runner = RecordingRunner::new().failing_on("genomecov");
        let err = coverage_track(
            &ws,
            &runner,
            &Toolbox::default(),
            "s",
            &ws.path("sizes.txt"),
            CoverageEngine::Bedtools,
            &CoverageOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ngsflow_core::PipelineError::ExternalToolFailed { .. }
        ));
        assert!(!ws.coverage("s", None).exists());
    }
}
