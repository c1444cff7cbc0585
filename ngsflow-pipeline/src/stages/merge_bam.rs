use std::path::PathBuf;

use log::info;

use ngsflow_core::Result;
use ngsflow_core::manifest::GroupRow;
use ngsflow_core::utils::require;
use ngsflow_tools::{Samtools, Tool};

use crate::consts::MERGE_BAM_CMD;
use crate::dispatch::{Context, GroupStage};

///
/// Index the coordinate-sorted `{member}.bam` files of a group and merge them
/// into `{group}.bam`.
///
#[derive(Debug, Clone, Default)]
pub struct MergeBam {
    pub extra_args: Vec<String>,
}

impl GroupStage for MergeBam {
    fn name(&self) -> &'static str {
        MERGE_BAM_CMD
    }

    fn run(&mut self, context: &Context, group: &GroupRow) -> Result<()> {
        let ws = &context.workspace;
        let inputs: Vec<PathBuf> = group.members.iter().map(|m| ws.bam(m)).collect();

        for input in &inputs {
            require(input)?;
            context.runner.run(
                &context
                    .toolbox
                    .command(Tool::Samtools(Samtools::Index))
                    .threads(context.threads)
                    .path(input),
            )?;
        }

        let output = ws.bam(&group.name);
        let mut merge = context
            .toolbox
            .command(Tool::Samtools(Samtools::Merge))
            .threads(context.threads)
            .arg("-f")
            .args(self.extra_args.iter().cloned())
            .path(&output);
        for input in &inputs {
            merge = merge.path(input);
        }
        context.runner.run(&merge)?;
        info!("{}: merged {} BAM file(s)", group.name, inputs.len());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::dispatch::tests::context;
    use ngsflow_core::PipelineError;
    use ngsflow_tools::testing::RecordingRunner;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::fs;

    #[rstest]
    fn index_then_merge() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.bam"), "").unwrap();
        fs::write(root.join("b.bam"), "").unwrap();
        let manifest = root.join("merge.txt");
        fs::write(&manifest, "ab\ta\tb\n").unwrap();
        let runner = RecordingRunner::new();
        let context = context(root, &runner);

        let visited = Dispatcher::new(&context, &manifest, None)
            .run_groups(&mut MergeBam::default())
            .unwrap();

        assert_eq!(visited, vec!["ab"]);
        let subcommands: Vec<String> = runner.argvs().iter().map(|a| a[1].clone()).collect();
        assert_eq!(subcommands, vec!["index", "index", "merge"]);
        let merge = &runner.argvs()[2];
        assert_eq!(merge[2], "-f");
        assert!(merge[3].ends_with("ab.bam"));
        assert!(merge[5].ends_with("b.bam"));
    }

    #[rstest]
    fn missing_member() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let context = context(dir.path(), &runner);
        let group = GroupRow {
            name: "ab".to_string(),
            members: vec!["a".to_string()],
        };
        assert!(matches!(
            MergeBam::default().run(&context, &group).unwrap_err(),
            PipelineError::MissingArtifact(_)
        ));
    }
}
