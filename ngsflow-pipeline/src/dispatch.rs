//! Walk the samples of a manifest, and their splits, through one stage.

use std::path::{Path, PathBuf};

use log::info;

use ngsflow_core::manifest::{GroupRow, first_column, read_manifest};
use ngsflow_core::{Result, Workspace};
use ngsflow_tools::{Runner, Toolbox};

///
/// What every stage call receives: the workspace, the way to run tools and the
/// shared thread budget.
///
pub struct Context<'r> {
    pub workspace: Workspace,
    pub runner: &'r dyn Runner,
    pub toolbox: Toolbox,
    pub threads: usize,
}

impl<'r> Context<'r> {
    pub fn new(workspace: Workspace, runner: &'r dyn Runner, toolbox: Toolbox, threads: usize) -> Context<'r> {
        Context {
            workspace,
            runner,
            toolbox,
            threads,
        }
    }
}

///
/// One step of the pipeline applied to a sample.
///
pub trait Stage {
    fn name(&self) -> &'static str;

    /// Whether the stage also runs on each split once the sample is done.
    fn walks_splits(&self) -> bool {
        false
    }

    fn run(&mut self, context: &Context, sample: &str) -> Result<()>;

    /// Called once after the last sample.
    fn finish(&mut self, _context: &Context) -> Result<()> {
        Ok(())
    }
}

///
/// A step applied to a group of samples from a merge manifest.
///
pub trait GroupStage {
    fn name(&self) -> &'static str;

    fn run(&mut self, context: &Context, group: &GroupRow) -> Result<()>;
}

///
/// Sample names of a manifest, or only the `index`-th one.
///
pub fn selection(manifest: &Path, index: Option<usize>) -> Result<Vec<String>> {
    first_column(manifest, index)
}

pub struct Dispatcher<'a> {
    context: &'a Context<'a>,
    manifest: PathBuf,
    index: Option<usize>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(context: &'a Context<'a>, manifest: &Path, index: Option<usize>) -> Dispatcher<'a> {
        Dispatcher {
            context,
            manifest: manifest.to_path_buf(),
            index,
        }
    }

    ///
    /// Run `stage` on every selected sample, then on each of its splits when the
    /// stage walks splits. Splits are listed only after the sample itself has
    /// run. The first failure stops the walk. Returns the names visited.
    ///
    pub fn run(&self, stage: &mut dyn Stage) -> Result<Vec<String>> {
        let samples = selection(&self.manifest, self.index)?;
        let mut visited = Vec::new();

        for sample in samples {
            self.visit(stage, &sample)?;
            visited.push(sample.clone());
            if stage.walks_splits() {
                for split in self.context.workspace.splits_of(&sample)? {
                    let name = split.name();
                    self.visit(stage, &name)?;
                    visited.push(name);
                }
            }
        }
        stage.finish(self.context)?;

        Ok(visited)
    }

    ///
    /// Run `stage` on every selected group of a merge manifest.
    ///
    pub fn run_groups(&self, stage: &mut dyn GroupStage) -> Result<Vec<String>> {
        let groups: Vec<GroupRow> = read_manifest(&self.manifest, self.index)?;
        let mut visited = Vec::new();
        for group in groups {
            println!("[{}] {}", stage.name(), group.name);
            info!("{}: {} ({} members)", stage.name(), group.name, group.members.len());
            stage.run(self.context, &group)?;
            visited.push(group.name);
        }
        Ok(visited)
    }

    fn visit(&self, stage: &mut dyn Stage, sample: &str) -> Result<()> {
        println!("[{}] {}", stage.name(), sample);
        info!("{}: {}", stage.name(), sample);
        stage.run(self.context, sample)
    }
}
