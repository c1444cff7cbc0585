use std::fs;
use std::path::Path;

use log::{debug, info};

use ngsflow_core::Result;
use ngsflow_core::utils::require;
use ngsflow_tools::{Samtools, Tool, ToolCommand, scratch_file};

use crate::consts::{EXCLUDED_FLAGS, FILTER_BAM_CMD, PROPER_PAIR_FLAG};
use crate::dispatch::{Context, Stage};

///
/// Keep mapped primary alignments of `{sample}-raw.bam`, optionally remove
/// duplicates, and publish the result as the indexed `{sample}.bam`.
///
#[derive(Debug, Clone, Default)]
pub struct FilterBam {
    pub paired: bool,
    pub min_quality: Option<u32>,
    pub dedup: bool,
    pub extra_args: Vec<String>,
}

impl Stage for FilterBam {
    fn name(&self) -> &'static str {
        FILTER_BAM_CMD
    }

    fn run(&mut self, context: &Context, sample: &str) -> Result<()> {
        let ws = &context.workspace;
        let raw = ws.raw_bam(sample);
        require(&raw)?;

        let unsorted = scratch_file(ws.root(), ".bam")?;
        let mut view = context
            .toolbox
            .command(Tool::Samtools(Samtools::View))
            .threads(context.threads)
            .arg("-b");
        if self.paired {
            view = view.option("-f", PROPER_PAIR_FLAG);
        }
        view = view.option("-F", EXCLUDED_FLAGS);
        if let Some(quality) = self.min_quality {
            view = view.option("-q", quality.to_string());
        }
        let view = view
            .args(self.extra_args.iter().cloned())
            .path_option("-o", &unsorted)
            .path(&raw);
        context.runner.run(&view)?;

        let filtered = ws.filtered_bam(sample);
        context.runner.run(&sort_command(context, &filtered, &unsorted, false))?;
        debug!("{} written", filtered.display());

        let last = if self.dedup {
            let dedup = ws.dedup_bam(sample);
            self.remove_duplicates(context, &filtered, &dedup)?;
            dedup
        } else {
            filtered
        };

        let bam = ws.bam(sample);
        fs::copy(&last, &bam)?;
        context.runner.run(
            &context
                .toolbox
                .command(Tool::Samtools(Samtools::Index))
                .threads(context.threads)
                .path(&bam),
        )?;
        info!("{}: {} from {}", sample, bam.display(), last.display());

        Ok(())
    }
}

impl FilterBam {
    /// `sort -n`, `fixmate -m`, `sort`, `markdup -r`.
    fn remove_duplicates(&self, context: &Context, input: &Path, output: &Path) -> Result<()> {
        let root = context.workspace.root();
        let by_name = scratch_file(root, ".bam")?;
        let fixed = scratch_file(root, ".bam")?;
        let by_position = scratch_file(root, ".bam")?;

        context.runner.run(&sort_command(context, &by_name, input, true))?;
        context.runner.run(
            &context
                .toolbox
                .command(Tool::Samtools(Samtools::Fixmate))
                .threads(context.threads)
                .arg("-m")
                .path(&by_name)
                .path(&fixed),
        )?;
        context.runner.run(&sort_command(context, &by_position, &fixed, false))?;
        context.runner.run(
            &context
                .toolbox
                .command(Tool::Samtools(Samtools::Markdup))
                .threads(context.threads)
                .arg("-r")
                .path(&by_position)
                .path(output),
        )?;
        debug!("{} written", output.display());

        Ok(())
    }
}

fn sort_command(context: &Context, output: &Path, input: &Path, by_name: bool) -> ToolCommand {
    let command = context
        .toolbox
        .command(Tool::Samtools(Samtools::Sort))
        .threads(context.threads);
    let command = if by_name { command.arg("-n") } else { command };
    command.path_option("-o", output).path(input)
}
