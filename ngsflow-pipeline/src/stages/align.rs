use std::fmt::{self, Display};
use std::path::PathBuf;
use std::str::FromStr;

use log::{debug, info};

use ngsflow_core::{PipelineError, Result};
use ngsflow_tools::{Samtools, Tool, ToolCommand, scratch_file};

use crate::consts::ALIGN_CMD;
use crate::dispatch::{Context, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aligner {
    #[default]
    Bowtie2,
    Bwa,
}

impl FromStr for Aligner {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bowtie2" => Ok(Aligner::Bowtie2),
            "bwa" => Ok(Aligner::Bwa),
            other => Err(PipelineError::invalid(format!("Unknown aligner: {}", other))),
        }
    }
}

impl Display for Aligner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aligner::Bowtie2 => write!(f, "bowtie2"),
            Aligner::Bwa => write!(f, "bwa"),
        }
    }
}

///
/// Align the reads of a sample and write the coordinate-sorted `{sample}-raw.bam`.
///
pub struct Align {
    pub aligner: Aligner,
    /// Aligner index prefix (bowtie2) or reference FASTA (bwa).
    pub index: PathBuf,
    pub extra_args: Vec<String>,
}

impl Align {
    fn aligner_command(&self, context: &Context, reads: &[PathBuf]) -> Result<ToolCommand> {
        let (mate1, mate2) = match reads {
            [single] => (single, None),
            [first, second] => (first, Some(second)),
            _ => return Err(PipelineError::invalid("Expected one or two read files")),
        };

        let command = match self.aligner {
            Aligner::Bowtie2 => {
                let command = context
                    .toolbox
                    .command(Tool::Bowtie2)
                    .threads(context.threads)
                    .args(self.extra_args.iter().cloned())
                    .path_option("-x", &self.index);
                match mate2 {
                    Some(mate2) => command.path_option("-1", mate1).path_option("-2", mate2),
                    None => command.path_option("-U", mate1),
                }
            }
            Aligner::Bwa => {
                let command = context
                    .toolbox
                    .command(Tool::BwaMem)
                    .threads(context.threads)
                    .args(self.extra_args.iter().cloned())
                    .path(&self.index)
                    .path(mate1);
                match mate2 {
                    Some(mate2) => command.path(mate2),
                    None => command,
                }
            }
        };
        Ok(command)
    }
}

impl Stage for Align {
    fn name(&self) -> &'static str {
        ALIGN_CMD
    }

    fn run(&mut self, context: &Context, sample: &str) -> Result<()> {
        let reads = context.workspace.reads(sample)?;
        if reads.is_empty() {
            return Err(PipelineError::MissingArtifact(
                context.workspace.path(format!("{sample}_1.fastq.gz")),
            ));
        }
        debug!("{}: aligning {:?}", sample, reads);

        let sam = scratch_file(context.workspace.root(), ".sam")?;
        let align = self.aligner_command(context, &reads)?.stdout_to(&sam);
        context.runner.run(&align)?;

        let raw = context.workspace.raw_bam(sample);
        let sort = context
            .toolbox
            .command(Tool::Samtools(Samtools::Sort))
            .threads(context.threads)
            .path_option("-o", &raw)
            .path(&sam);
        context.runner.run(&sort)?;
        info!("{}: {} with {}", sample, raw.display(), self.aligner);

        Ok(())
    }
}
