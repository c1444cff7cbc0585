//! Length splitting and coverage tracks, per sample and per split.

use std::path::PathBuf;

use log::info;

use ngsflow_core::Result;
use ngsflow_core::manifest::GroupRow;
use ngsflow_core::models::Strand;
use ngsflow_core::utils::require;
use ngsflow_coverage::consts::{GENOME_COV_CMD, MERGE_BW_CMD, PREP_COVERAGE_CMD};
use ngsflow_coverage::{CoverageEngine, CoverageOptions, ForcovPolicy, coverage_track, merge_bigwigs, prepare_forcov};
use ngsflow_split::consts::SPLIT_CMD;
use ngsflow_split::{BinSpec, split_sample};

use crate::dispatch::{Context, GroupStage, Stage};

///
/// Partition `{sample}.bed` into length bins.
///
pub struct SplitStage {
    pub spec: BinSpec,
}

impl Stage for SplitStage {
    fn name(&self) -> &'static str {
        SPLIT_CMD
    }

    fn run(&mut self, context: &Context, sample: &str) -> Result<()> {
        split_sample(&context.workspace, sample, &self.spec)?;
        Ok(())
    }
}

///
/// Write `-forcov.bed` for a sample and each of its splits.
///
pub struct PrepCoverage {
    pub policy: ForcovPolicy,
}

impl Stage for PrepCoverage {
    fn name(&self) -> &'static str {
        PREP_COVERAGE_CMD
    }

    fn walks_splits(&self) -> bool {
        true
    }

    fn run(&mut self, context: &Context, sample: &str) -> Result<()> {
        prepare_forcov(&context.workspace, sample, self.policy)?;
        Ok(())
    }
}

///
/// Coverage bedGraph and bigWig for a sample and each of its splits, once per
/// requested strand (`None` is both strands together).
///
pub struct GenomeCov {
    pub sizes: PathBuf,
    pub engine: CoverageEngine,
    pub options: CoverageOptions,
    pub strands: Vec<Option<Strand>>,
}

impl Stage for GenomeCov {
    fn name(&self) -> &'static str {
        GENOME_COV_CMD
    }

    fn walks_splits(&self) -> bool {
        true
    }

    fn run(&mut self, context: &Context, sample: &str) -> Result<()> {
        for strand in &self.strands {
            let options = CoverageOptions {
                strand: *strand,
                ..self.options.clone()
            };
            let track = coverage_track(
                &context.workspace,
                context.runner,
                &context.toolbox,
                sample,
                &self.sizes,
                self.engine,
                &options,
            )?;
            info!("{}: scale {}", track.bigwig.display(), track.scale);
        }
        Ok(())
    }
}

///
/// Sum the bigWig tracks of a group's members into `{group}-cov[-pos|-neg].bw`.
///
pub struct MergeBigWig {
    pub sizes: PathBuf,
    pub strands: Vec<Option<Strand>>,
}

impl GroupStage for MergeBigWig {
    fn name(&self) -> &'static str {
        MERGE_BW_CMD
    }

    fn run(&mut self, context: &Context, group: &GroupRow) -> Result<()> {
        let ws = &context.workspace;
        for strand in &self.strands {
            let inputs: Vec<PathBuf> = group.members.iter().map(|m| ws.bigwig(m, *strand)).collect();
            for input in &inputs {
                require(input)?;
            }
            merge_bigwigs(&inputs, &self.sizes, &ws.bigwig(&group.name, *strand))?;
        }
        Ok(())
    }
}
