//! Stages producing or reshaping a sample's interval records.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use ngsflow_core::bed::{coordinate_order, read_regions, sort, write_regions};
use ngsflow_core::manifest::GroupRow;
use ngsflow_core::models::{Region, is_header_line};
use ngsflow_core::utils::{get_dynamic_reader, require};
use ngsflow_core::{PipelineError, Result};
use ngsflow_tools::{Bedtools, Samtools, Tool, scratch_file};

use crate::consts::{BAM_TO_BED_CMD, INTERSECT_CMD, MERGE_CMD};
use crate::dispatch::{Context, GroupStage, Stage};

///
/// Convert `{sample}.bam` to the sorted interval file `{sample}.bed`. Paired
/// reads become one fragment record per pair.
///
#[derive(Debug, Clone, Default)]
pub struct BamToBed {
    pub paired: bool,
    pub extra_args: Vec<String>,
}

impl Stage for BamToBed {
    fn name(&self) -> &'static str {
        BAM_TO_BED_CMD
    }

    fn run(&mut self, context: &Context, sample: &str) -> Result<()> {
        let ws = &context.workspace;
        let bam = ws.bam(sample);
        require(&bam)?;
        let bed = ws.bed(sample);

        if self.paired {
            let by_name = scratch_file(ws.root(), ".bam")?;
            context.runner.run(
                &context
                    .toolbox
                    .command(Tool::Samtools(Samtools::Sort))
                    .threads(context.threads)
                    .arg("-n")
                    .path_option("-o", &by_name)
                    .path(&bam),
            )?;

            let bedpe = scratch_file(ws.root(), ".bedpe")?;
            context.runner.run(
                &context
                    .toolbox
                    .command(Tool::Bedtools(Bedtools::Bamtobed))
                    .arg("-bedpe")
                    .arg("-mate1")
                    .args(self.extra_args.iter().cloned())
                    .path_option("-i", &by_name)
                    .stdout_to(&bedpe),
            )?;

            let mut records = fragments(&bedpe)?;
            records.sort_by(coordinate_order);
            write_regions(&bed, &[], &records)?;
        } else {
            let unsorted = scratch_file(ws.root(), ".bed")?;
            context.runner.run(
                &context
                    .toolbox
                    .command(Tool::Bedtools(Bedtools::Bamtobed))
                    .args(self.extra_args.iter().cloned())
                    .path_option("-i", &bam)
                    .stdout_to(&unsorted),
            )?;
            sort(&unsorted, &bed)?;
        }
        info!("{}: {}", sample, bed.display());

        Ok(())
    }
}

///
/// One record per BEDPE pair spanning both mates:
/// `(chrom, min(start1, start2), max(end1, end2), name, score, strand1)`.
/// Pairs whose mates lie on different chromosomes are dropped.
///
pub fn fragments(bedpe: &Path) -> Result<Vec<Region>> {
    let reader = get_dynamic_reader(bedpe)?;
    let mut records = Vec::new();
    let mut dropped = 0;

    for line in reader.lines() {
        let line = line?;
        if is_header_line(&line) || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
        if fields.len() < 9 {
            return Err(PipelineError::invalid(format!("Malformed BEDPE record: {:?}", line)));
        }
        if fields[0] != fields[3] || fields[0] == "." {
            dropped += 1;
            continue;
        }
        let coordinate = |i: usize| {
            fields[i]
                .parse::<u32>()
                .map_err(|_| PipelineError::invalid(format!("Malformed BEDPE record: {:?}", line)))
        };
        let (start1, end1, start2, end2) = (coordinate(1)?, coordinate(2)?, coordinate(4)?, coordinate(5)?);

        records.push(Region {
            chr: fields[0].to_string(),
            start: start1.min(start2),
            end: end1.max(end2),
            rest: Some(format!("{}\t{}\t{}", fields[6], fields[7], fields[8])),
        });
    }
    if dropped > 0 {
        debug!("{}: {} pair(s) across chromosomes dropped", bedpe.display(), dropped);
    }

    Ok(records)
}

///
/// Keep the records of `{sample}.bed` overlapping an annotation file, sorted,
/// into `{sample}-inter.bed`.
///
pub struct Intersect {
    pub annotations: PathBuf,
    pub extra_args: Vec<String>,
}

impl Stage for Intersect {
    fn name(&self) -> &'static str {
        INTERSECT_CMD
    }

    fn run(&mut self, context: &Context, sample: &str) -> Result<()> {
        let ws = &context.workspace;
        let bed = ws.bed(sample);
        require(&bed)?;
        require(&self.annotations)?;

        let overlapping = scratch_file(ws.root(), ".bed")?;
        context.runner.run(
            &context
                .toolbox
                .command(Tool::Bedtools(Bedtools::Intersect))
                .arg("-u")
                .args(self.extra_args.iter().cloned())
                .path_option("-a", &bed)
                .path_option("-b", &self.annotations)
                .stdout_to(&overlapping),
        )?;

        let (headers, _) = read_regions(&bed)?;
        let (_, mut records) = read_regions(&overlapping)?;
        records.sort_by(coordinate_order);
        let output = ws.intersected(sample);
        write_regions(&output, &headers, &records)?;
        info!("{}: {} records overlap {}", sample, records.len(), self.annotations.display());

        Ok(())
    }
}

///
/// Concatenate the interval files of a group's members into `{group}.bed`.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeBed;

impl GroupStage for MergeBed {
    fn name(&self) -> &'static str {
        MERGE_CMD
    }

    fn run(&mut self, context: &Context, group: &GroupRow) -> Result<()> {
        let ws = &context.workspace;
        if group.members.is_empty() {
            warn!("{}: no members to merge", group.name);
        }
        let inputs: Vec<PathBuf> = group.members.iter().map(|m| ws.bed(m)).collect();
        for input in &inputs {
            require(input)?;
        }
        let inputs: Vec<&Path> = inputs.iter().map(|p| p.as_path()).collect();
        let output = ws.bed(&group.name);
        ngsflow_core::bed::concat_sorted(&inputs, &output)?;
        info!("{}: merged {} file(s)", group.name, inputs.len());

        Ok(())
    }
}
