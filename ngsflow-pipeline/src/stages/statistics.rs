use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use ngsflow_core::bed::count;
use ngsflow_core::utils::{AtomicFile, get_dynamic_reader};
use ngsflow_core::{PipelineError, Result};
use ngsflow_tools::{Samtools, Tool, scratch_file};

use crate::consts::STATISTICS_CMD;
use crate::dispatch::{Context, Stage};

pub const STATISTICS_HEADER: [&str; 6] = [
    "Sample",
    "Total reads",
    "Mapped reads",
    "Filtered reads",
    "Deduplicated reads",
    "Intervals",
];

///
/// Read and record counts of each sample and its splits, written as one table
/// once every sample is done. Counts of missing artifacts are left empty.
///
pub struct Statistics {
    pub output: PathBuf,
    rows: Vec<[String; 6]>,
}

impl Statistics {
    pub fn new(output: PathBuf) -> Statistics {
        Statistics { output, rows: vec![] }
    }

    fn samtools_count(&self, context: &Context, bam: &Path, mapped_only: bool) -> Result<Option<u64>> {
        if !bam.exists() {
            return Ok(None);
        }
        let counted = scratch_file(context.workspace.root(), ".txt")?;
        let mut command = context
            .toolbox
            .command(Tool::Samtools(Samtools::View))
            .threads(context.threads)
            .arg("-c");
        if mapped_only {
            command = command.option("-F", "4");
        }
        context.runner.run(&command.path(bam).stdout_to(&counted))?;

        let text = fs::read_to_string(&counted)?;
        let n = text.trim().parse::<u64>().map_err(|_| {
            PipelineError::invalid(format!("samtools view -c printed {:?} for {}", text.trim(), bam.display()))
        })?;
        Ok(Some(n))
    }
}

///
/// Number of records in a FASTQ file, gzip or not.
///
pub fn fastq_records(path: &Path) -> Result<u64> {
    let reader = get_dynamic_reader(path)?;
    let mut lines = 0;
    for line in reader.lines() {
        if !line?.is_empty() {
            lines += 1;
        }
    }
    Ok(lines / 4)
}

fn cell(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn intervals(path: &Path) -> Result<Option<u64>> {
    if path.exists() {
        Ok(Some(count(path, None)?))
    } else {
        Ok(None)
    }
}

impl Stage for Statistics {
    fn name(&self) -> &'static str {
        STATISTICS_CMD
    }

    fn run(&mut self, context: &Context, sample: &str) -> Result<()> {
        let ws = &context.workspace;

        // mate 1 only: one record per fragment
        let total = match ws.reads(sample)?.first() {
            Some(reads) => Some(fastq_records(reads)?),
            None => None,
        };
        let mapped = self.samtools_count(context, &ws.raw_bam(sample), true)?;
        let filtered = self.samtools_count(context, &ws.filtered_bam(sample), false)?;
        let dedup = self.samtools_count(context, &ws.dedup_bam(sample), false)?;

        self.rows.push([
            sample.to_string(),
            cell(total),
            cell(mapped),
            cell(filtered),
            cell(dedup),
            cell(intervals(&ws.bed(sample))?),
        ]);
        for split in ws.splits_of(sample)? {
            let name = split.name();
            let n = intervals(&ws.bed(&name))?;
            self.rows.push([name, String::new(), String::new(), String::new(), String::new(), cell(n)]);
        }
        debug!("{}: {:?}", sample, self.rows.last());

        Ok(())
    }

    fn finish(&mut self, _context: &Context) -> Result<()> {
        let mut out = AtomicFile::create(&self.output)?;
        writeln!(out, "{}", STATISTICS_HEADER.join("\t"))?;
        for row in &self.rows {
            writeln!(out, "{}", row.join("\t"))?;
        }
        out.commit()?;
        info!("{} rows written to {}", self.rows.len(), self.output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::dispatch::tests::context;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use ngsflow_tools::testing::RecordingRunner;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const FASTQ: &str = "@r1\nACGT\n+\nIIII\n@r2\nACGT\n+\nIIII\n@r3\nAC\n+\nII\n";

    #[rstest]
    fn gzipped_fastq_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s_1.fastq.gz");
        let mut encoder = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
        encoder.write_all(FASTQ.as_bytes()).unwrap();
        encoder.finish().unwrap();

        assert_eq!(fastq_records(&path).unwrap(), 3);
    }

    #[rstest]
    fn table_of_samples_and_splits() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("s_R1.fastq"), FASTQ).unwrap();
        fs::write(root.join("s-raw.bam"), "").unwrap();
        fs::write(root.join("s-filtered.bam"), "").unwrap();
        fs::write(root.join("s.bed"), "track name=s\nchr1\t1\t60\nchr1\t5\t70\n").unwrap();
        fs::write(root.join("s-50-60.bed"), "chr1\t1\t60\n").unwrap();
        let manifest = root.join("samples.txt");
        fs::write(&manifest, "s\n").unwrap();
        let runner = RecordingRunner::new().with_effect(|cmd| {
            if let Some(stdout) = &cmd.stdout {
                let n = if cmd.argv().iter().any(|a| a == "-F") { "7" } else { "5" };
                fs::write(stdout, format!("{n}\n"))?;
            }
            Ok(())
        });
        let context = context(root, &runner);
        let output = root.join("statistics.txt");

        Dispatcher::new(&context, &manifest, None)
            .run(&mut Statistics::new(output.clone()))
            .unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "Sample\tTotal reads\tMapped reads\tFiltered reads\tDeduplicated reads\tIntervals\n\
             s\t3\t7\t5\t\t2\n\
             s-50-60\t\t\t\t\t1\n"
        );
        assert_eq!(runner.argvs().len(), 2);
    }
}
