use clap::{ArgAction, Command, arg, value_parser};

use ngsflow_core::consts::{DEFAULT_MERGE_FILE, DEFAULT_SAMPLES_FILE};
pub use ngsflow_pipeline::consts::*;

use crate::common::{manifest_args, pass_through};

pub fn create_download_cli() -> Command {
    let command = Command::new(DOWNLOAD_CMD)
        .about("Download the reads of each sample from SRA using the accession in the second manifest column.");
    pass_through(manifest_args(command, DEFAULT_SAMPLES_FILE))
}

pub fn create_align_cli() -> Command {
    let command = Command::new(ALIGN_CMD)
        .about("Align reads and write a coordinate-sorted {sample}-raw.bam.")
        .arg(arg!(--genome <PATH> "Aligner index prefix (bowtie2) or reference FASTA (bwa)").required(true))
        .arg(
            arg!(--aligner <ALIGNER> "bowtie2 or bwa")
                .value_parser(["bowtie2", "bwa"])
                .default_value("bowtie2"),
        );
    pass_through(manifest_args(command, DEFAULT_SAMPLES_FILE))
}

pub fn create_filter_bam_cli() -> Command {
    let command = Command::new(FILTER_BAM_CMD)
        .about("Keep mapped primary alignments, optionally remove duplicates, and index {sample}.bam.")
        .arg(arg!(--paired "Reads are paired-end: keep proper pairs only").action(ArgAction::SetTrue))
        .arg(arg!(--dedup "Remove duplicates with samtools markdup").action(ArgAction::SetTrue))
        .arg(
            arg!(--mapq <MAPQ> "Minimum mapping quality")
                .value_parser(value_parser!(u32)),
        );
    pass_through(manifest_args(command, DEFAULT_SAMPLES_FILE))
}

pub fn create_bam_to_bed_cli() -> Command {
    let command = Command::new(BAM_TO_BED_CMD)
        .about("Convert {sample}.bam to the sorted interval file {sample}.bed.")
        .arg(arg!(--paired "One fragment record per read pair").action(ArgAction::SetTrue));
    pass_through(manifest_args(command, DEFAULT_SAMPLES_FILE))
}

pub fn create_merge_bam_cli() -> Command {
    let command = Command::new(MERGE_BAM_CMD)
        .about("Merge the BAM files of each group of a merge manifest into {group}.bam.");
    pass_through(manifest_args(command, DEFAULT_MERGE_FILE))
}

pub fn create_intersect_cli() -> Command {
    let command = Command::new(INTERSECT_CMD)
        .about("Keep intervals overlapping an annotation file, into {sample}-inter.bed.")
        .arg(arg!(--annotations <PATH> "Interval file to intersect with").required(true));
    pass_through(manifest_args(command, DEFAULT_SAMPLES_FILE))
}

pub fn create_statistics_cli() -> Command {
    let command = Command::new(STATISTICS_CMD)
        .about("Tabulate read and interval counts of every sample and split.")
        .arg(arg!(--output <PATH> "Output table").default_value(DEFAULT_STATISTICS_FILE));
    manifest_args(command, DEFAULT_SAMPLES_FILE)
}
