mod common;
mod coverage;
mod dyad;
mod logging;
mod prep;
mod vap;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgMatches, Command};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "ngsflow";
    pub const DEFAULT_LOG_FILE: &str = "ngsflow.log";
}

fn build_parser() -> Command {
    let app = Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Sample-by-sample orchestration of MNase-seq, ChIP-exo and CHEC-seq pipelines.")
        .subcommand_required(true)
        .subcommand(prep::cli::create_download_cli())
        .subcommand(prep::cli::create_align_cli())
        .subcommand(prep::cli::create_filter_bam_cli())
        .subcommand(prep::cli::create_bam_to_bed_cli())
        .subcommand(prep::cli::create_merge_bam_cli())
        .subcommand(prep::cli::create_intersect_cli())
        .subcommand(prep::cli::create_statistics_cli())
        .subcommand(coverage::cli::create_split_cli())
        .subcommand(coverage::cli::create_prep_coverage_cli())
        .subcommand(coverage::cli::create_genome_cov_cli())
        .subcommand(coverage::cli::create_merge_cli())
        .subcommand(coverage::cli::create_merge_bw_cli())
        .subcommand(coverage::cli::create_center_annotations_cli())
        .subcommand(dyad::cli::create_dyad_cov_cli())
        .subcommand(dyad::cli::create_fit_gaussian_cli())
        .subcommand(dyad::cli::create_fit_double_gaussian_cli())
        .subcommand(vap::cli::create_vap_cli());
    common::global_args(app)
}

fn log_file(matches: &ArgMatches) -> PathBuf {
    match matches.get_one::<String>("log-file") {
        Some(path) => PathBuf::from(path),
        None => common::workdir(matches).join(consts::DEFAULT_LOG_FILE),
    }
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    let Some((_, verb)) = matches.subcommand() else {
        unreachable!("Subcommand not found")
    };
    logging::init_logging(&log_file(verb))?;

    match matches.subcommand() {
        //
        // READS AND ALIGNMENTS
        //
        Some((prep::cli::DOWNLOAD_CMD, matches)) => prep::handlers::run_download(matches)?,
        Some((prep::cli::ALIGN_CMD, matches)) => prep::handlers::run_align(matches)?,
        Some((prep::cli::FILTER_BAM_CMD, matches)) => prep::handlers::run_filter_bam(matches)?,
        Some((prep::cli::BAM_TO_BED_CMD, matches)) => prep::handlers::run_bam_to_bed(matches)?,
        Some((prep::cli::MERGE_BAM_CMD, matches)) => prep::handlers::run_merge_bam(matches)?,
        Some((prep::cli::INTERSECT_CMD, matches)) => prep::handlers::run_intersect(matches)?,
        Some((prep::cli::STATISTICS_CMD, matches)) => prep::handlers::run_statistics(matches)?,

        //
        // SPLITS AND COVERAGE
        //
        Some((coverage::cli::SPLIT_CMD, matches)) => coverage::handlers::run_split(matches)?,
        Some((coverage::cli::PREP_COVERAGE_CMD, matches)) => {
            coverage::handlers::run_prep_coverage(matches)?
        }
        Some((coverage::cli::GENOME_COV_CMD, matches)) => coverage::handlers::run_genome_cov(matches)?,
        Some((prep::cli::MERGE_CMD, matches)) => coverage::handlers::run_merge(matches)?,
        Some((coverage::cli::MERGE_BW_CMD, matches)) => coverage::handlers::run_merge_bw(matches)?,
        Some((coverage::cli::CENTER_ANNOTATIONS_CMD, matches)) => {
            coverage::handlers::run_center_annotations(matches)?
        }

        //
        // DYAD PROFILES
        //
        Some((dyad::cli::DYAD_COV_CMD, matches)) => dyad::handlers::run_dyad_cov(matches)?,
        Some((dyad::cli::FIT_GAUSSIAN_CMD, matches)) => dyad::handlers::run_fit_gaussian(matches)?,
        Some((dyad::cli::FIT_DOUBLE_GAUSSIAN_CMD, matches)) => {
            dyad::handlers::run_fit_double_gaussian(matches)?
        }

        //
        // HEATMAPS
        //
        Some((vap::cli::VAP_CMD, matches)) => vap::handlers::run_vap(matches)?,

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn parser_is_consistent() {
        build_parser().debug_assert();
    }

    #[rstest]
    fn index_and_pass_through_arguments() {
        let matches = build_parser()
            .try_get_matches_from([
                "ngsflow", "align", "--genome", "ref", "--index", "2", "--threads", "4", "--", "--very-sensitive",
                "-N", "1",
            ])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "align");
        assert_eq!(sub.get_one::<usize>("index"), Some(&2));
        assert_eq!(sub.get_one::<usize>("threads"), Some(&4));
        assert_eq!(common::extra_args(sub), vec!["--very-sensitive", "-N", "1"]);
        assert_eq!(sub.get_one::<String>("samples").unwrap(), "samples.txt");
    }

    #[rstest]
    fn strands_parse_both_encodings() {
        let matches = build_parser()
            .try_get_matches_from([
                "ngsflow", "genome-cov", "--sizes", "s.txt", "--strand", "+", "--strand", "-1",
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let strands = common::strands(sub).unwrap();
        assert_eq!(
            strands,
            vec![
                Some(ngsflow_core::models::Strand::Plus),
                Some(ngsflow_core::models::Strand::Minus)
            ]
        );
    }

    #[rstest]
    fn merge_verbs_default_to_the_merge_manifest() {
        let matches = build_parser()
            .try_get_matches_from(["ngsflow", "merge-bw", "--sizes", "s.txt"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(sub.get_one::<String>("samples").unwrap(), "merge.txt");
        assert_eq!(common::strands(sub).unwrap(), vec![None]);
    }

    #[rstest]
    fn negative_offsets_are_accepted() {
        let matches = build_parser()
            .try_get_matches_from(["ngsflow", "dyad-cov", "--genes", "g.txt", "--min-position", "-40"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(sub.get_one::<i64>("min-position"), Some(&-40));
    }

    #[rstest]
    fn log_file_defaults_to_the_workdir() {
        let matches = build_parser()
            .try_get_matches_from(["ngsflow", "merge", "--workdir", "/data/run"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(log_file(sub), PathBuf::from("/data/run/ngsflow.log"));
    }
}
