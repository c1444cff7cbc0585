use log::info;

use ngsflow_core::Result;
use ngsflow_core::models::GeneCatalog;
use ngsflow_dyad::consts::{DYAD_COV_CMD, FIT_DOUBLE_GAUSSIAN_CMD, FIT_GAUSSIAN_CMD};
use ngsflow_dyad::{FitOutcome, FitRequest, ProfileSettings, dyad_profile, fit_dyad_profile};

use crate::dispatch::{Context, Stage};

///
/// Dyad profile of a sample's coverage, then of each split.
///
pub struct DyadCov {
    pub catalog: GeneCatalog,
    pub settings: ProfileSettings,
}

impl Stage for DyadCov {
    fn name(&self) -> &'static str {
        DYAD_COV_CMD
    }

    fn walks_splits(&self) -> bool {
        true
    }

    fn run(&mut self, context: &Context, sample: &str) -> Result<()> {
        let outputs = dyad_profile(&context.workspace, sample, &self.catalog, &self.settings)?;
        info!("{}: {}", sample, outputs.dyad_table.display());
        Ok(())
    }
}

///
/// Gaussian fit of every dyad table. Failed fits are counted, not raised.
///
pub struct FitGaussian {
    pub request: FitRequest,
    pub failures: Vec<String>,
}

impl FitGaussian {
    pub fn new(request: FitRequest) -> FitGaussian {
        FitGaussian {
            request,
            failures: vec![],
        }
    }
}

impl Stage for FitGaussian {
    fn name(&self) -> &'static str {
        if self.request.settings.model.is_double() {
            FIT_DOUBLE_GAUSSIAN_CMD
        } else {
            FIT_GAUSSIAN_CMD
        }
    }

    fn walks_splits(&self) -> bool {
        true
    }

    fn run(&mut self, context: &Context, sample: &str) -> Result<()> {
        if let FitOutcome::Failed(_) = fit_dyad_profile(&context.workspace, sample, &self.request)? {
            self.failures.push(sample.to_string());
        }
        Ok(())
    }

    fn finish(&mut self, _context: &Context) -> Result<()> {
        if !self.failures.is_empty() {
            info!("{}: no fit for {}", self.name(), self.failures.join(", "));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::dispatch::tests::context;
    use ngsflow_core::PipelineError;
    use ngsflow_dyad::{FitPlotOptions, FitSettings, Model};
    use ngsflow_tools::testing::RecordingRunner;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::fs;

    #[rstest]
    fn profiles_sample_and_splits() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let sizes = root.join("sizes.txt");
        fs::write(&sizes, "chr1\t5000\n").unwrap();
        fs::write(root.join("s.bed"), "").unwrap();
        fs::write(root.join("s-100-110.bed"), "").unwrap();
        for stem in ["s-cov", "s-100-110-cov"] {
            fs::write(root.join(format!("{stem}.bed")), "chr1\t995\t1006\t1\n").unwrap();
            ngsflow_coverage::bedgraph_to_bigwig(
                &root.join(format!("{stem}.bed")),
                &root.join(format!("{stem}.bw")),
                &sizes,
            )
            .unwrap();
        }
        let genes = root.join("genes.txt");
        fs::write(&genes, "x\tchr1\tg1\t900\t+\t1900\t1000\n").unwrap();
        let manifest = root.join("samples.txt");
        fs::write(&manifest, "s\n").unwrap();

        let runner = RecordingRunner::new();
        let context = context(root, &runner);
        let mut stage = DyadCov {
            catalog: GeneCatalog::from_path(&genes).unwrap(),
            settings: ProfileSettings {
                min_position: -5,
                max_position: 5,
                ..Default::default()
            },
        };
        let visited = Dispatcher::new(&context, &manifest, None).run(&mut stage).unwrap();

        assert_eq!(visited, vec!["s", "s-100-110"]);
        assert!(root.join("s-dyad.txt").exists());
        assert!(root.join("s-100-110-genes.txt").exists());
    }

    #[rstest]
    fn stage_name_follows_the_model() {
        let request = |model| FitRequest {
            settings: FitSettings::new(model),
            suffix: String::new(),
            absolute: false,
            plot: FitPlotOptions::default(),
        };
        assert_eq!(FitGaussian::new(request(Model::Single)).name(), "fit-gaussian");
        assert_eq!(FitGaussian::new(request(Model::Double)).name(), "fit-double-gaussian");
    }

    #[rstest]
    fn missing_dyad_table_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let context = context(dir.path(), &runner);
        let mut stage = FitGaussian::new(FitRequest {
            settings: FitSettings::new(Model::Single),
            suffix: String::new(),
            absolute: false,
            plot: FitPlotOptions::default(),
        });
        assert!(matches!(
            stage.run(&context, "s").unwrap_err(),
            PipelineError::MissingArtifact(_)
        ));
    }
}
