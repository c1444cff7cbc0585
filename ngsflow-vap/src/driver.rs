use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use ngsflow_core::consts::DEFAULT_VALUE_COLUMN;
use ngsflow_core::models::{GeneCatalog, read_selection};
use ngsflow_core::utils::require;
use ngsflow_core::{PipelineError, Result, Workspace};
use ngsflow_tools::{Runner, Tool, ToolCommand, Toolbox};

use crate::consts::PARAMETERS_FILE;
use crate::heatmap::write_heatmap;
use crate::output::{find_split_output, read_column};
use crate::params::{ParameterValues, rewrite_parameters};

///
/// Inputs of one aggregation run.
///
#[derive(Debug, Clone, PartialEq)]
pub struct VapRequest {
    /// Engine parameter template.
    pub parameters: PathBuf,
    /// Gene catalog giving the heatmap rows.
    pub genes: PathBuf,
    pub selection: Option<PathBuf>,
    /// Engine output column holding the per-gene value.
    pub value_column: String,
    pub extra_args: Vec<String>,
}

impl VapRequest {
    pub fn new(parameters: PathBuf, genes: PathBuf) -> VapRequest {
        VapRequest {
            parameters,
            genes,
            selection: None,
            value_column: DEFAULT_VALUE_COLUMN.to_string(),
            extra_args: vec![],
        }
    }
}

pub fn vap_command(toolbox: &Toolbox, parameters: &Path, extra: &[String]) -> ToolCommand {
    toolbox
        .command(Tool::Vap)
        .path_option("-p", parameters)
        .args(extra.iter().cloned())
}

///
/// Run the engine over every split of `sample` and merge the per-split values
/// into `{sample}-heatmap.txt`.
///
/// The engine works in the `{sample}` subdirectory, which is removed once the
/// heatmap is written. Splits without output are skipped with a warning; if no
/// split has output the run fails with [`PipelineError::EngineOutputMissing`].
///
pub fn aggregate(
    workspace: &Workspace,
    runner: &dyn Runner,
    toolbox: &Toolbox,
    sample: &str,
    request: &VapRequest,
) -> Result<PathBuf> {
    let splits = workspace.splits_of(sample)?;
    if splits.is_empty() {
        return Err(PipelineError::invalid(format!("{} has no length splits", sample)));
    }
    require(&request.parameters)?;
    let catalog = GeneCatalog::from_path(&request.genes)?;
    let selection = match &request.selection {
        Some(path) => Some(read_selection(path)?),
        None => None,
    };

    let mut datasets = Vec::with_capacity(splits.len());
    for split in &splits {
        let coverage = workspace.coverage(&split.name(), None);
        require(&coverage)?;
        datasets.push(coverage);
    }

    let output_directory = workspace.path(sample);
    fs::create_dir_all(&output_directory)?;
    let parameters = output_directory.join(PARAMETERS_FILE);
    rewrite_parameters(
        &request.parameters,
        &parameters,
        &ParameterValues {
            datasets,
            output_directory: output_directory.clone(),
            selection: request.selection.clone(),
        },
    )?;
    debug!("{} written", parameters.display());

    runner.run(&vap_command(toolbox, &parameters, &request.extra_args))?;

    let mut values: Vec<Option<HashMap<String, f64>>> = Vec::with_capacity(splits.len());
    for split in &splits {
        match find_split_output(&output_directory, &split.name())? {
            Some(path) => values.push(Some(read_column(&path, &request.value_column)?)),
            None => {
                warn!("No engine output for {}", split);
                values.push(None);
            }
        }
    }
    if values.iter().all(|v| v.is_none()) {
        return Err(PipelineError::EngineOutputMissing(sample.to_string()));
    }

    let genes: Vec<&str> = catalog
        .select(selection.as_ref())
        .map(|g| g.name.as_str())
        .collect();
    let columns: Vec<String> = splits.iter().map(|s| s.suffix()).collect();
    let heatmap = workspace.heatmap(sample);
    write_heatmap(&heatmap, &genes, &columns, &values)?;

    fs::remove_dir_all(&output_directory)?;
    info!("{}: heatmap of {} genes over {} splits", sample, genes.len(), splits.len());
    Ok(heatmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngsflow_tools::testing::RecordingRunner;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const GENES: &str = "#id\tchr\tname\ttss\tstrand\ttes\tdyad\n\
        x\tchr1\tg1\t100\t+\t900\t150\n\
        x\tchr1\tg2\t2000\t-\t1500\t1950\n\
        x\tchr2\tg3\t50\t+\t400\t-1\n";

    #[fixture]
    fn workspace() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        for split in ["s-100-110", "s-110-120"] {
            fs::write(ws.bed(split), "").unwrap();
            fs::write(ws.coverage(split, None), "track type=bedGraph\n").unwrap();
        }
        fs::write(ws.path("genes.txt"), GENES).unwrap();
        fs::write(ws.path("template.txt"), "~~@analysis_mode:=:A\n").unwrap();
        (dir, ws)
    }

    fn request(ws: &Workspace) -> VapRequest {
        VapRequest::new(ws.path("template.txt"), ws.path("genes.txt"))
    }

    #[rstest]
    fn heatmap_merges_available_splits(workspace: (tempfile::TempDir, Workspace)) {
        let ws = workspace.1;
        let engine_dir = ws.path("s");
        let runner = RecordingRunner::new().with_effect(move |_| {
            fs::write(
                engine_dir.join("ind_data_s-100-110_x.txt"),
                "Gene\tW0_0\ng1\t2.5\ng2\t0.0\n",
            )?;
            Ok(())
        });

        let heatmap = aggregate(&ws, &runner, &Toolbox::default(), "s", &request(&ws)).unwrap();

        assert_eq!(
            fs::read_to_string(&heatmap).unwrap(),
            "UNIQID\tName\t100-110\t110-120\n\
             EWEIGHT\t\t1\t1\n\
             g1\tg1\t2.5\t0\n\
             g2\tg2\t0\t0\n\
             g3\tg3\t0\t0\n"
        );
        assert!(!ws.path("s").exists());

        let argv = &runner.argvs()[0];
        assert_eq!(argv[0], "vap");
        assert_eq!(argv[1], "-p");
        assert!(argv[2].ends_with("parameters.txt"));
    }

    #[rstest]
    fn unusable_engine_values_are_zero(workspace: (tempfile::TempDir, Workspace)) {
        let ws = workspace.1;
        let engine_dir = ws.path("s");
        let runner = RecordingRunner::new().with_effect(move |_| {
            fs::write(
                engine_dir.join("ind_data_s-100-110.txt"),
                "Gene\tW0_0\ng1\tNA\ng2\t\n",
            )?;
            fs::write(
                engine_dir.join("ind_data_s-110-120.txt"),
                "Gene\tW0_0\ng1\tnan\ng2\t0.5\n",
            )?;
            Ok(())
        });

        let heatmap = aggregate(&ws, &runner, &Toolbox::default(), "s", &request(&ws)).unwrap();

        let content = fs::read_to_string(heatmap).unwrap();
        let rows: Vec<&str> = content.lines().skip(2).collect();
        assert_eq!(rows, vec!["g1\tg1\t0\t0", "g2\tg2\t0\t0.5", "g3\tg3\t0\t0"]);
    }

    #[rstest]
    fn genes_absent_from_engine_output_are_zero(workspace: (tempfile::TempDir, Workspace)) {
        let ws = workspace.1;
        let engine_dir = ws.path("s");
        let runner = RecordingRunner::new().with_effect(move |_| {
            fs::write(
                engine_dir.join("ind_data_s-110-120.txt"),
                "# engine\nGene\tW0_0\ng2\t3\nunknown\t7\n",
            )?;
            Ok(())
        });

        let heatmap = aggregate(&ws, &runner, &Toolbox::default(), "s", &request(&ws)).unwrap();

        let content = fs::read_to_string(heatmap).unwrap();
        let rows: Vec<&str> = content.lines().skip(2).collect();
        assert_eq!(rows, vec!["g1\tg1\t0\t0", "g2\tg2\t0\t3", "g3\tg3\t0\t0"]);
    }

    #[rstest]
    fn engine_output_without_value_column_is_invalid(workspace: (tempfile::TempDir, Workspace)) {
        let ws = workspace.1;
        let engine_dir = ws.path("s");
        let runner = RecordingRunner::new().with_effect(move |_| {
            fs::write(engine_dir.join("ind_data_s-100-110.txt"), "Gene\tW1_0\ng1\t2\n")?;
            Ok(())
        });

        let err = aggregate(&ws, &runner, &Toolbox::default(), "s", &request(&ws)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert!(!ws.heatmap("s").exists());
    }

    #[rstest]
    fn engine_without_output_fails(workspace: (tempfile::TempDir, Workspace)) {
        let ws = workspace.1;
        let err = aggregate(&ws, &RecordingRunner::new(), &Toolbox::default(), "s", &request(&ws))
            .unwrap_err();
        assert!(matches!(err, PipelineError::EngineOutputMissing(_)));
    }

    #[rstest]
    fn selection_filters_rows(workspace: (tempfile::TempDir, Workspace)) {
        let ws = workspace.1;
        fs::write(ws.path("selection.txt"), "g3\ng1\n").unwrap();
        let engine_dir = ws.path("s");
        let runner = RecordingRunner::new().with_effect(move |_| {
            fs::write(
                engine_dir.join("ind_data_s-110-120.txt"),
                "Gene\tW0_0\ng3\t1.25\n",
            )?;
            Ok(())
        });
        let mut request = request(&ws);
        request.selection = Some(ws.path("selection.txt"));

        let heatmap = aggregate(&ws, &runner, &Toolbox::default(), "s", &request).unwrap();
        let content = fs::read_to_string(heatmap).unwrap();
        let rows: Vec<&str> = content.lines().skip(2).collect();
        assert_eq!(rows, vec!["g1\tg1\t0\t0", "g3\tg3\t0\t1.25"]);
    }

    #[rstest]
    fn sample_without_splits_is_invalid(workspace: (tempfile::TempDir, Workspace)) {
        let ws = workspace.1;
        let err = aggregate(&ws, &RecordingRunner::new(), &Toolbox::default(), "t", &request(&ws))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }
}
