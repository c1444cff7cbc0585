use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};

use ngsflow_core::{PipelineError, Result};
use ngsflow_tools::Toolbox;

///
/// Executable overrides, one optional entry per external tool.
///
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    pub bowtie2: Option<String>,
    pub bwa: Option<String>,
    pub samtools: Option<String>,
    pub bedtools: Option<String>,
    #[serde(rename = "fastq-dump")]
    pub fastq_dump: Option<String>,
    pub vap: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Thread budget used when the command line does not give one.
    pub threads: Option<usize>,
}

impl PipelineConfig {
    ///
    /// Read a TOML configuration file.
    ///
    /// # Arguments
    /// - path: path to the config file
    pub fn try_from(path: &Path) -> Result<PipelineConfig> {
        let toml_str = read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::MissingArtifact(path.to_path_buf()),
            _ => PipelineError::Io(e),
        })?;
        let config: PipelineConfig = toml::from_str(&toml_str)
            .map_err(|e| PipelineError::invalid(format!("{}: {}", path.display(), e)))?;

        Ok(config)
    }

    pub fn toolbox(&self) -> Toolbox {
        let t = &self.tools;
        let entries = [
            ("bowtie2", &t.bowtie2),
            ("bwa", &t.bwa),
            ("samtools", &t.samtools),
            ("bedtools", &t.bedtools),
            ("fastq-dump", &t.fastq_dump),
            ("vap", &t.vap),
        ];
        let overrides: HashMap<String, String> = entries
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
            .collect();
        Toolbox::new(overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngsflow_tools::{Samtools, Tool};
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::fs;

    #[rstest]
    fn overrides_reach_the_toolbox() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ngsflow.toml");
        fs::write(
            &path,
            "threads = 4\n\n[tools]\nsamtools = \"/opt/bin/samtools\"\nfastq-dump = \"fasterq\"\n",
        )
        .unwrap();

        let config = PipelineConfig::try_from(&path).unwrap();
        assert_eq!(config.threads, Some(4));
        let toolbox = config.toolbox();
        assert_eq!(toolbox.program(Tool::Samtools(Samtools::Sort)), "/opt/bin/samtools");
        assert_eq!(toolbox.program(Tool::FastqDump), "fasterq");
        assert_eq!(toolbox.program(Tool::Vap), "vap");
    }

    #[rstest]
    #[case("colour = \"blue\"\n")]
    #[case("[tools]\nsamtool = \"x\"\n")]
    fn unknown_keys_are_rejected(#[case] text: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ngsflow.toml");
        fs::write(&path, text).unwrap();
        assert!(matches!(
            PipelineConfig::try_from(&path).unwrap_err(),
            PipelineError::InvalidInput(_)
        ));
    }

    #[rstest]
    fn empty_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ngsflow.toml");
        fs::write(&path, "").unwrap();
        assert_eq!(PipelineConfig::try_from(&path).unwrap(), PipelineConfig::default());
    }
}
