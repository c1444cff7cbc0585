use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("External tool failed ({}): {}", status_text(.status), .command.join(" "))]
    ExternalToolFailed {
        command: Vec<String>,
        status: Option<i32>,
    },

    #[error("Aggregation engine produced no output for any split of {0}")]
    EngineOutputMissing(String),

    #[error("Curve fit failed: {0}")]
    FitFailed(String),

    #[error("Signal file error: {0}")]
    Signal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn status_text(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl PipelineError {
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        PipelineError::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
