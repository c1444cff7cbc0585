use std::fs::File;
use std::process::{Command, Stdio};

use log::debug;

use ngsflow_core::{PipelineError, Result};

use crate::tool::ToolCommand;

///
/// Something able to execute a [`ToolCommand`] to completion.
///
pub trait Runner {
    fn run(&self, command: &ToolCommand) -> Result<()>;
}

///
/// Runs commands as child processes and waits for them.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<()> {
        let argv = command.argv();
        debug!("running: {}", argv.join(" "));

        let mut process = Command::new(&command.program);
        process.args(command.arguments());

        if let Some(dir) = &command.current_dir {
            process.current_dir(dir);
        }

        // the file exists afterwards even if the tool prints nothing
        if let Some(stdout) = &command.stdout {
            debug!("stdout of {} goes to {}", command.program, stdout.display());
            let file = File::create(stdout)?;
            process.stdout(Stdio::from(file));
        }

        let status = process.status().map_err(|e| {
            debug!("could not start {}: {}", command.program, e);
            PipelineError::ExternalToolFailed {
                command: argv.clone(),
                status: None,
            }
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(PipelineError::ExternalToolFailed {
                command: argv,
                status: status.code(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{Tool, ToolCommand};
    use rstest::*;

    #[rstest]
    fn missing_program_is_a_tool_failure() {
        let cmd = ToolCommand::new(Tool::Vap, "ngsflow-no-such-program").arg("-p");
        let err = SystemRunner.run(&cmd).unwrap_err();
        match err {
            PipelineError::ExternalToolFailed { command, status } => {
                assert_eq!(command, vec!["ngsflow-no-such-program", "-p"]);
                assert_eq!(status, None);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
