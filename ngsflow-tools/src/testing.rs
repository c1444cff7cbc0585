//! A [`Runner`] that records commands instead of executing them.

use std::cell::RefCell;

use ngsflow_core::{PipelineError, Result};

use crate::runner::Runner;
use crate::tool::ToolCommand;

type Effect = Box<dyn Fn(&ToolCommand) -> Result<()>>;

pub struct RecordingRunner {
    pub calls: RefCell<Vec<ToolCommand>>,
    effect: Option<Effect>,
    fail_on: Option<String>,
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRunner {
    pub fn new() -> RecordingRunner {
        RecordingRunner {
            calls: RefCell::new(vec![]),
            effect: None,
            fail_on: None,
        }
    }

    /// Simulate what the tool would leave on disk.
    pub fn with_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&ToolCommand) -> Result<()> + 'static,
    {
        self.effect = Some(Box::new(effect));
        self
    }

    /// Fail every command whose argument vector contains `word`.
    pub fn failing_on(mut self, word: &str) -> Self {
        self.fail_on = Some(word.to_string());
        self
    }

    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.calls.borrow().iter().map(|c| c.argv()).collect()
    }
}

impl Runner for RecordingRunner {
    fn run(&self, command: &ToolCommand) -> Result<()> {
        self.calls.borrow_mut().push(command.clone());

        if let Some(word) = &self.fail_on {
            if command.argv().iter().any(|a| a == word) {
                return Err(PipelineError::ExternalToolFailed {
                    command: command.argv(),
                    status: Some(1),
                });
            }
        }

        // the real runner always creates the stdout file
        if let Some(stdout) = &command.stdout {
            if !stdout.exists() {
                std::fs::write(stdout, "")?;
            }
        }

        match &self.effect {
            Some(effect) => effect(command),
            None => Ok(()),
        }
    }
}
