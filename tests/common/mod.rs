// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fake host shared by the integration tests.

#![allow(dead_code)]

use chaos_agent::env::{Environment, ProcessEntry};
use chaos_agent::error::ToolError;
use chaos_agent::tool::CommandRunner;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

/// A helper invocation as the fake saw it.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    /// Path of the `.btm` file named on the command line, if any.
    pub rule_path: Option<PathBuf>,
    /// Contents of that file at the moment the helper ran.
    pub rule_text: Option<String>,
}

#[derive(Default)]
pub struct FakeHost {
    pub invocations: Mutex<Vec<Invocation>>,
    pub signals: Mutex<Vec<(i32, i32)>>,
    pub processes: Vec<ProcessEntry>,
    /// When set, every helper run fails with this combined output.
    pub helper_failure: Option<String>,
    pub signal_failure: Option<io::ErrorKind>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_helper(output: &str) -> Self {
        Self {
            helper_failure: Some(output.to_string()),
            ..Self::default()
        }
    }

    pub fn with_processes(processes: &[(i32, &str)]) -> Self {
        Self {
            processes: processes
                .iter()
                .map(|(pid, name)| ProcessEntry {
                    pid: *pid,
                    name: name.to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn signals(&self) -> Vec<(i32, i32)> {
        self.signals.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeHost {
    fn run(&self, command_line: &str) -> Result<Vec<u8>, ToolError> {
        // Last argument, unwrapping the single quotes put around paths with spaces.
        let last = match command_line.strip_suffix('\'') {
            Some(rest) => rest.rfind(" '").map(|i| &rest[i + 2..]),
            None => command_line.split_whitespace().last(),
        };
        let rule_path = last
            .filter(|token| token.ends_with(".btm"))
            .map(PathBuf::from);
        let rule_text = rule_path.as_ref().and_then(|p| fs::read_to_string(p).ok());

        self.invocations.lock().unwrap().push(Invocation {
            command: command_line.to_string(),
            rule_path,
            rule_text,
        });

        match &self.helper_failure {
            Some(output) => Err(ToolError::Failed {
                command: command_line.to_string(),
                status: "exit status: 1".to_string(),
                output: output.clone(),
            }),
            None => Ok(b"install rule ok\n".to_vec()),
        }
    }
}

impl Environment for FakeHost {
    fn runner(&self) -> &dyn CommandRunner {
        self
    }

    fn send_signal(&self, pid: i32, signal: i32) -> io::Result<()> {
        if let Some(kind) = self.signal_failure {
            return Err(io::Error::new(kind, "signal refused"));
        }
        self.signals.lock().unwrap().push((pid, signal));
        Ok(())
    }

    fn processes(&self) -> io::Result<Vec<ProcessEntry>> {
        Ok(self.processes.clone())
    }
}
