// SPDX-License-Identifier: PMPL-1.0-or-later

//! Native helper invocation.

use crate::error::ToolError;
use log::debug;
use std::borrow::Cow;
use std::process::{Command, Stdio};
use std::time::Duration;

/// Capability to run one shell command line and capture its combined output.
///
/// Implementations return the output on success and carry it inside
/// [`ToolError::Failed`] on a non-zero exit, so callers always have the
/// helper's own diagnostics to log.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command_line: &str) -> Result<Vec<u8>, ToolError>;
}

/// Quote one argument for a `bash -c` line.
///
/// Plain words are passed through unchanged; anything else is wrapped in
/// single quotes, with embedded quotes written as `'\''`.
pub fn quote(arg: &str) -> Cow<'_, str> {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+=:,@%".contains(c));
    if plain {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', "'\\''")))
    }
}

/// Runs command lines through `bash -c`, stderr folded into stdout.
///
/// Blocks until the helper exits. With a timeout set the line is wrapped in
/// coreutils `timeout`, which kills the helper and exits 124.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    timeout: Option<Duration>,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn command(&self, command_line: &str) -> Command {
        // Grouping keeps stdout and stderr interleaved on one pipe.
        let script = format!("{{ {}\n}} 2>&1", command_line);
        match self.timeout {
            Some(limit) => {
                let mut cmd = Command::new("timeout");
                cmd.arg(limit.as_secs().max(1).to_string())
                    .arg("bash")
                    .arg("-c")
                    .arg(script);
                cmd
            }
            None => {
                let mut cmd = Command::new("bash");
                cmd.arg("-c").arg(script);
                cmd
            }
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command_line: &str) -> Result<Vec<u8>, ToolError> {
        debug!("running helper: {}", command_line);

        let output = self
            .command(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ToolError::Spawn {
                command: command_line.to_string(),
                source,
            })?;

        // Anything on stderr here came from bash or timeout themselves.
        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if output.status.success() {
            Ok(combined)
        } else {
            Err(ToolError::Failed {
                command: command_line.to_string(),
                status: output.status.to_string(),
                output: String::from_utf8_lossy(&combined).trim_end().to_string(),
            })
        }
    }
}
