// SPDX-License-Identifier: PMPL-1.0-or-later

//! Process kill attack.

use super::{mismatch, Attack};
use crate::env::Environment;
use crate::error::{AttackError, Result};
use crate::storage::Experiment;
use crate::types::{AttackConfig, AttackKind, ProcessCommand};
use log::{info, warn};

/// Signals every process matching a pid or command name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessKillAttack;

impl ProcessKillAttack {
    /// A numeric identifier is a pid; anything else matches command names exactly.
    fn resolve(&self, process: &str, env: &dyn Environment) -> Result<Vec<i32>> {
        if let Ok(pid) = process.parse::<i32>() {
            return Ok(vec![pid]);
        }

        let table = env
            .processes()
            .map_err(|e| AttackError::OperationFailed(format!("listing processes: {}", e)))?;
        let pids: Vec<i32> = table
            .into_iter()
            .filter(|p| p.name == process)
            .map(|p| p.pid)
            .collect();

        if pids.is_empty() {
            return Err(AttackError::OperationFailed(format!(
                "process {} not found",
                process
            )));
        }
        Ok(pids)
    }

    fn kill(&self, cmd: &ProcessCommand, env: &dyn Environment) -> Result<()> {
        cmd.validate()?;

        for pid in self.resolve(&cmd.process, env)? {
            env.send_signal(pid, cmd.signal).map_err(|e| {
                AttackError::OperationFailed(format!(
                    "sending signal {} to pid {}: {}",
                    cmd.signal, pid, e
                ))
            })?;
            info!("sent signal {} to pid {}", cmd.signal, pid);
        }
        Ok(())
    }
}

fn is_stop_signal(signal: i32) -> bool {
    matches!(
        signal,
        libc::SIGSTOP | libc::SIGTSTP | libc::SIGTTIN | libc::SIGTTOU
    )
}

impl Attack for ProcessKillAttack {
    fn kind(&self) -> AttackKind {
        AttackKind::Process
    }

    fn attack(&self, config: &AttackConfig, env: &dyn Environment) -> Result<()> {
        match config {
            AttackConfig::Process(cmd) => self.kill(cmd, env),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    /// Stopped processes are resumed with SIGCONT. A killed process cannot be
    /// brought back; recovery only acknowledges the record.
    fn recover(&self, experiment: &Experiment, env: &dyn Environment) -> Result<()> {
        let cmd: ProcessCommand = serde_json::from_str(&experiment.recover_command)
            .map_err(AttackError::MalformedRecoveryState)?;

        if !is_stop_signal(cmd.signal) {
            warn!(
                "experiment {} sent signal {} to {}; nothing to recover",
                experiment.uid, cmd.signal, cmd.process
            );
            return Ok(());
        }

        self.kill(&cmd.with_signal(libc::SIGCONT), env)
    }
}
