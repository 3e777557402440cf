// SPDX-License-Identifier: PMPL-1.0-or-later

//! Process-level capabilities handed to attack implementations.

use crate::tool::{CommandRunner, ShellRunner};
use std::fs;
use std::io;

/// A running process as seen by the kill attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: i32,
    pub name: String,
}

/// Everything an attack may do to the host. Swapped for a fake in tests.
pub trait Environment: Send + Sync {
    fn runner(&self) -> &dyn CommandRunner;

    fn send_signal(&self, pid: i32, signal: i32) -> io::Result<()>;

    fn processes(&self) -> io::Result<Vec<ProcessEntry>>;
}

/// The real host: `kill(2)` for signals, `/proc` for the process table.
#[derive(Debug, Clone, Default)]
pub struct HostEnvironment {
    runner: ShellRunner,
}

impl HostEnvironment {
    pub fn new(runner: ShellRunner) -> Self {
        Self { runner }
    }
}

impl Environment for HostEnvironment {
    fn runner(&self) -> &dyn CommandRunner {
        &self.runner
    }

    fn send_signal(&self, pid: i32, signal: i32) -> io::Result<()> {
        if pid <= 0 {
            // kill(2) treats these as process groups.
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to signal pid {}", pid),
            ));
        }
        // SAFETY: kill(2) has no memory-safety preconditions.
        let rc = unsafe { libc::kill(pid, signal) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    fn processes(&self) -> io::Result<Vec<ProcessEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir("/proc")?.flatten() {
            let pid = match entry.file_name().to_str().and_then(|n| n.parse::<i32>().ok()) {
                Some(pid) => pid,
                None => continue,
            };
            // Processes may exit between readdir and read.
            if let Ok(comm) = fs::read_to_string(entry.path().join("comm")) {
                entries.push(ProcessEntry {
                    pid,
                    name: comm.trim_end().to_string(),
                });
            }
        }
        entries.sort_by_key(|e| e.pid);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_table_includes_self() {
        let me = std::process::id() as i32;
        let procs = HostEnvironment::default().processes().unwrap();
        assert!(procs.iter().any(|p| p.pid == me));
    }

    #[test]
    fn signal_zero_probes_own_process() {
        let me = std::process::id() as i32;
        assert!(HostEnvironment::default().send_signal(me, 0).is_ok());
    }

    #[test]
    fn non_positive_pid_is_refused() {
        assert!(HostEnvironment::default().send_signal(0, libc::SIGKILL).is_err());
        assert!(HostEnvironment::default().send_signal(-1, libc::SIGKILL).is_err());
    }
}
