// SPDX-License-Identifier: PMPL-1.0-or-later

//! JVM fault injection through Byteman.
//!
//! Install attaches the agent to a JVM with `bminstall.sh`. Submit renders a
//! rule, writes it to a temporary `.btm` file and loads it with
//! `bmsubmit.sh -l`. Recover renders the same rule from the stored command
//! and unloads it with `bmsubmit.sh -u`.

use super::{mismatch, Attack};
use crate::env::Environment;
use crate::error::{AttackError, Result};
use crate::rule;
use crate::storage::Experiment;
use crate::tool::quote;
use crate::types::{AttackConfig, AttackKind, JvmCommand, JvmCommandType};
use log::{debug, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

const BM_INSTALL: &str = "bminstall.sh";
const BM_SUBMIT: &str = "bmsubmit.sh";
const BM_INSTALL_FLAGS: &str = "-b -Dorg.jboss.byteman.transform.all -Dorg.jboss.byteman.verbose";

/// Whether a submitted rule file is loaded or unloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    Load,
    Unload,
}

impl SubmitMode {
    fn flag(&self) -> &'static str {
        match self {
            SubmitMode::Load => "l",
            SubmitMode::Unload => "u",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct JvmAttack {
    /// Directory for temporary rule files; the system temp dir when unset.
    rule_dir: Option<PathBuf>,
    /// Directory holding the Byteman scripts; resolved through `PATH` when unset.
    helper_dir: Option<PathBuf>,
}

impl JvmAttack {
    pub fn new(rule_dir: Option<PathBuf>, helper_dir: Option<PathBuf>) -> Self {
        Self {
            rule_dir,
            helper_dir,
        }
    }

    fn helper(&self, script: &str) -> String {
        match &self.helper_dir {
            Some(dir) => quote(&dir.join(script).to_string_lossy()).into_owned(),
            None => script.to_string(),
        }
    }

    pub fn install_command(&self, port: u16, pid: u32) -> String {
        format!(
            "{} {} -p {} {}",
            self.helper(BM_INSTALL),
            BM_INSTALL_FLAGS,
            port,
            pid
        )
    }

    pub fn submit_command(&self, port: u16, mode: SubmitMode, rule_file: &Path) -> String {
        format!(
            "{} -p {} -{} {}",
            self.helper(BM_SUBMIT),
            port,
            mode.flag(),
            quote(&rule_file.to_string_lossy())
        )
    }

    fn install(&self, cmd: &JvmCommand, env: &dyn Environment) -> Result<()> {
        let pid = cmd.pid.ok_or(AttackError::ArgumentMissing("pid"))?;
        run_helper(env, &self.install_command(cmd.port, pid))
    }

    /// Render, write, hand to `bmsubmit.sh`. The rule file is removed when
    /// this returns, on every path.
    pub fn submit(&self, cmd: &JvmCommand, mode: SubmitMode, env: &dyn Environment) -> Result<()> {
        let rule_text = rule::generate(cmd)?;
        info!("byteman rule {}:\n{}", cmd.name, rule_text);

        let rule_file = self.write_rule_file(&rule_text)?;
        debug!("created rule file {}", rule_file.display());

        run_helper(env, &self.submit_command(cmd.port, mode, &rule_file))
    }

    fn write_rule_file(&self, rule_text: &str) -> Result<TempPath> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("rule").suffix(".btm");
        let mut file = match &self.rule_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(rule_text.as_bytes())?;
        file.flush()?;
        // Closes the handle; the returned path still deletes the file on drop.
        Ok(file.into_temp_path())
    }

    fn command<'a>(&self, config: &'a AttackConfig) -> Result<&'a JvmCommand> {
        match config {
            AttackConfig::Jvm(cmd) => Ok(cmd),
            other => Err(mismatch(self.kind(), other)),
        }
    }
}

fn run_helper(env: &dyn Environment, command_line: &str) -> Result<()> {
    match env.runner().run(command_line) {
        Ok(output) => {
            info!("{}", String::from_utf8_lossy(&output).trim_end());
            Ok(())
        }
        Err(err) => {
            error!("{}", err);
            Err(err.into())
        }
    }
}

impl Attack for JvmAttack {
    fn kind(&self) -> AttackKind {
        AttackKind::Jvm
    }

    fn attack(&self, config: &AttackConfig, env: &dyn Environment) -> Result<()> {
        let cmd = self.command(config)?;
        match cmd.command_type {
            JvmCommandType::Install => self.install(cmd, env),
            JvmCommandType::Submit => self.submit(cmd, SubmitMode::Load, env),
        }
    }

    fn recover(&self, experiment: &Experiment, env: &dyn Environment) -> Result<()> {
        let cmd: JvmCommand = serde_json::from_str(&experiment.recover_command)
            .map_err(AttackError::MalformedRecoveryState)?;

        match cmd.command_type {
            JvmCommandType::Install => {
                // bminstall has no detach; the agent stays until the JVM exits.
                warn!(
                    "experiment {} attached the byteman agent to pid {:?}; it cannot be detached",
                    experiment.uid, cmd.pid
                );
                Ok(())
            }
            JvmCommandType::Submit => self.submit(&cmd, SubmitMode::Unload, env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_command_shape() {
        assert_eq!(
            JvmAttack::default().install_command(9288, 4242),
            "bminstall.sh -b -Dorg.jboss.byteman.transform.all -Dorg.jboss.byteman.verbose -p 9288 4242"
        );
    }

    #[test]
    fn submit_commands_differ_only_in_mode_flag() {
        let attack = JvmAttack::default();
        let path = Path::new("/tmp/rule123.btm");
        assert_eq!(
            attack.submit_command(9288, SubmitMode::Load, path),
            "bmsubmit.sh -p 9288 -l /tmp/rule123.btm"
        );
        assert_eq!(
            attack.submit_command(9288, SubmitMode::Unload, path),
            "bmsubmit.sh -p 9288 -u /tmp/rule123.btm"
        );
    }

    #[test]
    fn helper_dir_prefixes_scripts() {
        let attack = JvmAttack::new(None, Some(PathBuf::from("/opt/byteman/bin")));
        assert!(attack
            .install_command(1, 2)
            .starts_with("/opt/byteman/bin/bminstall.sh -b "));
    }

    #[test]
    fn paths_with_spaces_are_quoted() {
        let attack = JvmAttack::new(None, Some(PathBuf::from("/opt/Byte Man/bin")));
        assert_eq!(
            attack.install_command(9288, 7),
            "'/opt/Byte Man/bin/bminstall.sh' -b -Dorg.jboss.byteman.transform.all -Dorg.jboss.byteman.verbose -p 9288 7"
        );
        assert_eq!(
            attack.submit_command(9288, SubmitMode::Load, Path::new("/var/tmp/my rules/rule1.btm")),
            "'/opt/Byte Man/bin/bmsubmit.sh' -p 9288 -l '/var/tmp/my rules/rule1.btm'"
        );
    }
}
