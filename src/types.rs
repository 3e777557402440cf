// SPDX-License-Identifier: PMPL-1.0-or-later

//! Attack configuration model.
//!
//! Every request the agent accepts is one of a closed set of variants,
//! tagged by [`AttackKind`]. The inner commands are what gets persisted as
//! recovery state, so their serde shape is part of the on-disk contract.

use crate::error::{AttackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Attack families the agent knows how to apply and reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackKind {
    Process,
    Jvm,
}

impl AttackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackKind::Process => "process",
            AttackKind::Jvm => "jvm",
        }
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttackKind {
    type Err = AttackError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "process" => Ok(AttackKind::Process),
            "jvm" => Ok(AttackKind::Jvm),
            other => Err(AttackError::UnsupportedAttackType(other.to_string())),
        }
    }
}

/// A single attack request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AttackConfig {
    Process(ProcessCommand),
    Jvm(JvmCommand),
}

impl AttackConfig {
    pub fn kind(&self) -> AttackKind {
        match self {
            AttackConfig::Process(_) => AttackKind::Process,
            AttackConfig::Jvm(_) => AttackKind::Jvm,
        }
    }

    /// Short label of the concrete operation, stored alongside the experiment.
    pub fn action(&self) -> String {
        match self {
            AttackConfig::Process(_) => "kill".to_string(),
            AttackConfig::Jvm(cmd) => match cmd.command_type {
                JvmCommandType::Install => "install".to_string(),
                JvmCommandType::Submit => cmd.action.to_string(),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            AttackConfig::Process(cmd) => cmd.validate(),
            AttackConfig::Jvm(cmd) => cmd.validate(),
        }
    }

    /// Serialized inner command, kept verbatim as the experiment's recovery state.
    pub fn recover_command(&self) -> serde_json::Result<String> {
        match self {
            AttackConfig::Process(cmd) => serde_json::to_string(cmd),
            AttackConfig::Jvm(cmd) => serde_json::to_string(cmd),
        }
    }
}

fn default_signal() -> i32 {
    libc::SIGKILL
}

/// Deliver a signal to a process selected by name or pid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessCommand {
    /// Process name or numeric process ID.
    pub process: String,
    #[serde(default = "default_signal")]
    pub signal: i32,
}

impl ProcessCommand {
    pub fn kill(process: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            signal: default_signal(),
        }
    }

    /// Build a kill request from an optional `--process` flag value.
    ///
    /// This is the request-construction boundary: an absent or blank value
    /// is rejected here so nothing downstream ever sees it.
    pub fn from_flag(process: Option<String>) -> Result<Self> {
        match process {
            Some(p) if !p.trim().is_empty() => Ok(Self::kill(p)),
            _ => Err(AttackError::ArgumentMissing("process")),
        }
    }

    pub fn with_signal(mut self, signal: i32) -> Self {
        self.signal = signal;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.process.trim().is_empty() {
            return Err(AttackError::ArgumentMissing("process"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JvmCommandType {
    /// Attach the Byteman agent to a running JVM.
    Install,
    /// Load (attack) or unload (recover) a rule through the attached agent.
    Submit,
}

/// Fault injected by a submitted rule.
///
/// The set is closed, but action text arriving over the wire is kept as
/// [`JvmAction::Unsupported`] instead of failing deserialization, so the
/// rule engine is the one place that rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JvmAction {
    Latency,
    Exception,
    Return,
    Stress,
    Gc,
    Unsupported(String),
}

impl JvmAction {
    pub fn as_str(&self) -> &str {
        match self {
            JvmAction::Latency => "latency",
            JvmAction::Exception => "exception",
            JvmAction::Return => "return",
            JvmAction::Stress => "stress",
            JvmAction::Gc => "gc",
            JvmAction::Unsupported(raw) => raw,
        }
    }
}

impl From<String> for JvmAction {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "latency" => JvmAction::Latency,
            "exception" => JvmAction::Exception,
            "return" => JvmAction::Return,
            "stress" => JvmAction::Stress,
            "gc" => JvmAction::Gc,
            _ => JvmAction::Unsupported(value),
        }
    }
}

impl From<&str> for JvmAction {
    fn from(value: &str) -> Self {
        JvmAction::from(value.to_string())
    }
}

impl From<JvmAction> for String {
    fn from(action: JvmAction) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for JvmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value following the stress rule's value name: a CPU count or a memory size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StressValue {
    Count(u32),
    Size(String),
}

impl fmt::Display for StressValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StressValue::Count(count) => write!(f, "{}", count),
            StressValue::Size(size) => f.write_str(size),
        }
    }
}

/// JVM fault request, driven through the Byteman helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JvmCommand {
    #[serde(rename = "type")]
    pub command_type: JvmCommandType,
    /// Byteman agent listen port.
    pub port: u16,
    /// Target JVM, only meaningful for install.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub action: JvmAction,

    /// Milliseconds passed to `Thread.sleep`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throw_exception: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<String>,
    #[serde(default)]
    pub cpu_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<String>,

    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub name: String,

    /// Pre-rendered rule statement. Derived from `action` when absent.
    #[serde(rename = "do", default, skip_serializing_if = "Option::is_none")]
    pub do_statement: Option<String>,

    // Populated by stress derivation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_value_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_value: Option<StressValue>,
}

impl JvmCommand {
    pub fn install(port: u16, pid: u32) -> Self {
        Self {
            pid: Some(pid),
            ..Self::blank(JvmCommandType::Install, port, JvmAction::Unsupported(String::new()))
        }
    }

    pub fn submit(port: u16, action: impl Into<JvmAction>) -> Self {
        Self::blank(JvmCommandType::Submit, port, action.into())
    }

    fn blank(command_type: JvmCommandType, port: u16, action: JvmAction) -> Self {
        Self {
            command_type,
            port,
            pid: None,
            action,
            latency_duration: None,
            throw_exception: None,
            return_value: None,
            cpu_count: 0,
            memory_size: None,
            class: String::new(),
            method: String::new(),
            name: String::new(),
            do_statement: None,
            stress_type: None,
            stress_value_name: None,
            stress_value: None,
        }
    }

    /// Set the rule identity: rule name, target class and method.
    pub fn rule(mut self, name: &str, class: &str, method: &str) -> Self {
        self.name = name.to_string();
        self.class = class.to_string();
        self.method = method.to_string();
        self
    }

    pub fn validate(&self) -> Result<()> {
        match self.command_type {
            JvmCommandType::Install => {
                if self.pid.is_none() {
                    return Err(AttackError::ArgumentMissing("pid"));
                }
                Ok(())
            }
            JvmCommandType::Submit => self.validate_submit(),
        }
    }

    fn validate_submit(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AttackError::ArgumentMissing("name"));
        }

        let explicit_do = self
            .do_statement
            .as_deref()
            .map_or(false, |stmt| !stmt.is_empty());

        match &self.action {
            JvmAction::Latency | JvmAction::Exception | JvmAction::Return => {
                if self.class.trim().is_empty() {
                    return Err(AttackError::ArgumentMissing("class"));
                }
                if self.method.trim().is_empty() {
                    return Err(AttackError::ArgumentMissing("method"));
                }
            }
            JvmAction::Stress | JvmAction::Gc => {}
            JvmAction::Unsupported(raw) => {
                return Err(AttackError::UnsupportedAction(raw.clone()));
            }
        }

        if explicit_do {
            return Ok(());
        }

        match &self.action {
            JvmAction::Latency if self.latency_duration.is_none() => {
                Err(AttackError::ArgumentMissing("latency_duration"))
            }
            JvmAction::Exception if is_blank(&self.throw_exception) => {
                Err(AttackError::ArgumentMissing("throw_exception"))
            }
            JvmAction::Return if is_blank(&self.return_value) => {
                Err(AttackError::ArgumentMissing("return_value"))
            }
            JvmAction::Stress if self.cpu_count == 0 && is_blank(&self.memory_size) => {
                Err(AttackError::ArgumentMissing("cpu_count or memory_size"))
            }
            _ => Ok(()),
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}
