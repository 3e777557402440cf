// SPDX-License-Identifier: PMPL-1.0-or-later

//! Rule generation: JVM fault request in, Byteman rule text out.
//!
//! Rendering is a pure function of the command. Recovery depends on it:
//! the rule unloaded on recover is regenerated from the persisted command
//! and must match the installed one byte for byte.

pub mod template;

use crate::error::{AttackError, Result};
use crate::types::{JvmAction, JvmCommand, StressValue};
use template::{fill, GC_RULE_TEMPLATE, RULE_TEMPLATE, STRESS_RULE_TEMPLATE};

/// The three rule shapes understood by the Byteman agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleGrammar {
    MethodEntry,
    Stress,
    Gc,
}

impl RuleGrammar {
    pub fn for_action(action: &JvmAction) -> Result<Self> {
        match action {
            JvmAction::Latency | JvmAction::Exception | JvmAction::Return => {
                Ok(RuleGrammar::MethodEntry)
            }
            JvmAction::Stress => Ok(RuleGrammar::Stress),
            JvmAction::Gc => Ok(RuleGrammar::Gc),
            JvmAction::Unsupported(raw) => Err(AttackError::TemplateSelection(raw.clone())),
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            RuleGrammar::MethodEntry => RULE_TEMPLATE,
            RuleGrammar::Stress => STRESS_RULE_TEMPLATE,
            RuleGrammar::Gc => GC_RULE_TEMPLATE,
        }
    }
}

/// Fill in `do` (or the stress fields) from `action` when the caller left them out.
///
/// An explicitly supplied `do` is kept as is. Running this twice yields the
/// same command.
pub fn derive_do(cmd: &mut JvmCommand) -> Result<()> {
    if cmd.do_statement.as_deref().map_or(false, |s| !s.is_empty()) {
        return Ok(());
    }

    match &cmd.action {
        JvmAction::Latency => {
            let millis = cmd
                .latency_duration
                .ok_or(AttackError::ArgumentMissing("latency_duration"))?;
            cmd.do_statement = Some(format!("Thread.sleep({})", millis));
        }
        JvmAction::Exception => {
            let exception = cmd
                .throw_exception
                .as_deref()
                .ok_or(AttackError::ArgumentMissing("throw_exception"))?;
            cmd.do_statement = Some(format!("throw new {}", exception));
        }
        JvmAction::Return => {
            let value = cmd
                .return_value
                .as_deref()
                .ok_or(AttackError::ArgumentMissing("return_value"))?;
            cmd.do_statement = Some(format!("return {}", value));
        }
        JvmAction::Stress => {
            if cmd.cpu_count > 0 {
                cmd.stress_type = Some("CPU".to_string());
                cmd.stress_value_name = Some("CPUCOUNT".to_string());
                cmd.stress_value = Some(StressValue::Count(cmd.cpu_count));
            } else {
                cmd.stress_type = Some("MEMORY".to_string());
                cmd.stress_value_name = Some("MEMORYSIZE".to_string());
                cmd.stress_value = Some(StressValue::Size(
                    cmd.memory_size.clone().unwrap_or_default(),
                ));
            }
        }
        JvmAction::Gc => {}
        JvmAction::Unsupported(raw) => return Err(AttackError::UnsupportedAction(raw.clone())),
    }

    Ok(())
}

/// Explicit parameter set a template is filled from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleParams {
    pub name: String,
    pub class: String,
    pub method: String,
    pub do_statement: String,
    pub stress_type: String,
    pub stress_value_name: String,
    pub stress_value: String,
}

impl RuleParams {
    pub fn from_command(cmd: &JvmCommand) -> Self {
        Self {
            name: cmd.name.clone(),
            class: cmd.class.clone(),
            method: cmd.method.clone(),
            do_statement: cmd.do_statement.clone().unwrap_or_default(),
            stress_type: cmd.stress_type.clone().unwrap_or_default(),
            stress_value_name: cmd.stress_value_name.clone().unwrap_or_default(),
            stress_value: cmd
                .stress_value
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let value = match key {
            "Name" => &self.name,
            "Class" => &self.class,
            "Method" => &self.method,
            "Do" => &self.do_statement,
            "StressType" => &self.stress_type,
            "StressValueName" => &self.stress_value_name,
            "StressValue" => &self.stress_value,
            _ => return None,
        };
        Some(value.clone())
    }
}

/// Render the rule for an already-derived command.
pub fn render(cmd: &JvmCommand) -> Result<String> {
    let grammar = RuleGrammar::for_action(&cmd.action)?;
    let params = RuleParams::from_command(cmd);
    fill(grammar.template(), |key| params.lookup(key))
}

/// Derive on a copy, then render. The caller's command is left untouched.
pub fn generate(cmd: &JvmCommand) -> Result<String> {
    let mut derived = cmd.clone();
    derive_do(&mut derived)?;
    render(&derived)
}
