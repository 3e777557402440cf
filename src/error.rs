// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error taxonomy for the attack engine.

use thiserror::Error;

/// Failure of a native helper invocation.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The shell could not be started at all.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The helper ran and exited non-zero. `output` is its combined stdout/stderr.
    #[error("`{command}` failed ({status}): {output}")]
    Failed {
        command: String,
        status: String,
        output: String,
    },
}

/// Errors raised while applying or reversing an attack.
#[derive(Error, Debug)]
pub enum AttackError {
    /// A required field was missing at the request boundary.
    #[error("argument missing: {0}")]
    ArgumentMissing(&'static str),

    #[error("attack type {0} not supported")]
    UnsupportedAttackType(String),

    #[error("jvm action {0} not supported")]
    UnsupportedAction(String),

    #[error("no rule template for jvm action {0}")]
    TemplateSelection(String),

    /// The config variant handed to an implementation is not the one it handles.
    #[error("attack config of type {found} handed to {expected} attack")]
    ConfigMismatch { expected: String, found: String },

    #[error("rendering rule: {0}")]
    Render(String),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("malformed recovery state: {0}")]
    MalformedRecoveryState(#[source] serde_json::Error),

    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// Temporary rule file could not be created, written or closed.
    #[error("rule file: {0}")]
    Resource(#[from] std::io::Error),
}

impl AttackError {
    /// Argument errors are the only kind the CLI reports with a distinct exit status.
    pub fn is_bad_argument(&self) -> bool {
        matches!(self, AttackError::ArgumentMissing(_))
    }
}

pub type Result<T> = std::result::Result<T, AttackError>;
