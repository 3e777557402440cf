// SPDX-License-Identifier: PMPL-1.0-or-later

//! Attack contract and dispatch.
//!
//! Every fault family implements [`Attack`]: one call to apply the fault,
//! one call to reverse it from a persisted [`Experiment`]. Recovery may run
//! in a different agent process than the attack did, so implementations
//! keep no state of their own between the two.

pub mod jvm;
pub mod process;

use crate::env::Environment;
use crate::error::{AttackError, Result};
use crate::storage::Experiment;
use crate::types::{AttackConfig, AttackKind};
use std::collections::HashMap;

pub use jvm::JvmAttack;
pub use process::ProcessKillAttack;

pub trait Attack: Send + Sync {
    fn kind(&self) -> AttackKind;

    fn attack(&self, config: &AttackConfig, env: &dyn Environment) -> Result<()>;

    fn recover(&self, experiment: &Experiment, env: &dyn Environment) -> Result<()>;
}

/// Routes requests to the implementation registered for their kind.
///
/// Built once at startup and read-only afterwards.
pub struct Dispatcher {
    attacks: HashMap<AttackKind, Box<dyn Attack>>,
}

impl Dispatcher {
    pub fn new(attacks: Vec<Box<dyn Attack>>) -> Self {
        let attacks = attacks.into_iter().map(|a| (a.kind(), a)).collect();
        Self { attacks }
    }

    /// Process kill plus a JVM attack with default helper locations.
    pub fn with_defaults() -> Self {
        Self::new(vec![
            Box::new(ProcessKillAttack),
            Box::new(JvmAttack::default()),
        ])
    }

    pub fn supports(&self, kind: AttackKind) -> bool {
        self.attacks.contains_key(&kind)
    }

    fn lookup(&self, kind: AttackKind) -> Result<&dyn Attack> {
        self.attacks
            .get(&kind)
            .map(|a| a.as_ref())
            .ok_or_else(|| AttackError::UnsupportedAttackType(kind.to_string()))
    }

    pub fn attack(
        &self,
        kind: AttackKind,
        config: &AttackConfig,
        env: &dyn Environment,
    ) -> Result<()> {
        let attack = self.lookup(kind)?;
        if config.kind() != kind {
            return Err(mismatch(kind, config));
        }
        attack.attack(config, env)
    }

    pub fn recover(&self, experiment: &Experiment, env: &dyn Environment) -> Result<()> {
        self.lookup(experiment.kind)?.recover(experiment, env)
    }
}

/// Common guard for implementations handed the wrong config variant.
pub(crate) fn mismatch(expected: AttackKind, config: &AttackConfig) -> AttackError {
    AttackError::ConfigMismatch {
        expected: expected.to_string(),
        found: config.kind().to_string(),
    }
}
