// SPDX-License-Identifier: PMPL-1.0-or-later

//! Chaos-Agent — host-level fault injection with exact recovery.
//!
//! An attack request is applied to a live process or JVM and recorded as
//! an experiment. Recovery reads that record back, possibly in a later
//! agent process, and reverses the fault.
//!
//! ENGINE PILLARS:
//! 1. **Attack**: one [`attack::Attack`] implementation per fault family,
//!    routed by the [`attack::Dispatcher`].
//! 2. **Rule**: deterministic Byteman rule generation, so the rule unloaded
//!    on recovery is the rule that was loaded.
//! 3. **Tool**: narrow shell capability for the Byteman helper scripts.

pub mod agent;
pub mod attack;
pub mod config;
pub mod env;
pub mod error;
pub mod logger;
pub mod rule;
pub mod storage;
pub mod tool;
pub mod types;
