// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request service: records experiments around dispatched attacks.

use crate::attack::Dispatcher;
use crate::env::Environment;
use crate::storage::{Experiment, ExperimentStatus, ExperimentStore};
use crate::types::AttackConfig;
use anyhow::{anyhow, Context, Result};
use log::{error, info};
use std::sync::Arc;
use uuid::Uuid;

/// Holds no per-experiment state, so independent requests may run concurrently.
pub struct Agent {
    dispatcher: Dispatcher,
    store: Arc<dyn ExperimentStore>,
    env: Arc<dyn Environment>,
}

impl Agent {
    pub fn new(
        dispatcher: Dispatcher,
        store: Arc<dyn ExperimentStore>,
        env: Arc<dyn Environment>,
    ) -> Self {
        Self {
            dispatcher,
            store,
            env,
        }
    }

    /// Validate, record and apply an attack. Returns the stored experiment.
    ///
    /// Argument errors are returned before anything is recorded or dispatched;
    /// the underlying `AttackError` stays reachable through `downcast_ref`.
    pub fn attack(&self, config: AttackConfig) -> Result<Experiment> {
        config.validate()?;

        let uid = Uuid::new_v4().to_string();
        let mut experiment =
            Experiment::new(uid, &config).context("serializing recovery state")?;
        self.store
            .save(&experiment)
            .context("recording experiment")?;
        info!(
            "experiment {} created: {} {}",
            experiment.uid, experiment.kind, experiment.action
        );

        match self
            .dispatcher
            .attack(config.kind(), &config, self.env.as_ref())
        {
            Ok(()) => {
                experiment.transition(ExperimentStatus::Success, None);
                self.store.save(&experiment)?;
                info!("experiment {} applied", experiment.uid);
                Ok(experiment)
            }
            Err(err) => {
                error!("experiment {} failed: {}", experiment.uid, err);
                experiment.transition(ExperimentStatus::Error, Some(err.to_string()));
                if let Err(store_err) = self.store.save(&experiment) {
                    error!("recording failure of {}: {}", experiment.uid, store_err);
                }
                Err(err.into())
            }
        }
    }

    /// Reverse a previously applied attack using only its stored record.
    pub fn recover(&self, uid: &str) -> Result<Experiment> {
        let mut experiment = self.store.find(uid)?;
        if experiment.status != ExperimentStatus::Success {
            return Err(anyhow!(
                "experiment {} is {}, only successful experiments can be recovered",
                uid,
                experiment.status
            ));
        }

        self.dispatcher
            .recover(&experiment, self.env.as_ref())
            .with_context(|| format!("recovering experiment {}", uid))?;

        experiment.transition(ExperimentStatus::Destroyed, None);
        self.store.save(&experiment)?;
        info!("experiment {} recovered", uid);
        Ok(experiment)
    }

    pub fn experiments(&self) -> Result<Vec<Experiment>> {
        Ok(self.store.list()?)
    }
}
