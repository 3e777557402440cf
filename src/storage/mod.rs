// SPDX-License-Identifier: PMPL-1.0-or-later

//! Experiment records and the store that keeps them across agent restarts.

use crate::types::{AttackConfig, AttackKind};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    Created,
    Success,
    Error,
    Destroyed,
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExperimentStatus::Created => write!(f, "created"),
            ExperimentStatus::Success => write!(f, "success"),
            ExperimentStatus::Error => write!(f, "error"),
            ExperimentStatus::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// One attack request and what is needed to reverse it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub uid: String,
    pub kind: AttackKind,
    pub action: String,
    pub status: ExperimentStatus,
    /// The inner command as JSON, exactly as it was attacked with.
    pub recover_command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Experiment {
    pub fn new(uid: impl Into<String>, config: &AttackConfig) -> serde_json::Result<Self> {
        let now = Utc::now();
        Ok(Self {
            uid: uid.into(),
            kind: config.kind(),
            action: config.action(),
            status: ExperimentStatus::Created,
            recover_command: config.recover_command()?,
            error: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn transition(&mut self, status: ExperimentStatus, error: Option<String>) {
        self.status = status;
        self.error = error;
        self.updated_at = Utc::now();
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("experiment {0} not found")]
    NotFound(String),

    #[error("invalid experiment uid {0:?}")]
    InvalidUid(String),

    #[error("experiment store I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("experiment record {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Persistence for experiment records, keyed by uid.
///
/// Records for different uids must be writable concurrently.
pub trait ExperimentStore: Send + Sync {
    /// Insert or overwrite the record for `experiment.uid`.
    fn save(&self, experiment: &Experiment) -> Result<(), StoreError>;

    fn find(&self, uid: &str) -> Result<Experiment, StoreError>;

    /// All records, oldest first.
    fn list(&self) -> Result<Vec<Experiment>, StoreError>;
}

/// One pretty-printed JSON file per experiment under a directory.
#[derive(Debug, Clone)]
pub struct FileExperimentStore {
    dir: PathBuf,
}

impl FileExperimentStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// A uid names exactly one file directly inside the store directory.
    fn path_for(&self, uid: &str) -> Result<PathBuf, StoreError> {
        if uid.is_empty() || uid.contains(['/', '\\']) || uid.contains("..") {
            return Err(StoreError::InvalidUid(uid.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", uid)))
    }

    fn read(path: &Path) -> Result<Experiment, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ExperimentStore for FileExperimentStore {
    fn save(&self, experiment: &Experiment) -> Result<(), StoreError> {
        let path = self.path_for(&experiment.uid)?;
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        let payload = serde_json::to_string_pretty(experiment).map_err(|source| {
            StoreError::Corrupt {
                path: path.clone(),
                source,
            }
        })?;

        // Write beside the target and rename so readers never see half a record.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(payload.as_bytes()).map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    fn find(&self, uid: &str) -> Result<Experiment, StoreError> {
        let path = self.path_for(uid)?;
        if !path.exists() {
            return Err(StoreError::NotFound(uid.to_string()));
        }
        Self::read(&path)
    }

    fn list(&self) -> Result<Vec<Experiment>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        // An unreadable record is skipped so the rest stay listable.
        let mut experiments: Vec<Experiment> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("json"))
                    .unwrap_or(false)
            })
            .filter_map(|path| match Self::read(&path) {
                Ok(experiment) => Some(experiment),
                Err(err) => {
                    warn!("skipping {}", err);
                    None
                }
            })
            .collect();

        experiments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(experiments)
    }
}
