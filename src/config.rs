// SPDX-License-Identifier: PMPL-1.0-or-later

//! Agent configuration file.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_experiment_dir() -> PathBuf {
    PathBuf::from("experiments")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Where experiment records are kept.
    #[serde(default = "default_experiment_dir")]
    pub experiment_dir: PathBuf,
    /// Where temporary `.btm` rule files are written.
    #[serde(default)]
    pub rule_dir: Option<PathBuf>,
    /// Directory containing `bminstall.sh` and `bmsubmit.sh`.
    #[serde(default)]
    pub byteman_bin: Option<PathBuf>,
    /// Upper bound on a single helper invocation. Unbounded when absent.
    #[serde(default)]
    pub tool_timeout_secs: Option<u64>,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            experiment_dir: default_experiment_dir(),
            rule_dir: None,
            byteman_bin: None,
            tool_timeout_secs: None,
            log_level: None,
        }
    }
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading agent config {}", path.display()))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("parsing json agent config {}", path.display())),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("parsing yaml agent config {}", path.display())),
            _ => Err(anyhow!(
                "unsupported agent config extension for {}",
                path.display()
            )),
        }
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn yaml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent.yaml");
        fs::write(&path, "byteman_bin: /opt/byteman/bin\ntool_timeout_secs: 30\n").unwrap();

        let config = AgentConfig::load(&path).unwrap();
        assert_eq!(config.experiment_dir, PathBuf::from("experiments"));
        assert_eq!(config.byteman_bin, Some(PathBuf::from("/opt/byteman/bin")));
        assert_eq!(config.tool_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn json_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent.json");
        fs::write(&path, r#"{"experiment_dir": "/var/lib/chaos", "log_level": "debug"}"#).unwrap();

        let config = AgentConfig::load(&path).unwrap();
        assert_eq!(config.experiment_dir, PathBuf::from("/var/lib/chaos"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.tool_timeout(), None);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent.toml");
        fs::write(&path, "").unwrap();
        assert!(AgentConfig::load(&path).is_err());
    }
}
