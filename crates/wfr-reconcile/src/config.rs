use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use wfr_core::{budget, PollBudget};

pub const DEFAULT_CONFIG_PATH: &str = "~/.wfr/wfr.toml";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub budgets: BudgetsConfig,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub url: String,
    /// Leading token of every bundle name the orchestration service submits.
    pub bundle_prefix: String,
    /// Page size for bundle listings.
    pub list_length: usize,
    pub timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11000/oozie".to_string(),
            bundle_prefix: "FALCON".to_string(),
            list_length: 10,
            timeout_secs: 30,
        }
    }
}

impl SchedulerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetsConfig {
    pub coordinator_creation: PollBudget,
    pub action_creation: PollBudget,
    pub action_terminal: PollBudget,
    pub bundle_status: PollBudget,
    pub bundle_over: PollBudget,
}

impl Default for BudgetsConfig {
    fn default() -> Self {
        Self {
            coordinator_creation: budget::COORDINATOR_CREATION,
            action_creation: budget::ACTION_CREATION,
            action_terminal: budget::ACTION_TERMINAL,
            bundle_status: budget::BUNDLE_STATUS,
            bundle_over: budget::BUNDLE_OVER,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Local directory standing in for the data store's root.
    pub root: String,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self { root: "/tmp/wfr-data".to_string() }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    /// Defaults when `path` does not exist; a file that exists must parse.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        expand_path(DEFAULT_CONFIG_PATH)
    }

    pub fn provisioning_root(&self) -> Result<PathBuf> {
        expand_path(&self.provisioning.root)
    }
}

fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).with_context(|| format!("expand {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
