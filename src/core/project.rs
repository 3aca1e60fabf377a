//! Project configuration file management.
//!
//! Handles reading, writing, and validating `.stagehand.toml`: the project
//! name, the declared stage and region order, and the optional KMS key ARN.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Project configuration file name.
pub const CONFIG_FILE: &str = ".stagehand.toml";

/// Project configuration stored in `.stagehand.toml`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectMeta,
    /// Optional KMS configuration; absent means encryption and decryption
    /// are never attempted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms: Option<KmsConfig>,
}

/// The `[project]` section.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub name: String,
    /// Stages in deployment order.
    #[serde(default)]
    pub stages: Vec<String>,
    /// Regions per stage, each list in deployment order.
    #[serde(default)]
    pub regions: BTreeMap<String, Vec<String>>,
}

/// The `[kms]` section.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KmsConfig {
    /// KMS key ARN, e.g. `arn:aws:kms:us-east-1:123456789012:key/abc-123`.
    pub key_arn: String,
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            project: ProjectMeta {
                name: name.into(),
                stages: Vec::new(),
                regions: BTreeMap::new(),
            },
            kms: None,
        }
    }

    pub fn config_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE)
    }

    pub fn exists() -> bool {
        Self::config_path().exists()
    }

    /// Load the project config from the current directory.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load the project config from `dir`.
    ///
    /// # Errors
    ///
    /// `ConfigError::NotInitialized` if the file doesn't exist,
    /// `ConfigError::Parse` if the TOML is malformed.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        debug!(path = %path.display(), "loading project config");

        if !path.exists() {
            return Err(ConfigError::NotInitialized.into());
        }
        let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadFile)?;
        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;

        debug!(
            stages = config.project.stages.len(),
            kms = config.kms.is_some(),
            "project config loaded"
        );
        Ok(config)
    }

    /// Save the project config into the current directory.
    pub fn save(&self) -> Result<()> {
        self.save_in(Path::new("."))
    }

    pub fn save_in(&self, dir: &Path) -> Result<()> {
        let path = dir.join(CONFIG_FILE);
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(&path, contents).map_err(ConfigError::WriteFile)?;
        debug!(path = %path.display(), "project config saved");
        Ok(())
    }

    pub fn stage_exists(&self, stage: &str) -> bool {
        self.project.stages.iter().any(|s| s == stage)
    }

    pub fn region_exists(&self, stage: &str, region: &str) -> bool {
        self.project
            .regions
            .get(stage)
            .map(|regions| regions.iter().any(|r| r == region))
            .unwrap_or(false)
    }

    /// Regions declared for a stage, in deployment order.
    pub fn regions_of(&self, stage: &str) -> &[String] {
        self.project
            .regions
            .get(stage)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The configured KMS key ARN, if any.
    pub fn key_arn(&self) -> Option<&str> {
        self.kms.as_ref().map(|k| k.key_arn.as_str())
    }
}
