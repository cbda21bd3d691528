use anyhow::{Context, Result};
use roombook_engine::SchedulingRules;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI configuration loaded from a TOML file.
///
/// ```toml
/// [rules]
/// opening = "08:00"
/// closing = "18:00"
/// slot_minutes = 30
/// min_duration_minutes = 60
///
/// [store]
/// path = "/var/lib/roombook/occurrences.json"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Operating hours and slot grid
    #[serde(default)]
    pub rules: SchedulingRules,

    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding committed occurrences
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("roombook.json")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl CliConfig {
    /// Load from `path`, or fall back to defaults when no file was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .rules
            .validate()
            .with_context(|| format!("Invalid rules in config file: {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
