use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::plugin::pending::OrphanPolicy;
use crate::utils::paths::get_config_path;

/// Name and version of the running binary, captured once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}

impl AppInfo {
    pub fn from_build() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// How the external plugin backend is invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Executable providing the `plugin` subcommands
    #[serde(default = "default_backend_command")]
    pub command: String,
}

fn default_backend_command() -> String {
    "claude".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: default_backend_command(),
        }
    }
}

/// What happens to staged changes whose plugin vanished after a reload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingConfig {
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// List installed plugins that no marketplace advertises anymore
    #[serde(default = "default_true")]
    pub show_orphaned_installs: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_orphaned_installs: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub pending: PendingConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

fn default_theme() -> String {
    "default".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            backend: BackendConfig::default(),
            pending: PendingConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)?;

        Ok(())
    }
}
