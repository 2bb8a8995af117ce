//! Configuration management for fleet-upkeep
//!
//! Config stored at: ~/.config/fleet-upkeep/config.json

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use upkeep_domain::model::ServiceIntervalTable;
use upkeep_infra::interval_table_loader;
use upkeep_types::{ConfigError, OutputFormat, Result};

const APP_DIR: &str = "fleet-upkeep";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the fleet snapshot
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// TOML interval table; built-in intervals when unset
    #[serde(default)]
    pub intervals_path: Option<PathBuf>,

    /// Default output format (json, table)
    #[serde(default)]
    pub output_format: OutputFormat,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join(APP_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Get the store directory path
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.store_dir {
            return Ok(dir.clone());
        }

        let store_dir = dirs::data_dir()
            .ok_or(ConfigError::NotFound)?
            .join(APP_DIR);
        Ok(store_dir)
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Interval table from `intervals_path`, or the built-in defaults
    pub fn interval_table(&self) -> Result<ServiceIntervalTable> {
        match self.intervals_path {
            Some(ref path) => {
                tracing::debug!(path = %path.display(), "loading interval table");
                interval_table_loader::load_from_file(path)
            }
            None => Ok(ServiceIntervalTable::default()),
        }
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Fleet Upkeep Configuration")?;
        writeln!(f, "==========================")?;
        writeln!(f)?;
        writeln!(
            f,
            "Store dir:      {}",
            self.store_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(
            f,
            "Intervals:      {}",
            self.intervals_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(built-in)".to_string())
        )?;
        writeln!(f, "Output format:  {}", self.output_format)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:    {}", path.display())?;
        }

        Ok(())
    }
}
