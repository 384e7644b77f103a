//! Configuration management for Strata
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files: how many layers the manager keeps, which restacking
//! strategy it uses and how verbosely it logs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::strategy::StackingMode;

/// Largest layer count accepted from a configuration file
pub const MAX_LAYERS: usize = 64;

/// Main configuration struct containing all Strata settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StackConfig {
    /// Layer manager settings
    #[serde(default)]
    pub stacking: StackingConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackingConfig {
    /// Number of layers (1-64); 13 holds every named band
    #[serde(default = "StackingConfig::default_layers")]
    pub layers: usize,

    /// "eager" sends partial restacks at once, "deferred" waits for a full one
    #[serde(default)]
    pub mode: StackingMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default log filter ("trace", "debug", "info", "warn", "error");
    /// RUST_LOG takes precedence
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl Default for StackingConfig {
    fn default() -> Self {
        Self {
            layers: Self::default_layers(),
            mode: StackingMode::default(),
        }
    }
}

impl StackingConfig {
    fn default_layers() -> usize {
        crate::layer::LayerLevel::COUNT
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

impl LoggingConfig {
    pub const LEVELS: [&'static str; 5] = ["trace", "debug", "info", "warn", "error"];

    fn default_level() -> String {
        "info".to_string()
    }
}

/// Expands a leading `~` to the user's home directory
fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Ok(Path::new(&home).join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}

impl StackConfig {
    /// Location of the user's configuration file
    pub fn default_path() -> PathBuf {
        PathBuf::from("~/.config/strata/strata.toml")
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_home(path.as_ref())?;

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: StackConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.stacking.layers == 0 || self.stacking.layers > MAX_LAYERS {
            anyhow::bail!(
                "Invalid layers: {} (must be between 1 and {})",
                self.stacking.layers,
                MAX_LAYERS
            );
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LoggingConfig::LEVELS.contains(&level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = expand_home(path.as_ref())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(&path, contents).context("Failed to write configuration file")?;

        Ok(())
    }
}


#[cfg(test)]
mod property_tests;
