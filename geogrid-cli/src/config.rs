//! Configuration handling for the GeoGrid CLI
//!
//! Supports loading configuration from geogrid.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use geogrid_core::GridConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CliError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print the JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Only keep commands issued after the last clear of each cycle
    #[serde(default)]
    pub live_only: bool,

    /// Pixel size of one world tile at zoom 0
    #[serde(default = "default_tile_size")]
    pub tile_size: f64,
}

fn default_true() -> bool { true }
fn default_tile_size() -> f64 { 256.0 }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            live_only: false,
            tile_size: default_tile_size(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from("geogrid.toml");
                if default_path.exists() {
                    log::info!("Loading configuration from: geogrid.toml");
                    Self::load_from_file(&default_path)?
                } else {
                    log::info!("Using default configuration");
                    Self::default()
                }
            }
        };

        config.grid.validate().map_err(CliError::from)?;
        if !(config.output.tile_size.is_finite() && config.output.tile_size > 0.0) {
            return Err(CliError::config("[output] tile_size must be positive").into());
        }

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default()).context("Failed to serialize default configuration")
    }
}
