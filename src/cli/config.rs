//! Configuration file support.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::store::StoreOptions;

/// Directory under the home directory used when nothing else is configured.
const DEFAULT_ROOT_DIR: &str = ".pinthepiece";

/// Application configuration loaded from config file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage root
    pub dir: Option<PathBuf>,

    /// Rebuild the index from note files when it cannot be parsed
    pub recover_corrupt_index: bool,

    /// Remove temp files left by interrupted writes when opening the store
    pub sweep_temp_on_open: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dir: None,
            recover_corrupt_index: false,
            sweep_temp_on_open: true,
        }
    }
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Returns the path to the config file.
    ///
    /// Default: `~/.config/pinthepiece/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pinthepiece")
            .join("config.toml")
    }

    /// Resolve the storage root, with CLI argument taking precedence.
    ///
    /// Precedence order:
    /// 1. CLI `--dir` argument
    /// 2. Config file `dir` setting
    /// 3. `~/.pinthepiece`
    pub fn root_dir(&self, cli_dir: Option<&PathBuf>) -> PathBuf {
        cli_dir
            .cloned()
            .or_else(|| self.dir.clone())
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(DEFAULT_ROOT_DIR)
            })
    }

    /// Builds store options for the resolved root.
    pub fn store_options(&self, cli_dir: Option<&PathBuf>) -> StoreOptions {
        StoreOptions::new(self.root_dir(cli_dir))
            .recover_corrupt_index(self.recover_corrupt_index)
            .sweep_temp_on_open(self.sweep_temp_on_open)
    }
}
