use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::batch::{ConvertOptions, DEFAULT_BATCH_SIZE};
use crate::lookup::CatalogPaths;

const CONFIG_FILE: &str = "config.json";

/// Settings shared by every run, read from a JSON file. Command line flags
/// take precedence over anything set here.
///
/// ```json
/// {
///   "ships": "/data/eve/shiplist.csv",
///   "types": "/data/eve/typeid.csv",
///   "systems": "/data/eve/mapSolarSystems.csv",
///   "batch_size": 1000
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub ships: Option<PathBuf>,
    pub types: Option<PathBuf>,
    pub systems: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub threads: Option<usize>,
    pub narrow_types: Option<bool>,
}

impl Config {
    /// `config.json` in the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "eve-killmail-to-csv")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load an explicit config file, or the default one if it exists.
    /// An explicit path that can't be read is an error; a missing default
    /// file just means no configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("Invalid config: {:?}", path))?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse config JSON")
    }

    /// Values set in `overrides` replace ours
    pub fn merge(self, overrides: Config) -> Self {
        Self {
            ships: overrides.ships.or(self.ships),
            types: overrides.types.or(self.types),
            systems: overrides.systems.or(self.systems),
            batch_size: overrides.batch_size.or(self.batch_size),
            threads: overrides.threads.or(self.threads),
            narrow_types: overrides.narrow_types.or(self.narrow_types),
        }
    }

    pub fn catalog_paths(&self) -> CatalogPaths {
        CatalogPaths {
            ships: self.ships.clone(),
            types: self.types.clone(),
            systems: self.systems.clone(),
        }
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            threads: self.threads,
            narrow_types: self.narrow_types.unwrap_or(true),
        }
    }
}
