//! Configuration for locating the listening history snapshots.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_DATABASE: &str = "listening_history.sqlite";
pub const DEFAULT_OVERRIDES: &str = "listening_history_overrides.sqlite";
pub const DEFAULT_FETCH_TIMEOUT_SEC: u64 = 60;

/// Raw TOML file configuration. Every field is optional; defaults are
/// applied by [`DatasetConfig::resolve`].
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    /// Local path or http(s) URL of the base listening history snapshot.
    pub database: Option<String>,
    /// Local path or http(s) URL of the overrides snapshot. An empty string
    /// disables overrides entirely.
    pub overrides: Option<String>,
    /// Timeout for HTTP snapshot fetches, in seconds.
    pub fetch_timeout_sec: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

/// Resolved snapshot locations with defaults applied.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub database: String,
    pub overrides: Option<String>,
    pub fetch_timeout_sec: u64,
}

impl DatasetConfig {
    /// Resolve configuration from an optional TOML file config.
    pub fn resolve(file_config: Option<FileConfig>) -> Self {
        let file = file_config.unwrap_or_default();

        let database = file
            .database
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        // Missing key means "use the conventional sibling file"; an explicit
        // empty string opts out of overrides.
        let overrides = match file.overrides {
            Some(s) if s.is_empty() => None,
            Some(s) => Some(s),
            None => Some(DEFAULT_OVERRIDES.to_string()),
        };

        let fetch_timeout_sec = file.fetch_timeout_sec.unwrap_or(DEFAULT_FETCH_TIMEOUT_SEC);

        Self {
            database,
            overrides,
            fetch_timeout_sec,
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self::resolve(None)
    }
}
