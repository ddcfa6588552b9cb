//! Snapshot acquisition.
//!
//! Snapshots are configured as either local paths or http(s) URLs. Remote
//! snapshots are downloaded into temp files at load time; the store holds on
//! to those files for as long as it lives.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::config::DatasetConfig;
use crate::error::DatasetError;
use crate::history_store::SqliteHistoryStore;

/// Where a snapshot comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// Fetched over HTTP(S) at load time.
    Remote(String),
    /// Read directly from the local filesystem.
    Local(PathBuf),
}

impl DatasetSource {
    /// Parse a configured location. Anything that does not look like an
    /// http(s) URL is a local path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            DatasetSource::Remote(location.to_string())
        } else {
            DatasetSource::Local(PathBuf::from(location))
        }
    }
}

/// A materialized snapshot file ready to be opened with SQLite.
///
/// Fetched snapshots live in a temp file that is removed on drop.
#[derive(Debug)]
pub enum DatasetFile {
    Local(PathBuf),
    Fetched(NamedTempFile),
}

impl DatasetFile {
    pub fn local(path: &Path) -> Self {
        DatasetFile::Local(path.to_path_buf())
    }

    pub fn path(&self) -> &Path {
        match self {
            DatasetFile::Local(path) => path,
            DatasetFile::Fetched(file) => file.path(),
        }
    }
}

/// Materialize one snapshot: check a local path, or download a remote one
/// into a temp file.
pub async fn fetch(source: &DatasetSource, timeout_secs: u64) -> Result<DatasetFile, DatasetError> {
    match source {
        DatasetSource::Local(path) => {
            if !path.exists() {
                return Err(DatasetError::NotFound(path.clone()));
            }
            Ok(DatasetFile::local(path))
        }
        DatasetSource::Remote(url) => {
            let client = Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .map_err(|source| DatasetError::Fetch {
                    url: url.clone(),
                    source,
                })?;
            let response = client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|source| DatasetError::Fetch {
                    url: url.clone(),
                    source,
                })?;
            let bytes = response.bytes().await.map_err(|source| DatasetError::Fetch {
                url: url.clone(),
                source,
            })?;

            let mut file = NamedTempFile::new()?;
            file.write_all(&bytes)?;
            file.flush()?;
            info!("Fetched snapshot from {} ({} bytes)", url, bytes.len());
            Ok(DatasetFile::Fetched(file))
        }
    }
}

/// Load the store described by a resolved config.
///
/// The base snapshot is required; a missing or unreadable overrides snapshot
/// downgrades to running without overrides.
pub async fn load(config: &DatasetConfig) -> Result<SqliteHistoryStore> {
    let base_source = DatasetSource::parse(&config.database);
    let base = fetch(&base_source, config.fetch_timeout_sec)
        .await
        .with_context(|| format!("Failed to materialize base snapshot from {}", config.database))?;

    let overrides = match &config.overrides {
        Some(location) => {
            let source = DatasetSource::parse(location);
            match fetch(&source, config.fetch_timeout_sec).await {
                Ok(file) => Some(file),
                Err(e) => {
                    warn!(
                        "Overrides snapshot unavailable, continuing without overrides: {}",
                        e
                    );
                    None
                }
            }
        }
        None => None,
    };

    SqliteHistoryStore::open(base, overrides)
}
