//! Error types for snapshot loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while materializing a snapshot file.
///
/// A base snapshot failure is fatal for the whole store, while an overrides
/// failure is absorbed by the loader, which degrades to an empty overrides
/// set and logs a warning.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to fetch snapshot from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("snapshot not found at {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
