//! Listenvault Library
//!
//! Read-only browsing and statistics layer over a personal music listening
//! history. Loads a prebuilt SQLite snapshot (plus an optional metadata
//! overrides snapshot) and answers the queries a music-browser front end
//! needs: top artists, top albums, artist/release/year detail pages and
//! artist search, all respecting field-level overrides and entity hiding.

pub mod config;
pub mod dataset;
pub mod error;
pub mod history_store;
pub mod search_session;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use config::{DatasetConfig, FileConfig};
pub use dataset::{DatasetFile, DatasetSource};
pub use error::DatasetError;
pub use history_store::{ChartMode, ListeningHistory, SqliteHistoryStore};
pub use search_session::{SearchSession, SearchTicket};
