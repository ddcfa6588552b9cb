//! Common test infrastructure
//!
//! This module provides everything end-to-end tests need: a builder for
//! snapshot SQLite files plus the standard test catalog. Tests should only
//! import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{create_test_snapshot, ARTIST_1_ID};
//! use listenvault::SqliteHistoryStore;
//!
//! #[test]
//! fn test_artist_exists() {
//!     let (_dir, base_path) = create_test_snapshot().unwrap();
//!     let store = SqliteHistoryStore::open_paths(&base_path, None).unwrap();
//!     assert!(store.artist_info(ARTIST_1_ID).unwrap().is_some());
//! }
//! ```

mod constants;
mod fixtures;

// Public API - this is what tests import. Not every test binary uses every
// helper, hence the allow.
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{create_test_snapshot, create_test_snapshot_with_overrides, SnapshotBuilder};
