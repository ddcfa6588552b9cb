//! SQLite schema definitions for the listening history snapshots.
//!
//! The base snapshot arrives prebuilt from an export pipeline; its tables are
//! only checked for the columns queries rely on. The override tables are
//! created by this crate inside an in-memory database attached as
//! `overrides`, so every query can join them whether or not an overrides
//! snapshot was supplied.

use anyhow::Result;
use rusqlite::Connection;

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table};

/// Name of the attached schema holding the override tables.
pub const OVERRIDES_SCHEMA: &str = "overrides";

// =============================================================================
// Base Snapshot Tables
// =============================================================================

pub const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("artist_mbid", &SqlType::Text, is_primary_key = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!("profile_image_url", &SqlType::Text),
    ],
};

pub const RELEASES_TABLE: Table = Table {
    name: "releases",
    columns: &[
        sqlite_column!("release_mbid", &SqlType::Text, is_primary_key = true),
        sqlite_column!("release_name", &SqlType::Text, non_null = true),
        sqlite_column!("release_year", &SqlType::Integer),
        sqlite_column!("release_type_primary", &SqlType::Text),
        sqlite_column!("album_art_url", &SqlType::Text),
    ],
};

pub const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("track_mbid", &SqlType::Text, is_primary_key = true),
        sqlite_column!("track_name", &SqlType::Text, non_null = true),
        sqlite_column!("duration_ms", &SqlType::Integer),
        sqlite_column!("release_mbid", &SqlType::Text),
    ],
};

pub const TRACK_ARTISTS_TABLE: Table = Table {
    name: "track_artists",
    columns: &[
        sqlite_column!("track_mbid", &SqlType::Text, non_null = true),
        sqlite_column!("artist_mbid", &SqlType::Text, non_null = true),
        // 'main' or 'other'; at most one main credit per track
        sqlite_column!("role", &SqlType::Text, non_null = true),
    ],
};

pub const LISTENS_TABLE: Table = Table {
    name: "listens",
    columns: &[
        sqlite_column!("track_mbid", &SqlType::Text, non_null = true),
        sqlite_column!("timestamp", &SqlType::Integer, non_null = true),
        sqlite_column!("year", &SqlType::Integer),
        sqlite_column!("month", &SqlType::Integer),
        sqlite_column!("main_artist_mbid", &SqlType::Text),
    ],
};

pub const BASE_TABLES: &[&Table] = &[
    &ARTISTS_TABLE,
    &RELEASES_TABLE,
    &TRACKS_TABLE,
    &TRACK_ARTISTS_TABLE,
    &LISTENS_TABLE,
];

// =============================================================================
// Override Tables
// =============================================================================

pub const ARTIST_OVERRIDES_TABLE: Table = Table {
    name: "artist_overrides",
    columns: &[
        sqlite_column!("artist_mbid", &SqlType::Text, is_primary_key = true),
        sqlite_column!("profile_image_url", &SqlType::Text),
        sqlite_column!("profile_image_source", &SqlType::Text),
        sqlite_column!("profile_image_crop", &SqlType::Text),
        sqlite_column!("spotify_artist_id", &SqlType::Text),
        sqlite_column!("hidden", &SqlType::Integer, default_value = Some("0")),
        sqlite_column!("updated_at", &SqlType::Text),
        sqlite_column!("notes", &SqlType::Text),
    ],
};

pub const RELEASE_OVERRIDES_TABLE: Table = Table {
    name: "release_overrides",
    columns: &[
        sqlite_column!("release_mbid", &SqlType::Text, is_primary_key = true),
        sqlite_column!("album_art_url", &SqlType::Text),
        sqlite_column!("album_art_source", &SqlType::Text),
        sqlite_column!("album_art_crop", &SqlType::Text),
        sqlite_column!("release_date", &SqlType::Text),
        sqlite_column!("release_year", &SqlType::Integer),
        sqlite_column!("release_type_primary", &SqlType::Text),
        sqlite_column!("release_type_secondary", &SqlType::Text),
        sqlite_column!("genre", &SqlType::Text),
        sqlite_column!("spotify_album_id", &SqlType::Text),
        sqlite_column!("hidden", &SqlType::Integer, default_value = Some("0")),
        sqlite_column!("updated_at", &SqlType::Text),
        sqlite_column!("notes", &SqlType::Text),
    ],
};

pub const TRACK_OVERRIDES_TABLE: Table = Table {
    name: "track_overrides",
    columns: &[
        sqlite_column!("track_mbid", &SqlType::Text, is_primary_key = true),
        sqlite_column!("track_name", &SqlType::Text),
        sqlite_column!("spotify_track_id", &SqlType::Text),
        sqlite_column!("hidden", &SqlType::Integer, default_value = Some("0")),
        sqlite_column!("updated_at", &SqlType::Text),
        sqlite_column!("notes", &SqlType::Text),
    ],
};

/// (table, key column) pairs, in copy order.
pub const OVERRIDE_TABLES: &[(&Table, &str)] = &[
    (&ARTIST_OVERRIDES_TABLE, "artist_mbid"),
    (&RELEASE_OVERRIDES_TABLE, "release_mbid"),
    (&TRACK_OVERRIDES_TABLE, "track_mbid"),
];

// =============================================================================
// Schema Operations
// =============================================================================

/// Verify the base snapshot carries every table and column queries rely on.
pub fn ensure_base_schema(conn: &Connection) -> Result<()> {
    for table in BASE_TABLES {
        table.ensure_compatible(conn)?;
    }
    Ok(())
}

/// Attach the in-memory overrides database and create its tables.
///
/// Idempotent: calling it on an already initialized connection changes
/// nothing and keeps existing override rows.
pub fn init_overrides_schema(conn: &Connection) -> Result<()> {
    let already_attached: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_database_list WHERE name = ?1",
        [OVERRIDES_SCHEMA],
        |row| row.get(0),
    )?;
    if already_attached == 0 {
        conn.execute_batch(&format!(
            "ATTACH DATABASE ':memory:' AS {};",
            OVERRIDES_SCHEMA
        ))?;
    }
    for (table, _key) in OVERRIDE_TABLES {
        table.create(conn, Some(OVERRIDES_SCHEMA))?;
    }
    Ok(())
}

/// Drop all override rows, restoring the no-overrides state.
pub fn clear_overrides(conn: &Connection) -> Result<()> {
    for (table, _key) in OVERRIDE_TABLES {
        conn.execute(
            &format!("DELETE FROM {}", table.qualified_name(Some(OVERRIDES_SCHEMA))),
            [],
        )?;
    }
    Ok(())
}
