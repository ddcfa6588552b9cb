//! Test fixture creation for snapshot databases
//!
//! Snapshots are plain SQLite files, so fixtures build them with direct SQL
//! inserts into a temp directory, the same file layout the snapshot pipeline
//! produces.

use std::path::{Path, PathBuf};

use anyhow::Result;
use listenvault::history_store::{BASE_TABLES, OVERRIDE_TABLES};
use rusqlite::{params, Connection};
use tempfile::TempDir;

use super::constants::*;

/// Writes snapshot SQLite files row by row.
pub struct SnapshotBuilder {
    conn: Connection,
}

#[allow(dead_code)]
impl SnapshotBuilder {
    /// Create an empty base snapshot with the full base schema at `path`.
    pub fn create_base(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        for table in BASE_TABLES {
            table.create(&conn, None)?;
        }
        Ok(Self { conn })
    }

    /// Create an empty overrides snapshot with all override tables at `path`.
    pub fn create_overrides(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        for (table, _key) in OVERRIDE_TABLES {
            table.create(&conn, None)?;
        }
        Ok(Self { conn })
    }

    /// Raw SQL escape hatch for snapshot shapes the builder does not model
    /// (older snapshots with missing tables or columns, extra columns, ...).
    pub fn execute(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Base snapshot rows
    // ------------------------------------------------------------------------

    pub fn insert_artist(&self, mbid: &str, name: &str, image_url: Option<&str>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO artists (artist_mbid, artist_name, profile_image_url)
             VALUES (?1, ?2, ?3)",
            params![mbid, name, image_url],
        )?;
        Ok(())
    }

    pub fn insert_release(
        &self,
        mbid: &str,
        name: &str,
        year: Option<i64>,
        release_type: Option<&str>,
        album_art_url: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO releases
                 (release_mbid, release_name, release_year, release_type_primary, album_art_url)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![mbid, name, year, release_type, album_art_url],
        )?;
        Ok(())
    }

    pub fn insert_track(
        &self,
        mbid: &str,
        release_mbid: &str,
        name: &str,
        duration_ms: Option<i64>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tracks (track_mbid, track_name, duration_ms, release_mbid)
             VALUES (?1, ?2, ?3, ?4)",
            params![mbid, name, duration_ms, release_mbid],
        )?;
        Ok(())
    }

    pub fn insert_credit(&self, track_mbid: &str, artist_mbid: &str, role: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO track_artists (track_mbid, artist_mbid, role) VALUES (?1, ?2, ?3)",
            params![track_mbid, artist_mbid, role],
        )?;
        Ok(())
    }

    /// Insert `count` listens of one track in one calendar month.
    pub fn insert_listens(
        &self,
        track_mbid: &str,
        main_artist_mbid: Option<&str>,
        year: i32,
        month: u32,
        count: usize,
    ) -> Result<()> {
        for i in 0..count {
            // Synthetic but ordered; queries only read the year/month columns
            let timestamp = (year as i64) * 1_000_000 + (month as i64) * 10_000 + i as i64;
            self.conn.execute(
                "INSERT INTO listens (track_mbid, timestamp, year, month, main_artist_mbid)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![track_mbid, timestamp, year, month, main_artist_mbid],
            )?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Overrides snapshot rows (one insert per entity, NULL means "not set")
    // ------------------------------------------------------------------------

    pub fn set_artist_override(
        &self,
        mbid: &str,
        profile_image_url: Option<&str>,
        hidden: bool,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO artist_overrides (artist_mbid, profile_image_url, hidden)
             VALUES (?1, ?2, ?3)",
            params![mbid, profile_image_url, hidden as i64],
        )?;
        Ok(())
    }

    pub fn set_release_override(
        &self,
        mbid: &str,
        album_art_url: Option<&str>,
        release_year: Option<i64>,
        release_type: Option<&str>,
        hidden: bool,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO release_overrides
                 (release_mbid, album_art_url, release_year, release_type_primary, hidden)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![mbid, album_art_url, release_year, release_type, hidden as i64],
        )?;
        Ok(())
    }

    pub fn set_track_override(
        &self,
        mbid: &str,
        track_name: Option<&str>,
        hidden: bool,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO track_overrides (track_mbid, track_name, hidden)
             VALUES (?1, ?2, ?3)",
            params![mbid, track_name, hidden as i64],
        )?;
        Ok(())
    }
}

/// Creates the standard test catalog in a fresh temp directory.
/// Returns (temp_dir, base_snapshot_path).
///
/// Catalog layout:
/// - "The Test Band" (artist-1): "First Album" (2020, Album) with Opening
///   Track (600000 ms), Middle Track (180000 ms) and the never-listened
///   Closing Track (guest credit: Jazz Ensemble); plus "Early EP" (2015, EP)
///   with the never-listened Quiet Opening.
/// - "Jazz Ensemble" (artist-2): "Jazz Collection" (2021, Album) with Smooth
///   Jazz (200000 ms) and Upbeat Jazz (NULL duration).
/// - "The Quiet One" (artist-3): no tracks at all.
/// - "Various Gems" (album-4, 2019, Compilation): Hidden Gem (150000 ms)
///   with no artist credits.
///
/// Listens:
/// - Opening Track: 3x 2021-03            -> artist-1: 5 listens, 36 minutes
/// - Middle Track:  1x 2021-03, 1x 2021-05
/// - Smooth Jazz:   4x 2021-07            -> artist-2: 7 listens, 13 minutes
/// - Upbeat Jazz:   3x 2022-01               (NULL duration counts zero)
/// - Hidden Gem:    2x 2021-09            -> unattributed
pub fn create_test_snapshot() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let base_path = dir.path().join("listening_history.sqlite");

    let builder = SnapshotBuilder::create_base(&base_path)?;

    builder.insert_artist(ARTIST_1_ID, ARTIST_1_NAME, Some(ARTIST_1_IMAGE))?;
    builder.insert_artist(ARTIST_2_ID, ARTIST_2_NAME, None)?;
    builder.insert_artist(ARTIST_3_ID, ARTIST_3_NAME, None)?;

    builder.insert_release(
        ALBUM_1_ID,
        ALBUM_1_TITLE,
        Some(2020),
        Some("Album"),
        Some("https://img.example/first-album.jpg"),
    )?;
    builder.insert_release(ALBUM_2_ID, ALBUM_2_TITLE, Some(2021), Some("Album"), None)?;
    builder.insert_release(ALBUM_3_ID, ALBUM_3_TITLE, Some(2015), Some("EP"), None)?;
    builder.insert_release(ALBUM_4_ID, ALBUM_4_TITLE, Some(2019), Some("Compilation"), None)?;

    builder.insert_track(TRACK_1_ID, ALBUM_1_ID, TRACK_1_TITLE, Some(600_000))?;
    builder.insert_track(TRACK_2_ID, ALBUM_1_ID, TRACK_2_TITLE, Some(180_000))?;
    builder.insert_track(TRACK_3_ID, ALBUM_1_ID, TRACK_3_TITLE, Some(210_000))?;
    builder.insert_track(TRACK_4_ID, ALBUM_2_ID, TRACK_4_TITLE, Some(200_000))?;
    builder.insert_track(TRACK_5_ID, ALBUM_2_ID, TRACK_5_TITLE, None)?;
    builder.insert_track(TRACK_6_ID, ALBUM_3_ID, TRACK_6_TITLE, Some(300_000))?;
    builder.insert_track(TRACK_7_ID, ALBUM_4_ID, TRACK_7_TITLE, Some(150_000))?;

    builder.insert_credit(TRACK_1_ID, ARTIST_1_ID, "main")?;
    builder.insert_credit(TRACK_2_ID, ARTIST_1_ID, "main")?;
    builder.insert_credit(TRACK_3_ID, ARTIST_1_ID, "main")?;
    builder.insert_credit(TRACK_3_ID, ARTIST_2_ID, "other")?;
    builder.insert_credit(TRACK_4_ID, ARTIST_2_ID, "main")?;
    builder.insert_credit(TRACK_5_ID, ARTIST_2_ID, "main")?;
    builder.insert_credit(TRACK_6_ID, ARTIST_1_ID, "main")?;

    builder.insert_listens(TRACK_1_ID, Some(ARTIST_1_ID), 2021, 3, 3)?;
    builder.insert_listens(TRACK_2_ID, Some(ARTIST_1_ID), 2021, 3, 1)?;
    builder.insert_listens(TRACK_2_ID, Some(ARTIST_1_ID), 2021, 5, 1)?;
    builder.insert_listens(TRACK_4_ID, Some(ARTIST_2_ID), 2021, 7, 4)?;
    builder.insert_listens(TRACK_5_ID, Some(ARTIST_2_ID), 2022, 1, 3)?;
    builder.insert_listens(TRACK_7_ID, None, 2021, 9, 2)?;

    Ok((dir, base_path))
}

/// Standard catalog plus an empty overrides snapshot beside it.
/// Returns (temp_dir, base_path, overrides_path, overrides_builder); tests
/// add override rows through the builder before opening the store.
#[allow(dead_code)]
pub fn create_test_snapshot_with_overrides(
) -> Result<(TempDir, PathBuf, PathBuf, SnapshotBuilder)> {
    let (dir, base_path) = create_test_snapshot()?;
    let overrides_path = dir.path().join("listening_history_overrides.sqlite");
    let overrides = SnapshotBuilder::create_overrides(&overrides_path)?;
    Ok((dir, base_path, overrides_path, overrides))
}
