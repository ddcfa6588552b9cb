//! SQLite-backed listening history store.
//!
//! One connection serves every query: its main database is the read-only
//! base snapshot, and an in-memory `overrides` schema is attached at open so
//! override joins behave identically whether or not an overrides snapshot
//! was supplied. Every view-facing query runs through the same visibility
//! predicates and `COALESCE` field precedence.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Datelike;
use rusqlite::{params, types::Value, Connection};
use tracing::{debug, info, warn};

use super::models::*;
use super::schema::{self, OVERRIDES_SCHEMA};
use super::timeline::{ListeningHistory, MonthlyCount};
use crate::dataset::DatasetFile;

/// Year range answered when the snapshot holds no listens at all.
const FALLBACK_MIN_YEAR: i32 = 1960;

// Visibility predicates shared by every query. `ao`, `ro` and `tro` are the
// conventional aliases for the artist/release/track override joins; a missing
// override row (NULL hidden) counts as visible.
const ARTIST_VISIBLE: &str = "(ao.hidden IS NULL OR ao.hidden = 0)";
const RELEASE_VISIBLE: &str = "(ro.hidden IS NULL OR ro.hidden = 0)";
const TRACK_VISIBLE: &str = "(tro.hidden IS NULL OR tro.hidden = 0)";

/// Escape LIKE wildcards so user text matches literally under `ESCAPE '\'`.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// SQLite-backed store over the listening history snapshots.
#[derive(Clone)]
pub struct SqliteHistoryStore {
    conn: Arc<Mutex<Connection>>,
    // Keeps fetched snapshot temp files alive for the lifetime of the store.
    _snapshots: Arc<Vec<DatasetFile>>,
}

impl SqliteHistoryStore {
    /// Open the base snapshot and merge in the optional overrides snapshot.
    ///
    /// A base snapshot that cannot be opened or fails the schema check is a
    /// fatal error. An overrides snapshot that cannot be read degrades to an
    /// empty overrides set with a warning.
    pub fn open(base: DatasetFile, overrides: Option<DatasetFile>) -> Result<Self> {
        // READ_WRITE (without CREATE) keeps the attached in-memory overrides
        // schema writable; the main database itself is never written.
        let conn = Connection::open_with_flags(
            base.path(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open listening history snapshot {:?}", base.path()))?;

        schema::ensure_base_schema(&conn).context("Listening history snapshot schema check failed")?;
        schema::init_overrides_schema(&conn)?;

        if let Some(source) = overrides.as_ref() {
            match Self::copy_overrides(&conn, source.path()) {
                Ok(total) => info!("Loaded {} override rows from overrides snapshot", total),
                Err(e) => {
                    warn!(
                        "Failed to load overrides snapshot, continuing without overrides: {:#}",
                        e
                    );
                    schema::clear_overrides(&conn)?;
                }
            }
        }

        let artist_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM artists", [], |r| r.get(0))
            .unwrap_or(0);
        let release_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM releases", [], |r| r.get(0))
            .unwrap_or(0);
        let track_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM tracks", [], |r| r.get(0))
            .unwrap_or(0);
        let listen_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM listens", [], |r| r.get(0))
            .unwrap_or(0);

        info!(
            "Opened listening history: {} artists, {} releases, {} tracks, {} listens",
            artist_count, release_count, track_count, listen_count
        );

        let mut snapshots = vec![base];
        if let Some(source) = overrides {
            snapshots.push(source);
        }

        Ok(SqliteHistoryStore {
            conn: Arc::new(Mutex::new(conn)),
            _snapshots: Arc::new(snapshots),
        })
    }

    /// Open from local paths. Convenience over [`SqliteHistoryStore::open`].
    pub fn open_paths(base: &Path, overrides: Option<&Path>) -> Result<Self> {
        Self::open(DatasetFile::local(base), overrides.map(DatasetFile::local))
    }

    /// Copy override rows from a snapshot file into the attached schema.
    ///
    /// Tables missing from the snapshot are skipped; columns are intersected
    /// with the known schema so older or partial snapshots load fine. Rows
    /// keyed to entities the base snapshot does not know are copied too;
    /// they simply never join.
    fn copy_overrides(conn: &Connection, source: &Path) -> Result<u64> {
        let src = Connection::open_with_flags(
            source,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open overrides snapshot {:?}", source))?;

        let mut total = 0u64;
        for (table, key) in schema::OVERRIDE_TABLES {
            let present: i64 = src.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table.name],
                |r| r.get(0),
            )?;
            if present == 0 {
                debug!("Overrides snapshot has no {} table, skipping", table.name);
                continue;
            }

            let mut info_stmt = src.prepare(&format!("PRAGMA table_info({});", table.name))?;
            let source_columns: Vec<String> = info_stmt
                .query_map([], |row| row.get::<_, String>(1))?
                .collect::<Result<Vec<String>, _>>()?;

            let columns: Vec<&str> = table
                .column_names()
                .filter(|name| source_columns.iter().any(|c| c == name))
                .collect();
            if !columns.contains(key) {
                warn!(
                    "Overrides table {} lacks its key column {}, skipping",
                    table.name, key
                );
                continue;
            }

            let column_list = columns.join(", ");
            let placeholders = (1..=columns.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ");

            let mut select = src.prepare(&format!(
                "SELECT {} FROM {}",
                column_list, table.name
            ))?;
            let mut insert = conn.prepare(&format!(
                "INSERT OR REPLACE INTO {}.{} ({}) VALUES ({})",
                OVERRIDES_SCHEMA, table.name, column_list, placeholders
            ))?;

            let mut copied = 0u64;
            let mut rows = select.query([])?;
            while let Some(row) = rows.next()? {
                let values: Vec<Value> = (0..columns.len())
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<Result<Vec<Value>, _>>()?;
                insert.execute(rusqlite::params_from_iter(values))?;
                copied += 1;
            }
            debug!("Loaded {} override rows into {}", copied, table.name);
            total += copied;
        }
        Ok(total)
    }

    // =========================================================================
    // Overview
    // =========================================================================

    /// Home-page counters, all visibility-filtered.
    pub fn overview(&self) -> Result<OverviewStats> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT
                (SELECT COUNT(*) FROM listens l
                   LEFT JOIN overrides.track_overrides tro ON tro.track_mbid = l.track_mbid
                   WHERE (tro.hidden IS NULL OR tro.hidden = 0)),
                (SELECT COUNT(*) FROM artists a
                   LEFT JOIN overrides.artist_overrides ao ON ao.artist_mbid = a.artist_mbid
                   WHERE (ao.hidden IS NULL OR ao.hidden = 0)),
                (SELECT COUNT(*) FROM releases r
                   LEFT JOIN overrides.release_overrides ro ON ro.release_mbid = r.release_mbid
                   WHERE (ro.hidden IS NULL OR ro.hidden = 0)),
                (SELECT COUNT(*) FROM tracks t
                   LEFT JOIN overrides.track_overrides tro ON tro.track_mbid = t.track_mbid
                   WHERE (tro.hidden IS NULL OR tro.hidden = 0))",
        )?;
        let stats = stmt.query_row([], |row| {
            Ok(OverviewStats {
                total_listens: row.get::<_, i64>(0)? as u64,
                total_artists: row.get::<_, i64>(1)? as u64,
                total_releases: row.get::<_, i64>(2)? as u64,
                total_tracks: row.get::<_, i64>(3)? as u64,
            })
        })?;
        Ok(stats)
    }

    // =========================================================================
    // Top Lists
    // =========================================================================

    /// All-time artist ranking. Artists with no counted listens never appear.
    pub fn top_artists(&self, query: &TopArtistsQuery) -> Result<Vec<ArtistRow>> {
        let conn = self.conn.lock().unwrap();
        Self::top_artists_scoped(&conn, None, &query.sort, query.limit)
    }

    /// All-time album ranking, grouped by (release, attributed main artist).
    pub fn top_albums(&self, query: &TopAlbumsQuery) -> Result<Vec<AlbumRow>> {
        let conn = self.conn.lock().unwrap();
        Self::top_albums_scoped(&conn, None, None, &query.sort, query.limit)
    }

    fn top_artists_scoped(
        conn: &Connection,
        listened_year: Option<i32>,
        sort: &ArtistSort,
        limit: usize,
    ) -> Result<Vec<ArtistRow>> {
        let order_clause = match sort {
            ArtistSort::Listens => "total_listens DESC",
            ArtistSort::Minutes => "total_minutes DESC",
        };
        let query = format!(
            "SELECT a.artist_mbid,
                    a.artist_name,
                    COALESCE(ao.profile_image_url, a.profile_image_url) AS profile_image_url,
                    COUNT(DISTINCT l.track_mbid) AS unique_tracks,
                    COUNT(*) AS total_listens,
                    CAST(SUM(COALESCE(t.duration_ms, 0)) / 60000.0 AS INTEGER) AS total_minutes
             FROM listens l
             JOIN tracks t ON t.track_mbid = l.track_mbid
             LEFT JOIN overrides.track_overrides tro ON tro.track_mbid = t.track_mbid
             JOIN track_artists ta ON ta.track_mbid = t.track_mbid AND ta.role = '{main_role}'
             JOIN artists a ON a.artist_mbid = ta.artist_mbid
             LEFT JOIN overrides.artist_overrides ao ON ao.artist_mbid = a.artist_mbid
             WHERE {track_visible} AND {artist_visible}
               AND (?1 IS NULL OR l.year = ?1)
             GROUP BY a.artist_mbid
             ORDER BY {order_clause}
             LIMIT ?2",
            main_role = CreditRole::Main.to_db_str(),
            track_visible = TRACK_VISIBLE,
            artist_visible = ARTIST_VISIBLE,
            order_clause = order_clause,
        );

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(params![listened_year, limit as i64], |row| {
                Ok(ArtistRow {
                    artist_mbid: row.get(0)?,
                    artist_name: row.get(1)?,
                    profile_image_url: row.get(2)?,
                    stats: ListenStats {
                        unique_tracks: row.get::<_, i64>(3)? as u64,
                        total_listens: row.get::<_, i64>(4)? as u64,
                        total_minutes: row.get::<_, i64>(5)? as u64,
                    },
                })
            })?
            .collect::<Result<Vec<ArtistRow>, _>>()?;
        Ok(rows)
    }

    fn top_albums_scoped(
        conn: &Connection,
        listened_year: Option<i32>,
        released_year: Option<i32>,
        sort: &AlbumSort,
        limit: usize,
    ) -> Result<Vec<AlbumRow>> {
        let order_clause = match sort {
            AlbumSort::Listens => "total_listens DESC",
            AlbumSort::Minutes => "total_minutes DESC",
            AlbumSort::ReleaseDate => "release_year DESC, total_listens DESC",
        };
        // The main-artist credit is LEFT-joined so listens of uncredited
        // tracks aggregate under a NULL artist instead of disappearing.
        let query = format!(
            "SELECT r.release_mbid,
                    r.release_name,
                    COALESCE(ro.release_year, r.release_year) AS release_year,
                    COALESCE(ro.release_type_primary, r.release_type_primary) AS release_type,
                    COALESCE(ro.album_art_url, r.album_art_url) AS album_art_url,
                    a.artist_mbid,
                    a.artist_name,
                    COUNT(DISTINCT l.track_mbid) AS unique_tracks,
                    COUNT(*) AS total_listens,
                    CAST(SUM(COALESCE(t.duration_ms, 0)) / 60000.0 AS INTEGER) AS total_minutes
             FROM listens l
             JOIN tracks t ON t.track_mbid = l.track_mbid
             LEFT JOIN overrides.track_overrides tro ON tro.track_mbid = t.track_mbid
             JOIN releases r ON r.release_mbid = t.release_mbid
             LEFT JOIN overrides.release_overrides ro ON ro.release_mbid = r.release_mbid
             LEFT JOIN track_artists ta ON ta.track_mbid = t.track_mbid AND ta.role = '{main_role}'
             LEFT JOIN artists a ON a.artist_mbid = ta.artist_mbid
             LEFT JOIN overrides.artist_overrides ao ON ao.artist_mbid = a.artist_mbid
             WHERE {track_visible} AND {release_visible} AND {artist_visible}
               AND (?1 IS NULL OR l.year = ?1)
               AND (?2 IS NULL OR COALESCE(ro.release_year, r.release_year) = ?2)
             GROUP BY r.release_mbid, a.artist_mbid
             ORDER BY {order_clause}
             LIMIT ?3",
            main_role = CreditRole::Main.to_db_str(),
            track_visible = TRACK_VISIBLE,
            release_visible = RELEASE_VISIBLE,
            artist_visible = ARTIST_VISIBLE,
            order_clause = order_clause,
        );

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(
                params![listened_year, released_year, limit as i64],
                Self::parse_album_row,
            )?
            .collect::<Result<Vec<AlbumRow>, _>>()?;
        Ok(rows)
    }

    fn parse_album_row(row: &rusqlite::Row) -> rusqlite::Result<AlbumRow> {
        Ok(AlbumRow {
            release_mbid: row.get(0)?,
            release_name: row.get(1)?,
            release_year: row.get(2)?,
            release_type: row.get(3)?,
            album_art_url: row.get(4)?,
            artist_mbid: row.get(5)?,
            artist_name: row.get(6)?,
            stats: ListenStats {
                unique_tracks: row.get::<_, i64>(7)? as u64,
                total_listens: row.get::<_, i64>(8)? as u64,
                total_minutes: row.get::<_, i64>(9)? as u64,
            },
        })
    }

    // =========================================================================
    // Artist Detail
    // =========================================================================

    /// Everything the artist detail view renders, or `None` for an unknown id.
    pub fn artist_page(&self, artist_mbid: &str, query: &ArtistPageQuery) -> Result<Option<ArtistPage>> {
        let info = match self.artist_info(artist_mbid)? {
            Some(info) => info,
            None => return Ok(None),
        };
        let top_tracks =
            self.artist_top_tracks(artist_mbid, &query.track_sort, query.track_limit)?;
        let releases =
            self.artist_releases(artist_mbid, &query.release_sort, query.release_limit)?;
        let history = self.artist_history(artist_mbid)?;
        Ok(Some(ArtistPage {
            info,
            top_tracks,
            releases,
            history,
        }))
    }

    /// Artist profile header and all-time totals. Addressing a hidden artist
    /// directly still answers; hiding governs lists and aggregates.
    pub fn artist_info(&self, artist_mbid: &str) -> Result<Option<ArtistInfo>> {
        let conn = self.conn.lock().unwrap();

        let mut profile_stmt = conn.prepare_cached(
            "SELECT a.artist_name,
                    COALESCE(ao.profile_image_url, a.profile_image_url) AS profile_image_url
             FROM artists a
             LEFT JOIN overrides.artist_overrides ao ON ao.artist_mbid = a.artist_mbid
             WHERE a.artist_mbid = ?1",
        )?;
        let profile = match profile_stmt.query_row(params![artist_mbid], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        }) {
            Ok(profile) => profile,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let (artist_name, profile_image_url) = profile;

        let totals_query = format!(
            "SELECT COUNT(DISTINCT l.track_mbid) AS unique_tracks,
                    COUNT(l.timestamp) AS total_listens,
                    COALESCE(CAST(SUM(CASE WHEN l.timestamp IS NOT NULL
                                           THEN COALESCE(t.duration_ms, 0) ELSE 0 END) / 60000.0 AS INTEGER), 0)
                        AS total_minutes,
                    COUNT(DISTINCT CASE WHEN {release_visible} THEN t.release_mbid END) AS total_releases
             FROM tracks t
             JOIN track_artists ta ON ta.track_mbid = t.track_mbid
                  AND ta.role = '{main_role}' AND ta.artist_mbid = ?1
             LEFT JOIN overrides.track_overrides tro ON tro.track_mbid = t.track_mbid
             LEFT JOIN overrides.release_overrides ro ON ro.release_mbid = t.release_mbid
             LEFT JOIN listens l ON l.track_mbid = t.track_mbid
             WHERE {track_visible}",
            main_role = CreditRole::Main.to_db_str(),
            release_visible = RELEASE_VISIBLE,
            track_visible = TRACK_VISIBLE,
        );
        let mut totals_stmt = conn.prepare(&totals_query)?;
        let (stats, total_releases) = totals_stmt.query_row(params![artist_mbid], |row| {
            Ok((
                ListenStats {
                    unique_tracks: row.get::<_, i64>(0)? as u64,
                    total_listens: row.get::<_, i64>(1)? as u64,
                    total_minutes: row.get::<_, i64>(2)? as u64,
                },
                row.get::<_, i64>(3)? as u64,
            ))
        })?;

        Ok(Some(ArtistInfo {
            artist_mbid: artist_mbid.to_string(),
            artist_name,
            profile_image_url,
            stats,
            total_releases,
        }))
    }

    /// Most-listened tracks of one artist; zero-listen tracks never appear.
    pub fn artist_top_tracks(
        &self,
        artist_mbid: &str,
        sort: &TrackSort,
        limit: usize,
    ) -> Result<Vec<TrackRow>> {
        let conn = self.conn.lock().unwrap();
        let order_clause = match sort {
            TrackSort::Listens => "play_count DESC",
            TrackSort::Minutes => "total_minutes DESC",
        };
        let query = format!(
            "SELECT t.track_mbid,
                    COALESCE(tro.track_name, t.track_name) AS track_name,
                    t.duration_ms,
                    COUNT(*) AS play_count,
                    CAST(SUM(COALESCE(t.duration_ms, 0)) / 60000.0 AS INTEGER) AS total_minutes
             FROM listens l
             JOIN tracks t ON t.track_mbid = l.track_mbid
             LEFT JOIN overrides.track_overrides tro ON tro.track_mbid = t.track_mbid
             JOIN track_artists ta ON ta.track_mbid = t.track_mbid
                  AND ta.role = '{main_role}' AND ta.artist_mbid = ?1
             WHERE {track_visible}
             GROUP BY t.track_mbid
             ORDER BY {order_clause}
             LIMIT ?2",
            main_role = CreditRole::Main.to_db_str(),
            track_visible = TRACK_VISIBLE,
            order_clause = order_clause,
        );

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(params![artist_mbid, limit as i64], |row| {
                Ok(TrackRow {
                    track_mbid: row.get(0)?,
                    track_name: row.get(1)?,
                    duration_ms: row.get(2)?,
                    play_count: row.get::<_, i64>(3)? as u64,
                    total_minutes: row.get::<_, i64>(4)? as u64,
                })
            })?
            .collect::<Result<Vec<TrackRow>, _>>()?;
        Ok(rows)
    }

    /// Releases carrying the artist's main-credit tracks, zero-listen ones
    /// included.
    pub fn artist_releases(
        &self,
        artist_mbid: &str,
        sort: &AlbumSort,
        limit: usize,
    ) -> Result<Vec<ReleaseRow>> {
        let conn = self.conn.lock().unwrap();
        let order_clause = match sort {
            AlbumSort::Listens => "total_listens DESC, release_year DESC",
            AlbumSort::Minutes => "total_minutes DESC",
            AlbumSort::ReleaseDate => "release_year DESC, total_listens DESC",
        };
        let query = format!(
            "SELECT r.release_mbid,
                    r.release_name,
                    COALESCE(ro.release_year, r.release_year) AS release_year,
                    COALESCE(ro.release_type_primary, r.release_type_primary) AS release_type,
                    COUNT(DISTINCT CASE WHEN l.timestamp IS NOT NULL THEN t.track_mbid END) AS unique_tracks,
                    COUNT(l.timestamp) AS total_listens,
                    CAST(SUM(CASE WHEN l.timestamp IS NOT NULL
                                  THEN COALESCE(t.duration_ms, 0) ELSE 0 END) / 60000.0 AS INTEGER)
                        AS total_minutes
             FROM releases r
             LEFT JOIN overrides.release_overrides ro ON ro.release_mbid = r.release_mbid
             JOIN tracks t ON t.release_mbid = r.release_mbid
             LEFT JOIN overrides.track_overrides tro ON tro.track_mbid = t.track_mbid
             JOIN track_artists ta ON ta.track_mbid = t.track_mbid
                  AND ta.role = '{main_role}' AND ta.artist_mbid = ?1
             LEFT JOIN listens l ON l.track_mbid = t.track_mbid
             WHERE {release_visible} AND {track_visible}
             GROUP BY r.release_mbid
             ORDER BY {order_clause}
             LIMIT ?2",
            main_role = CreditRole::Main.to_db_str(),
            release_visible = RELEASE_VISIBLE,
            track_visible = TRACK_VISIBLE,
            order_clause = order_clause,
        );

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(params![artist_mbid, limit as i64], |row| {
                Ok(ReleaseRow {
                    release_mbid: row.get(0)?,
                    release_name: row.get(1)?,
                    release_year: row.get(2)?,
                    release_type: row.get(3)?,
                    stats: ListenStats {
                        unique_tracks: row.get::<_, i64>(4)? as u64,
                        total_listens: row.get::<_, i64>(5)? as u64,
                        total_minutes: row.get::<_, i64>(6)? as u64,
                    },
                })
            })?
            .collect::<Result<Vec<ReleaseRow>, _>>()?;
        Ok(rows)
    }

    /// Dense monthly/yearly listen counts for one artist, via the
    /// denormalized attribution on listen rows.
    pub fn artist_history(&self, artist_mbid: &str) -> Result<ListeningHistory> {
        let conn = self.conn.lock().unwrap();
        let query = format!(
            "SELECT l.year, l.month, COUNT(*) AS listen_count
             FROM listens l
             LEFT JOIN overrides.track_overrides tro ON tro.track_mbid = l.track_mbid
             WHERE l.main_artist_mbid = ?1 AND {track_visible}
               AND l.year IS NOT NULL AND l.month IS NOT NULL
             GROUP BY l.year, l.month
             ORDER BY l.year, l.month",
            track_visible = TRACK_VISIBLE,
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(params![artist_mbid], Self::parse_monthly_row)?
            .collect::<Result<Vec<MonthlyCount>, _>>()?;
        Ok(ListeningHistory::from_monthly_rows(&rows))
    }

    fn parse_monthly_row(row: &rusqlite::Row) -> rusqlite::Result<MonthlyCount> {
        Ok(MonthlyCount {
            year: row.get(0)?,
            month: row.get::<_, i64>(1)? as u32,
            count: row.get::<_, i64>(2)? as u64,
        })
    }

    // =========================================================================
    // Release Detail
    // =========================================================================

    /// Everything the release detail view renders, or `None` for an unknown id.
    pub fn release_page(&self, release_mbid: &str) -> Result<Option<ReleasePage>> {
        let info = match self.release_info(release_mbid)? {
            Some(info) => info,
            None => return Ok(None),
        };
        let tracks = self.release_tracks(release_mbid)?;
        let history = self.release_history(release_mbid)?;
        Ok(Some(ReleasePage {
            info,
            tracks,
            history,
        }))
    }

    /// Release header with effective metadata, primary artist credit and
    /// all-time totals. A release without tracks still answers with zeroed
    /// stats.
    pub fn release_info(&self, release_mbid: &str) -> Result<Option<ReleaseInfo>> {
        let conn = self.conn.lock().unwrap();

        let mut profile_stmt = conn.prepare_cached(
            "SELECT r.release_name,
                    COALESCE(ro.release_year, r.release_year) AS release_year,
                    COALESCE(ro.release_type_primary, r.release_type_primary) AS release_type,
                    COALESCE(ro.album_art_url, r.album_art_url) AS album_art_url
             FROM releases r
             LEFT JOIN overrides.release_overrides ro ON ro.release_mbid = r.release_mbid
             WHERE r.release_mbid = ?1",
        )?;
        let profile = match profile_stmt.query_row(params![release_mbid], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        }) {
            Ok(profile) => profile,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let (release_name, release_year, release_type, album_art_url) = profile;

        let stats_query = format!(
            "SELECT COUNT(DISTINCT l.track_mbid) AS unique_tracks,
                    COUNT(l.timestamp) AS total_listens,
                    COALESCE(CAST(SUM(CASE WHEN l.timestamp IS NOT NULL
                                           THEN COALESCE(t.duration_ms, 0) ELSE 0 END) / 60000.0 AS INTEGER), 0)
                        AS total_minutes
             FROM tracks t
             LEFT JOIN overrides.track_overrides tro ON tro.track_mbid = t.track_mbid
             LEFT JOIN listens l ON l.track_mbid = t.track_mbid
             WHERE t.release_mbid = ?1 AND {track_visible}",
            track_visible = TRACK_VISIBLE,
        );
        let mut stats_stmt = conn.prepare(&stats_query)?;
        let stats = stats_stmt.query_row(params![release_mbid], |row| {
            Ok(ListenStats {
                unique_tracks: row.get::<_, i64>(0)? as u64,
                total_listens: row.get::<_, i64>(1)? as u64,
                total_minutes: row.get::<_, i64>(2)? as u64,
            })
        })?;

        // Header link goes to the main-credit artist owning the most tracks
        let artist_query = format!(
            "SELECT a.artist_mbid, a.artist_name
             FROM tracks t
             JOIN track_artists ta ON ta.track_mbid = t.track_mbid AND ta.role = '{main_role}'
             JOIN artists a ON a.artist_mbid = ta.artist_mbid
             WHERE t.release_mbid = ?1
             GROUP BY a.artist_mbid
             ORDER BY COUNT(*) DESC, a.artist_name ASC
             LIMIT 1",
            main_role = CreditRole::Main.to_db_str(),
        );
        let mut artist_stmt = conn.prepare(&artist_query)?;
        let artist = match artist_stmt.query_row(params![release_mbid], |row| {
            Ok(ArtistRef {
                artist_mbid: row.get(0)?,
                artist_name: row.get(1)?,
            })
        }) {
            Ok(artist) => Some(artist),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Some(ReleaseInfo {
            release_mbid: release_mbid.to_string(),
            release_name,
            release_year,
            release_type,
            album_art_url,
            artist,
            stats,
        }))
    }

    /// Full track listing of a release, unplayed tracks included, with every
    /// credited artist (any role). Hidden tracks are omitted.
    pub fn release_tracks(&self, release_mbid: &str) -> Result<Vec<ReleaseTrackRow>> {
        let conn = self.conn.lock().unwrap();

        // Play counts come from a correlated subquery: joining the credits
        // here would multiply listen rows per credited artist.
        let tracks_query = format!(
            "SELECT t.track_mbid,
                    COALESCE(tro.track_name, t.track_name) AS track_name,
                    (SELECT COUNT(*) FROM listens l WHERE l.track_mbid = t.track_mbid) AS play_count
             FROM tracks t
             LEFT JOIN overrides.track_overrides tro ON tro.track_mbid = t.track_mbid
             WHERE t.release_mbid = ?1 AND {track_visible}
             ORDER BY play_count DESC, track_name ASC",
            track_visible = TRACK_VISIBLE,
        );
        let mut tracks_stmt = conn.prepare(&tracks_query)?;
        let mut rows = tracks_stmt
            .query_map(params![release_mbid], |row| {
                Ok(ReleaseTrackRow {
                    track_mbid: row.get(0)?,
                    track_name: row.get(1)?,
                    artist_names: Vec::new(),
                    play_count: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<Result<Vec<ReleaseTrackRow>, _>>()?;

        let mut credits_stmt = conn.prepare_cached(
            "SELECT ta.track_mbid, a.artist_name
             FROM tracks t
             JOIN track_artists ta ON ta.track_mbid = t.track_mbid
             JOIN artists a ON a.artist_mbid = ta.artist_mbid
             WHERE t.release_mbid = ?1
             ORDER BY a.artist_name",
        )?;
        let mut credits: HashMap<String, Vec<String>> = HashMap::new();
        let credit_rows = credits_stmt.query_map(params![release_mbid], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for credit in credit_rows {
            let (track_mbid, artist_name) = credit?;
            let names = credits.entry(track_mbid).or_default();
            if !names.contains(&artist_name) {
                names.push(artist_name);
            }
        }

        for track in &mut rows {
            if let Some(names) = credits.remove(&track.track_mbid) {
                track.artist_names = names;
            }
        }
        Ok(rows)
    }

    /// Dense monthly/yearly listen counts for one release.
    pub fn release_history(&self, release_mbid: &str) -> Result<ListeningHistory> {
        let conn = self.conn.lock().unwrap();
        let query = format!(
            "SELECT l.year, l.month, COUNT(*) AS listen_count
             FROM listens l
             JOIN tracks t ON t.track_mbid = l.track_mbid
             LEFT JOIN overrides.track_overrides tro ON tro.track_mbid = t.track_mbid
             WHERE t.release_mbid = ?1 AND {track_visible}
               AND l.year IS NOT NULL AND l.month IS NOT NULL
             GROUP BY l.year, l.month
             ORDER BY l.year, l.month",
            track_visible = TRACK_VISIBLE,
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(params![release_mbid], Self::parse_monthly_row)?
            .collect::<Result<Vec<MonthlyCount>, _>>()?;
        Ok(ListeningHistory::from_monthly_rows(&rows))
    }

    // =========================================================================
    // Year Views
    // =========================================================================

    /// Everything the year view renders. The requested year is clamped into
    /// the observed listen-year range first.
    pub fn year_page(&self, query: &YearPageQuery) -> Result<YearPage> {
        let year = self.clamp_year(query.year)?;
        let summary = self.year_summary(year)?;
        let top_artists = self.year_top_artists(year, &query.artist_sort, query.limit)?;
        let top_albums =
            self.year_top_albums(year, &query.album_mode, &query.album_sort, query.limit)?;
        Ok(YearPage {
            summary,
            top_artists,
            top_albums,
        })
    }

    /// Headline counts for one listen-year.
    pub fn year_summary(&self, year: i32) -> Result<YearSummary> {
        let conn = self.conn.lock().unwrap();
        let query = format!(
            "SELECT COUNT(DISTINCT CASE WHEN {artist_visible} THEN ta.artist_mbid END) AS artist_count,
                    COUNT(DISTINCT CASE WHEN {release_visible} THEN t.release_mbid END) AS album_count,
                    COUNT(*) AS total_listens
             FROM listens l
             JOIN tracks t ON t.track_mbid = l.track_mbid
             LEFT JOIN overrides.track_overrides tro ON tro.track_mbid = t.track_mbid
             LEFT JOIN track_artists ta ON ta.track_mbid = t.track_mbid AND ta.role = '{main_role}'
             LEFT JOIN overrides.artist_overrides ao ON ao.artist_mbid = ta.artist_mbid
             LEFT JOIN overrides.release_overrides ro ON ro.release_mbid = t.release_mbid
             WHERE l.year = ?1 AND {track_visible}",
            main_role = CreditRole::Main.to_db_str(),
            artist_visible = ARTIST_VISIBLE,
            release_visible = RELEASE_VISIBLE,
            track_visible = TRACK_VISIBLE,
        );
        let mut stmt = conn.prepare(&query)?;
        let summary = stmt.query_row(params![year], |row| {
            Ok(YearSummary {
                year,
                artist_count: row.get::<_, i64>(0)? as u64,
                album_count: row.get::<_, i64>(1)? as u64,
                total_listens: row.get::<_, i64>(2)? as u64,
            })
        })?;
        Ok(summary)
    }

    /// Artist ranking scoped to listens of one year.
    pub fn year_top_artists(
        &self,
        year: i32,
        sort: &ArtistSort,
        limit: usize,
    ) -> Result<Vec<ArtistRow>> {
        let conn = self.conn.lock().unwrap();
        Self::top_artists_scoped(&conn, Some(year), sort, limit)
    }

    /// Album ranking for one year. `ListenedIn` scopes the counted listens to
    /// the year; `ReleasedIn` keeps all-time listens but only releases whose
    /// effective release year matches.
    pub fn year_top_albums(
        &self,
        year: i32,
        mode: &YearAlbumMode,
        sort: &AlbumSort,
        limit: usize,
    ) -> Result<Vec<AlbumRow>> {
        let conn = self.conn.lock().unwrap();
        match mode {
            YearAlbumMode::ListenedIn => {
                Self::top_albums_scoped(&conn, Some(year), None, sort, limit)
            }
            YearAlbumMode::ReleasedIn => {
                Self::top_albums_scoped(&conn, None, Some(year), sort, limit)
            }
        }
    }

    /// Observed `[min, max]` listen-year range, with a fixed fallback when
    /// the snapshot has no listens.
    pub fn year_bounds(&self) -> Result<(i32, i32)> {
        let conn = self.conn.lock().unwrap();
        let bounds = conn.query_row(
            "SELECT MIN(year), MAX(year) FROM listens WHERE year IS NOT NULL",
            [],
            |row| {
                Ok((
                    row.get::<_, Option<i32>>(0)?,
                    row.get::<_, Option<i32>>(1)?,
                ))
            },
        )?;
        Ok(match bounds {
            (Some(min), Some(max)) => (min, max),
            _ => (FALLBACK_MIN_YEAR, chrono::Utc::now().year()),
        })
    }

    /// Clamp a requested year into [`year_bounds`].
    pub fn clamp_year(&self, year: i32) -> Result<i32> {
        let (min, max) = self.year_bounds()?;
        Ok(year.clamp(min, max))
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Case-insensitive substring search over artist names. Wildcards in the
    /// query match literally; zero-listen artists are legitimate hits.
    pub fn search_artists(&self, text: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let conn = self.conn.lock().unwrap();
        let query = format!(
            "SELECT a.artist_mbid,
                    a.artist_name,
                    COUNT(CASE WHEN {track_visible} THEN l.timestamp END) AS total_listens
             FROM artists a
             LEFT JOIN overrides.artist_overrides ao ON ao.artist_mbid = a.artist_mbid
             LEFT JOIN track_artists ta ON ta.artist_mbid = a.artist_mbid AND ta.role = '{main_role}'
             LEFT JOIN tracks t ON t.track_mbid = ta.track_mbid
             LEFT JOIN overrides.track_overrides tro ON tro.track_mbid = t.track_mbid
             LEFT JOIN listens l ON l.track_mbid = t.track_mbid
             WHERE a.artist_name LIKE ?1 ESCAPE '\\' AND {artist_visible}
             GROUP BY a.artist_mbid
             ORDER BY total_listens DESC
             LIMIT ?2",
            main_role = CreditRole::Main.to_db_str(),
            track_visible = TRACK_VISIBLE,
            artist_visible = ARTIST_VISIBLE,
        );
        let pattern = format!("%{}%", escape_like(text));

        let mut stmt = conn.prepare(&query)?;
        let hits = stmt
            .query_map(params![pattern, limit as i64], |row| {
                Ok(SearchHit {
                    artist_mbid: row.get(0)?,
                    artist_name: row.get(1)?,
                    total_listens: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<Result<Vec<SearchHit>, _>>()?;
        Ok(hits)
    }
}
