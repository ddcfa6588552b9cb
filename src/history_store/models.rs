//! Row and query models for the listening history store.
//!
//! Every store method takes one of the immutable query structs below and
//! returns plain rows; view state (sort keys, filter modes, limits) always
//! travels through parameters, never through shared mutable state.

use serde::{Deserialize, Serialize};

use super::timeline::ListeningHistory;

pub const DEFAULT_TOP_LIMIT: usize = 20;
pub const DEFAULT_RELEASES_LIMIT: usize = 15;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

// =============================================================================
// Enumerations
// =============================================================================

/// Artist credit role on a track.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CreditRole {
    Main,
    Other,
}

impl CreditRole {
    /// Convert from database string representation
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "main" => CreditRole::Main,
            _ => CreditRole::Other,
        }
    }

    /// Convert to database string representation
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CreditRole::Main => "main",
            CreditRole::Other => "other",
        }
    }
}

/// Sort key for artist rankings.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ArtistSort {
    #[default]
    Listens,
    Minutes,
}

impl ArtistSort {
    /// Parse a UI sort key, falling back to the default on unknown input.
    pub fn from_key(s: &str) -> Self {
        match s {
            "minutes" => ArtistSort::Minutes,
            _ => ArtistSort::Listens,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            ArtistSort::Listens => "listens",
            ArtistSort::Minutes => "minutes",
        }
    }
}

/// Sort key for album rankings and artist release lists.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlbumSort {
    #[default]
    Listens,
    Minutes,
    ReleaseDate,
}

impl AlbumSort {
    pub fn from_key(s: &str) -> Self {
        match s {
            "minutes" => AlbumSort::Minutes,
            "date" => AlbumSort::ReleaseDate,
            _ => AlbumSort::Listens,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            AlbumSort::Listens => "listens",
            AlbumSort::Minutes => "minutes",
            AlbumSort::ReleaseDate => "date",
        }
    }
}

/// Sort key for an artist's top tracks.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrackSort {
    #[default]
    Listens,
    Minutes,
}

impl TrackSort {
    pub fn from_key(s: &str) -> Self {
        match s {
            "minutes" => TrackSort::Minutes,
            _ => TrackSort::Listens,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            TrackSort::Listens => "listens",
            TrackSort::Minutes => "minutes",
        }
    }
}

/// Which albums a year view ranks: albums listened to during the year, or
/// albums whose (effective) release year is the year.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum YearAlbumMode {
    #[default]
    ListenedIn,
    ReleasedIn,
}

impl YearAlbumMode {
    pub fn from_key(s: &str) -> Self {
        match s {
            "released" => YearAlbumMode::ReleasedIn,
            _ => YearAlbumMode::ListenedIn,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            YearAlbumMode::ListenedIn => "listens",
            YearAlbumMode::ReleasedIn => "released",
        }
    }
}

// =============================================================================
// Aggregate Rows
// =============================================================================

/// The stat triple shared by every aggregate row.
///
/// `total_minutes` is the truncated sum of listen durations: a listen of a
/// track with NULL duration contributes zero.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ListenStats {
    pub unique_tracks: u64,
    pub total_listens: u64,
    pub total_minutes: u64,
}

/// One row of an artist ranking.
#[derive(Clone, Debug, Serialize)]
pub struct ArtistRow {
    pub artist_mbid: String,
    pub artist_name: String,
    pub profile_image_url: Option<String>,
    pub stats: ListenStats,
}

/// One row of an album ranking, grouped by (release, attributed main artist).
/// Tracks without a main credit aggregate under a `None` artist.
#[derive(Clone, Debug, Serialize)]
pub struct AlbumRow {
    pub release_mbid: String,
    pub release_name: String,
    pub release_year: Option<i64>,
    pub release_type: Option<String>,
    pub album_art_url: Option<String>,
    pub artist_mbid: Option<String>,
    pub artist_name: Option<String>,
    pub stats: ListenStats,
}

/// One row of an artist's top-tracks list.
#[derive(Clone, Debug, Serialize)]
pub struct TrackRow {
    pub track_mbid: String,
    pub track_name: String,
    pub duration_ms: Option<i64>,
    pub play_count: u64,
    pub total_minutes: u64,
}

/// One row of an artist's release list. Unlike ranking rows, zero-listen
/// releases appear here.
#[derive(Clone, Debug, Serialize)]
pub struct ReleaseRow {
    pub release_mbid: String,
    pub release_name: String,
    pub release_year: Option<i64>,
    pub release_type: Option<String>,
    pub stats: ListenStats,
}

/// One row of a release's track listing; `play_count` zero means the track
/// was never listened to (rendered as "Not played").
#[derive(Clone, Debug, Serialize)]
pub struct ReleaseTrackRow {
    pub track_mbid: String,
    pub track_name: String,
    /// All credited artists, any role, deduplicated.
    pub artist_names: Vec<String>,
    pub play_count: u64,
}

/// One artist search hit. Zero-listen artists are legitimate hits.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SearchHit {
    pub artist_mbid: String,
    pub artist_name: String,
    pub total_listens: u64,
}

// =============================================================================
// Detail Pages
// =============================================================================

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ArtistRef {
    pub artist_mbid: String,
    pub artist_name: String,
}

/// Artist profile header: effective image plus all-time totals.
#[derive(Clone, Debug, Serialize)]
pub struct ArtistInfo {
    pub artist_mbid: String,
    pub artist_name: String,
    pub profile_image_url: Option<String>,
    pub stats: ListenStats,
    /// Distinct visible releases carrying at least one visible track credited
    /// to this artist, listened to or not.
    pub total_releases: u64,
}

/// Everything the artist detail view renders.
#[derive(Clone, Debug, Serialize)]
pub struct ArtistPage {
    pub info: ArtistInfo,
    pub top_tracks: Vec<TrackRow>,
    pub releases: Vec<ReleaseRow>,
    pub history: ListeningHistory,
}

/// Release profile header with effective metadata and all-time totals.
#[derive(Clone, Debug, Serialize)]
pub struct ReleaseInfo {
    pub release_mbid: String,
    pub release_name: String,
    pub release_year: Option<i64>,
    pub release_type: Option<String>,
    pub album_art_url: Option<String>,
    /// Main-credit artist owning the most tracks on the release, for the
    /// header link. `None` when no track carries a main credit.
    pub artist: Option<ArtistRef>,
    pub stats: ListenStats,
}

/// Everything the release detail view renders.
#[derive(Clone, Debug, Serialize)]
pub struct ReleasePage {
    pub info: ReleaseInfo,
    pub tracks: Vec<ReleaseTrackRow>,
    pub history: ListeningHistory,
}

/// Headline counts for one listen-year.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct YearSummary {
    pub year: i32,
    pub artist_count: u64,
    pub album_count: u64,
    pub total_listens: u64,
}

/// Everything the year view renders. `year` is the clamped year actually
/// answered, which may differ from the requested one.
#[derive(Clone, Debug, Serialize)]
pub struct YearPage {
    pub summary: YearSummary,
    pub top_artists: Vec<ArtistRow>,
    pub top_albums: Vec<AlbumRow>,
}

/// Home-page counters, all visibility-filtered.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct OverviewStats {
    pub total_listens: u64,
    pub total_artists: u64,
    pub total_releases: u64,
    pub total_tracks: u64,
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Clone, Debug)]
pub struct TopArtistsQuery {
    pub limit: usize,
    pub sort: ArtistSort,
}

impl Default for TopArtistsQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_TOP_LIMIT,
            sort: ArtistSort::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TopAlbumsQuery {
    pub limit: usize,
    pub sort: AlbumSort,
}

impl Default for TopAlbumsQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_TOP_LIMIT,
            sort: AlbumSort::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ArtistPageQuery {
    pub track_sort: TrackSort,
    pub release_sort: AlbumSort,
    pub track_limit: usize,
    pub release_limit: usize,
}

impl Default for ArtistPageQuery {
    fn default() -> Self {
        Self {
            track_sort: TrackSort::default(),
            release_sort: AlbumSort::default(),
            track_limit: DEFAULT_TOP_LIMIT,
            release_limit: DEFAULT_RELEASES_LIMIT,
        }
    }
}

#[derive(Clone, Debug)]
pub struct YearPageQuery {
    pub year: i32,
    pub album_mode: YearAlbumMode,
    pub artist_sort: ArtistSort,
    pub album_sort: AlbumSort,
    pub limit: usize,
}

impl YearPageQuery {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            album_mode: YearAlbumMode::default(),
            artist_sort: ArtistSort::default(),
            album_sort: AlbumSort::default(),
            limit: DEFAULT_TOP_LIMIT,
        }
    }
}
