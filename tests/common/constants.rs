//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When the standard catalog changes (ids, names, listen counts),
//! update only this file and `fixtures.rs`.

// ============================================================================
// Test Artist IDs
// ============================================================================

/// Artist ID for "The Test Band"
pub const ARTIST_1_ID: &str = "artist-1";

/// Artist ID for "Jazz Ensemble"
pub const ARTIST_2_ID: &str = "artist-2";

/// Artist ID for "The Quiet One" (no tracks, no listens)
pub const ARTIST_3_ID: &str = "artist-3";

// ============================================================================
// Test Release IDs
// ============================================================================

/// Release ID for "First Album" (2020) by The Test Band
pub const ALBUM_1_ID: &str = "album-1";

/// Release ID for "Jazz Collection" (2021) by Jazz Ensemble
pub const ALBUM_2_ID: &str = "album-2";

/// Release ID for "Early EP" (2015) by The Test Band, never listened to
pub const ALBUM_3_ID: &str = "album-3";

/// Release ID for "Various Gems" (2019), a compilation without credits
pub const ALBUM_4_ID: &str = "album-4";

// ============================================================================
// Test Track IDs
// ============================================================================

/// Track ID for "Opening Track" on First Album (600000 ms)
pub const TRACK_1_ID: &str = "track-1";

/// Track ID for "Middle Track" on First Album (180000 ms)
pub const TRACK_2_ID: &str = "track-2";

/// Track ID for "Closing Track" on First Album, never listened to
pub const TRACK_3_ID: &str = "track-3";

/// Track ID for "Smooth Jazz" on Jazz Collection (200000 ms)
pub const TRACK_4_ID: &str = "track-4";

/// Track ID for "Upbeat Jazz" on Jazz Collection (NULL duration)
pub const TRACK_5_ID: &str = "track-5";

/// Track ID for "Quiet Opening" on Early EP, never listened to
pub const TRACK_6_ID: &str = "track-6";

/// Track ID for "Hidden Gem" on Various Gems, no artist credits
pub const TRACK_7_ID: &str = "track-7";

// ============================================================================
// Test Catalog Metadata
// ============================================================================

/// Artist 1 name
pub const ARTIST_1_NAME: &str = "The Test Band";

/// Artist 1 base profile image
pub const ARTIST_1_IMAGE: &str = "https://img.example/test-band.jpg";

/// Artist 2 name
pub const ARTIST_2_NAME: &str = "Jazz Ensemble";

/// Artist 3 name
pub const ARTIST_3_NAME: &str = "The Quiet One";

/// Album 1 title
pub const ALBUM_1_TITLE: &str = "First Album";

/// Album 2 title
pub const ALBUM_2_TITLE: &str = "Jazz Collection";

/// Album 3 title
pub const ALBUM_3_TITLE: &str = "Early EP";

/// Album 4 title
pub const ALBUM_4_TITLE: &str = "Various Gems";

/// Track 1 title
pub const TRACK_1_TITLE: &str = "Opening Track";

/// Track 2 title
pub const TRACK_2_TITLE: &str = "Middle Track";

/// Track 3 title
pub const TRACK_3_TITLE: &str = "Closing Track";

/// Track 4 title
pub const TRACK_4_TITLE: &str = "Smooth Jazz";

/// Track 5 title
pub const TRACK_5_TITLE: &str = "Upbeat Jazz";

/// Track 6 title
pub const TRACK_6_TITLE: &str = "Quiet Opening";

/// Track 7 title
pub const TRACK_7_TITLE: &str = "Hidden Gem";
