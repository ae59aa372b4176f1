//! Beatmap metadata structures

use serde::{Deserialize, Serialize};

/// Descriptive metadata shared by a beatmap set and optionally overridden per beatmap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatmapMetadata {
    /// Row ID in the `beatmap_metadata` table
    pub id: Option<i64>,
    /// Online beatmap ID
    pub beatmap_id: Option<i32>,
    /// Online beatmap set ID
    pub beatmap_set_id: Option<i32>,
    /// Romanized song title
    pub title: String,
    /// Unicode song title
    pub title_unicode: Option<String>,
    /// Romanized artist name
    pub artist: String,
    /// Unicode artist name
    pub artist_unicode: Option<String>,
    /// Beatmap creator username
    pub creator: String,
    /// Source (game, anime, etc.)
    pub source: Option<String>,
    /// Tags for searching
    pub tags: Vec<String>,
    /// Audio filename inside the archive
    pub audio_file: String,
    /// Background image filename inside the archive
    pub background_file: Option<String>,
    /// Song preview start in milliseconds (-1 when unset)
    pub preview_time: i32,
}

impl BeatmapMetadata {
    /// Get display title (unicode if available, otherwise romanized)
    pub fn display_title(&self) -> &str {
        self.title_unicode.as_deref().unwrap_or(&self.title)
    }

    /// Get display artist (unicode if available, otherwise romanized)
    pub fn display_artist(&self) -> &str {
        self.artist_unicode.as_deref().unwrap_or(&self.artist)
    }

    /// Tags joined the way they are stored in the database
    pub fn tags_string(&self) -> String {
        self.tags.join(" ")
    }
}
