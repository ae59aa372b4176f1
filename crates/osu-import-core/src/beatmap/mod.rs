//! Beatmap data structures and types
//!
//! These mirror the four tables of the beatmap database: a [`BeatmapSetInfo`]
//! owns its [`BeatmapInfo`]s and its [`BeatmapMetadata`], and every
//! [`BeatmapInfo`] owns one [`BeatmapDifficulty`].

mod metadata;

pub use metadata::*;

use serde::{Deserialize, Serialize};

/// Represents a game mode in osu!
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    Osu = 0,
    Taiko = 1,
    Catch = 2,
    Mania = 3,
}

impl From<u8> for GameMode {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Osu,
            1 => Self::Taiko,
            2 => Self::Catch,
            3 => Self::Mania,
            _ => Self::Osu,
        }
    }
}

/// Difficulty settings for a beatmap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatmapDifficulty {
    /// Row ID in the `base_difficulty` table
    pub id: Option<i64>,
    pub hp_drain: f32,
    pub circle_size: f32,
    pub overall_difficulty: f32,
    pub approach_rate: f32,
    pub slider_multiplier: f64,
    pub slider_tick_rate: f64,
}

/// Information about a single beatmap difficulty inside a set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatmapInfo {
    /// Row ID in the `beatmaps` table
    pub id: Option<i64>,
    /// Row ID of the owning set
    pub beatmap_set_info_id: Option<i64>,
    /// Online beatmap ID
    pub beatmap_id: Option<i32>,
    /// Online ID of the owning set
    pub beatmap_set_id: i32,
    /// Entry name of the `.osu` file inside the set's archive
    pub path: String,
    /// Row ID of the overriding metadata, if any
    pub metadata_id: Option<i64>,
    /// Overriding metadata; `None` inherits the set's metadata
    pub metadata: Option<BeatmapMetadata>,
    /// Row ID of the difficulty record
    pub difficulty_id: Option<i64>,
    pub difficulty: BeatmapDifficulty,
    /// Difficulty name/version
    pub version: String,
    pub mode: GameMode,
    /// SHA-256 hash of the .osu file
    pub hash: String,
    /// MD5 hash for online matching
    pub md5_hash: String,
}

/// A beatmap set as persisted in the beatmap database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatmapSetInfo {
    /// Row ID in the `beatmap_sets` table
    pub id: Option<i64>,
    /// Online beatmap set ID, unique among persisted sets
    pub beatmap_set_id: i32,
    /// Storage path of the archive (content store path or original directory)
    pub path: String,
    /// Lowercase hex MD5 of the archive, `None` when the source was not relocated
    pub hash: Option<String>,
    pub metadata_id: Option<i64>,
    pub metadata: Option<BeatmapMetadata>,
    /// All difficulties in this set
    pub beatmaps: Vec<BeatmapInfo>,
}

impl BeatmapSetInfo {
    /// Whether the archive was copied into the content store
    pub fn is_relocated(&self) -> bool {
        self.hash.is_some()
    }

    /// Find a difficulty by its entry name
    pub fn beatmap(&self, path: &str) -> Option<&BeatmapInfo> {
        self.beatmaps.iter().find(|b| b.path == path)
    }

    /// Human readable "Artist - Title" label
    pub fn display_name(&self) -> String {
        match &self.metadata {
            Some(meta) => format!("{} - {}", meta.display_artist(), meta.display_title()),
            None => format!("Beatmap set {}", self.beatmap_set_id),
        }
    }
}

/// A fully decoded beatmap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Beatmap {
    pub info: BeatmapInfo,
    /// `osu file format vN` version of the source file
    pub format_version: i32,
    pub hit_object_count: usize,
    /// Total length in milliseconds
    pub length_ms: u64,
    /// Main BPM
    pub bpm: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_mode_from_u8() {
        assert_eq!(GameMode::from(0), GameMode::Osu);
        assert_eq!(GameMode::from(3), GameMode::Mania);
        assert_eq!(GameMode::from(42), GameMode::Osu);
    }

    #[test]
    fn test_set_display_name() {
        let mut set = BeatmapSetInfo {
            beatmap_set_id: 42,
            ..Default::default()
        };
        assert_eq!(set.display_name(), "Beatmap set 42");

        set.metadata = Some(BeatmapMetadata {
            title: "Title".to_string(),
            artist: "Artist".to_string(),
            ..Default::default()
        });
        assert_eq!(set.display_name(), "Artist - Title");
    }
}
