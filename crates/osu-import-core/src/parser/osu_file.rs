//! .osu file decoding using rosu-map

use crate::beatmap::{Beatmap, BeatmapDifficulty, BeatmapInfo, BeatmapMetadata, GameMode};
use crate::error::{Error, Result};
use crate::parser::BeatmapDecoder;
use md5::{Digest as Md5Digest, Md5};
use sha2::Sha256;

const HEADER: &[u8] = b"osu file format v";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read the `osu file format vN` header, returning `N`
pub fn legacy_format_version(content: &[u8]) -> Option<i32> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let start = content.iter().position(|b| !b.is_ascii_whitespace())?;
    let rest = content[start..].strip_prefix(HEADER)?;

    let digits: String = rest
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .map(|&b| b as char)
        .collect();
    digits.parse().ok()
}

/// Decoder for the text `.osu` format used by osu!stable
#[derive(Debug, Clone, Copy)]
pub struct LegacyDecoder {
    format_version: i32,
}

impl LegacyDecoder {
    pub fn new(format_version: i32) -> Self {
        Self { format_version }
    }

    pub fn format_version(&self) -> i32 {
        self.format_version
    }
}

impl BeatmapDecoder for LegacyDecoder {
    fn decode(&self, name: &str, content: &[u8]) -> Result<Beatmap> {
        let beatmap = rosu_map::from_bytes::<rosu_map::Beatmap>(content).map_err(|e| {
            Error::MalformedBeatmap {
                name: name.to_string(),
                message: e.to_string(),
            }
        })?;

        let beatmap_set_id = if beatmap.beatmap_set_id > 0 {
            Some(beatmap.beatmap_set_id)
        } else {
            None
        };
        let beatmap_id = if beatmap.beatmap_id > 0 {
            Some(beatmap.beatmap_id)
        } else {
            None
        };

        let metadata = BeatmapMetadata {
            id: None,
            beatmap_id,
            beatmap_set_id,
            title: beatmap.title.clone(),
            title_unicode: non_empty(&beatmap.title_unicode),
            artist: beatmap.artist.clone(),
            artist_unicode: non_empty(&beatmap.artist_unicode),
            creator: beatmap.creator.clone(),
            source: non_empty(&beatmap.source),
            tags: beatmap
                .tags
                .split_whitespace()
                .map(String::from)
                .collect(),
            audio_file: beatmap.audio_file.clone(),
            background_file: non_empty(&beatmap.background_file),
            preview_time: beatmap.preview_time,
        };

        let difficulty = BeatmapDifficulty {
            id: None,
            hp_drain: beatmap.hp_drain_rate,
            circle_size: beatmap.circle_size,
            overall_difficulty: beatmap.overall_difficulty,
            approach_rate: beatmap.approach_rate,
            slider_multiplier: beatmap.slider_multiplier,
            slider_tick_rate: beatmap.slider_tick_rate,
        };

        let info = BeatmapInfo {
            beatmap_id,
            beatmap_set_id: beatmap_set_id.unwrap_or_default(),
            path: name.to_string(),
            metadata: Some(metadata),
            difficulty,
            version: beatmap.version.clone(),
            mode: GameMode::from(beatmap.mode as u8),
            hash: format!("{:x}", Sha256::digest(content)),
            md5_hash: format!("{:x}", Md5::digest(content)),
            ..Default::default()
        };

        Ok(Beatmap {
            info,
            format_version: self.format_version,
            hit_object_count: beatmap.hit_objects.len(),
            length_ms: calculate_length(&beatmap),
            bpm: calculate_bpm(&beatmap),
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Calculate the length of the beatmap in milliseconds
fn calculate_length(beatmap: &rosu_map::Beatmap) -> u64 {
    let (Some(first), Some(last)) = (beatmap.hit_objects.first(), beatmap.hit_objects.last())
    else {
        return 0;
    };

    (last.start_time - first.start_time).max(0.0) as u64
}

/// Calculate the main BPM from the first uninherited timing point
fn calculate_bpm(beatmap: &rosu_map::Beatmap) -> f64 {
    match beatmap.control_points.timing_points.first() {
        Some(tp) if tp.beat_len > 0.0 => 60000.0 / tp.beat_len,
        _ => 120.0,
    }
}
