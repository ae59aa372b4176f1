//! Beatmap file decoding
//!
//! A decoder is picked by inspecting the content of a beatmap file, the same
//! way for archive entries and loose files.

mod osu_file;

pub use osu_file::*;

use crate::beatmap::Beatmap;
use crate::error::{Error, Result};

/// Decodes the bytes of one beatmap file
pub trait BeatmapDecoder {
    /// Decode `content`. `name` is only used to label errors.
    fn decode(&self, name: &str, content: &[u8]) -> Result<Beatmap>;
}

/// Select a decoder for the given content by looking at its header
pub fn decoder_for(name: &str, content: &[u8]) -> Result<Box<dyn BeatmapDecoder>> {
    if let Some(version) = legacy_format_version(content) {
        return Ok(Box::new(LegacyDecoder::new(version)));
    }

    Err(Error::MalformedBeatmap {
        name: name.to_string(),
        message: "unrecognised beatmap header".to_string(),
    })
}

/// Select a decoder for `content` and decode it
pub fn decode_beatmap(name: &str, content: &[u8]) -> Result<Beatmap> {
    decoder_for(name, content)?.decode(name, content)
}
