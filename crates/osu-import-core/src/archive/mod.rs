//! Read access to beatmap set sources
//!
//! A beatmap set arrives either as a packaged `.osz` file or as an already
//! extracted folder. Both are exposed through [`ArchiveReader`]; use
//! [`open_archive`] to pick the right implementation for a path.

mod directory;
mod osz;

pub use directory::*;
pub use osz::*;

use std::io::Read;
use std::path::Path;

use crate::beatmap::BeatmapMetadata;
use crate::error::{Error, Result};
use crate::parser::decode_beatmap;
use crate::store::Storage;

/// Uniform read access to the files of one beatmap set
pub trait ArchiveReader {
    /// All file entries, using `/` as separator
    fn file_names(&self) -> Vec<String>;

    /// Open one entry for reading
    fn read_file(&mut self, name: &str) -> Result<Box<dyn Read + '_>>;

    /// Entries that hold beatmap difficulties, in name order
    fn beatmap_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .file_names()
            .into_iter()
            .filter(|name| name.to_lowercase().ends_with(".osu"))
            .collect();
        names.sort();
        names
    }

    /// Read an entry fully into memory
    fn read_bytes(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        self.read_file(name)?.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Read the set's metadata from its first beatmap without keeping the rest
    fn read_metadata(&mut self) -> Result<BeatmapMetadata> {
        let first = self
            .beatmap_names()
            .into_iter()
            .next()
            .ok_or_else(|| Error::Other("No .osu files found in beatmap set".to_string()))?;

        let content = self.read_bytes(&first)?;
        let beatmap = decode_beatmap(&first, &content)?;
        Ok(beatmap.info.metadata.unwrap_or_default())
    }
}

/// Open the beatmap set stored at `path` (resolved against `storage`)
pub fn open_archive(storage: &Storage, path: impl AsRef<Path>) -> Result<Box<dyn ArchiveReader>> {
    let full = storage.resolve(path);

    if full.is_dir() {
        Ok(Box::new(DirectoryArchive::open(&full)?))
    } else if full.is_file() {
        Ok(Box::new(OszArchive::open(&full)?))
    } else {
        Err(Error::UnreadableArchive {
            path: full,
            reason: "no such file or directory".to_string(),
        })
    }
}

/// Reject entry names that would escape the archive root
pub(crate) fn check_entry_name(name: &str) -> Result<()> {
    let escapes = Path::new(name).components().any(|c| {
        !matches!(
            c,
            std::path::Component::Normal(_) | std::path::Component::CurDir
        )
    });
    if escapes {
        return Err(Error::Other(format!("Invalid entry name: {}", name)));
    }
    Ok(())
}
