//! .osz archive reader

use crate::archive::{check_entry_name, ArchiveReader};
use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Reader over a packaged `.osz` (zip) beatmap set
pub struct OszArchive {
    archive: ZipArchive<File>,
}

impl OszArchive {
    pub fn open(path: &Path) -> Result<Self> {
        let unreadable = |reason: String| Error::UnreadableArchive {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
        let archive = ZipArchive::new(file).map_err(|e| unreadable(e.to_string()))?;
        Ok(Self { archive })
    }
}

impl ArchiveReader for OszArchive {
    fn file_names(&self) -> Vec<String> {
        self.archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(String::from)
            .collect()
    }

    fn read_file(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        check_entry_name(name)?;
        Ok(Box::new(self.archive.by_name(name)?))
    }
}
