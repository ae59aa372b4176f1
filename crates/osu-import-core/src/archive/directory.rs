//! Reader for beatmap sets that are already extracted to a folder

use crate::archive::{check_entry_name, ArchiveReader};
use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Reader over a loose directory, e.g. a folder in osu!stable's Songs
pub struct DirectoryArchive {
    root: PathBuf,
    files: Vec<String>,
}

impl DirectoryArchive {
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::UnreadableArchive {
                path: root.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).min_depth(1) {
            let entry = entry.map_err(|e| Error::UnreadableArchive {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(root) {
                let name: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect();
                files.push(name.join("/"));
            }
        }
        files.sort();

        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }
}

impl ArchiveReader for DirectoryArchive {
    fn file_names(&self) -> Vec<String> {
        self.files.clone()
    }

    fn read_file(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        check_entry_name(name)?;
        Ok(Box::new(File::open(self.root.join(name))?))
    }
}
