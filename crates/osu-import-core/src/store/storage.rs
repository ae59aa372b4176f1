//! Storage root used to resolve stored paths

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// A directory that relative stored paths are resolved against.
///
/// Paths recorded in the database are either relative to this root (content
/// store blobs) or absolute (sources that were left in place). [`Storage::resolve`]
/// handles both.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Create a storage rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a stored path to a filesystem path
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.resolve(path).exists()
    }

    /// Delete a stored file. Missing files are not an error.
    pub fn delete(&self, path: impl AsRef<Path>) -> Result<()> {
        match fs::remove_file(self.resolve(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
