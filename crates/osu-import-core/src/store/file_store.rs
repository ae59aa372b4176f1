//! Hash-addressed archive storage

use crate::error::{Error, Result};
use crate::store::Storage;
use md5::{Digest, Md5};
use std::fs;
use std::path::Path;

/// Directory under the storage root that holds archive blobs
pub const NAMESPACE: &str = "beatmaps";

/// Result of placing content into the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Lowercase hex MD5 digest of the content
    pub hash: String,
    /// Stored path relative to the storage root
    pub path: String,
    /// False when a blob with the same hash was already present
    pub newly_written: bool,
}

/// Content store for imported archives
///
/// Files are stored at: `beatmaps/{hash[0]}/{hash[0..2]}/{hash}`
/// Where `hash` is the lowercase MD5 hex digest of the archive bytes
#[derive(Debug, Clone)]
pub struct FileStore {
    storage: Storage,
}

impl FileStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Get the stored path for a given hash
    ///
    /// Path format: `beatmaps/{hash[0]}/{hash[0..2]}/{hash}`
    pub fn hash_to_path(hash: &str) -> String {
        let hash = hash.to_lowercase();
        if hash.len() < 2 {
            return format!("{}/{}", NAMESPACE, hash);
        }
        format!("{}/{}/{}/{}", NAMESPACE, &hash[0..1], &hash[0..2], hash)
    }

    /// Calculate the MD5 hash of content
    pub fn calculate_hash(content: &[u8]) -> String {
        format!("{:x}", Md5::digest(content))
    }

    /// Place content into the store, returning its hash and stored path.
    ///
    /// Content is written to a temporary sibling and renamed into place, so a
    /// blob under a hash name is always complete.
    pub fn place(&self, content: &[u8]) -> Result<StoredFile> {
        let hash = Self::calculate_hash(content);
        let path = Self::hash_to_path(&hash);
        let target = self.storage.resolve(&path);

        if target.is_file() {
            tracing::debug!("Blob {} already present, not rewriting", hash);
            return Ok(StoredFile {
                hash,
                path,
                newly_written: false,
            });
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp = target.with_extension("tmp");
        fs::write(&temp, content)?;
        fs::rename(&temp, &target)?;

        tracing::debug!("Stored {} bytes at {}", content.len(), path);
        Ok(StoredFile {
            hash,
            path,
            newly_written: true,
        })
    }

    /// Place the contents of a file on disk into the store
    pub fn place_file(&self, source: &Path) -> Result<StoredFile> {
        let content = fs::read(source)?;
        self.place(&content)
    }

    /// Check if a stored path exists
    pub fn exists(&self, path: &str) -> bool {
        self.storage.resolve(path).is_file()
    }

    /// Read a stored file
    pub fn retrieve(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.storage.resolve(path);
        if !full.is_file() {
            return Err(Error::Other(format!("Stored file {} not found", path)));
        }
        Ok(fs::read(full)?)
    }

    /// Open a stored file for streaming reads
    pub fn open(&self, path: &str) -> Result<fs::File> {
        Ok(fs::File::open(self.storage.resolve(path))?)
    }

    /// Delete a stored file and prune fan-out directories left empty
    pub fn delete(&self, path: &str) -> Result<()> {
        self.storage.delete(path)?;

        let namespace_root = self.storage.resolve(NAMESPACE);
        let mut dir = self.storage.resolve(path).parent().map(Path::to_path_buf);
        while let Some(current) = dir {
            if current == namespace_root || !current.starts_with(&namespace_root) {
                break;
            }
            // remove_dir fails on non-empty directories, which ends the walk
            if fs::remove_dir(&current).is_err() {
                break;
            }
            dir = current.parent().map(Path::to_path_buf);
        }
        Ok(())
    }

    /// Verify a stored file's content matches the expected hash
    pub fn verify(&self, path: &str, hash: &str) -> Result<bool> {
        let content = self.retrieve(path)?;
        Ok(Self::calculate_hash(&content) == hash.to_lowercase())
    }

    /// Like [`FileStore::verify`] but reports the mismatch as an error
    pub fn ensure_valid(&self, path: &str, hash: &str) -> Result<()> {
        let actual = Self::calculate_hash(&self.retrieve(path)?);
        if actual != hash.to_lowercase() {
            return Err(Error::HashMismatch {
                expected: hash.to_lowercase(),
                actual,
            });
        }
        Ok(())
    }

    /// Get the hashes of all blobs in the store
    pub fn list_all(&self) -> Result<Vec<String>> {
        let root = self.storage.resolve(NAMESPACE);
        if !root.exists() {
            return Ok(Vec::new());
        }

        let hashes = walkdir::WalkDir::new(&root)
            .min_depth(3)
            .max_depth(3)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .filter(|name| !name.ends_with(".tmp"))
            .collect();

        Ok(hashes)
    }
}
