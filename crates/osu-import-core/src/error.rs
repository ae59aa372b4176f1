//! Error types for osu-import-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for osu-import operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Unreadable archive {path}: {reason}")]
    UnreadableArchive { path: PathBuf, reason: String },

    #[error("Failed to decode beatmap {name}: {message}")]
    MalformedBeatmap { name: String, message: String },

    #[error("Archive {0} has no online beatmap set ID")]
    MissingSetId(PathBuf),

    #[error("{0} is not a type managed by the beatmap database")]
    UnsupportedKind(&'static str),

    #[error("{0} has not been persisted yet")]
    NotPersisted(&'static str),

    #[error("Beatmap set {0} is not in the local database")]
    BeatmapSetNotFound(i32),

    #[error("File hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether SQLite rejected an insert because the online beatmap set ID
    /// is already present
    pub fn is_duplicate_beatmap_set(&self) -> bool {
        match self {
            Error::Database(rusqlite::Error::SqliteFailure(e, Some(message))) => {
                e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && message.contains("beatmap_sets.beatmap_set_id")
            }
            _ => false,
        }
    }
}

/// Result type alias for osu-import operations
pub type Result<T> = std::result::Result<T, Error>;
