//! # osu-import-core
//!
//! Core library for importing osu! beatmap sets into a local,
//! content-addressed beatmap database.
//!
//! This crate provides the foundational functionality for:
//! - Reading beatmap sets from `.osz` archives and extracted folders
//! - Decoding `.osu` beatmap files
//! - Storing archives under their MD5 hash (`beatmaps/a/ab/abcd...`)
//! - Persisting sets, beatmaps, metadata and difficulty in SQLite
//! - Skipping sets that were already imported
//!
//! ## Modules
//!
//! - [`archive`] - `.osz` and folder readers behind one trait
//! - [`beatmap`] - Beatmap data structures (set, beatmap, metadata, difficulty)
//! - [`config`] - Storage location configuration
//! - [`database`] - Import pipeline, queries, updates and reset
//! - [`error`] - Error types and Result alias
//! - [`parser`] - `.osu` file decoding
//! - [`store`] - Hash-addressed archive storage
//!
//! ## Example
//!
//! ```no_run
//! use osu_import_core::{BeatmapDatabase, Config};
//!
//! let mut db = BeatmapDatabase::open(&Config::load()).expect("Failed to open database");
//! // Relative paths resolve against the storage root, not the working directory
//! let result = db.import(&["/downloads/song.osz"]);
//! println!("Imported {} beatmap sets", result.imported_count());
//! ```

// Module declarations
pub mod archive;
pub mod beatmap;
pub mod config;
pub mod database;
pub mod error;
pub mod parser;
pub mod store;

// Re-export key types for convenience

// Error types
pub use error::{Error, Result};

// Beatmap types
pub use beatmap::{
    Beatmap, BeatmapDifficulty, BeatmapInfo, BeatmapMetadata, BeatmapSetInfo, GameMode,
};

// Configuration
pub use config::Config;

// Archive access and decoding
pub use archive::{open_archive, ArchiveReader, DirectoryArchive, OszArchive};
pub use parser::{decode_beatmap, decoder_for, BeatmapDecoder, LegacyDecoder};

// Storage
pub use store::{FileStore, Storage, StoredFile};

// Beatmap database
pub use database::{
    BeatmapDatabase, BeatmapSetAddedCallback, BeatmapStore, ImportOutcome, ImportResult,
    PathImport, Record,
};
