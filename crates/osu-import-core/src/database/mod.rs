//! Beatmap database: import pipeline and typed access to persisted sets
//!
//! [`BeatmapDatabase`] owns the SQLite [`BeatmapStore`] and the content
//! [`FileStore`]. Both are opened once and passed in explicitly; there is no
//! process-wide connection.
//!
//! ## Example
//!
//! ```no_run
//! use osu_import_core::{BeatmapDatabase, Config};
//!
//! let mut db = BeatmapDatabase::open(&Config::load())?;
//! db.on_beatmap_set_added(|set| println!("Imported {}", set.display_name()));
//!
//! let result = db.import(&["/downloads/42 Artist - Title.osz"]);
//! println!("{} imported, {} skipped", result.imported_count(), result.skipped_count());
//!
//! if let Some(set) = db.get_beatmap_set(42)? {
//!     let beatmap = db.get_beatmap(&set.beatmaps[0])?;
//!     println!("{} hit objects", beatmap.hit_object_count);
//! }
//! # Ok::<(), osu_import_core::Error>(())
//! ```

mod import;
mod record;
mod store;

pub use import::*;
pub use record::Record;
pub use store::*;

use std::any::{type_name, Any};
use tracing::{info, warn};

use crate::archive::{open_archive, ArchiveReader};
use crate::beatmap::{Beatmap, BeatmapDifficulty, BeatmapInfo, BeatmapMetadata, BeatmapSetInfo};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser::decode_beatmap;
use crate::store::{FileStore, Storage};

/// Callback invoked after a beatmap set has been imported
pub type BeatmapSetAddedCallback = Box<dyn Fn(&BeatmapSetInfo) + Send + Sync>;

/// Persistent collection of imported beatmap sets
pub struct BeatmapDatabase {
    storage: Storage,
    files: FileStore,
    store: BeatmapStore,
    listeners: Vec<BeatmapSetAddedCallback>,
}

impl BeatmapDatabase {
    /// Create a database over an already opened storage root and store
    pub fn new(storage: Storage, store: BeatmapStore) -> Self {
        Self {
            files: FileStore::new(storage.clone()),
            storage,
            store,
            listeners: Vec::new(),
        }
    }

    /// Open the storage root and database file described by `config`
    pub fn open(config: &Config) -> Result<Self> {
        let storage = Storage::new(&config.storage_path)?;
        let store = BeatmapStore::open(&config.database_path())?;
        info!("Using storage at {}", storage.root().display());
        Ok(Self::new(storage, store))
    }

    /// Register a listener for newly imported sets
    pub fn on_beatmap_set_added(
        &mut self,
        callback: impl Fn(&BeatmapSetInfo) + Send + Sync + 'static,
    ) {
        self.listeners.push(Box::new(callback));
    }

    fn notify_beatmap_set_added(&self, set: &BeatmapSetInfo) {
        for listener in &self.listeners {
            listener(set);
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    pub fn store(&self) -> &BeatmapStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut BeatmapStore {
        &mut self.store
    }

    /// Open the archive backing a persisted set
    pub fn get_reader(&self, set: &BeatmapSetInfo) -> Result<Box<dyn ArchiveReader>> {
        open_archive(&self.storage, &set.path)
    }

    fn contains_beatmap_set(&self, beatmap_set_id: i32) -> Result<bool> {
        Ok(self
            .store
            .count_where::<BeatmapSetInfo, _>("beatmap_set_id = ?1", [beatmap_set_id])?
            > 0)
    }

    /// Find a set by its online ID, with beatmaps, difficulties and metadata loaded
    pub fn get_beatmap_set(&self, beatmap_set_id: i32) -> Result<Option<BeatmapSetInfo>> {
        let Some(mut set) = self
            .store
            .query_where::<BeatmapSetInfo, _>("beatmap_set_id = ?1", [beatmap_set_id])?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };
        self.store.get_children(&mut set, true)?;
        Ok(Some(set))
    }

    /// Re-read and fully decode a persisted beatmap from its set's archive
    pub fn get_beatmap(&self, info: &BeatmapInfo) -> Result<Beatmap> {
        let set = self
            .store
            .query_where::<BeatmapSetInfo, _>("beatmap_set_id = ?1", [info.beatmap_set_id])?
            .into_iter()
            .next()
            .ok_or(Error::BeatmapSetNotFound(info.beatmap_set_id))?;

        let mut reader = self.get_reader(&set)?;
        let content = reader.read_bytes(&info.path)?;
        decode_beatmap(&info.path, &content)
    }

    /// All rows of `T`, without children
    pub fn query<T: Record>(&self) -> Result<Vec<T>> {
        self.store.query()
    }

    /// One row of `T` by row ID with its children
    pub fn get_with_children<T: Record>(&self, id: i64) -> Result<Option<T>> {
        self.store.get_with_children(id)
    }

    /// All rows of `T` accepted by `filter`, with children
    pub fn get_all_with_children<T: Record>(
        &self,
        filter: Option<&dyn Fn(&T) -> bool>,
        recursive: bool,
    ) -> Result<Vec<T>> {
        self.store.get_all_with_children(filter, recursive)
    }

    /// Populate the children of `item`. An absent item yields `T::default()`.
    pub fn get_children<T: Record>(&self, item: Option<T>, recursive: bool) -> Result<T> {
        let Some(mut item) = item else {
            return Ok(T::default());
        };
        self.store.get_children(&mut item, recursive)?;
        Ok(item)
    }

    /// Persist changes to a record.
    ///
    /// Only the four managed types are accepted; anything else fails with
    /// [`Error::UnsupportedKind`] before touching the database. With `cascade`
    /// the record and all records it owns are updated in one transaction.
    pub fn update<T: Any>(&mut self, record: &T, cascade: bool) -> Result<()> {
        let record = record as &dyn Any;

        if let Some(set) = record.downcast_ref::<BeatmapSetInfo>() {
            self.update_record(set, cascade)
        } else if let Some(beatmap) = record.downcast_ref::<BeatmapInfo>() {
            self.update_record(beatmap, cascade)
        } else if let Some(metadata) = record.downcast_ref::<BeatmapMetadata>() {
            self.update_record(metadata, cascade)
        } else if let Some(difficulty) = record.downcast_ref::<BeatmapDifficulty>() {
            self.update_record(difficulty, cascade)
        } else {
            Err(Error::UnsupportedKind(type_name::<T>()))
        }
    }

    fn update_record<R: Record>(&mut self, record: &R, cascade: bool) -> Result<()> {
        if cascade {
            self.store.update_with_children(record)
        } else {
            self.store.update(record)
        }
    }

    /// Check that a relocated set's archive still matches its recorded hash
    pub fn verify_beatmap_set(&self, set: &BeatmapSetInfo) -> Result<()> {
        match &set.hash {
            Some(hash) => self.files.ensure_valid(&set.path, hash),
            None => Ok(()),
        }
    }

    /// Remove every imported set: stored archives first, then all rows.
    ///
    /// Archive deletion is best effort; failures are logged and skipped.
    /// Sources that were referenced in place are never deleted.
    pub fn reset(&mut self) -> Result<()> {
        let sets = self.store.query::<BeatmapSetInfo>()?;

        for set in sets.iter().filter(|s| s.is_relocated()) {
            if let Err(e) = self.files.delete(&set.path) {
                warn!("Failed to delete {}: {}", set.path, e);
            }
        }

        self.store.delete_everything()?;
        info!("Reset beatmap database, removed {} sets", sets.len());
        Ok(())
    }
}
