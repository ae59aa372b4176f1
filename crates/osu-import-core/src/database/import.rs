//! Import pipeline: archive → content store → beatmap database

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::archive::open_archive;
use crate::beatmap::{BeatmapInfo, BeatmapMetadata, BeatmapSetInfo};
use crate::database::BeatmapDatabase;
use crate::error::{Error, Result};
use crate::parser::decode_beatmap;

/// What happened to one path passed to [`BeatmapDatabase::import`]
#[derive(Debug)]
pub enum ImportOutcome {
    /// The set was persisted and listeners were notified
    Imported(BeatmapSetInfo),
    /// A set with the same online ID already exists; nothing was written
    Skipped { beatmap_set_id: i32 },
    /// The path could not be imported; nothing was persisted for it
    Failed(Error),
}

/// Outcome of importing one path
#[derive(Debug)]
pub struct PathImport {
    pub path: PathBuf,
    pub outcome: ImportOutcome,
}

/// Result of an import call, one entry per input path in input order
#[derive(Debug, Default)]
pub struct ImportResult {
    pub entries: Vec<PathImport>,
}

impl ImportResult {
    /// Sets that were imported
    pub fn imported(&self) -> impl Iterator<Item = &BeatmapSetInfo> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            ImportOutcome::Imported(set) => Some(set),
            _ => None,
        })
    }

    /// Paths that failed, with their errors
    pub fn errors(&self) -> impl Iterator<Item = (&Path, &Error)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            ImportOutcome::Failed(err) => Some((e.path.as_path(), err)),
            _ => None,
        })
    }

    pub fn imported_count(&self) -> usize {
        self.imported().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, ImportOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.errors().count()
    }

    /// Total number of paths processed
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Check if no path failed
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

impl BeatmapDatabase {
    /// Import beatmap sets from `.osz` files or extracted folders.
    ///
    /// Paths are processed in order and independently: a duplicate is skipped
    /// and a failure is recorded, and in both cases the remaining paths are
    /// still imported. Listeners are notified once per imported set.
    ///
    /// Relative paths are resolved against the storage root. Archives whose
    /// beatmaps carry no `BeatmapSetID` (unsubmitted maps, old format
    /// versions) fail with [`Error::MissingSetId`].
    pub fn import<P: AsRef<Path>>(&mut self, paths: &[P]) -> ImportResult {
        let mut result = ImportResult::default();

        for path in paths {
            let path = path.as_ref();
            info!("Importing {}", path.display());

            let outcome = match self.import_path(path) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Failed to import {}: {}", path.display(), e);
                    ImportOutcome::Failed(e)
                }
            };

            if let ImportOutcome::Imported(set) = &outcome {
                self.notify_beatmap_set_added(set);
            }

            result.entries.push(PathImport {
                path: path.to_path_buf(),
                outcome,
            });
        }

        info!(
            "Import complete: {} imported, {} skipped, {} failed",
            result.imported_count(),
            result.skipped_count(),
            result.failed_count()
        );
        result
    }

    fn import_path(&mut self, path: &Path) -> Result<ImportOutcome> {
        let metadata = open_archive(self.storage(), path)?.read_metadata()?;
        let beatmap_set_id = metadata
            .beatmap_set_id
            .ok_or_else(|| Error::MissingSetId(path.to_path_buf()))?;

        if self.contains_beatmap_set(beatmap_set_id)? {
            debug!("Beatmap set {} already imported, skipping", beatmap_set_id);
            return Ok(ImportOutcome::Skipped { beatmap_set_id });
        }

        self.import_new(path, beatmap_set_id, metadata)
    }

    /// Place, decode and persist a set that passed the dedup check
    fn import_new(
        &mut self,
        path: &Path,
        beatmap_set_id: i32,
        metadata: BeatmapMetadata,
    ) -> Result<ImportOutcome> {
        // Extracted folders cannot be relocated and are referenced in place
        let source = self.storage().resolve(path);
        let (stored_path, hash, newly_placed) = if source.is_file() {
            let stored = self.files().place_file(&source)?;
            let newly_placed = stored.newly_written.then(|| stored.path.clone());
            (stored.path, Some(stored.hash), newly_placed)
        } else {
            (source.to_string_lossy().into_owned(), None, None)
        };

        let result = self
            .read_beatmaps(&stored_path)
            .and_then(|beatmaps| self.persist(beatmap_set_id, stored_path, hash, metadata, beatmaps));

        match result {
            Ok(set) => Ok(ImportOutcome::Imported(set)),
            // Another writer committed the same set after our dedup check and
            // may reference the blob we placed, so it stays
            Err(e) if e.is_duplicate_beatmap_set() => {
                debug!("Beatmap set {} inserted concurrently, skipping", beatmap_set_id);
                Ok(ImportOutcome::Skipped { beatmap_set_id })
            }
            Err(e) => {
                if let Some(placed) = &newly_placed {
                    if let Err(delete_err) = self.files().delete(placed) {
                        warn!("Failed to remove {} after aborted import: {}", placed, delete_err);
                    }
                }
                Err(e)
            }
        }
    }

    fn read_beatmaps(&self, stored_path: &str) -> Result<Vec<BeatmapInfo>> {
        let mut reader = open_archive(self.storage(), stored_path)?;
        let names = reader.beatmap_names();

        let mut beatmaps = Vec::with_capacity(names.len());
        for name in names {
            let content = reader.read_bytes(&name)?;
            let mut beatmap = decode_beatmap(&name, &content)?;
            beatmap.info.path = name;
            // TODO: keep per-difficulty metadata when it differs from the set's
            beatmap.info.metadata = None;
            beatmaps.push(beatmap.info);
        }
        Ok(beatmaps)
    }

    fn persist(
        &mut self,
        beatmap_set_id: i32,
        path: String,
        hash: Option<String>,
        metadata: BeatmapMetadata,
        beatmaps: Vec<BeatmapInfo>,
    ) -> Result<BeatmapSetInfo> {
        let mut set = BeatmapSetInfo {
            beatmap_set_id,
            path,
            hash,
            metadata: Some(metadata),
            beatmaps,
            ..Default::default()
        };

        self.store_mut().insert_with_children(&mut set)?;
        info!(
            "Imported beatmap set {} ({}) with {} beatmaps",
            set.beatmap_set_id,
            set.display_name(),
            set.beatmaps.len()
        );
        Ok(set)
    }
}
