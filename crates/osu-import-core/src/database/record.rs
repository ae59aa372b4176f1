//! Row mapping for the four tables of the beatmap database
//!
//! Ownership runs set → beatmaps → difficulty, with metadata referenced from
//! both sets and (optionally) beatmaps. The `*_with_children` methods walk
//! that graph; callers wrap them in a transaction.

use rusqlite::{params, Connection, OptionalExtension, Params, Row};

use crate::beatmap::{BeatmapDifficulty, BeatmapInfo, BeatmapMetadata, BeatmapSetInfo, GameMode};
use crate::error::{Error, Result};

/// A type persisted in one table of the beatmap database
pub trait Record: Clone + Default + Sized + 'static {
    /// Table name
    const TABLE: &'static str;
    /// Type name used in error messages
    const KIND: &'static str;
    /// `CREATE TABLE IF NOT EXISTS` statement for the table
    const CREATE_TABLE: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn row_id(&self) -> Option<i64>;

    /// Insert this record's own row and assign its row ID
    fn insert(&mut self, conn: &Connection) -> Result<()>;

    /// Update this record's own row
    fn update(&self, conn: &Connection) -> Result<()>;

    /// Insert this record and every record it owns that is not yet persisted
    fn insert_with_children(&mut self, conn: &Connection) -> Result<()> {
        self.insert(conn)
    }

    /// Update this record and every record it owns
    fn update_with_children(&self, conn: &Connection) -> Result<()> {
        self.update(conn)
    }

    /// Populate owned records from the database
    fn load_children(&mut self, _conn: &Connection, _recursive: bool) -> Result<()> {
        Ok(())
    }

    fn require_id(&self) -> Result<i64> {
        self.row_id().ok_or(Error::NotPersisted(Self::KIND))
    }
}

/// Load all rows of `T` matching an optional SQL `WHERE` clause
pub fn load_where<T: Record, P: Params>(
    conn: &Connection,
    clause: Option<&str>,
    params: P,
) -> Result<Vec<T>> {
    let sql = match clause {
        Some(clause) => format!("SELECT * FROM {} WHERE {} ORDER BY id", T::TABLE, clause),
        None => format!("SELECT * FROM {} ORDER BY id", T::TABLE),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, T::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
}

/// Load one row of `T` by row ID
pub fn load_by_id<T: Record>(conn: &Connection, id: i64) -> Result<Option<T>> {
    let sql = format!("SELECT * FROM {} WHERE id = ?1", T::TABLE);
    Ok(conn.query_row(&sql, [id], T::from_row).optional()?)
}

fn ensure_updated(changed: usize, kind: &'static str) -> Result<()> {
    if changed == 0 {
        return Err(Error::NotPersisted(kind));
    }
    Ok(())
}

// =============================================================================
// Metadata
// =============================================================================

impl Record for BeatmapMetadata {
    const TABLE: &'static str = "beatmap_metadata";
    const KIND: &'static str = "BeatmapMetadata";
    const CREATE_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS beatmap_metadata (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        beatmap_id INTEGER,
        beatmap_set_id INTEGER,
        title TEXT NOT NULL,
        title_unicode TEXT,
        artist TEXT NOT NULL,
        artist_unicode TEXT,
        creator TEXT NOT NULL,
        source TEXT,
        tags TEXT NOT NULL,
        audio_file TEXT NOT NULL,
        background_file TEXT,
        preview_time INTEGER NOT NULL
    )";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let tags: String = row.get("tags")?;
        Ok(Self {
            id: row.get("id")?,
            beatmap_id: row.get("beatmap_id")?,
            beatmap_set_id: row.get("beatmap_set_id")?,
            title: row.get("title")?,
            title_unicode: row.get("title_unicode")?,
            artist: row.get("artist")?,
            artist_unicode: row.get("artist_unicode")?,
            creator: row.get("creator")?,
            source: row.get("source")?,
            tags: tags.split_whitespace().map(String::from).collect(),
            audio_file: row.get("audio_file")?,
            background_file: row.get("background_file")?,
            preview_time: row.get("preview_time")?,
        })
    }

    fn row_id(&self) -> Option<i64> {
        self.id
    }

    fn insert(&mut self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO beatmap_metadata (beatmap_id, beatmap_set_id, title, title_unicode,
                artist, artist_unicode, creator, source, tags, audio_file, background_file,
                preview_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                self.beatmap_id,
                self.beatmap_set_id,
                self.title,
                self.title_unicode,
                self.artist,
                self.artist_unicode,
                self.creator,
                self.source,
                self.tags_string(),
                self.audio_file,
                self.background_file,
                self.preview_time,
            ],
        )?;
        self.id = Some(conn.last_insert_rowid());
        Ok(())
    }

    fn update(&self, conn: &Connection) -> Result<()> {
        let id = self.require_id()?;
        let changed = conn.execute(
            "UPDATE beatmap_metadata SET beatmap_id = ?1, beatmap_set_id = ?2, title = ?3,
                title_unicode = ?4, artist = ?5, artist_unicode = ?6, creator = ?7, source = ?8,
                tags = ?9, audio_file = ?10, background_file = ?11, preview_time = ?12
             WHERE id = ?13",
            params![
                self.beatmap_id,
                self.beatmap_set_id,
                self.title,
                self.title_unicode,
                self.artist,
                self.artist_unicode,
                self.creator,
                self.source,
                self.tags_string(),
                self.audio_file,
                self.background_file,
                self.preview_time,
                id,
            ],
        )?;
        ensure_updated(changed, Self::KIND)
    }
}

// =============================================================================
// Difficulty
// =============================================================================

impl Record for BeatmapDifficulty {
    const TABLE: &'static str = "base_difficulty";
    const KIND: &'static str = "BeatmapDifficulty";
    const CREATE_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS base_difficulty (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        hp_drain REAL NOT NULL,
        circle_size REAL NOT NULL,
        overall_difficulty REAL NOT NULL,
        approach_rate REAL NOT NULL,
        slider_multiplier REAL NOT NULL,
        slider_tick_rate REAL NOT NULL
    )";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            hp_drain: row.get("hp_drain")?,
            circle_size: row.get("circle_size")?,
            overall_difficulty: row.get("overall_difficulty")?,
            approach_rate: row.get("approach_rate")?,
            slider_multiplier: row.get("slider_multiplier")?,
            slider_tick_rate: row.get("slider_tick_rate")?,
        })
    }

    fn row_id(&self) -> Option<i64> {
        self.id
    }

    fn insert(&mut self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO base_difficulty (hp_drain, circle_size, overall_difficulty,
                approach_rate, slider_multiplier, slider_tick_rate)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.hp_drain,
                self.circle_size,
                self.overall_difficulty,
                self.approach_rate,
                self.slider_multiplier,
                self.slider_tick_rate,
            ],
        )?;
        self.id = Some(conn.last_insert_rowid());
        Ok(())
    }

    fn update(&self, conn: &Connection) -> Result<()> {
        let id = self.require_id()?;
        let changed = conn.execute(
            "UPDATE base_difficulty SET hp_drain = ?1, circle_size = ?2,
                overall_difficulty = ?3, approach_rate = ?4, slider_multiplier = ?5,
                slider_tick_rate = ?6
             WHERE id = ?7",
            params![
                self.hp_drain,
                self.circle_size,
                self.overall_difficulty,
                self.approach_rate,
                self.slider_multiplier,
                self.slider_tick_rate,
                id,
            ],
        )?;
        ensure_updated(changed, Self::KIND)
    }
}

// =============================================================================
// Beatmap
// =============================================================================

impl BeatmapInfo {
    fn difficulty_ref(&self) -> Option<i64> {
        self.difficulty.id.or(self.difficulty_id)
    }

    fn metadata_ref(&self) -> Option<i64> {
        match &self.metadata {
            Some(meta) => meta.id.or(self.metadata_id),
            None => self.metadata_id,
        }
    }
}

impl Record for BeatmapInfo {
    const TABLE: &'static str = "beatmaps";
    const KIND: &'static str = "BeatmapInfo";
    const CREATE_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS beatmaps (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        beatmap_set_info_id INTEGER NOT NULL
            REFERENCES beatmap_sets(id) ON DELETE CASCADE,
        beatmap_id INTEGER,
        beatmap_set_id INTEGER NOT NULL,
        path TEXT NOT NULL,
        metadata_id INTEGER REFERENCES beatmap_metadata(id) ON DELETE SET NULL,
        difficulty_id INTEGER NOT NULL REFERENCES base_difficulty(id) ON DELETE CASCADE,
        version TEXT NOT NULL,
        mode INTEGER NOT NULL,
        hash TEXT NOT NULL,
        md5_hash TEXT NOT NULL,
        UNIQUE (beatmap_set_info_id, path)
    )";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let mode: u8 = row.get("mode")?;
        Ok(Self {
            id: row.get("id")?,
            beatmap_set_info_id: row.get("beatmap_set_info_id")?,
            beatmap_id: row.get("beatmap_id")?,
            beatmap_set_id: row.get("beatmap_set_id")?,
            path: row.get("path")?,
            metadata_id: row.get("metadata_id")?,
            metadata: None,
            difficulty_id: row.get("difficulty_id")?,
            difficulty: BeatmapDifficulty::default(),
            version: row.get("version")?,
            mode: GameMode::from(mode),
            hash: row.get("hash")?,
            md5_hash: row.get("md5_hash")?,
        })
    }

    fn row_id(&self) -> Option<i64> {
        self.id
    }

    fn insert(&mut self, conn: &Connection) -> Result<()> {
        let set_row = self
            .beatmap_set_info_id
            .ok_or(Error::NotPersisted(BeatmapSetInfo::KIND))?;
        let difficulty_id = self
            .difficulty_ref()
            .ok_or(Error::NotPersisted(BeatmapDifficulty::KIND))?;
        let metadata_id = self.metadata_ref();

        conn.execute(
            "INSERT INTO beatmaps (beatmap_set_info_id, beatmap_id, beatmap_set_id, path,
                metadata_id, difficulty_id, version, mode, hash, md5_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                set_row,
                self.beatmap_id,
                self.beatmap_set_id,
                self.path,
                metadata_id,
                difficulty_id,
                self.version,
                self.mode as u8,
                self.hash,
                self.md5_hash,
            ],
        )?;
        self.id = Some(conn.last_insert_rowid());
        self.difficulty_id = Some(difficulty_id);
        self.metadata_id = metadata_id;
        Ok(())
    }

    fn update(&self, conn: &Connection) -> Result<()> {
        let id = self.require_id()?;
        let changed = conn.execute(
            "UPDATE beatmaps SET beatmap_id = ?1, beatmap_set_id = ?2, path = ?3,
                metadata_id = ?4, difficulty_id = ?5, version = ?6, mode = ?7, hash = ?8,
                md5_hash = ?9
             WHERE id = ?10",
            params![
                self.beatmap_id,
                self.beatmap_set_id,
                self.path,
                self.metadata_ref(),
                self.difficulty_ref(),
                self.version,
                self.mode as u8,
                self.hash,
                self.md5_hash,
                id,
            ],
        )?;
        ensure_updated(changed, Self::KIND)
    }

    fn insert_with_children(&mut self, conn: &Connection) -> Result<()> {
        if self.difficulty.id.is_none() {
            self.difficulty.insert(conn)?;
        }
        if let Some(meta) = self.metadata.as_mut() {
            if meta.id.is_none() {
                meta.insert(conn)?;
            }
        }
        self.insert(conn)
    }

    fn update_with_children(&self, conn: &Connection) -> Result<()> {
        self.difficulty.update(conn)?;
        if let Some(meta) = &self.metadata {
            meta.update(conn)?;
        }
        self.update(conn)
    }

    fn load_children(&mut self, conn: &Connection, _recursive: bool) -> Result<()> {
        if let Some(id) = self.difficulty_id {
            self.difficulty = load_by_id(conn, id)?.unwrap_or_default();
        }
        self.metadata = match self.metadata_id {
            Some(id) => load_by_id(conn, id)?,
            None => None,
        };
        Ok(())
    }
}

// =============================================================================
// Beatmap set
// =============================================================================

impl Record for BeatmapSetInfo {
    const TABLE: &'static str = "beatmap_sets";
    const KIND: &'static str = "BeatmapSetInfo";
    const CREATE_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS beatmap_sets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        beatmap_set_id INTEGER NOT NULL UNIQUE,
        path TEXT NOT NULL,
        hash TEXT,
        metadata_id INTEGER REFERENCES beatmap_metadata(id) ON DELETE SET NULL
    )";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            beatmap_set_id: row.get("beatmap_set_id")?,
            path: row.get("path")?,
            hash: row.get("hash")?,
            metadata_id: row.get("metadata_id")?,
            metadata: None,
            beatmaps: Vec::new(),
        })
    }

    fn row_id(&self) -> Option<i64> {
        self.id
    }

    fn insert(&mut self, conn: &Connection) -> Result<()> {
        let metadata_id = self.metadata.as_ref().and_then(|m| m.id).or(self.metadata_id);
        conn.execute(
            "INSERT INTO beatmap_sets (beatmap_set_id, path, hash, metadata_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![self.beatmap_set_id, self.path, self.hash, metadata_id],
        )?;
        self.id = Some(conn.last_insert_rowid());
        self.metadata_id = metadata_id;
        Ok(())
    }

    fn update(&self, conn: &Connection) -> Result<()> {
        let id = self.require_id()?;
        let metadata_id = self.metadata.as_ref().and_then(|m| m.id).or(self.metadata_id);
        let changed = conn.execute(
            "UPDATE beatmap_sets SET beatmap_set_id = ?1, path = ?2, hash = ?3, metadata_id = ?4
             WHERE id = ?5",
            params![self.beatmap_set_id, self.path, self.hash, metadata_id, id],
        )?;
        ensure_updated(changed, Self::KIND)
    }

    fn insert_with_children(&mut self, conn: &Connection) -> Result<()> {
        if let Some(meta) = self.metadata.as_mut() {
            if meta.id.is_none() {
                meta.insert(conn)?;
            }
        }
        self.insert(conn)?;

        for beatmap in &mut self.beatmaps {
            beatmap.beatmap_set_info_id = self.id;
            beatmap.beatmap_set_id = self.beatmap_set_id;
            beatmap.insert_with_children(conn)?;
        }
        Ok(())
    }

    fn update_with_children(&self, conn: &Connection) -> Result<()> {
        if let Some(meta) = &self.metadata {
            meta.update(conn)?;
        }
        for beatmap in &self.beatmaps {
            beatmap.update_with_children(conn)?;
        }
        self.update(conn)
    }

    fn load_children(&mut self, conn: &Connection, recursive: bool) -> Result<()> {
        let id = self.require_id()?;

        self.metadata = match self.metadata_id {
            Some(meta_id) => load_by_id(conn, meta_id)?,
            None => None,
        };

        self.beatmaps = load_where(conn, Some("beatmap_set_info_id = ?1"), [id])?;
        if recursive {
            for beatmap in &mut self.beatmaps {
                beatmap.load_children(conn, recursive)?;
            }
        }
        Ok(())
    }
}
