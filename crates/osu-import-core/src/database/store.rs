//! SQLite-backed store for the beatmap object graph

use rusqlite::{params, Connection, Params};
use std::path::Path;
use tracing::{debug, info};

use crate::beatmap::{BeatmapDifficulty, BeatmapInfo, BeatmapMetadata, BeatmapSetInfo};
use crate::database::record::{load_by_id, load_where, Record};
use crate::error::Result;

/// Schema version recorded in `PRAGMA user_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Relational store for beatmap sets and everything they own.
///
/// Every graph write (`insert_with_children`, `update_with_children`,
/// `delete_everything`) runs in one transaction, so a set is never visible
/// with only part of its children.
pub struct BeatmapStore {
    conn: Connection,
}

impl BeatmapStore {
    /// Open (or create) the database file at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;

        let store = Self { conn };
        store.create_table::<BeatmapMetadata>()?;
        store.create_table::<BeatmapDifficulty>()?;
        store.create_table::<BeatmapSetInfo>()?;
        store.create_table::<BeatmapInfo>()?;
        store
            .conn
            .pragma_update(None, "user_version", SCHEMA_VERSION)?;

        info!(
            "Opened beatmap database: {} sets, {} beatmaps",
            store.count::<BeatmapSetInfo>()?,
            store.count::<BeatmapInfo>()?
        );
        Ok(store)
    }

    /// Create the table for `T` if it does not exist yet
    pub fn create_table<T: Record>(&self) -> Result<()> {
        self.conn.execute_batch(T::CREATE_TABLE)?;
        Ok(())
    }

    /// Insert `record` and all owned records in one transaction.
    ///
    /// Row IDs are written back into `record` only once the transaction has
    /// committed.
    pub fn insert_with_children<T: Record>(&mut self, record: &mut T) -> Result<()> {
        let mut staged = record.clone();

        let tx = self.conn.transaction()?;
        staged.insert_with_children(&tx)?;
        tx.commit()?;

        debug!("Inserted {} {:?} with children", T::KIND, staged.row_id());
        *record = staged;
        Ok(())
    }

    /// Update only the row of `record`
    pub fn update<T: Record>(&mut self, record: &T) -> Result<()> {
        record.update(&self.conn)
    }

    /// Update `record` and every owned record in one transaction
    pub fn update_with_children<T: Record>(&mut self, record: &T) -> Result<()> {
        let tx = self.conn.transaction()?;
        record.update_with_children(&tx)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete every row of `T`, returning the number of rows removed
    pub fn delete_all<T: Record>(&mut self) -> Result<usize> {
        let sql = format!("DELETE FROM {}", T::TABLE);
        Ok(self.conn.execute(&sql, params![])?)
    }

    /// Delete every row of all four tables in one transaction
    pub fn delete_everything(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        for table in [
            BeatmapInfo::TABLE,
            BeatmapSetInfo::TABLE,
            BeatmapDifficulty::TABLE,
            BeatmapMetadata::TABLE,
        ] {
            tx.execute(&format!("DELETE FROM {}", table), params![])?;
        }
        tx.commit()?;
        Ok(())
    }

    /// All rows of `T`, without children
    pub fn query<T: Record>(&self) -> Result<Vec<T>> {
        load_where(&self.conn, None, params![])
    }

    /// Rows of `T` matching an SQL `WHERE` clause, without children
    pub fn query_where<T: Record, P: Params>(&self, clause: &str, params: P) -> Result<Vec<T>> {
        load_where(&self.conn, Some(clause), params)
    }

    /// Number of rows of `T`
    pub fn count<T: Record>(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let count: i64 = self.conn.query_row(&sql, params![], |r| r.get(0))?;
        Ok(count as usize)
    }

    /// Number of rows of `T` matching an SQL `WHERE` clause
    pub fn count_where<T: Record, P: Params>(&self, clause: &str, params: P) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {}", T::TABLE, clause);
        let count: i64 = self.conn.query_row(&sql, params, |r| r.get(0))?;
        Ok(count as usize)
    }

    /// One row of `T` by row ID, without children
    pub fn get<T: Record>(&self, id: i64) -> Result<Option<T>> {
        load_by_id(&self.conn, id)
    }

    /// One row of `T` by row ID with all of its children loaded recursively
    pub fn get_with_children<T: Record>(&self, id: i64) -> Result<Option<T>> {
        let Some(mut record) = self.get::<T>(id)? else {
            return Ok(None);
        };
        record.load_children(&self.conn, true)?;
        Ok(Some(record))
    }

    /// All rows of `T` accepted by `filter`, with children loaded
    pub fn get_all_with_children<T: Record>(
        &self,
        filter: Option<&dyn Fn(&T) -> bool>,
        recursive: bool,
    ) -> Result<Vec<T>> {
        let mut records = self.query::<T>()?;
        if let Some(filter) = filter {
            records.retain(|r| filter(r));
        }
        for record in &mut records {
            record.load_children(&self.conn, recursive)?;
        }
        Ok(records)
    }

    /// Populate the children of an already loaded `record`
    pub fn get_children<T: Record>(&self, record: &mut T, recursive: bool) -> Result<()> {
        record.load_children(&self.conn, recursive)
    }
}
