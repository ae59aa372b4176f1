//! Content-addressed storage for imported archives
//!
//! - [`Storage`] - Root directory that stored paths resolve against
//! - [`FileStore`] - Hash fan-out blob store under `beatmaps/`

mod file_store;
mod storage;

pub use file_store::*;
pub use storage::*;
