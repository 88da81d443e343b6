//! Session-scoped key-value storage.
//!
//! This module provides:
//! - `SessionStore`: the storage seam the guard is built on
//! - `MemoryStore`: in-process storage that lives as long as the value does
//! - `FileStore`: JSON file storage, written through on every mutation
//!
//! Values are plain strings; timestamps are stored as decimal epoch
//! milliseconds.

pub mod file;
pub mod memory;

use std::path::PathBuf;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read store file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write store file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value persistence scoped to one browsing session.
///
/// Implementations own their keys outright; the guard only touches the keys
/// listed in [`crate::auth::keys`] apart from `clear`.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    fn clear(&mut self) -> Result<(), StoreError>;
}
