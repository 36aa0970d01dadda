//! Storage layer abstractions for hnswdb.
//!
//! This module provides a trait-based abstraction over the storage engine,
//! so the database logic does not depend on redb directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      VectorDB                                │
//! │                         │                                    │
//! │                         ▼                                    │
//! │              ┌─────────────────────┐                        │
//! │              │   StorageEngine     │  ← Trait               │
//! │              └─────────────────────┘                        │
//! │                         ▲                                    │
//! │                         │                                    │
//! │                  ┌──────┴──────┐                            │
//! │                  │ RedbStorage │                            │
//! │                  └─────────────┘                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod redb;
pub mod schema;

pub use self::redb::RedbStorage;
pub use schema::{DatabaseMetadata, MAX_DIMENSION, SCHEMA_VERSION};

use std::path::Path;

use serde_json::Value;

use crate::config::Config;
use crate::error::Result;
use crate::record::VectorRecord;
use crate::types::VectorId;

/// Storage engine trait for hnswdb.
///
/// Stored vectors are the source of truth; the HNSW index is always
/// rebuilt from [`load_vectors`](Self::load_vectors).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow the database to be shared
/// across threads. The engine handles internal synchronization.
pub trait StorageEngine: Send + Sync {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Returns the database metadata (schema version, dimension, timestamps).
    fn metadata(&self) -> &DatabaseMetadata;

    /// Closes the storage engine, flushing any pending writes.
    ///
    /// This method consumes the storage engine. After calling `close()`,
    /// the engine cannot be used.
    fn close(self: Box<Self>) -> Result<()>;

    /// Returns the path to the database file, if applicable.
    fn path(&self) -> Option<&Path>;

    // =========================================================================
    // Vector Storage Operations
    // =========================================================================

    /// Stores a vector and its metadata under a newly allocated ID.
    ///
    /// The ID counter, vector and document are written in one transaction,
    /// so a failed insert never burns an ID.
    fn insert_vector(&self, vector: &[f32], metadata: &Value) -> Result<VectorId>;

    /// Retrieves a vector and its metadata.
    ///
    /// Returns `None` if no vector with the given ID exists.
    fn get_vector(&self, id: VectorId) -> Result<Option<VectorRecord>>;

    /// Replaces the vector and metadata stored under `id`.
    ///
    /// Returns `false` if the ID does not exist; nothing is written then.
    fn update_vector(&self, id: VectorId, vector: &[f32], metadata: &Value) -> Result<bool>;

    /// Permanently deletes a vector and its metadata.
    ///
    /// Returns `true` if the vector existed and was deleted.
    fn delete_vector(&self, id: VectorId) -> Result<bool>;

    /// Number of stored vectors.
    fn count_vectors(&self) -> Result<u64>;

    /// Loads every stored vector in ascending ID order.
    fn load_vectors(&self) -> Result<Vec<(VectorId, Vec<f32>)>>;

    /// The ID the next insert will receive.
    fn next_id(&self) -> Result<VectorId>;
}

/// Creates a new storage engine at the given path.
///
/// # Errors
///
/// Returns `DatabaseExists` if a file is already present at `path`.
pub fn create_storage(
    path: impl AsRef<Path>,
    dimension: usize,
    config: &Config,
) -> Result<Box<dyn StorageEngine>> {
    let storage = RedbStorage::create(path, dimension, config)?;
    Ok(Box::new(storage))
}

/// Opens an existing storage engine at the given path.
///
/// # Errors
///
/// Returns an error if:
/// - No database exists at `path`
/// - The database file is corrupted
/// - The database is locked by another process
/// - Schema version doesn't match
pub fn open_storage(path: impl AsRef<Path>, config: &Config) -> Result<Box<dyn StorageEngine>> {
    let storage = RedbStorage::open(path, config)?;
    Ok(Box::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_then_open_storage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let storage = create_storage(&path, 4, &Config::default()).unwrap();
        assert_eq!(storage.metadata().dimension, 4);
        assert!(storage.path().is_some());
        storage.close().unwrap();

        let storage = open_storage(&path, &Config::default()).unwrap();
        assert_eq!(storage.metadata().dimension, 4);
        storage.close().unwrap();
    }

    #[test]
    fn test_storage_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RedbStorage>();
    }
}
