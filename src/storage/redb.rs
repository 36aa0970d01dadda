//! redb storage engine implementation.
//!
//! This module provides the storage backend for hnswdb using
//! [redb](https://docs.rs/redb), a pure Rust embedded key-value store.
//!
//! # Features
//!
//! - ACID transactions with MVCC
//! - Single-writer, multiple-reader concurrency
//! - Automatic crash recovery
//! - Zero external dependencies (pure Rust)
//!
//! # Durability
//!
//! Every write transaction uses the durability selected by
//! [`SyncMode`](crate::SyncMode):
//!
//! | SyncMode | redb Durability |
//! |----------|-----------------|
//! | Normal   | Immediate       |
//! | Fast     | Eventual        |
//! | Paranoid | Paranoid        |

use std::path::{Path, PathBuf};

use ::redb::{Database, Durability, ReadableTable, ReadableTableMetadata, WriteTransaction};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::schema::{
    decode_counter, decode_vector, encode_counter, encode_vector, DatabaseMetadata,
    DOCUMENTS_TABLE, METADATA_KEY, METADATA_TABLE, NEXT_ID_KEY, SCHEMA_VERSION, VECTORS_TABLE,
};
use super::StorageEngine;
use crate::config::{Config, SyncMode};
use crate::error::{Result, StorageError, VectorDBError};
use crate::record::VectorRecord;
use crate::types::VectorId;

/// redb storage engine wrapper.
///
/// This struct holds the redb database handle and cached metadata.
///
/// # Thread Safety
///
/// `RedbStorage` is `Send + Sync`. redb handles internal synchronization
/// using MVCC for readers and exclusive locking for writers.
#[derive(Debug)]
pub struct RedbStorage {
    /// The redb database handle.
    db: Database,

    /// Cached database metadata.
    metadata: DatabaseMetadata,

    /// Path to the database file.
    path: PathBuf,

    /// Durability applied to every write transaction.
    durability: Durability,
}

impl RedbStorage {
    /// Creates and initializes a new database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A file already exists at `path`
    /// - The file cannot be created
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use hnswdb::{Config, storage::RedbStorage};
    ///
    /// let storage = RedbStorage::create("./vectors.db", 128, &Config::default())?;
    /// ```
    #[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
    pub fn create(path: impl AsRef<Path>, dimension: usize, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(StorageError::DatabaseExists(path.to_path_buf()).into());
        }

        let mut builder = Database::builder();
        builder.set_cache_size(config.cache_size_mb * 1024 * 1024);
        let db = builder.create(path)?;

        debug!("Database file created");
        Self::initialize_new(db, path.to_path_buf(), dimension, config)
    }

    /// Opens an existing database at the given path.
    ///
    /// The dimension is read from the stored metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No file exists at `path`
    /// - The database file is corrupted
    /// - The database is locked by another process
    /// - Schema version doesn't match
    #[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StorageError::DatabaseNotFound(path.to_path_buf()).into());
        }

        let mut builder = Database::builder();
        builder.set_cache_size(config.cache_size_mb * 1024 * 1024);
        let db = builder.open(path)?;

        debug!("Database file opened");
        Self::open_existing(db, path.to_path_buf(), config)
    }

    /// Initializes a new database with tables and metadata.
    #[instrument(skip(db, config), fields(path = %path.display()))]
    fn initialize_new(
        db: Database,
        path: PathBuf,
        dimension: usize,
        config: &Config,
    ) -> Result<Self> {
        info!("Initializing new database");

        let metadata = DatabaseMetadata::new(dimension);
        let durability = durability_for(config.sync_mode);

        // Create all tables and write metadata in a single transaction
        let mut write_txn = db.begin_write()?;
        write_txn.set_durability(durability);
        {
            let mut meta_table = write_txn.open_table(METADATA_TABLE)?;
            let metadata_bytes = bincode::serialize(&metadata)?;
            meta_table.insert(METADATA_KEY, metadata_bytes.as_slice())?;
            meta_table.insert(NEXT_ID_KEY, encode_counter(VectorId::FIRST.as_u64()).as_slice())?;

            let _ = write_txn.open_table(VECTORS_TABLE)?;
            let _ = write_txn.open_table(DOCUMENTS_TABLE)?;
        }
        write_txn.commit()?;

        info!(
            schema_version = SCHEMA_VERSION,
            dimension = dimension,
            "Database initialized"
        );

        Ok(Self {
            db,
            metadata,
            path,
            durability,
        })
    }

    /// Opens and validates an existing database.
    #[instrument(skip(db, config), fields(path = %path.display()))]
    fn open_existing(db: Database, path: PathBuf, config: &Config) -> Result<Self> {
        info!("Opening existing database");

        let read_txn = db.begin_read()?;
        let metadata = {
            let meta_table = read_txn.open_table(METADATA_TABLE).map_err(|e| {
                StorageError::corrupted(format!("Cannot open metadata table: {}", e))
            })?;

            let metadata_bytes = meta_table
                .get(METADATA_KEY)?
                .ok_or_else(|| StorageError::corrupted("Missing database metadata"))?;

            bincode::deserialize::<DatabaseMetadata>(metadata_bytes.value())
                .map_err(|e| StorageError::corrupted(format!("Invalid metadata format: {}", e)))?
        };
        drop(read_txn);

        if !metadata.is_compatible() {
            warn!(
                expected = SCHEMA_VERSION,
                found = metadata.schema_version,
                "Schema version mismatch"
            );
            return Err(StorageError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                found: metadata.schema_version,
            }
            .into());
        }

        let mut metadata = metadata;
        metadata.touch();

        let durability = durability_for(config.sync_mode);
        let mut write_txn = db.begin_write()?;
        write_txn.set_durability(durability);
        {
            let mut meta_table = write_txn.open_table(METADATA_TABLE)?;
            let metadata_bytes = bincode::serialize(&metadata)?;
            meta_table.insert(METADATA_KEY, metadata_bytes.as_slice())?;
        }
        write_txn.commit()?;

        info!(
            schema_version = metadata.schema_version,
            dimension = metadata.dimension,
            "Database opened successfully"
        );

        Ok(Self {
            db,
            metadata,
            path,
            durability,
        })
    }

    /// Begins a write transaction with the configured durability.
    fn begin_write(&self) -> Result<WriteTransaction> {
        let mut txn = self.db.begin_write()?;
        txn.set_durability(self.durability);
        Ok(txn)
    }

    /// Returns a reference to the underlying redb database.
    #[cfg(test)]
    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    /// Returns the vector dimension configured for this database.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.metadata.dimension
    }
}

/// Maps a [`SyncMode`] to the redb durability level.
fn durability_for(mode: SyncMode) -> Durability {
    match mode {
        SyncMode::Normal => Durability::Immediate,
        SyncMode::Fast => Durability::Eventual,
        SyncMode::Paranoid => Durability::Paranoid,
    }
}

impl StorageEngine for RedbStorage {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    fn metadata(&self) -> &DatabaseMetadata {
        &self.metadata
    }

    #[instrument(skip(self))]
    fn close(self: Box<Self>) -> Result<()> {
        info!("Closing storage engine");

        // redb flushes on drop; Database::drop is infallible.
        drop(self.db);

        info!("Storage engine closed");
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    // =========================================================================
    // Vector Storage Operations
    // =========================================================================

    fn insert_vector(&self, vector: &[f32], metadata: &Value) -> Result<VectorId> {
        let document = serde_json::to_string(metadata)?;
        let bytes = encode_vector(vector);

        let write_txn = self.begin_write()?;
        let id = {
            let mut meta_table = write_txn.open_table(METADATA_TABLE)?;
            let id = match meta_table.get(NEXT_ID_KEY)? {
                Some(raw) => VectorId::new(decode_counter(raw.value())?),
                None => VectorId::FIRST,
            };
            meta_table.insert(NEXT_ID_KEY, encode_counter(id.next().as_u64()).as_slice())?;

            let mut vectors = write_txn.open_table(VECTORS_TABLE)?;
            vectors.insert(id.as_u64(), bytes.as_slice())?;

            let mut documents = write_txn.open_table(DOCUMENTS_TABLE)?;
            documents.insert(id.as_u64(), document.as_str())?;
            id
        };
        write_txn.commit()?;

        debug!(id = %id, "Vector stored");
        Ok(id)
    }

    fn get_vector(&self, id: VectorId) -> Result<Option<VectorRecord>> {
        let read_txn = self.db.begin_read()?;
        let vectors = read_txn.open_table(VECTORS_TABLE)?;

        let vector = match vectors.get(id.as_u64())? {
            Some(raw) => decode_vector(raw.value())?,
            None => return Ok(None),
        };

        let documents = read_txn.open_table(DOCUMENTS_TABLE)?;
        let metadata = match documents.get(id.as_u64())? {
            Some(raw) => serde_json::from_str(raw.value())?,
            None => {
                return Err(StorageError::corrupted(format!(
                    "Missing metadata document for vector {}",
                    id
                ))
                .into())
            }
        };

        Ok(Some(VectorRecord {
            id,
            vector,
            metadata,
        }))
    }

    fn update_vector(&self, id: VectorId, vector: &[f32], metadata: &Value) -> Result<bool> {
        let document = serde_json::to_string(metadata)?;
        let bytes = encode_vector(vector);

        let write_txn = self.begin_write()?;
        let existed = {
            let mut vectors = write_txn.open_table(VECTORS_TABLE)?;
            let existed = vectors.get(id.as_u64())?.is_some();
            if existed {
                vectors.insert(id.as_u64(), bytes.as_slice())?;
                let mut documents = write_txn.open_table(DOCUMENTS_TABLE)?;
                documents.insert(id.as_u64(), document.as_str())?;
            }
            existed
        };

        if existed {
            write_txn.commit()?;
            debug!(id = %id, "Vector updated");
        } else {
            write_txn.abort()?;
        }
        Ok(existed)
    }

    fn delete_vector(&self, id: VectorId) -> Result<bool> {
        let write_txn = self.begin_write()?;
        let existed = {
            let mut vectors = write_txn.open_table(VECTORS_TABLE)?;
            let existed = vectors.remove(id.as_u64())?.is_some();
            let mut documents = write_txn.open_table(DOCUMENTS_TABLE)?;
            documents.remove(id.as_u64())?;
            existed
        };
        write_txn.commit()?;

        if existed {
            debug!(id = %id, "Vector deleted");
        }
        Ok(existed)
    }

    fn count_vectors(&self) -> Result<u64> {
        let read_txn = self.db.begin_read()?;
        let vectors = read_txn.open_table(VECTORS_TABLE)?;
        Ok(vectors.len()?)
    }

    fn load_vectors(&self) -> Result<Vec<(VectorId, Vec<f32>)>> {
        let read_txn = self.db.begin_read()?;
        let vectors = read_txn.open_table(VECTORS_TABLE)?;

        let mut loaded = Vec::new();
        for entry in vectors.iter()? {
            let (key, value) = entry?;
            let vector = decode_vector(value.value())?;
            if vector.len() != self.metadata.dimension {
                return Err(StorageError::corrupted(format!(
                    "Vector {} has {} components, expected {}",
                    key.value(),
                    vector.len(),
                    self.metadata.dimension
                ))
                .into());
            }
            loaded.push((VectorId::new(key.value()), vector));
        }

        Ok(loaded)
    }

    fn next_id(&self) -> Result<VectorId> {
        let read_txn = self.db.begin_read()?;
        let meta_table = read_txn.open_table(METADATA_TABLE)?;
        match meta_table.get(NEXT_ID_KEY)? {
            Some(raw) => Ok(VectorId::new(decode_counter(raw.value())?)),
            None => Ok(VectorId::FIRST),
        }
    }
}
