//! VectorDB main struct and lifecycle operations.
//!
//! The [`VectorDB`] struct is the primary interface for interacting with
//! the database. It provides methods for:
//!
//! - Creating, opening and closing the database
//! - Storing, reading, updating and deleting vectors
//! - Rebuilding the HNSW index and searching it
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use hnswdb::{Config, VectorDB};
//! use serde_json::json;
//!
//! let db = VectorDB::create("./vectors.db", 2, Config::default())?;
//!
//! let id = db.add_vector(&[1.0, 1.1], json!({"name": "first"}))?;
//!
//! for hit in db.search(&[1.0, 1.0], 5)? {
//!     println!("{} {}", hit.id, hit.euclidean());
//! }
//!
//! db.close()?;
//! ```
//!
//! # Index Lifecycle
//!
//! Stored vectors are the source of truth. The index is derived from them
//! and is only ever replaced wholesale:
//!
//! ```text
//!   add / update / delete ──▶ redb commit ──▶ stale = true
//!                                               │
//!                           auto_rebuild ───────┤
//!                                               ▼
//!   rebuild_index: load (ascending id) ──▶ build new HnswIndex ──▶ swap
//! ```
//!
//! Each built index carries the label table it was built with, so a stale
//! index still maps its results to the IDs it was built from.
//!
//! # Thread Safety
//!
//! `VectorDB` is `Send + Sync` and can be shared across threads using `Arc`.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::{Result, VectorDBError};
use crate::record::{validate_dimension, validate_vector, SearchResult, VectorRecord};
use crate::storage::{create_storage, open_storage, DatabaseMetadata, StorageEngine};
use crate::types::VectorId;
use crate::vector::HnswIndex;

/// An index together with the ID of each of its labels.
struct BuiltIndex {
    index: HnswIndex,

    /// `labels[i]` is the ID stored under graph label `i`.
    labels: Vec<VectorId>,
}

/// The main hnswdb database handle.
///
/// Create a new database with [`VectorDB::create()`], reopen one with
/// [`VectorDB::open()`], and release it with [`VectorDB::close()`].
pub struct VectorDB {
    /// Storage engine holding vectors and metadata.
    storage: Box<dyn StorageEngine>,

    /// Most recently built index; `None` until the first rebuild.
    index: RwLock<Option<BuiltIndex>>,

    /// Set when stored vectors change after the last rebuild.
    stale: AtomicBool,

    /// Held for a whole rebuild so swaps happen in load order.
    rebuild_lock: Mutex<()>,

    /// Configuration used to open this database.
    config: Config,
}

impl std::fmt::Debug for VectorDB {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorDB")
            .field("config", &self.config)
            .field("dimension", &self.dimension())
            .field("stale", &self.is_index_stale())
            .finish_non_exhaustive()
    }
}

impl VectorDB {
    /// Creates a new database at `path` for vectors of `dimension` components.
    ///
    /// The new database starts with an empty, built index.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration is invalid (see [`Config::validate`])
    /// - `dimension` is 0 or above [`MAX_DIMENSION`](crate::storage::MAX_DIMENSION)
    /// - A file already exists at `path`
    #[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
    pub fn create(path: impl AsRef<Path>, dimension: usize, config: Config) -> Result<Self> {
        config.validate().map_err(VectorDBError::from)?;
        validate_dimension(dimension)?;

        info!("Creating database");
        let storage = create_storage(&path, dimension, &config)?;
        let db = Self::from_parts(storage, config);
        db.rebuild_index()?;

        info!(dimension, "Database created");
        Ok(db)
    }

    /// Opens an existing database.
    ///
    /// The dimension comes from the stored metadata. The index is rebuilt
    /// from storage unless `config.rebuild_on_open` is false.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration is invalid (see [`Config::validate`])
    /// - No database exists at `path`
    /// - Database file is corrupted or locked
    /// - Schema version doesn't match
    #[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        config.validate().map_err(VectorDBError::from)?;

        info!("Opening database");
        let storage = open_storage(&path, &config)?;
        let rebuild = config.rebuild_on_open;
        let db = Self::from_parts(storage, config);

        if rebuild {
            db.rebuild_index()?;
        } else {
            db.stale.store(true, Ordering::SeqCst);
        }

        info!(
            dimension = db.dimension(),
            sync_mode = ?db.config.sync_mode,
            "Database opened successfully"
        );
        Ok(db)
    }

    fn from_parts(storage: Box<dyn StorageEngine>, config: Config) -> Self {
        Self {
            storage,
            index: RwLock::new(None),
            stale: AtomicBool::new(false),
            rebuild_lock: Mutex::new(()),
            config,
        }
    }

    /// Closes the database, flushing all pending writes.
    ///
    /// This method consumes the `VectorDB` instance, ensuring it cannot
    /// be used after closing.
    #[instrument(skip(self))]
    pub fn close(self) -> Result<()> {
        info!("Closing database");
        self.storage.close()?;
        info!("Database closed successfully");
        Ok(())
    }

    /// Returns the configuration used to open this database.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the database metadata.
    #[inline]
    pub fn metadata(&self) -> &DatabaseMetadata {
        self.storage.metadata()
    }

    /// Number of components every vector in this database has.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.storage.metadata().dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> Result<u64> {
        self.storage.count_vectors()
    }

    /// Returns true if no vectors are stored.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // =========================================================================
    // Vector Operations
    // =========================================================================

    /// Stores a vector with its metadata document and returns its new ID.
    ///
    /// Rebuilds the index afterwards when `config.auto_rebuild` is set.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the vector has the wrong dimension or
    /// a non-finite component. Nothing is stored in that case.
    #[instrument(skip(self, vector, metadata))]
    pub fn add_vector(&self, vector: &[f32], metadata: Value) -> Result<VectorId> {
        validate_vector(vector, self.dimension())?;

        let id = self.storage.insert_vector(vector, &metadata)?;
        info!(id = %id, "Vector added");

        self.after_mutation()?;
        Ok(id)
    }

    /// Returns the vector and metadata stored under `id`.
    pub fn get_vector(&self, id: VectorId) -> Result<Option<VectorRecord>> {
        self.storage.get_vector(id)
    }

    /// Replaces the vector and metadata stored under `id`.
    ///
    /// Returns `false` if no such vector exists.
    #[instrument(skip(self, vector, metadata), fields(id = %id))]
    pub fn update_vector(&self, id: VectorId, vector: &[f32], metadata: Value) -> Result<bool> {
        validate_vector(vector, self.dimension())?;

        if !self.storage.update_vector(id, vector, &metadata)? {
            debug!("Vector not found");
            return Ok(false);
        }
        info!("Vector updated");

        self.after_mutation()?;
        Ok(true)
    }

    /// Deletes the vector stored under `id`.
    ///
    /// Returns `false` if no such vector exists.
    #[instrument(skip(self), fields(id = %id))]
    pub fn delete_vector(&self, id: VectorId) -> Result<bool> {
        if !self.storage.delete_vector(id)? {
            debug!("Vector not found");
            return Ok(false);
        }
        info!("Vector deleted");

        self.after_mutation()?;
        Ok(true)
    }

    fn after_mutation(&self) -> Result<()> {
        self.stale.store(true, Ordering::SeqCst);
        if self.config.auto_rebuild {
            self.rebuild_index()?;
        }
        Ok(())
    }

    // =========================================================================
    // Index Operations
    // =========================================================================

    /// Rebuilds the index from every stored vector.
    ///
    /// Vectors are inserted in ascending ID order under labels `0..n`. The
    /// new index is built without holding the index lock and swapped in
    /// once complete; searches keep using the previous index until then.
    /// Rebuilds are serialized, so the live index never goes back to an
    /// older snapshot.
    #[instrument(skip(self))]
    pub fn rebuild_index(&self) -> Result<()> {
        let _rebuilding = self
            .rebuild_lock
            .lock()
            .map_err(|_| VectorDBError::index("Rebuild lock poisoned"))?;

        // Cleared before loading so a concurrent mutation marks it again.
        self.stale.store(false, Ordering::SeqCst);

        let built = match self.build_from_storage() {
            Ok(built) => built,
            Err(e) => {
                self.stale.store(true, Ordering::SeqCst);
                return Err(e);
            }
        };

        let count = built.labels.len();
        *self.write_index()? = Some(built);

        info!(count, "Index rebuilt");
        Ok(())
    }

    fn build_from_storage(&self) -> Result<BuiltIndex> {
        let (labels, vectors): (Vec<VectorId>, Vec<Vec<f32>>) =
            self.storage.load_vectors()?.into_iter().unzip();

        if vectors.is_empty() {
            warn!("Rebuilding index with 0 vectors");
        }

        let index = HnswIndex::from_vectors(self.dimension(), &self.config.hnsw, &vectors)?;
        Ok(BuiltIndex { index, labels })
    }

    /// Returns up to `k` stored vectors nearest to `query`, nearest first.
    ///
    /// Distances are squared Euclidean; see [`SearchResult::euclidean`].
    ///
    /// # Errors
    ///
    /// - [`VectorDBError::IndexNotBuilt`] if no index has been built yet
    /// - a validation error on a dimension mismatch, or when `k` is 0 and
    ///   the index is not empty
    #[instrument(skip(self, query))]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        validate_vector(query, self.dimension())?;

        let guard = self.read_index()?;
        let built = guard.as_ref().ok_or(VectorDBError::IndexNotBuilt)?;

        let hits = built.index.search(query, k)?;
        let results = hits
            .into_iter()
            .map(|(distance, label)| {
                let id = built.labels.get(label).copied().ok_or_else(|| {
                    VectorDBError::index(format!("Label {} has no stored ID", label))
                })?;
                Ok(SearchResult { id, distance })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(results = results.len(), "Search complete");
        Ok(results)
    }

    /// Returns true if stored vectors changed since the last rebuild, or no
    /// index has been built yet.
    pub fn is_index_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// Returns true once an index has been built.
    pub fn is_index_built(&self) -> bool {
        self.index.read().map_or(false, |guard| guard.is_some())
    }

    /// Runs `f` against the current index.
    ///
    /// # Errors
    ///
    /// Returns [`VectorDBError::IndexNotBuilt`] if no index has been built.
    pub fn with_index<R>(&self, f: impl FnOnce(&HnswIndex) -> R) -> Result<R> {
        let guard = self.read_index()?;
        let built = guard.as_ref().ok_or(VectorDBError::IndexNotBuilt)?;
        Ok(f(&built.index))
    }

    fn read_index(&self) -> Result<RwLockReadGuard<'_, Option<BuiltIndex>>> {
        self.index
            .read()
            .map_err(|_| VectorDBError::index("Index lock poisoned"))
    }

    fn write_index(&self) -> Result<RwLockWriteGuard<'_, Option<BuiltIndex>>> {
        self.index
            .write()
            .map_err(|_| VectorDBError::index("Index lock poisoned"))
    }
}

// VectorDB is auto Send + Sync: Box<dyn StorageEngine + Send + Sync>,
// RwLock<Option<BuiltIndex>>, Mutex<()>, AtomicBool and Config are all Send + Sync.
