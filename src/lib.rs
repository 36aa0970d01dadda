//! # hnswdb
//!
//! Embedded vector database with an in-memory HNSW index for approximate
//! nearest neighbor search under squared Euclidean distance.
//!
//! Vectors and their JSON metadata are stored durably in redb. The HNSW
//! graph is derived from the stored vectors and rebuilt on demand.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hnswdb::{Config, VectorDB};
//! use serde_json::json;
//!
//! // Create a database for 2-dimensional vectors
//! let db = VectorDB::create("./vectors.db", 2, Config::default())?;
//!
//! // Store vectors
//! db.add_vector(&[1.0, 1.1], json!({"name": "near"}))?;
//! db.add_vector(&[10.0, 10.1], json!({"name": "far"}))?;
//!
//! // Nearest neighbors, nearest first
//! let hits = db.search(&[1.0, 1.0], 1)?;
//!
//! db.close()?;
//! ```
//!
//! ## Key Concepts
//!
//! ### HNSW Index
//!
//! A layered proximity graph. Upper layers hold few nodes with long-range
//! links; layer 0 holds every node. [`HnswIndex`] is usable on its own,
//! without any storage, and is safe to share between threads.
//!
//! ### Labels and IDs
//!
//! The index works with dense `usize` labels. [`VectorDB`] assigns stable
//! [`VectorId`]s and maps labels back to them on every search.
//!
//! ## Thread Safety
//!
//! `VectorDB` and `HnswIndex` are `Send + Sync` and can be shared across
//! threads using `Arc`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

// ============================================================================
// Module declarations
// ============================================================================

mod config;
mod db;
mod error;
mod types;

pub mod storage;

/// Stored records and search results.
pub mod record;

/// HNSW approximate nearest neighbor index.
pub mod vector;

// ============================================================================
// Public API re-exports
// ============================================================================

// Main database interface
pub use db::VectorDB;

// Configuration
pub use config::{Config, HnswConfig, SyncMode, MAX_LAYERS};

// Error handling
pub use error::{NotFoundError, Result, StorageError, ValidationError, VectorDBError};

// Core types
pub use types::{Timestamp, VectorId};

// Records
pub use record::{SearchResult, VectorRecord};

// Index
pub use vector::{Distance, HnswGraph, HnswIndex, SquaredEuclidean, VectorIndex};

// Storage (for advanced users)
pub use storage::DatabaseMetadata;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Convenient imports for common hnswdb usage.
///
/// ```rust
/// use hnswdb::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Config, HnswConfig, SyncMode};
    pub use crate::db::VectorDB;
    pub use crate::error::{Result, VectorDBError};
    pub use crate::record::{SearchResult, VectorRecord};
    pub use crate::types::VectorId;
    pub use crate::vector::{HnswIndex, VectorIndex};
}
