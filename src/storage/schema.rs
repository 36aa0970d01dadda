//! Database schema definitions and versioning.
//!
//! This module defines the table structure for the redb storage engine.
//! All table definitions are compile-time constants to ensure consistency.
//!
//! # Schema Versioning
//!
//! The schema version is stored in the metadata table. When opening an
//! existing database, we check the version and fail if it doesn't match.
//!
//! # Table Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ METADATA_TABLE                                               │
//! │   Key: &str                                                  │
//! │   Value: &[u8]                                               │
//! │   Entries: "db_metadata" -> DatabaseMetadata (bincode)       │
//! │            "next_id"     -> u64 little-endian                │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │ VECTORS_TABLE                                                │
//! │   Key: u64 (VectorId)                                        │
//! │   Value: &[u8] (raw f32 little-endian, dimension * 4 bytes)  │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │ DOCUMENTS_TABLE                                              │
//! │   Key: u64 (VectorId)                                        │
//! │   Value: &str (JSON metadata document)                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::types::Timestamp;

/// Current schema version.
///
/// Increment this when making breaking changes to the schema.
/// The database will refuse to open if versions don't match.
pub const SCHEMA_VERSION: u32 = 1;

/// Largest accepted vector dimension.
pub const MAX_DIMENSION: usize = 65_536;

/// Key of the [`DatabaseMetadata`] entry.
pub const METADATA_KEY: &str = "db_metadata";

/// Key of the next-id counter.
pub const NEXT_ID_KEY: &str = "next_id";

// ============================================================================
// Table Definitions
// ============================================================================

/// Metadata table for database-level information.
pub const METADATA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("metadata");

/// Vectors table.
///
/// Source of truth for the index: every rebuild reads this table in key
/// order.
pub const VECTORS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("vectors");

/// Per-vector metadata documents, stored as JSON text.
///
/// Kept apart from the vectors so a rebuild never touches the documents.
pub const DOCUMENTS_TABLE: TableDefinition<u64, &str> = TableDefinition::new("documents");

// ============================================================================
// Database Metadata
// ============================================================================

/// Database metadata stored in the metadata table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    /// Schema version for compatibility checking.
    pub schema_version: u32,

    /// Vector dimension, fixed when the database is created.
    pub dimension: usize,

    /// Timestamp when the database was created.
    pub created_at: Timestamp,

    /// Last time the database was opened (updated on each open).
    pub last_opened_at: Timestamp,
}

impl DatabaseMetadata {
    /// Creates new metadata for a fresh database.
    pub fn new(dimension: usize) -> Self {
        let now = Timestamp::now();
        Self {
            schema_version: SCHEMA_VERSION,
            dimension,
            created_at: now,
            last_opened_at: now,
        }
    }

    /// Updates the last_opened_at timestamp.
    pub fn touch(&mut self) {
        self.last_opened_at = Timestamp::now();
    }

    /// Checks if this metadata is compatible with the current schema.
    pub fn is_compatible(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }
}

// ============================================================================
// Value Encoding Helpers
// ============================================================================

/// Encodes a vector as raw little-endian f32 bytes.
#[inline]
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decodes raw little-endian f32 bytes.
///
/// # Errors
///
/// Returns `Corrupted` if the byte length is not a multiple of 4.
pub fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>, StorageError> {
    if bytes.len() % 4 != 0 {
        return Err(StorageError::corrupted(format!(
            "Vector bytes length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Encodes the next-id counter.
#[inline]
pub fn encode_counter(value: u64) -> [u8; 8] {
    value.to_le_bytes()
}

/// Decodes the next-id counter.
pub fn decode_counter(bytes: &[u8]) -> Result<u64, StorageError> {
    let bytes: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StorageError::corrupted("Invalid next_id counter"))?;
    Ok(u64::from_le_bytes(bytes))
}
