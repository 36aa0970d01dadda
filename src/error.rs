//! Error types for hnswdb.
//!
//! hnswdb uses a hierarchical error system:
//! - `VectorDBError` is the top-level error returned by all public APIs
//! - Specific error types (`StorageError`, `ValidationError`) provide detail
//!
//! # Error Handling Pattern
//! ```rust,ignore
//! use hnswdb::{VectorDB, Config, Result};
//!
//! fn example() -> Result<()> {
//!     let db = VectorDB::open("./vectors.db", Config::default())?;
//!     // ... operations that may fail ...
//!     db.close()?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hnswdb operations.
pub type Result<T> = std::result::Result<T, VectorDBError>;

/// Top-level error enum for all hnswdb operations.
///
/// This is the only error type returned by public APIs.
/// Use pattern matching to handle specific error cases.
#[derive(Debug, Error)]
pub enum VectorDBError {
    /// Storage layer error (I/O, corruption, transactions).
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error.
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of what's wrong with the configuration.
        reason: String,
    },

    /// Requested entity not found.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// Caller-supplied metadata could not be parsed as JSON.
    #[error("Invalid metadata JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Vector index error (HNSW operations).
    #[error("Vector index error: {0}")]
    Index(String),

    /// A search was issued before any index build.
    #[error("Index is not built. Run 'rebuild' first.")]
    IndexNotBuilt,
}

impl VectorDBError {
    /// Creates a configuration error with the given reason.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Creates a vector index error with the given message.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::Index(msg.into())
    }

    /// Returns true if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a storage error.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is a vector index error.
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }

    /// Returns true if an input vector had the wrong number of components.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            Self::Validation(ValidationError::DimensionMismatch { .. })
        )
    }
}

/// Storage-related errors.
///
/// These errors indicate problems with the underlying storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database file or data is corrupted.
    #[error("Database corrupted: {0}")]
    Corrupted(String),

    /// Database file not found at expected path.
    #[error("Database not found: {0}")]
    DatabaseNotFound(PathBuf),

    /// A database already exists where a new one was requested.
    #[error("Database already exists: {0}")]
    DatabaseExists(PathBuf),

    /// Database is locked by another process.
    #[error("Database is locked by another writer")]
    DatabaseLocked,

    /// Transaction failed (commit, rollback, etc.).
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error from the redb storage engine.
    #[error("Storage engine error: {0}")]
    Redb(String),

    /// Database schema version doesn't match expected version.
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch {
        /// Expected schema version.
        expected: u32,
        /// Actual schema version found in database.
        found: u32,
    },
}

impl StorageError {
    /// Creates a corruption error with the given message.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }
}

// Conversions from redb error types
impl From<redb::Error> for StorageError {
    fn from(err: redb::Error) -> Self {
        StorageError::Redb(err.to_string())
    }
}

impl From<redb::DatabaseError> for StorageError {
    fn from(err: redb::DatabaseError) -> Self {
        match err {
            redb::DatabaseError::DatabaseAlreadyOpen => StorageError::DatabaseLocked,
            other => StorageError::Redb(other.to_string()),
        }
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(err: redb::TransactionError) -> Self {
        StorageError::Transaction(err.to_string())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(err: redb::CommitError) -> Self {
        StorageError::Transaction(format!("Commit failed: {}", err))
    }
}

impl From<redb::TableError> for StorageError {
    fn from(err: redb::TableError) -> Self {
        StorageError::Redb(format!("Table error: {}", err))
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(err: redb::StorageError) -> Self {
        StorageError::Redb(format!("Storage error: {}", err))
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

// Also allow direct conversion to VectorDBError for convenience
impl From<redb::Error> for VectorDBError {
    fn from(err: redb::Error) -> Self {
        VectorDBError::Storage(StorageError::from(err))
    }
}

impl From<redb::DatabaseError> for VectorDBError {
    fn from(err: redb::DatabaseError) -> Self {
        VectorDBError::Storage(StorageError::from(err))
    }
}

impl From<redb::TransactionError> for VectorDBError {
    fn from(err: redb::TransactionError) -> Self {
        VectorDBError::Storage(StorageError::from(err))
    }
}

impl From<redb::CommitError> for VectorDBError {
    fn from(err: redb::CommitError) -> Self {
        VectorDBError::Storage(StorageError::from(err))
    }
}

impl From<redb::TableError> for VectorDBError {
    fn from(err: redb::TableError) -> Self {
        VectorDBError::Storage(StorageError::from(err))
    }
}

impl From<redb::StorageError> for VectorDBError {
    fn from(err: redb::StorageError) -> Self {
        VectorDBError::Storage(StorageError::from(err))
    }
}

impl From<bincode::Error> for VectorDBError {
    fn from(err: bincode::Error) -> Self {
        VectorDBError::Storage(StorageError::from(err))
    }
}

/// Validation errors for input data.
///
/// These errors indicate problems with data provided by the caller.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Vector length doesn't match the configured dimension.
    #[error("Vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension the index or database was created with.
        expected: usize,
        /// Actual length provided.
        got: usize,
    },

    /// A field has an invalid value.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the invalid field.
        field: String,
        /// Why the value is invalid.
        reason: String,
    },
}

impl ValidationError {
    /// Creates a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, got: usize) -> Self {
        Self::DimensionMismatch { expected, got }
    }

    /// Creates an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Not found errors for specific entity types.
#[derive(Debug, Error)]
pub enum NotFoundError {
    /// Vector with given ID not found.
    #[error("Vector with ID {0} not found")]
    Vector(String),
}

impl NotFoundError {
    /// Creates a vector not found error.
    pub fn vector(id: impl ToString) -> Self {
        Self::Vector(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VectorDBError::config("m must be at least 2");
        assert_eq!(err.to_string(), "Configuration error: m must be at least 2");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::SchemaVersionMismatch {
            expected: 2,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "Schema version mismatch: expected 2, found 1"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::dimension_mismatch(3, 2);
        assert_eq!(
            err.to_string(),
            "Vector dimension mismatch: expected 3, got 2"
        );
    }

    #[test]
    fn test_not_found_error_display() {
        let err = NotFoundError::vector(42);
        assert_eq!(err.to_string(), "Vector with ID 42 not found");
    }

    #[test]
    fn test_is_not_found() {
        let err: VectorDBError = NotFoundError::vector(1).into();
        assert!(err.is_not_found());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_is_dimension_mismatch() {
        let err: VectorDBError = ValidationError::dimension_mismatch(3, 2).into();
        assert!(err.is_validation());
        assert!(err.is_dimension_mismatch());

        let err: VectorDBError = ValidationError::invalid_field("k", "must be at least 1").into();
        assert!(err.is_validation());
        assert!(!err.is_dimension_mismatch());
    }

    #[test]
    fn test_index_error_display() {
        let err = VectorDBError::index("graph lock poisoned");
        assert_eq!(err.to_string(), "Vector index error: graph lock poisoned");
        assert!(err.is_index());
        assert!(!err.is_storage());
    }

    #[test]
    fn test_index_not_built_display() {
        let err = VectorDBError::IndexNotBuilt;
        assert_eq!(err.to_string(), "Index is not built. Run 'rebuild' first.");
    }

    #[test]
    fn test_bincode_error_maps_to_serialization() {
        let bad: std::result::Result<u64, bincode::Error> = bincode::deserialize(&[1u8, 2]);
        let err: VectorDBError = bad.unwrap_err().into();
        assert!(matches!(
            err,
            VectorDBError::Storage(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_error_conversion_chain() {
        fn inner() -> Result<()> {
            Err(StorageError::corrupted("test corruption"))?
        }

        let result = inner();
        assert!(result.is_err());
        assert!(result.unwrap_err().is_storage());
    }
}
