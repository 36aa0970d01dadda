//! Stored vector records and search results.
//!
//! A **record** is one stored vector plus its JSON metadata document, keyed
//! by a sequential [`VectorId`](crate::VectorId).
//!
//! # Operations
//!
//! All record operations are available on [`VectorDB`](crate::VectorDB):
//!
//! - [`add_vector(vector, metadata)`](crate::VectorDB::add_vector)
//! - [`get_vector(id)`](crate::VectorDB::get_vector)
//! - [`update_vector(id, vector, metadata)`](crate::VectorDB::update_vector)
//! - [`delete_vector(id)`](crate::VectorDB::delete_vector)
//! - [`search(query, k)`](crate::VectorDB::search)

pub mod types;

pub use types::{SearchResult, VectorRecord};

use crate::error::{VectorDBError, ValidationError};
use crate::storage::schema::MAX_DIMENSION;

/// Validates a vector before storage or search.
///
/// # Rules
///
/// - length equals the database dimension
/// - every component is finite (no NaN or infinity)
pub(crate) fn validate_vector(vector: &[f32], dimension: usize) -> Result<(), VectorDBError> {
    if vector.len() != dimension {
        return Err(ValidationError::dimension_mismatch(dimension, vector.len()).into());
    }

    if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
        return Err(ValidationError::invalid_field(
            "vector",
            format!("component {} is not finite: {}", pos, vector[pos]),
        )
        .into());
    }

    Ok(())
}

/// Validates the dimension of a new database: `1..=MAX_DIMENSION`.
pub(crate) fn validate_dimension(dimension: usize) -> Result<(), VectorDBError> {
    if dimension == 0 || dimension > MAX_DIMENSION {
        return Err(ValidationError::invalid_field(
            "dimension",
            format!("must be between 1 and {}, got {}", MAX_DIMENSION, dimension),
        )
        .into());
    }
    Ok(())
}
