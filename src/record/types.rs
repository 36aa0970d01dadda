//! Record and search result types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::VectorId;

/// A stored vector with its metadata document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Stable identifier assigned on insert.
    pub id: VectorId,

    /// The vector components.
    pub vector: Vec<f32>,

    /// Arbitrary JSON document supplied by the caller.
    pub metadata: Value,
}

/// One hit returned by [`VectorDB::search`](crate::VectorDB::search).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Identifier of the matched vector.
    pub id: VectorId,

    /// Squared Euclidean distance to the query.
    pub distance: f32,
}

impl SearchResult {
    /// True Euclidean distance (square root of [`distance`](Self::distance)).
    #[inline]
    pub fn euclidean(&self) -> f32 {
        self.distance.sqrt()
    }
}
