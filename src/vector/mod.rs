//! Approximate nearest neighbor search over an HNSW graph.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │         VectorIndex trait         │
//! └──────────┬───────────────────────┘
//!            │
//!    ┌───────┴────────┐
//!    │   HnswIndex    │  (Mutex<HnswGraph>)
//!    └───────┬────────┘
//!            │
//!    ┌───────┴────────┐     ┌──────────────────┐
//!    │   HnswGraph    │────▶│  dyn Distance     │
//!    └───────┬────────┘     └──────────────────┘
//!            │
//!    ┌───────┴────────┐
//!    │   NodeStore    │  (arena, index-based adjacency)
//!    └────────────────┘
//! ```
//!
//! Vectors stored in redb are the **source of truth**. The graph is a
//! derived structure that the database rebuilds from storage on demand.

mod distance;
mod graph;
mod heap;
mod hnsw;
mod node;
mod visited;

pub use distance::{squared_euclidean, Distance, SquaredEuclidean};
pub use graph::HnswGraph;
pub use heap::{CandidateQueue, Neighbor, ResultSet};
pub use hnsw::HnswIndex;
pub use node::{Node, NodeStore};

use crate::error::Result;

/// Vector index trait for approximate nearest neighbor search.
///
/// Implementations must be `Send + Sync` so one index can serve many
/// threads. Mutation takes `&self` and relies on interior locking.
pub trait VectorIndex: Send + Sync {
    /// Inserts a vector under a caller-chosen label.
    fn insert(&self, vector: &[f32], label: usize) -> Result<()>;

    /// Returns up to `k` `(distance, label)` pairs sorted nearest first.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(f32, usize)>>;

    /// Vector length the index accepts.
    fn dimension(&self) -> usize;

    /// Number of indexed vectors.
    fn len(&self) -> usize;

    /// Returns true if the index holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
