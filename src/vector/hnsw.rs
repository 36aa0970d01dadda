//! Thread-safe HNSW index.
//!
//! Wraps an [`HnswGraph`] in a single `std::sync::Mutex`:
//! - `insert` and `search` each hold the lock for their whole duration
//! - [`HnswIndex::with_graph`] exposes the same lock for multi-step access
//!
//! # Thread Safety
//!
//! Every operation takes `&self`, so an `HnswIndex` can be shared through an
//! `Arc` without an outer lock. Searches serialize with each other as well as
//! with inserts; the graph is never observed half-linked.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument};

use crate::config::HnswConfig;
use crate::error::{Result, VectorDBError};

use super::distance::Distance;
use super::graph::HnswGraph;
use super::VectorIndex;

/// HNSW index safe to share between threads.
///
/// Labels are opaque `usize` values chosen by the caller; the index never
/// interprets them and returns them unchanged from [`search`](Self::search).
pub struct HnswIndex {
    /// The graph. All reads and writes go through this lock.
    graph: Mutex<HnswGraph>,

    /// Vector length, duplicated outside the lock for cheap access.
    dimension: usize,
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("dimension", &self.dimension)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl HnswIndex {
    /// Creates an empty index using squared Euclidean distance.
    ///
    /// # Arguments
    ///
    /// * `dimension` - Length every inserted and queried vector must have
    /// * `config` - Graph construction parameters
    pub fn new(dimension: usize, config: &HnswConfig) -> Self {
        Self::from_graph(HnswGraph::new(dimension, config, 0))
    }

    /// Creates an empty index from explicit construction parameters.
    ///
    /// `capacity_hint` pre-sizes node storage and is not a hard limit.
    /// The layer sampler draws from entropy.
    pub fn build(
        dimension: usize,
        capacity_hint: usize,
        m: usize,
        m_max0: usize,
        ef_construction: usize,
    ) -> Self {
        let config = HnswConfig {
            m,
            m_max0,
            ef_construction,
            seed: None,
        };
        Self::from_graph(HnswGraph::new(dimension, &config, capacity_hint))
    }

    /// Creates an empty index with a caller-supplied distance strategy.
    pub fn with_distance(
        dimension: usize,
        config: &HnswConfig,
        distance: Box<dyn Distance>,
    ) -> Self {
        Self::from_graph(HnswGraph::with_distance(dimension, config, 0, distance))
    }

    /// Makes layer sampling deterministic: two indexes seeded alike and fed
    /// the same inserts build identical graphs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.graph
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .reseed(seed);
        self
    }

    /// Builds an index over `vectors`, labelling each by its position.
    ///
    /// Used by the database to rebuild from stored vectors: label `i` is
    /// the `i`-th vector of the input.
    ///
    /// # Errors
    ///
    /// Fails on the first vector whose length differs from `dimension`.
    #[instrument(skip(vectors, config), fields(count = vectors.len()))]
    pub fn from_vectors(dimension: usize, config: &HnswConfig, vectors: &[Vec<f32>]) -> Result<Self> {
        let mut graph = HnswGraph::new(dimension, config, vectors.len());
        for (label, vector) in vectors.iter().enumerate() {
            graph.insert(vector, label)?;
        }

        debug!(
            nodes = graph.len(),
            top_layer = graph.top_layer(),
            "HNSW index built from vectors"
        );

        Ok(Self::from_graph(graph))
    }

    fn from_graph(graph: HnswGraph) -> Self {
        let dimension = graph.dimension();
        Self {
            graph: Mutex::new(graph),
            dimension,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HnswGraph>> {
        self.graph
            .lock()
            .map_err(|_| VectorDBError::index("Index lock poisoned"))
    }

    /// Inserts `vector` under `label`.
    ///
    /// # Errors
    ///
    /// Returns a `DimensionMismatch` validation error, leaving the index
    /// unchanged, if `vector.len()` differs from the index dimension.
    pub fn insert(&self, vector: &[f32], label: usize) -> Result<()> {
        self.lock()?.insert(vector, label)?;
        Ok(())
    }

    /// Returns up to `k` `(distance, label)` pairs, nearest first.
    ///
    /// Distances are squared Euclidean unless a different strategy was
    /// supplied. An empty index returns an empty list.
    ///
    /// # Errors
    ///
    /// Returns a validation error on a dimension mismatch, or when `k` is 0
    /// and the index is not empty.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(f32, usize)>> {
        self.lock()?.search(query, k)
    }

    /// Number of inserted points. Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.graph.lock().map_or(0, |g| g.len())
    }

    /// Returns true if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector length this index accepts.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Runs `f` with exclusive access to the graph.
    ///
    /// No insert or search can interleave with `f`. Do not call other
    /// methods of this index from inside `f`; the lock is not reentrant.
    pub fn with_graph<R>(&self, f: impl FnOnce(&mut HnswGraph) -> R) -> Result<R> {
        let mut graph = self.lock()?;
        Ok(f(&mut graph))
    }
}

impl VectorIndex for HnswIndex {
    fn insert(&self, vector: &[f32], label: usize) -> Result<()> {
        HnswIndex::insert(self, vector, label)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(f32, usize)>> {
        HnswIndex::search(self, query, k)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        HnswIndex::len(self)
    }
}
