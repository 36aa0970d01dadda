//! The HNSW graph: layer search, insertion, and k-NN query.
//!
//! [`HnswGraph`] is a plain owned value with no interior locking. Mutation
//! goes through `&mut self`, so the borrow checker already guarantees a single
//! writer; [`HnswIndex`](super::HnswIndex) adds the lock that lets the graph
//! be shared between threads.
//!
//! # Layout
//!
//! ```text
//! layer 2   E ─────────────── B                  (sparse, long range)
//! layer 1   E ──── C ──────── B ──── D
//! layer 0   E ─ A ─ C ─ F ─ G ─ B ─ H ─ D ─ I    (every node)
//! ```
//!
//! Every query starts at the entry point `E` on the top layer, walks greedily
//! toward the query on each upper layer, and finishes with a beam search of
//! width `ef` on layer 0.

use std::cell::RefCell;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{HnswConfig, MAX_LAYERS};
use crate::error::{Result, ValidationError};

use super::distance::{Distance, SquaredEuclidean};
use super::heap::{CandidateQueue, Neighbor, ResultSet};
use super::node::{Node, NodeStore};
use super::visited::VisitedSet;

thread_local! {
    /// Visited marks reused by every query issued from this thread.
    static QUERY_VISITED: RefCell<VisitedSet> = RefCell::new(VisitedSet::new(0));
}

/// Multi-layer proximity graph over an append-only node arena.
pub struct HnswGraph {
    nodes: NodeStore,
    entry_point: Option<usize>,
    top_layer: usize,
    dimension: usize,
    config: HnswConfig,
    level_multiplier: f64,
    distance: Box<dyn Distance>,
    rng: StdRng,
}

impl fmt::Debug for HnswGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HnswGraph")
            .field("len", &self.nodes.len())
            .field("dimension", &self.dimension)
            .field("entry_point", &self.entry_point)
            .field("top_layer", &self.top_layer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HnswGraph {
    /// Creates an empty graph using squared Euclidean distance.
    ///
    /// `capacity_hint` only pre-sizes the node arena; no limit is enforced.
    pub fn new(dimension: usize, config: &HnswConfig, capacity_hint: usize) -> Self {
        Self::with_distance(dimension, config, capacity_hint, Box::new(SquaredEuclidean))
    }

    /// Creates an empty graph with a caller-supplied distance strategy.
    pub fn with_distance(
        dimension: usize,
        config: &HnswConfig,
        capacity_hint: usize,
        distance: Box<dyn Distance>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            nodes: NodeStore::with_capacity(capacity_hint),
            entry_point: None,
            top_layer: 0,
            dimension,
            config: config.clone(),
            level_multiplier: config.level_multiplier(),
            distance,
            rng,
        }
    }

    /// Restarts the layer sampler from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.config.seed = Some(seed);
    }

    /// Number of inserted points.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing has been inserted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Vector length every insert and query must match.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Node every descent starts from; `None` while the graph is empty.
    #[inline]
    pub fn entry_point(&self) -> Option<usize> {
        self.entry_point
    }

    /// Highest layer any node has been sampled into.
    #[inline]
    pub fn top_layer(&self) -> usize {
        self.top_layer
    }

    /// Construction parameters.
    #[inline]
    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    /// The node arena, for read-only inspection.
    #[inline]
    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    /// Returns the node at `id`.
    #[inline]
    pub fn node(&self, id: usize) -> &Node {
        self.nodes.get(id)
    }

    /// Degree cap at `layer`: `m_max0` on layer 0, `m` above.
    #[inline]
    pub fn max_degree(&self, layer: usize) -> usize {
        self.config.max_degree(layer)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(ValidationError::dimension_mismatch(self.dimension, vector.len()).into());
        }
        Ok(())
    }

    #[inline]
    fn distance_to(&self, query: &[f32], id: usize) -> f32 {
        self.distance.distance(query, self.nodes.get(id).vector())
    }

    /// Samples a top layer: climb while a uniform draw falls below the
    /// level multiplier, capped at [`MAX_LAYERS`].
    fn random_level(&mut self) -> usize {
        let mut level = 0;
        while level < MAX_LAYERS && self.rng.gen::<f64>() < self.level_multiplier {
            level += 1;
        }
        level
    }

    /// Beam search for the `ef` nodes nearest to `query` within one layer.
    ///
    /// Starts from `entry`, repeatedly expands the nearest unexplored
    /// candidate, and stops once that candidate is farther than the worst
    /// kept result. Nodes without an adjacency list at `layer` are not
    /// expanded. Never mutates the graph.
    pub fn search_layer(&self, query: &[f32], entry: usize, ef: usize, layer: usize) -> ResultSet {
        self.with_query_visited(|visited| {
            self.search_layer_in(query, entry, ef, layer, visited)
        })
    }

    /// Runs `f` with this thread's visited set, sized for the current graph.
    fn with_query_visited<R>(&self, f: impl FnOnce(&mut VisitedSet) -> R) -> R {
        QUERY_VISITED.with(|cell| {
            let mut visited = cell.borrow_mut();
            visited.ensure_capacity(self.nodes.len());
            f(&mut *visited)
        })
    }

    fn search_layer_in(
        &self,
        query: &[f32],
        entry: usize,
        ef: usize,
        layer: usize,
        visited: &mut VisitedSet,
    ) -> ResultSet {
        let start = Neighbor::new(self.distance_to(query, entry), entry);

        visited.clear();
        visited.insert(entry);
        let mut candidates = CandidateQueue::new();
        let mut results = ResultSet::new(ef);
        candidates.push(start);
        results.push(start);

        while let Some(current) = candidates.pop() {
            if results
                .farthest()
                .is_some_and(|worst| current.distance() > worst.distance())
            {
                break;
            }

            for &neighbor in self.nodes.get(current.id()).neighbors(layer) {
                if !visited.insert(neighbor) {
                    continue;
                }

                let distance = self.distance_to(query, neighbor);
                let improves = results
                    .farthest()
                    .map_or(true, |worst| distance < worst.distance());
                if !results.is_full() || improves {
                    let found = Neighbor::new(distance, neighbor);
                    candidates.push(found);
                    results.push(found);
                }
            }
        }

        results
    }

    /// Greedy single-best descent from `entry` through `layers` (top to bottom).
    fn descend(
        &self,
        query: &[f32],
        mut entry: usize,
        layers: impl Iterator<Item = usize>,
        visited: &mut VisitedSet,
    ) -> usize {
        for layer in layers {
            let nearest = self.search_layer_in(query, entry, 1, layer, visited).nearest();
            if let Some(nearest) = nearest {
                entry = nearest.id();
            }
        }
        entry
    }

    /// Inserts `vector` under `label` and returns its node position.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` before any mutation if the vector length
    /// differs from the graph dimension.
    pub fn insert(&mut self, vector: &[f32], label: usize) -> Result<usize> {
        self.check_dimension(vector)?;

        let level = self.random_level();
        let id = self.nodes.create(vector.to_vec(), label, level);

        let Some(entry) = self.entry_point else {
            self.entry_point = Some(id);
            self.top_layer = level;
            return Ok(id);
        };

        // Only layers that already existed hold other nodes to link to.
        let previous_top = self.top_layer;
        let mut visited = VisitedSet::new(self.nodes.len());
        let entry = self.descend(vector, entry, (level + 1..=previous_top).rev(), &mut visited);

        for layer in (0..=level.min(previous_top)).rev() {
            let cap = self.max_degree(layer);
            let ef = self.config.ef_construction;
            let candidates = self.search_layer_in(vector, entry, ef, layer, &mut visited);

            for neighbor in candidates.into_nearest_first().into_iter().take(self.config.m) {
                let neighbor = neighbor.id();
                self.nodes.add_edge(id, layer, neighbor);
                self.nodes.add_edge(neighbor, layer, id);

                if self.nodes.degree(neighbor, layer) > cap {
                    self.prune(neighbor, layer, cap);
                }
            }
        }

        if level > previous_top {
            self.top_layer = level;
            self.entry_point = Some(id);
        }

        Ok(id)
    }

    /// Shrinks the adjacency of `id` at `layer` to its `cap` nearest neighbors.
    ///
    /// Distances are recomputed from the stored vectors. Back-edges of the
    /// dropped neighbors are left in place.
    fn prune(&mut self, id: usize, layer: usize, cap: usize) {
        let base = self.nodes.get(id).vector();
        let mut scored: Vec<Neighbor> = self
            .nodes
            .get(id)
            .neighbors(layer)
            .iter()
            .map(|&n| Neighbor::new(self.distance.distance(base, self.nodes.get(n).vector()), n))
            .collect();

        scored.sort_unstable();
        scored.truncate(cap);

        let kept = scored.into_iter().map(|n| n.id()).collect();
        self.nodes.set_neighbors(id, layer, kept);
    }

    /// Returns up to `k` `(distance, label)` pairs nearest-first.
    ///
    /// Walks greedily from the top layer to layer 1, then runs a beam search
    /// of width `k` on layer 0. Distances are raw values of the distance
    /// strategy (squared Euclidean by default).
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the query length differs from the graph
    /// dimension, and `InvalidField` if `k` is 0 on a non-empty graph. An
    /// empty graph answers every well-formed query with an empty list.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(f32, usize)>> {
        self.check_dimension(query)?;

        let Some(entry) = self.entry_point else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Err(ValidationError::invalid_field("k", "must be at least 1").into());
        }

        let results = self.with_query_visited(|visited| {
            let entry = self.descend(query, entry, (1..=self.top_layer).rev(), visited);
            self.search_layer_in(query, entry, k, 0, visited)
        });

        Ok(results
            .into_nearest_first()
            .into_iter()
            .map(|n| (n.distance(), self.nodes.get(n.id()).label()))
            .collect())
    }
}
