//! Ordered containers for the layer search.
//!
//! The beam search needs two priority queues over `(distance, node)` with
//! opposite orderings. They are separate types so the direction of each is
//! fixed by construction:
//!
//! - [`CandidateQueue`] pops the **nearest** entry (frontier to explore next)
//! - [`ResultSet`] exposes the **farthest** entry and evicts it when the set
//!   grows past its bound (best `ef` found so far)

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

/// A node position paired with its distance to the current query.
///
/// Ordered by distance, then by position, so ties break deterministically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Neighbor {
    distance: OrderedFloat<f32>,
    id: usize,
}

impl Neighbor {
    /// Pairs `id` with `distance`.
    #[inline]
    pub fn new(distance: f32, id: usize) -> Self {
        Self {
            distance: OrderedFloat(distance),
            id,
        }
    }

    /// Distance to the query.
    #[inline]
    pub fn distance(&self) -> f32 {
        self.distance.0
    }

    /// Node position in the arena.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }
}

/// Min-ordered frontier: `pop` returns the nearest unexplored entry.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    heap: BinaryHeap<Reverse<Neighbor>>,
}

impl CandidateQueue {
    /// Creates an empty frontier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry to explore.
    #[inline]
    pub fn push(&mut self, neighbor: Neighbor) {
        self.heap.push(Reverse(neighbor));
    }

    /// Removes and returns the nearest entry.
    #[inline]
    pub fn pop(&mut self) -> Option<Neighbor> {
        self.heap.pop().map(|Reverse(n)| n)
    }

    /// Number of queued entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Max-ordered result set holding at most `capacity` entries.
///
/// Pushing past capacity evicts the farthest entry, so the set always keeps
/// the nearest `capacity` entries seen.
#[derive(Debug)]
pub struct ResultSet {
    heap: BinaryHeap<Neighbor>,
    capacity: usize,
}

impl ResultSet {
    /// Creates an empty set bounded by `capacity` (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            heap: BinaryHeap::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Adds an entry, evicting the farthest while over capacity.
    pub fn push(&mut self, neighbor: Neighbor) {
        self.heap.push(neighbor);
        while self.heap.len() > self.capacity {
            self.heap.pop();
        }
    }

    /// The farthest kept entry.
    #[inline]
    pub fn farthest(&self) -> Option<Neighbor> {
        self.heap.peek().copied()
    }

    /// The nearest kept entry. Linear in the set size.
    pub fn nearest(&self) -> Option<Neighbor> {
        self.heap.iter().min().copied()
    }

    /// Returns true once the set holds `capacity` entries.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Number of kept entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if nothing is kept.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Consumes the set, returning entries nearest-first.
    pub fn into_nearest_first(self) -> Vec<Neighbor> {
        self.heap.into_sorted_vec()
    }

    /// Consumes the set, returning entries farthest-first.
    pub fn into_farthest_first(self) -> Vec<Neighbor> {
        let mut entries = self.heap.into_sorted_vec();
        entries.reverse();
        entries
    }
}
