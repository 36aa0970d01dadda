//! Append-only node arena for the HNSW graph.
//!
//! A node's identity is its position in the arena. Positions are assigned
//! once, in insertion order, and never reused; adjacency lists store these
//! positions instead of references, so the arena can grow without
//! invalidating anything.

/// A point in the graph.
#[derive(Clone, Debug)]
pub struct Node {
    /// Owned copy of the inserted vector.
    vector: Vec<f32>,

    /// Opaque label supplied by the caller and returned by search.
    label: usize,

    /// Highest layer this node was sampled into.
    level: usize,

    /// `friends[layer]` holds neighbor positions at that layer.
    friends: Vec<Vec<usize>>,
}

impl Node {
    /// Returns the node's vector.
    #[inline]
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// Returns the caller-supplied label.
    #[inline]
    pub fn label(&self) -> usize {
        self.label
    }

    /// Returns the highest layer the node lives on.
    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Number of layers with an adjacency list.
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.friends.len()
    }

    /// Neighbors at `layer`; empty if the node has no list for that layer.
    #[inline]
    pub fn neighbors(&self, layer: usize) -> &[usize] {
        self.friends.get(layer).map_or(&[], Vec::as_slice)
    }
}

/// Arena of graph nodes.
#[derive(Clone, Debug, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
}

impl NodeStore {
    /// Creates an empty store with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Appends a node living on layers `0..=level` and returns its position.
    pub fn create(&mut self, vector: Vec<f32>, label: usize, level: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            vector,
            label,
            level,
            friends: vec![Vec::new(); level + 1],
        });
        id
    }

    /// Returns the node at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was never returned by [`create`](Self::create).
    #[inline]
    pub fn get(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    /// Appends a directed edge `id -> neighbor` at `layer`.
    ///
    /// Grows the node's per-layer lists if it had none for `layer`.
    pub fn add_edge(&mut self, id: usize, layer: usize, neighbor: usize) {
        let friends = &mut self.nodes[id].friends;
        if friends.len() <= layer {
            friends.resize_with(layer + 1, Vec::new);
        }
        friends[layer].push(neighbor);
    }

    /// Replaces the adjacency list of `id` at `layer`.
    pub fn set_neighbors(&mut self, id: usize, layer: usize, neighbors: Vec<usize>) {
        let friends = &mut self.nodes[id].friends;
        if friends.len() <= layer {
            friends.resize_with(layer + 1, Vec::new);
        }
        friends[layer] = neighbors;
    }

    /// Number of edges leaving `id` at `layer`.
    #[inline]
    pub fn degree(&self, id: usize, layer: usize) -> usize {
        self.nodes[id].neighbors(layer).len()
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node has been created.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates nodes in position order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}
