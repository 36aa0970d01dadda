//! Distance strategies for the HNSW graph.
//!
//! All strategies return a dissimilarity where **lower is closer**. The
//! graph only ever compares distances produced by the same strategy, so a
//! strategy does not need to be a true metric; squared Euclidean (no square
//! root) is the default for that reason.

/// Dissimilarity between two equal-length vectors.
///
/// Supplied once when an index is constructed and used for every distance
/// computation that index performs (search, insertion, and pruning).
pub trait Distance: Send + Sync {
    /// Returns the distance between `a` and `b`. Callers guarantee equal lengths.
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;
}

/// Squared Euclidean distance (L2²). Range: \[0, ∞).
///
/// Callers needing the true Euclidean distance take the square root of
/// the reported value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SquaredEuclidean;

impl Distance for SquaredEuclidean {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        squared_euclidean(a, b)
    }
}

/// Computes `Σ (a[i] - b[i])²`.
#[inline]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
