//! Property tests for graph invariants of the HNSW index.

use std::collections::HashSet;

use hnswdb::{HnswConfig, HnswIndex, MAX_LAYERS};
use proptest::prelude::*;

// Strategy: distinct integer points on a 2D grid
fn arb_distinct_points(max: usize) -> impl Strategy<Value = Vec<[f32; 2]>> {
    prop::collection::hash_set((0i32..64, 0i32..64), 1..=max).prop_map(|set| {
        set.into_iter()
            .map(|(x, y)| [x as f32, y as f32])
            .collect()
    })
}

// Strategy: arbitrary finite vectors of a fixed dimension
fn arb_vectors(dim: usize, max: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(-100.0f32..100.0, dim), 0..max)
}

fn index_with(m: usize, m_max0: usize, ef_construction: usize, seed: u64, dim: usize) -> HnswIndex {
    let config = HnswConfig {
        m,
        m_max0,
        ef_construction,
        seed: Some(seed),
    };
    HnswIndex::new(dim, &config)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// With fewer points than `m` the graph is complete on layer 0, so
    /// every query is exact.
    #[test]
    fn prop_small_sets_are_exact(points in arb_distinct_points(16), seed in any::<u64>(), k in 1usize..24) {
        let index = index_with(16, 32, 200, seed, 2);
        for (label, p) in points.iter().enumerate() {
            index.insert(p, label).unwrap();
        }

        for (label, p) in points.iter().enumerate() {
            let nearest = index.search(p, 1).unwrap();
            prop_assert_eq!(nearest.len(), 1);
            prop_assert_eq!(nearest[0].1, label);
            prop_assert_eq!(nearest[0].0, 0.0);

            let hits = index.search(p, k).unwrap();
            prop_assert_eq!(hits.len(), k.min(points.len()));
            let labels: HashSet<usize> = hits.iter().map(|h| h.1).collect();
            prop_assert_eq!(labels.len(), hits.len(), "duplicate labels in results");
        }
    }

    #[test]
    fn prop_results_bounded_and_ordered(
        vectors in arb_vectors(3, 80),
        query in prop::collection::vec(-100.0f32..100.0, 3),
        k in 1usize..20,
        seed in any::<u64>(),
    ) {
        let index = index_with(8, 16, 64, seed, 3);
        for (label, v) in vectors.iter().enumerate() {
            index.insert(v, label).unwrap();
        }

        let hits = index.search(&query, k).unwrap();

        prop_assert!(hits.len() <= k.min(vectors.len()));
        if !vectors.is_empty() {
            prop_assert!(!hits.is_empty());
        }
        for w in hits.windows(2) {
            prop_assert!(w[0].0 <= w[1].0, "not nearest-first: {:?}", hits);
        }
        for (_, label) in &hits {
            prop_assert!(*label < vectors.len());
        }
    }

    #[test]
    fn prop_degree_caps_hold(
        vectors in arb_vectors(2, 120),
        m in 2usize..6,
        extra in 0usize..6,
        seed in any::<u64>(),
    ) {
        let m_max0 = m + extra;
        let index = index_with(m, m_max0, 32, seed, 2);
        for (label, v) in vectors.iter().enumerate() {
            index.insert(v, label).unwrap();
        }

        index.with_graph(|graph| {
            prop_assert!(graph.top_layer() <= MAX_LAYERS);
            if let Some(entry) = graph.entry_point() {
                prop_assert_eq!(graph.node(entry).level(), graph.top_layer());
            }
            for node in graph.nodes().iter() {
                prop_assert!(node.neighbors(0).len() <= m_max0);
                for layer in 1..node.layer_count() {
                    prop_assert!(node.neighbors(layer).len() <= m);
                }
            }
            Ok(())
        }).unwrap()?;
    }

    #[test]
    fn prop_dimension_mismatch_changes_nothing(
        vectors in arb_vectors(4, 30),
        bad_len in (0usize..8).prop_filter("must differ", |n| *n != 4),
    ) {
        let index = index_with(16, 32, 200, 7, 4);
        for (label, v) in vectors.iter().enumerate() {
            index.insert(v, label).unwrap();
        }

        let bad = vec![1.0f32; bad_len];
        prop_assert!(index.insert(&bad, 999).unwrap_err().is_dimension_mismatch());
        prop_assert!(index.search(&bad, 1).unwrap_err().is_dimension_mismatch());
        prop_assert_eq!(index.len(), vectors.len());
    }
}

#[test]
fn test_empty_index_returns_nothing() {
    let index = HnswIndex::new(3, &HnswConfig::default());
    for k in [1, 2, 10, 1000] {
        assert!(index.search(&[0.0, 0.0, 0.0], k).unwrap().is_empty());
    }
}

#[test]
fn test_default_parameters_scenario() {
    // M = 16, M_max0 = 32, ef_construction = 200
    let index = HnswIndex::build(2, 100, 16, 32, 200);
    index.insert(&[1.0, 1.1], 1).unwrap();
    index.insert(&[10.0, 10.1], 2).unwrap();

    assert_eq!(index.search(&[1.0, 1.0], 1).unwrap()[0].1, 1);
    assert_eq!(index.search(&[11.0, 11.0], 1).unwrap()[0].1, 2);
}
