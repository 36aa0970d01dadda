//! Integration tests for the HNSW index behind VectorDB.
//!
//! Tests the full stack: VectorDB → HnswIndex lifecycle, including
//! population via add_vector, update and delete followed by rebuild,
//! persistence across reopen, and the not-yet-built state.

use hnswdb::{Config, VectorDB, VectorDBError, VectorId};
use serde_json::json;
use tempfile::tempdir;

/// Vector dimension for the larger tests.
const DIM: usize = 8;

/// Generates a deterministic vector from a seed.
///
/// Close seeds produce close vectors, so nearest-neighbor ordering is
/// predictable.
fn make_vector(seed: u64) -> Vec<f32> {
    (0..DIM)
        .map(|i| (seed as f32 * 0.1 + i as f32 * 0.01).sin())
        .collect()
}

fn seeded_config() -> Config {
    let mut config = Config::default();
    config.hnsw.seed = Some(42);
    config
}

/// Helper: create a fresh database.
fn create_db(dimension: usize, config: Config) -> (VectorDB, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let db = VectorDB::create(&path, dimension, config).unwrap();
    (db, dir)
}

// ============================================================================
// Search Scenarios
// ============================================================================

#[test]
fn test_two_point_scenario() {
    let (db, _dir) = create_db(2, seeded_config());

    let first = db.add_vector(&[1.0, 1.1], json!({"name": "first"})).unwrap();
    let second = db.add_vector(&[10.0, 10.1], json!({"name": "second"})).unwrap();

    let hits = db.search(&[1.0, 1.0], 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, first);

    let hits = db.search(&[11.0, 11.0], 1).unwrap();
    assert_eq!(hits[0].id, second);

    db.close().unwrap();
}

#[test]
fn test_single_point_large_k() {
    let (db, _dir) = create_db(2, seeded_config());
    let id = db.add_vector(&[5.0, 5.0], json!(null)).unwrap();

    let hits = db.search(&[0.0, 0.0], 5).unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, id);
    assert_eq!(hits[0].distance, 50.0);
    assert!((hits[0].euclidean() - 50.0f32.sqrt()).abs() < 1e-6);

    db.close().unwrap();
}

#[test]
fn test_query_dimension_mismatch() {
    let (db, _dir) = create_db(3, seeded_config());
    db.add_vector(&[0.0, 0.0, 0.0], json!(null)).unwrap();

    let err = db.search(&[1.0, 2.0], 1).unwrap_err();
    assert!(err.is_dimension_mismatch());

    let err = db.add_vector(&[1.0, 2.0], json!(null)).unwrap_err();
    assert!(err.is_dimension_mismatch());
    db.with_index(|index| assert_eq!(index.len(), 1)).unwrap();

    db.close().unwrap();
}

#[test]
fn test_every_vector_finds_itself() {
    let config = Config {
        auto_rebuild: false,
        ..seeded_config()
    };
    let (db, _dir) = create_db(DIM, config);

    let mut ids = Vec::new();
    for i in 0..60u64 {
        ids.push(db.add_vector(&make_vector(i * 7), json!(i)).unwrap());
    }
    db.rebuild_index().unwrap();

    for (i, id) in ids.iter().enumerate() {
        let hits = db.search(&make_vector(i as u64 * 7), 5).unwrap();
        assert_eq!(hits[0].id, *id, "vector {} should be its own nearest", i);
        assert!(hits[0].distance < 1e-6);
        for w in hits.windows(2) {
            assert!(w[0].distance <= w[1].distance);
        }
    }

    db.close().unwrap();
}

// ============================================================================
// Mutations followed by rebuild
// ============================================================================

#[test]
fn test_delete_then_rebuild_removes_id() {
    let config = Config {
        auto_rebuild: false,
        ..seeded_config()
    };
    let (db, _dir) = create_db(2, config);

    let a = db.add_vector(&[0.0, 0.0], json!("a")).unwrap();
    let b = db.add_vector(&[5.0, 5.0], json!("b")).unwrap();
    let c = db.add_vector(&[9.0, 9.0], json!("c")).unwrap();
    db.rebuild_index().unwrap();

    assert!(db.delete_vector(b).unwrap());
    assert!(db.is_index_stale());
    db.rebuild_index().unwrap();

    let hits = db.search(&[5.0, 5.0], 10).unwrap();
    let ids: Vec<VectorId> = hits.iter().map(|h| h.id).collect();
    assert_eq!(hits.len(), 2);
    assert!(!ids.contains(&b));
    assert!(ids.contains(&a) && ids.contains(&c));

    db.close().unwrap();
}

#[test]
fn test_update_then_rebuild_moves_vector() {
    let (db, _dir) = create_db(2, seeded_config());

    let a = db.add_vector(&[0.0, 0.0], json!("a")).unwrap();
    let b = db.add_vector(&[100.0, 100.0], json!("b")).unwrap();
    assert_eq!(db.search(&[99.0, 99.0], 1).unwrap()[0].id, b);

    // auto_rebuild is on: the update is searchable immediately
    assert!(db.update_vector(a, &[99.0, 99.0], json!("a2")).unwrap());

    let hits = db.search(&[99.0, 99.0], 1).unwrap();
    assert_eq!(hits[0].id, a);
    assert_eq!(hits[0].distance, 0.0);
    assert_eq!(db.get_vector(a).unwrap().unwrap().metadata, json!("a2"));

    db.close().unwrap();
}

#[test]
fn test_missing_ids_report_false() {
    let (db, _dir) = create_db(2, seeded_config());

    assert!(!db.delete_vector(VectorId::new(9)).unwrap());
    assert!(!db
        .update_vector(VectorId::new(9), &[1.0, 1.0], json!(null))
        .unwrap());
    assert!(db.get_vector(VectorId::new(9)).unwrap().is_none());
    assert!(!db.is_index_stale());

    db.close().unwrap();
}

#[test]
fn test_rebuild_is_idempotent() {
    let (db, _dir) = create_db(DIM, seeded_config());
    for i in 0..50u64 {
        db.add_vector(&make_vector(i * 3), json!(i)).unwrap();
    }

    let queries: Vec<Vec<f32>> = (0..50u64).map(|i| make_vector(i * 3)).collect();
    let before: Vec<VectorId> = queries
        .iter()
        .map(|p| db.search(p, 10).unwrap()[0].id)
        .collect();

    db.rebuild_index().unwrap();

    let after: Vec<VectorId> = queries
        .iter()
        .map(|p| db.search(p, 10).unwrap()[0].id)
        .collect();
    assert_eq!(before, after);

    db.close().unwrap();
}

// ============================================================================
// Persistence and Index State
// ============================================================================

#[test]
fn test_ids_and_results_persist_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    let db = VectorDB::create(&path, 2, seeded_config()).unwrap();
    let a = db.add_vector(&[1.0, 1.1], json!({"k": 1})).unwrap();
    let b = db.add_vector(&[10.0, 10.1], json!({"k": 2})).unwrap();
    db.close().unwrap();

    let db = VectorDB::open(&path, seeded_config()).unwrap();
    assert!(db.is_index_built());
    assert_eq!(db.search(&[1.0, 1.0], 1).unwrap()[0].id, a);
    assert_eq!(db.search(&[11.0, 11.0], 1).unwrap()[0].id, b);

    let c = db.add_vector(&[50.0, 50.0], json!({"k": 3})).unwrap();
    assert_eq!(c, b.next());
    db.close().unwrap();
}

#[test]
fn test_index_not_built_without_rebuild_on_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    let db = VectorDB::create(&path, 2, seeded_config()).unwrap();
    let id = db.add_vector(&[3.0, 4.0], json!(null)).unwrap();
    db.close().unwrap();

    let config = Config {
        rebuild_on_open: false,
        auto_rebuild: false,
        ..seeded_config()
    };
    let db = VectorDB::open(&path, config).unwrap();

    assert!(!db.is_index_built());
    assert!(db.is_index_stale());
    let err = db.search(&[3.0, 4.0], 1).unwrap_err();
    assert!(matches!(err, VectorDBError::IndexNotBuilt));
    assert_eq!(err.to_string(), "Index is not built. Run 'rebuild' first.");

    // Stored data is still readable
    assert!(db.get_vector(id).unwrap().is_some());

    db.rebuild_index().unwrap();
    assert_eq!(db.search(&[3.0, 4.0], 1).unwrap()[0].id, id);
    db.close().unwrap();
}

#[test]
fn test_degree_caps_through_store() {
    let mut config = seeded_config();
    config.hnsw.m = 4;
    config.hnsw.m_max0 = 8;
    config.auto_rebuild = false;
    let (db, _dir) = create_db(DIM, config);

    for i in 0..120u64 {
        db.add_vector(&make_vector(i), json!(null)).unwrap();
    }
    db.rebuild_index().unwrap();

    db.with_index(|index| {
        index
            .with_graph(|graph| {
                for node in graph.nodes().iter() {
                    assert!(node.neighbors(0).len() <= 8);
                    for layer in 1..node.layer_count() {
                        assert!(node.neighbors(layer).len() <= 4);
                    }
                }
            })
            .unwrap()
    })
    .unwrap();

    db.close().unwrap();
}

#[test]
fn test_concurrent_searches() {
    use std::sync::Arc;
    use std::thread;

    let (db, _dir) = create_db(DIM, seeded_config());
    for i in 0..30u64 {
        db.add_vector(&make_vector(i * 5), json!(i)).unwrap();
    }
    let db = Arc::new(db);

    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                for i in 0..30u64 {
                    let hits = db.search(&make_vector(i * 5), 3).unwrap();
                    assert_eq!(hits.len(), 3, "thread {}", t);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_mutations_keep_index_complete() {
    use std::sync::Arc;
    use std::thread;

    for round in 0..5u64 {
        let (db, _dir) = create_db(DIM, seeded_config());
        for i in 0..100u64 {
            db.add_vector(&make_vector(i), json!(i)).unwrap();
        }
        let db = Arc::new(db);

        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    for i in 0..3u64 {
                        db.add_vector(&make_vector(1000 + t * 10 + i), json!(t)).unwrap();
                    }
                    if t % 2 == 0 {
                        assert!(db.delete_vector(VectorId::new(t + 1)).unwrap());
                    } else {
                        let id = VectorId::new(t + 1);
                        assert!(db.update_vector(id, &make_vector(2000 + t), json!(t)).unwrap());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // Every mutation finished its own rebuild, so the live index must
        // cover every stored vector.
        let stored = db.len().unwrap();
        assert_eq!(stored, 100 + 8 * 3 - 4);
        assert!(!db.is_index_stale(), "round {}", round);
        let indexed = db.with_index(|index| index.len()).unwrap();
        assert_eq!(indexed as u64, stored, "round {}", round);
    }
}
