//! End-to-end scenarios from the specification's testable-properties
//! section: small exact-answer graphs, a removal, a higher-dimensional
//! random set, a clustered extend-candidates case, cosine ranking, and
//! durable-backing persistence across a reopen.

use hnsw_core::params::IndexParameters;
use hnsw_core::{Distance, HnswEngine, NodeId};

fn ids(results: &[hnsw_core::SearchResult]) -> Vec<NodeId> {
    results.iter().map(|r| r.id).collect()
}

#[test]
fn scenario_1_euclidean_small_graph() {
    let engine = HnswEngine::in_memory(2, IndexParameters::auto(16)).unwrap();
    let a = NodeId(1);
    let b = NodeId(2);
    let c = NodeId(3);
    let d = NodeId(4);
    let e = NodeId(5);
    engine.add(a, vec![1.0, 1.0], &()).unwrap();
    engine.add(b, vec![2.0, 2.0], &()).unwrap();
    engine.add(c, vec![3.0, 3.0], &()).unwrap();
    engine.add(d, vec![10.0, 10.0], &()).unwrap();
    engine.add(e, vec![11.0, 11.0], &()).unwrap();

    let results = engine.top_k(&[1.5, 1.5], 3, None, &()).unwrap();
    assert_eq!(ids(&results), vec![a, b, c]);
    assert!((results[0].distance - 0.5_f32.sqrt()).abs() < 1e-4);
    assert!((results[1].distance - 0.5_f32.sqrt()).abs() < 1e-4);
    assert!((results[2].distance - 4.5_f32.sqrt()).abs() < 1e-4);
}

#[test]
fn scenario_2_remove_then_search() {
    let engine = HnswEngine::in_memory(2, IndexParameters::auto(16)).unwrap();
    let a = NodeId(1);
    let b = NodeId(2);
    let c = NodeId(3);
    let d = NodeId(4);
    let e = NodeId(5);
    for (id, v) in [
        (a, vec![1.0, 1.0]),
        (b, vec![2.0, 2.0]),
        (c, vec![3.0, 3.0]),
        (d, vec![10.0, 10.0]),
        (e, vec![11.0, 11.0]),
    ] {
        engine.add(id, v, &()).unwrap();
    }

    engine.remove(b, &()).unwrap();

    let results = engine.top_k(&[2.0, 2.0], 3, None, &()).unwrap();
    let found = ids(&results);
    assert!(!found.contains(&b));
    assert_eq!(found.len(), 3);
    assert!(found.contains(&a));
    assert!(found.contains(&c));
    assert!(found.contains(&d));
}

#[test]
fn scenario_3_high_dimensional_distinct_results() {
    let engine = HnswEngine::in_memory(100, IndexParameters::auto(16)).unwrap();
    for i in 1..=10u128 {
        let vector: Vec<f32> = (0..100)
            .map(|j| (((i * 31 + j as u128 * 17) % 97) as f32) / 10.0)
            .collect();
        engine.add(NodeId(i), vector, &()).unwrap();
    }

    let query: Vec<f32> = (0..100).map(|j| ((j * 13 % 53) as f32) / 10.0).collect();
    let results = engine.top_k(&query, 5, None, &()).unwrap();
    assert_eq!(results.len(), 5);

    let mut seen = std::collections::HashSet::new();
    for w in results.windows(2) {
        assert!(w[0].distance <= w[1].distance);
    }
    for r in &results {
        assert!(seen.insert(r.id));
    }
}

#[test]
fn scenario_4_clustered_extend_candidates() {
    let mut params = IndexParameters::auto(16);
    params.extend_candidates = true;
    params.seed = 42;
    let engine = HnswEngine::in_memory(2, params).unwrap();

    let centers = [(0.0_f32, 0.0_f32), (10.0, 10.0), (-10.0, 5.0)];
    let mut next_id = 1u128;
    for &(cx, cy) in &centers {
        for i in 0..20u128 {
            let dx = ((i % 5) as f32 - 2.0) * 0.5;
            let dy = ((i % 7) as f32 - 3.0) * 0.4;
            engine.add(NodeId(next_id), vec![cx + dx, cy + dy], &()).unwrap();
            next_id += 1;
        }
    }

    let results = engine.top_k(&[10.0, 10.0], 5, Some(400), &()).unwrap();
    let within = results
        .iter()
        .filter(|r| (r.vector[0] - 10.0).abs() <= 2.0 && (r.vector[1] - 10.0).abs() <= 2.0)
        .count();
    assert!(within >= 4, "expected at least 4 of 5 results near (10,10), got {within}");
}

#[test]
fn scenario_5_cosine_ranking() {
    let mut params = IndexParameters::auto(8);
    params.distance = Distance::Cosine;
    let engine = HnswEngine::in_memory(2, params).unwrap();

    let a = NodeId(1);
    let b = NodeId(2);
    let c = NodeId(3);
    let d = NodeId(4);
    engine.add(a, vec![1.0, 0.0], &()).unwrap();
    engine.add(b, vec![0.0, 1.0], &()).unwrap();
    engine.add(c, vec![0.707, 0.707], &()).unwrap();
    engine.add(d, vec![-1.0, 0.0], &()).unwrap();

    let results = engine.top_k(&[1.0, 0.0], 2, None, &()).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, a);
    assert!(results[0].distance.abs() < 1e-4);
    assert_eq!(results[1].id, c);
    assert!((results[1].distance - (1.0 - 0.707)).abs() < 1e-2);
}

#[test]
fn scenario_6_durable_persistence_after_reopen() {
    let path = tempfile::NamedTempFile::new().unwrap().into_temp_path();
    let params = IndexParameters::auto(16);

    {
        let engine = HnswEngine::open_durable(&path, 2, params).unwrap();
        engine.add(NodeId(1), vec![0.0, 0.0], &()).unwrap();
        engine.add(NodeId(2), vec![1.0, 1.0], &()).unwrap();
        engine.add(NodeId(3), vec![5.0, 5.0], &()).unwrap();
        engine.flush().unwrap();
    }

    let engine = HnswEngine::open_durable(&path, 2, params).unwrap();
    let results = engine.top_k(&[0.5, 0.5], 3, None, &()).unwrap();
    assert_eq!(results.len(), 3);
    let found = ids(&results);
    assert!(found.contains(&NodeId(1)));
    assert!(found.contains(&NodeId(2)));
    assert!(found.contains(&NodeId(3)));
    assert!((results[0].distance - (0.5_f32 * 0.5 * 2.0).sqrt()).abs() < 1e-6);
}

#[test]
fn boundary_empty_index_returns_empty() {
    let engine = HnswEngine::in_memory(3, IndexParameters::auto(8)).unwrap();
    let results = engine.top_k(&[1.0, 2.0, 3.0], 5, None, &()).unwrap();
    assert!(results.is_empty());
}

#[test]
fn boundary_single_node() {
    let engine = HnswEngine::in_memory(2, IndexParameters::auto(8)).unwrap();
    engine.add(NodeId(7), vec![1.0, 1.0], &()).unwrap();
    let results = engine.top_k(&[0.0, 0.0], 5, None, &()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, NodeId(7));
}

#[test]
fn boundary_duplicate_vectors_are_all_zero_distance() {
    let engine = HnswEngine::in_memory(2, IndexParameters::auto(8)).unwrap();
    engine.add(NodeId(1), vec![3.0, 4.0], &()).unwrap();
    engine.add(NodeId(2), vec![3.0, 4.0], &()).unwrap();
    engine.add(NodeId(3), vec![3.0, 4.0], &()).unwrap();
    let results = engine.top_k(&[3.0, 4.0], 3, None, &()).unwrap();
    assert_eq!(results.len(), 3);
    for r in &results {
        assert!(r.distance.abs() < 1e-5);
    }
}

#[test]
fn validation_rejects_mismatched_dimension() {
    let engine = HnswEngine::in_memory(3, IndexParameters::auto(8)).unwrap();
    assert!(engine.add(NodeId(1), vec![1.0, 2.0], &()).is_err());
    assert_eq!(engine.len(), 0);
}

#[test]
fn validation_rejects_non_finite_components() {
    let engine = HnswEngine::in_memory(2, IndexParameters::auto(8)).unwrap();
    assert!(engine.add(NodeId(1), vec![f32::NAN, 1.0], &()).is_err());
    assert!(engine.add(NodeId(1), vec![f32::INFINITY, 1.0], &()).is_err());
}

#[test]
fn validation_rejects_zero_node_id() {
    let engine = HnswEngine::in_memory(2, IndexParameters::auto(8)).unwrap();
    assert!(engine.add(NodeId::ZERO, vec![1.0, 1.0], &()).is_err());
}

#[test]
fn validation_rejects_bad_construction_params() {
    assert!(HnswEngine::in_memory(2, {
        let mut p = IndexParameters::auto(8);
        p.m = 0;
        p
    })
    .is_err());
    assert!(HnswEngine::in_memory(0, IndexParameters::auto(8)).is_err());
    assert!(HnswEngine::in_memory(5000, IndexParameters::auto(8)).is_err());
}

#[test]
fn validation_rejects_empty_batch() {
    let engine = HnswEngine::in_memory(2, IndexParameters::auto(8)).unwrap();
    assert!(engine.add_batch(Vec::new(), &()).is_err());
}

#[test]
fn cancellation_before_large_add_leaves_prior_state_consistent() {
    let engine = HnswEngine::in_memory(2, IndexParameters::auto(8)).unwrap();
    engine.add(NodeId(1), vec![0.0, 0.0], &()).unwrap();

    let flag = std::sync::atomic::AtomicBool::new(true);
    let err = engine.add(NodeId(2), vec![1.0, 1.0], &flag).unwrap_err();
    assert_eq!(err.kind(), hnsw_core::ErrorKind::Cancelled);

    let results = engine.top_k(&[0.0, 0.0], 5, None, &()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, NodeId(1));
}

/// Regression test: every neighbor edge must be mutual (spec.md's
/// "n.id ∈ m.neighbors[ℓ]" invariant). A tiny degree cap forces frequent
/// degree-repair shrinks, including cases where the repair evicts the
/// edge to the node that was just inserted — the reverse edge back to
/// that new node must be dropped too, not just the forward one.
#[test]
fn degree_repair_keeps_all_edges_mutual() {
    let mut params = IndexParameters::auto(2);
    params.m_max = 2;
    params.m_max0 = 2;
    params.seed = 7;
    let engine = HnswEngine::in_memory(2, params).unwrap();

    for i in 1..=60u128 {
        let x = (i % 7) as f32;
        let y = (i % 5) as f32;
        engine.add(NodeId(i), vec![x, y], &()).unwrap();
    }

    let state = engine.export_state().unwrap();
    let by_id: std::collections::HashMap<NodeId, &hnsw_core::ExportNode> =
        state.nodes.iter().map(|n| (n.id, n)).collect();

    for node in &state.nodes {
        for (layer_key, ids) in &node.neighbors {
            for neighbor_id in ids {
                let neighbor = by_id.get(neighbor_id).expect("neighbor must exist");
                let reverse_has_us = neighbor
                    .neighbors
                    .get(layer_key)
                    .is_some_and(|back| back.contains(&node.id));
                assert!(
                    reverse_has_us,
                    "edge {} -> {} at layer {layer_key} is not mutual",
                    node.id, neighbor_id
                );
            }
        }
    }
}
