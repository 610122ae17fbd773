//! End-to-end tests for the causal layer: seeding, edits, undo/redo,
//! suggestions, schema export and project bundles.

use pretty_assertions::assert_eq;

use resonator::bundle::ProjectBundle;
use resonator::heuristics::suggest_edge_type;
use resonator::inspect::{embedding_relevance, summarize_community};
use resonator::store::NodePatch;
use resonator::{analyze, EdgeType, History, NodeId, NodeType, RelationStore, ResonatorConfig, ViewMode};

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn seeded() -> (RelationStore, resonator::Analysis) {
    let texts: Vec<String> = [
        "Builds are slow and hard to debug",
        "We use a remote cache for build artifacts",
        "This will reduce CI time",
        "Quarterly hiring plan",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let embeddings = vec![
        vec![1.0, 0.2, 0.0],
        vec![0.9, 0.4, 0.0],
        vec![0.8, 0.5, 0.1],
        vec![0.0, 0.0, 1.0],
    ];
    let analysis = analyze(&texts, &embeddings, &ResonatorConfig::default()).unwrap();
    let mut store = RelationStore::new();
    store.seed_from_similarity_graph(&analysis.graph, &texts, &embeddings);
    (store, analysis)
}

// ============================================================================
// 1. Seeding and edge primitives
// ============================================================================

#[test]
fn test_seed_creates_untyped_nodes_without_edges() {
    let (store, analysis) = seeded();
    assert_eq!(store.node_count(), analysis.graph.node_count());
    assert_eq!(store.edge_count(), 0);
    assert!(store.nodes().all(|n| n.node_type == NodeType::Note));
    assert_eq!(store.node(&id("1")).unwrap().text, "We use a remote cache for build artifacts");
}

#[test]
fn test_set_edge_weight_touches_only_that_edge() {
    let (mut store, _) = seeded();
    let e1 = store.add_edge(&id("0"), &id("1"), EdgeType::Causes).unwrap();
    let e2 = store.add_edge(&id("1"), &id("2"), EdgeType::LeadsTo).unwrap();
    let e3 = store.add_edge(&id("0"), &id("3"), EdgeType::Contradicts).unwrap();
    let before: Vec<(String, f64)> = store.edges().map(|e| (e.id.0.clone(), e.weight)).collect();

    assert!(store.set_edge_weight(&e2, 0.9));

    for (edge_id, weight) in before {
        let now = store.edges().find(|e| e.id.0 == edge_id).unwrap().weight;
        if edge_id == e2.0 {
            assert_eq!(now, 0.9);
        } else {
            assert_eq!(now, weight);
        }
    }
    assert!(store.edge(&e1).is_some() && store.edge(&e3).is_some());
}

#[test]
fn test_missing_references_are_soft_noops() {
    let (mut store, _) = seeded();
    assert!(store.add_edge(&id("0"), &id("ghost"), EdgeType::Causes).is_none());
    assert!(!store.set_node_type(&id("ghost"), NodeType::Problem));
    assert!(!store.set_node_position(&id("ghost"), resonator::Position::new(1.0, 1.0)));
    assert_eq!(store.edge_count(), 0);
}

#[test]
fn test_duplicate_edges_allowed_and_ensure_edge_dedups() {
    let (mut store, _) = seeded();
    store.add_edge(&id("0"), &id("1"), EdgeType::Causes);
    store.add_edge(&id("0"), &id("1"), EdgeType::Causes);
    assert_eq!(store.edge_count(), 2);

    let (mut fresh, _) = seeded();
    let a = fresh.ensure_edge(&id("0"), &id("1"), EdgeType::Causes, None).unwrap();
    let b = fresh.ensure_edge(&id("0"), &id("1"), EdgeType::Explains, Some(0.3)).unwrap();
    assert_eq!(a, b);
    assert_eq!(fresh.edge_count(), 1);
    let edge = fresh.edge(&a).unwrap();
    assert_eq!(edge.edge_type, EdgeType::Explains);
    assert_eq!(edge.weight, 0.3);
}

#[test]
fn test_remove_node_detaches_edges_and_selection() {
    let (mut store, _) = seeded();
    store.add_edge(&id("0"), &id("1"), EdgeType::Causes);
    store.add_edge(&id("2"), &id("1"), EdgeType::Causes);
    store.add_edge(&id("2"), &id("3"), EdgeType::Causes);
    store.select_node(&id("1"), false);

    assert!(store.remove_node(&id("1")).is_some());
    assert_eq!(store.edge_count(), 1);
    assert!(store.selection().is_empty());
}

#[test]
fn test_edge_candidates_rank_by_similarity() {
    let (store, _) = seeded();
    let candidates = store.edge_candidates(&id("0"), "", 16);
    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[0].0, id("1"));
    assert_eq!(candidates.last().unwrap().0, id("3"));

    let filtered = store.edge_candidates(&id("0"), "HIRING", 16);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].0, id("3"));
}

// ============================================================================
// 2. Text edits, undo/redo
// ============================================================================

#[test]
fn test_text_edit_recompute_and_undo() {
    let (mut store, _) = seeded();
    let e = store.add_edge(&id("0"), &id("3"), EdgeType::Causes).unwrap();
    let before = store.edge(&e).unwrap().weight;

    let mut history = History::new();
    let node = id("3");
    history.record(&mut store, &node, |s| {
        s.set_node_text_and_vector(&node, "Slow builds hurt hiring", vec![1.0, 0.2, 0.0]);
        s.recompute_adjacent_edge_weights(&node)
    });
    let after = store.edge(&e).unwrap().weight;
    assert!(after > before);

    assert_eq!(history.undo(&mut store), Some(node.clone()));
    assert_eq!(store.node(&node).unwrap().text, "Quarterly hiring plan");
    assert_eq!(store.node(&node).unwrap().vector, vec![0.0, 0.0, 1.0]);
    assert!(history.can_redo());
    history.redo(&mut store);
    assert_eq!(store.node(&node).unwrap().text, "Slow builds hurt hiring");
}

#[test]
fn test_node_patch_applies_partial_fields() {
    let (mut store, _) = seeded();
    let patch = NodePatch { node_type: Some(NodeType::Outcome), x: Some(12.0), ..Default::default() };
    assert!(store.apply_node_patch(&id("2"), &patch));
    let n = store.node(&id("2")).unwrap();
    assert_eq!(n.node_type, NodeType::Outcome);
    assert_eq!(n.x, Some(12.0));
    assert_eq!(n.text, "This will reduce CI time");
}

// ============================================================================
// 3. Suggestions and schema
// ============================================================================

#[test]
fn test_ghost_types_then_schema() {
    let (mut store, _) = seeded();
    let suggested = store.suggest_ghost_types(0.5);
    assert!(suggested >= 3);
    assert_eq!(store.ghost_type(&id("0")), Some(NodeType::Problem));
    assert_eq!(store.ghost_type(&id("1")), Some(NodeType::Mechanism));
    assert_eq!(store.ghost_type(&id("2")), Some(NodeType::Outcome));
    // suggestions never set the type directly
    assert_eq!(store.node(&id("0")).unwrap().node_type, NodeType::Note);

    for n in ["0", "1", "2"] {
        assert!(store.accept_ghost_type(&id(n)));
    }
    let (p, m) = (store.node(&id("0")).unwrap().clone(), store.node(&id("1")).unwrap().clone());
    let ty = suggest_edge_type(&p, &m);
    assert_eq!(ty, EdgeType::Solves);
    store.add_edge(&id("0"), &id("1"), ty);
    store.add_edge(&id("1"), &id("2"), EdgeType::LeadsTo);

    let schema = store.idea_schema();
    assert_eq!(schema.summary.problems.len(), 1);
    assert_eq!(schema.summary.mechanisms.len(), 1);
    assert_eq!(schema.summary.outcomes.len(), 1);
    assert_eq!(schema.edges.len(), 2);
    let md = schema.to_markdown();
    assert!(md.contains("Builds are slow"));
}

#[test]
fn test_view_mode_and_highlight() {
    let (mut store, _) = seeded();
    assert_eq!(store.view_mode(), ViewMode::Resonance);
    store.set_view_mode(ViewMode::Structure);
    assert_eq!(store.view_mode(), ViewMode::Structure);

    store.set_highlight_base(Some(id("0")));
    let scores = store.highlight_scores();
    assert_eq!(scores.len(), 4);
    assert!(scores[&id("1")] > scores[&id("3")]);
    store.clear_highlight();
    assert!(store.highlight_scores().is_empty());
}

// ============================================================================
// 4. Inspection
// ============================================================================

#[test]
fn test_inspection_over_seeded_store() {
    let (store, analysis) = seeded();
    let c = analysis.graph.node(&id("0")).unwrap().community.unwrap();
    let summary = summarize_community(c, &analysis.graph, &store);
    assert_eq!(summary.size, 3);
    assert!(summary.keywords.iter().any(|k| k.starts_with("build")));

    let rel = embedding_relevance(&analysis.graph, &store);
    assert_eq!(rel.r_cluster.len(), 4);
    assert!(rel.r_cluster[&id("3")] > 0.99);
}

// ============================================================================
// 5. Bundle
// ============================================================================

#[test]
fn test_bundle_restores_everything() {
    let (mut store, _) = seeded();
    store.set_node_type(&id("0"), NodeType::Problem);
    let e = store.add_edge(&id("0"), &id("1"), EdgeType::Causes).unwrap();
    store.set_edge_notes(&e, "observed in CI logs");
    store.set_view_mode(ViewMode::Hybrid);

    let json = ProjectBundle::from_store("ci", &store).to_json_string().unwrap();
    let mut restored = RelationStore::new();
    ProjectBundle::from_json_str(&json).unwrap().restore_into(&mut restored);

    assert_eq!(restored.sim_snapshot(), store.sim_snapshot());
    assert_eq!(restored.view_mode(), ViewMode::Hybrid);
    assert_eq!(restored.edge(&e).unwrap().notes, "observed in CI logs");
}
