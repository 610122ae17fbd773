//! End-to-end tests for the similarity → community → label → display chain.
//!
//! Each test exercises the public API only, the way a UI collaborator would.

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use resonator::community::modularity;
use resonator::labels::{label_from_cluster_docs, FALLBACK_LABEL};
use resonator::vector::cosine;
use resonator::{
    analyze, build_similarity_graph, detect_communities, label_communities, reduce_for_display, ClusterLabeler,
    CorpusStats, DisplayOptions, Error, Graph, NodeId, ResonatorConfig, SimEdge, SimNode, SimilarityGraphBuilder,
};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// 1. Three-sentence scenario: one edge, two communities
// ============================================================================

#[test]
fn test_three_sentence_scenario() {
    let texts = strings(&["cats purr loudly", "kittens purr loudly", "stock markets fell"]);
    let embeddings = vec![vec![1.0, 0.0, 0.0], vec![0.99, 0.141, 0.0], vec![0.0, 0.0, 1.0]];

    let graph = build_similarity_graph(&texts, &embeddings, 2, 0.5).unwrap();
    assert_eq!(graph.edge_count(), 1);
    let edge = &graph.edges[0];
    let mut pair = [edge.source.as_str(), edge.target.as_str()];
    pair.sort();
    assert_eq!(pair, ["0", "1"]);

    let result = detect_communities(&graph, 1.0).unwrap();
    assert_eq!(result.cluster_count, 2);
    let c = result.graph.community_map();
    assert_eq!(c[&NodeId::from("0")], c[&NodeId::from("1")]);
    assert_ne!(c[&NodeId::from("0")], c[&NodeId::from("2")]);
}

// ============================================================================
// 2. Builder invariants
// ============================================================================

#[test]
fn test_builder_rejects_bad_shapes() {
    let texts = strings(&["a", "b"]);
    assert!(matches!(
        build_similarity_graph(&texts, &[vec![1.0]], 3, 0.5),
        Err(Error::InputShape(_))
    ));
    assert!(matches!(build_similarity_graph(&[], &[], 3, 0.5), Err(Error::InputShape(_))));
    assert!(matches!(
        build_similarity_graph(&texts, &[vec![1.0], vec![]], 3, 0.5),
        Err(Error::InputShape(_))
    ));
    // a negative threshold would admit negative-weight edges
    assert!(matches!(
        build_similarity_graph(&texts, &[vec![1.0, 0.0], vec![-1.0, 1.0]], 3, -0.9),
        Err(Error::InputShape(_))
    ));
}

#[test]
fn test_builder_ceiling_is_recoverable() {
    let texts: Vec<String> = (0..5).map(|i| i.to_string()).collect();
    let embeddings = vec![vec![1.0, 0.0]; 5];
    let err = SimilarityGraphBuilder::new(3, 0.5).with_max_nodes(Some(4)).build(&texts, &embeddings).unwrap_err();
    match err {
        Error::ResourceCeilingExceeded { requested, ceiling } => {
            assert_eq!((requested, ceiling), (5, 4));
        }
        other => panic!("unexpected error: {other}"),
    }
    // retrying at the suggested size succeeds
    assert!(SimilarityGraphBuilder::new(3, 0.5).with_max_nodes(Some(4)).build(&texts[..4], &embeddings[..4]).is_ok());
}

fn corpus_strategy() -> impl Strategy<Value = Vec<Vec<f32>>> {
    (2usize..12).prop_flat_map(|n| prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 4), n))
}

proptest! {
    #[test]
    fn prop_builder_respects_threshold_and_k(
        embeddings in corpus_strategy(),
        k in 1usize..5,
        threshold in 0.0f64..0.9,
    ) {
        let texts: Vec<String> = (0..embeddings.len()).map(|i| i.to_string()).collect();
        let graph = build_similarity_graph(&texts, &embeddings, k, threshold).unwrap();

        let mut pairs = std::collections::HashSet::new();
        for e in &graph.edges {
            prop_assert!(e.weight >= threshold);
            prop_assert!(e.source != e.target);
            let (a, b) = e.unordered_key();
            prop_assert!(pairs.insert((a.clone(), b.clone())), "duplicate unordered pair");
        }
        // an edge is stored under its first selecting side
        for node in &graph.nodes {
            let as_source = graph.edges.iter().filter(|e| e.source == node.id).count();
            prop_assert!(as_source <= k);
        }
    }

    #[test]
    fn prop_cosine_bounds(v in prop::collection::vec(-10.0f32..10.0, 1..16)) {
        let neg: Vec<f32> = v.iter().map(|x| -x).collect();
        if v.iter().any(|x| *x != 0.0) {
            prop_assert!((cosine(&v, &v) - 1.0).abs() < 1e-6);
            prop_assert!((cosine(&v, &neg) + 1.0).abs() < 1e-6);
        } else {
            prop_assert_eq!(cosine(&v, &v), 0.0);
        }
    }
}

// ============================================================================
// 3. Communities
// ============================================================================

fn clique_graph(sizes: &[usize]) -> Graph {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut offset = 0;
    for &size in sizes {
        for i in offset..offset + size {
            nodes.push(SimNode::new(i, format!("node {i}")));
            for j in i + 1..offset + size {
                edges.push(SimEdge::new(i, j, 1.0));
            }
        }
        offset += size;
    }
    Graph::new(nodes, edges)
}

#[test]
fn test_two_disjoint_cliques_give_two_communities() {
    let graph = clique_graph(&[3, 4]);
    let result = detect_communities(&graph, 1.0).unwrap();
    assert_eq!(result.cluster_count, 2);
    let c = result.graph.community_map();
    let first: std::collections::HashSet<_> = (0usize..3).map(|i| c[&NodeId::from(i)]).collect();
    let second: std::collections::HashSet<_> = (3usize..7).map(|i| c[&NodeId::from(i)]).collect();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert!(first.is_disjoint(&second));
    assert!(modularity(&result.graph, 1.0) > 0.4);
}

#[test]
fn test_detection_is_deterministic() {
    let graph = clique_graph(&[3, 3, 5]);
    let a = detect_communities(&graph, 1.0).unwrap();
    let b = detect_communities(&graph, 1.0).unwrap();
    assert_eq!(a.communities, b.communities);
}

#[test]
fn test_detection_empty_graph() {
    let result = detect_communities(&Graph::default(), 1.0).unwrap();
    assert_eq!(result.cluster_count, 0);
    assert!(result.graph.nodes.is_empty());
}

// ============================================================================
// 4. Labels
// ============================================================================

#[test]
fn test_dog_label() {
    let docs = ["the dog ran", "the dog barked"];
    let mut all: Vec<String> = docs.iter().map(|s| s.to_string()).collect();
    all.extend(
        ["quarterly revenue grew", "interest rates rose", "the weather was mild", "a new phone launched"]
            .iter()
            .map(|s| s.to_string()),
    );
    let corpus = CorpusStats::build(&all);
    let label = label_from_cluster_docs(&docs, &corpus, 3, 48);
    assert!(label.contains("dog"), "label was {label:?}");
}

#[test]
fn test_label_never_empty() {
    let corpus = CorpusStats::build(&["the a an", "of to in"]);
    assert_eq!(label_from_cluster_docs(&["the a", "of"], &corpus, 3, 48), FALLBACK_LABEL);
    assert_eq!(label_from_cluster_docs::<&str>(&[], &corpus, 3, 48), FALLBACK_LABEL);
}

#[test]
fn test_labels_for_detected_graph() {
    let texts = strings(&[
        "the dog ran fast",
        "the dog barked loudly",
        "a dog chased the ball",
        "interest rates rose again",
        "central bank interest rates",
    ]);
    let embeddings = vec![
        vec![1.0, 0.0],
        vec![0.98, 0.1],
        vec![0.97, 0.12],
        vec![0.0, 1.0],
        vec![0.1, 0.99],
    ];
    let analysis = analyze(&texts, &embeddings, &ResonatorConfig::default()).unwrap();
    assert_eq!(analysis.cluster_count, 2);

    let labels = label_communities(&analysis.graph, &analysis.graph.texts_by_id());
    assert_eq!(labels.len(), 2);
    assert!(labels.values().any(|l| l.contains("dog")));
    assert!(labels.values().any(|l| l.contains("interest") || l.contains("rates")));
    assert_eq!(labels, analysis.labels);

    // a labeler built once can be reused
    let labeler = ClusterLabeler::new(&texts);
    assert_eq!(labeler.label_graph(&analysis.graph, &analysis.graph.texts_by_id()), labels);
}

// ============================================================================
// 5. Display reduction
// ============================================================================

fn twenty_edge_graph() -> Graph {
    let nodes: Vec<SimNode> = (0..8).map(|i| SimNode::new(i, "")).collect();
    let mut edges = Vec::new();
    'outer: for i in 0..8 {
        for j in i + 1..8 {
            if edges.len() == 20 {
                break 'outer;
            }
            edges.push(SimEdge::new(i, j, ((i * 7 + j * 3) % 11) as f64 / 10.0));
        }
    }
    Graph::new(nodes, edges)
}

#[test]
fn test_reduce_keeps_top_five() {
    let graph = twenty_edge_graph();
    assert_eq!(graph.edge_count(), 20);
    let reduced = reduce_for_display(&graph, &DisplayOptions::new(5));
    assert_eq!(reduced.edge_count(), 5);
    assert_eq!(reduced.node_count(), 8);

    let min_kept = reduced.edges.iter().map(|e| e.weight).fold(f64::INFINITY, f64::min);
    let dropped: Vec<&SimEdge> = graph.edges.iter().filter(|e| !reduced.edges.contains(e)).collect();
    assert_eq!(dropped.len(), 15);
    assert!(dropped.iter().all(|e| e.weight <= min_kept));
}

#[test]
fn test_reduce_community_filter() {
    let detected = detect_communities(&clique_graph(&[3, 4]), 1.0).unwrap();
    let c = detected.graph.community_map()[&NodeId::from("0")];
    let reduced = reduce_for_display(&detected.graph, &DisplayOptions::new(1000).community(c));
    assert_eq!(reduced.node_count(), 3);
    assert_eq!(reduced.edge_count(), 3);
    assert!(reduced.nodes.iter().all(|n| n.community == Some(c)));
}
