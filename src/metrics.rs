//! Summary numbers for the similarity graph and the causal schema.

use serde::{Deserialize, Serialize};

use crate::model::{Graph, NodeType, RelationEdge, RelationNode};

/// Similarity-graph metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    pub clusters: usize,
    /// Mean edge weight, 0 without edges.
    pub avg_sim: f64,
    /// Resonance coefficient: intra-community edge weight / total edge weight.
    pub resonance: f64,
}

impl GraphMetrics {
    pub fn compute(graph: &Graph, clusters: usize) -> Self {
        let communities = graph.community_map();
        let mut total = 0.0;
        let mut intra = 0.0;
        for e in &graph.edges {
            total += e.weight;
            let same = match (communities.get(&e.source), communities.get(&e.target)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
            if same {
                intra += e.weight;
            }
        }
        let edge_count = graph.edges.len();
        Self {
            node_count: graph.nodes.len(),
            edge_count,
            clusters,
            avg_sim: if edge_count > 0 { total / edge_count as f64 } else { 0.0 },
            resonance: if total > 0.0 { intra / total } else { 0.0 },
        }
    }
}

/// Causal-schema metrics over a node subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaMetrics {
    pub selection_size: usize,
    /// Share of nodes typed as something other than `Note`.
    pub typed_coverage: f64,
    /// Relation edges per node.
    pub edge_density: f64,
}

impl SchemaMetrics {
    pub fn compute<'a>(nodes: impl IntoIterator<Item = &'a RelationNode>, edges: &[RelationEdge]) -> Self {
        let mut n = 0usize;
        let mut typed = 0usize;
        for node in nodes {
            n += 1;
            if node.node_type != NodeType::Note {
                typed += 1;
            }
        }
        if n == 0 {
            return Self::default();
        }
        Self {
            selection_size: n,
            typed_coverage: typed as f64 / n as f64,
            edge_density: edges.len() as f64 / n as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeId, EdgeType, SimEdge, SimNode};

    #[test]
    fn test_resonance_coefficient() {
        let g = Graph::new(
            vec![
                SimNode::new("a", "").with_community(0),
                SimNode::new("b", "").with_community(0),
                SimNode::new("c", "").with_community(1),
            ],
            vec![SimEdge::new("a", "b", 0.75), SimEdge::new("b", "c", 0.25)],
        );
        let m = GraphMetrics::compute(&g, 2);
        assert_eq!(m.node_count, 3);
        assert_eq!(m.edge_count, 2);
        assert!((m.avg_sim - 0.5).abs() < 1e-12);
        assert!((m.resonance - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_empty_graph_metrics() {
        assert_eq!(GraphMetrics::compute(&Graph::default(), 0), GraphMetrics::default());
    }

    #[test]
    fn test_schema_metrics() {
        let nodes = vec![
            RelationNode::new("a", "").with_type(NodeType::Problem),
            RelationNode::new("b", ""),
        ];
        let edges = vec![RelationEdge {
            id: EdgeId::from("e_000001"),
            from: "a".into(),
            to: "b".into(),
            edge_type: EdgeType::Causes,
            weight: 0.5,
            notes: String::new(),
        }];
        let m = SchemaMetrics::compute(&nodes, &edges);
        assert_eq!(m.selection_size, 2);
        assert_eq!(m.typed_coverage, 0.5);
        assert_eq!(m.edge_density, 0.5);
    }
}
