//! Louvain community detection.
//!
//! Partitions the similarity graph by greedy modularity maximisation:
//!
//! 1. **Local moving**: visit nodes in a seeded shuffled order, move each to
//!    the neighbouring community with the best modularity gain.
//! 2. **Aggregation**: collapse communities into super-nodes and repeat.
//! 3. Stop when a level moves nothing.
//!
//! Modularity with resolution γ:
//!
//! Q = Σ_c [ in_c / 2m − γ (tot_c / 2m)² ]
//!
//! Contract:
//! - deterministic for a given seed, resolution and edge weights,
//! - self-loops ignored, duplicate edges between a pair add their weights,
//!   non-positive weights ignored,
//! - isolated nodes end up as singleton communities,
//! - labels are renumbered densely in node order (callers must still treat
//!   them as opaque).
//!
//! Tie-break: a node stays in its community when no move is strictly better;
//! among equally good moves the lowest community index wins.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::model::{CommunityId, Graph, NodeId};
use crate::{Error, Result};

const GAIN_EPS: f64 = 1e-12;

/// Louvain configuration.
#[derive(Debug, Clone)]
pub struct CommunityDetector {
    /// Resolution parameter (higher = more communities).
    pub resolution: f64,
    /// Maximum local-moving passes per level.
    pub max_iter: usize,
    /// Seed for the visiting order.
    pub seed: u64,
}

impl Default for CommunityDetector {
    fn default() -> Self {
        Self { resolution: 1.0, max_iter: 100, seed: 42 }
    }
}

/// Output of a detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityResult {
    /// Input graph with `community` set on every node.
    pub graph: Graph,
    /// Number of distinct communities.
    pub cluster_count: usize,
    pub communities: BTreeMap<NodeId, CommunityId>,
}

/// Detect communities with the default seed and iteration cap.
pub fn detect_communities(graph: &Graph, resolution: f64) -> Result<CommunityResult> {
    CommunityDetector { resolution, ..Default::default() }.detect(graph)
}

/// Modularity of the partition currently written on `graph`'s nodes.
/// Nodes without a community count as singletons.
pub fn modularity(graph: &Graph, resolution: f64) -> f64 {
    let Ok(index) = index_nodes(graph) else {
        return 0.0;
    };
    let level = Level::from_graph(graph, &index);
    let mut next_singleton = graph.nodes.iter().filter_map(|n| n.community).max().map_or(0, |c| c as usize + 1);
    let assignment: Vec<usize> = graph
        .nodes
        .iter()
        .map(|n| match n.community {
            Some(c) => c as usize,
            None => {
                next_singleton += 1;
                next_singleton - 1
            }
        })
        .collect();
    level.modularity(&assignment, resolution)
}

impl CommunityDetector {
    pub fn new(resolution: f64) -> Self {
        Self { resolution, ..Default::default() }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Run Louvain and annotate a copy of `graph`.
    pub fn detect(&self, graph: &Graph) -> Result<CommunityResult> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::InputShape(format!("resolution must be > 0, got {}", self.resolution)));
        }
        let index = index_nodes(graph)?;
        let n = graph.nodes.len();

        let mut level = Level::from_graph(graph, &index);
        let m2: f64 = level.degree.iter().sum();

        // Each original node's current super-node.
        let mut membership: Vec<usize> = (0..n).collect();

        if m2 > 0.0 {
            let mut rng = StdRng::seed_from_u64(self.seed);
            loop {
                let (assignment, moved) = level.local_moving(self.resolution, m2, self.max_iter, &mut rng);
                let (dense, count) = renumber(&assignment);
                for m in membership.iter_mut() {
                    *m = dense[*m];
                }
                if !moved || count == level.n() {
                    break;
                }
                level = level.aggregate(&dense, count);
            }
        }

        // Final labels in order of first appearance over the input nodes.
        let (labels, cluster_count) = renumber(&membership);

        let mut out = graph.clone();
        let mut communities = BTreeMap::new();
        for (node, &label) in out.nodes.iter_mut().zip(&labels) {
            let c = label as CommunityId;
            node.community = Some(c);
            communities.insert(node.id.clone(), c);
        }

        tracing::debug!(
            node_count = n,
            clusters = cluster_count,
            resolution = self.resolution,
            "communities detected"
        );

        Ok(CommunityResult { graph: out, cluster_count, communities })
    }
}

// ============================================================================
// Level graph
// ============================================================================

/// Symmetric weighted adjacency at one aggregation level.
struct Level {
    /// Neighbour lists sorted by neighbour index, no self entries.
    adj: Vec<Vec<(usize, f64)>>,
    /// Weighted degree, including weight internal to a collapsed super-node.
    degree: Vec<f64>,
}

impl Level {
    fn n(&self) -> usize {
        self.degree.len()
    }

    fn from_graph(graph: &Graph, index: &HashMap<&NodeId, usize>) -> Self {
        let n = graph.nodes.len();
        let mut pair_weight: HashMap<(usize, usize), f64> = HashMap::new();
        for e in &graph.edges {
            let (Some(&a), Some(&b)) = (index.get(&e.source), index.get(&e.target)) else {
                tracing::debug!(source = %e.source, target = %e.target, "edge references unknown node, ignored");
                continue;
            };
            if a == b || !e.weight.is_finite() || e.weight <= 0.0 {
                continue;
            }
            *pair_weight.entry((a.min(b), a.max(b))).or_default() += e.weight;
        }

        let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for (&(a, b), &w) in &pair_weight {
            adj[a].push((b, w));
            adj[b].push((a, w));
        }
        for list in adj.iter_mut() {
            list.sort_by_key(|&(j, _)| j);
        }
        let degree = adj.iter().map(|l| l.iter().map(|&(_, w)| w).sum()).collect();
        Self { adj, degree }
    }

    /// Returns the community of each node and whether anything moved.
    fn local_moving(&self, resolution: f64, m2: f64, max_iter: usize, rng: &mut StdRng) -> (Vec<usize>, bool) {
        let n = self.n();
        let mut comm: Vec<usize> = (0..n).collect();
        let mut tot: Vec<f64> = self.degree.clone();
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let mut neigh: HashMap<usize, f64> = HashMap::new();
        let mut ranked: Vec<(usize, f64)> = Vec::new();
        let mut any_moved = false;

        for _pass in 0..max_iter {
            let mut moved = false;
            for &i in &order {
                let ci = comm[i];
                let ki = self.degree[i];

                neigh.clear();
                for &(j, w) in &self.adj[i] {
                    *neigh.entry(comm[j]).or_default() += w;
                }
                ranked.clear();
                ranked.extend(neigh.iter().map(|(&c, &w)| (c, w)));
                ranked.sort_by_key(|&(c, _)| c);

                tot[ci] -= ki;
                let own = neigh.get(&ci).copied().unwrap_or(0.0);
                let mut best = ci;
                let mut best_gain = own - resolution * tot[ci] * ki / m2;
                for &(c, w) in &ranked {
                    if c == ci {
                        continue;
                    }
                    let gain = w - resolution * tot[c] * ki / m2;
                    if gain > best_gain + GAIN_EPS {
                        best = c;
                        best_gain = gain;
                    }
                }
                tot[best] += ki;

                if best != ci {
                    comm[i] = best;
                    moved = true;
                }
            }
            if !moved {
                break;
            }
            any_moved = true;
        }
        (comm, any_moved)
    }

    /// Collapse each community into one super-node.
    fn aggregate(&self, dense: &[usize], count: usize) -> Self {
        let mut degree = vec![0.0; count];
        let mut between: Vec<HashMap<usize, f64>> = vec![HashMap::new(); count];
        for i in 0..self.n() {
            let ci = dense[i];
            degree[ci] += self.degree[i];
            for &(j, w) in &self.adj[i] {
                let cj = dense[j];
                if ci != cj {
                    *between[ci].entry(cj).or_default() += w;
                }
            }
        }
        let adj = between
            .into_iter()
            .map(|m| {
                let mut list: Vec<(usize, f64)> = m.into_iter().collect();
                list.sort_by_key(|&(j, _)| j);
                list
            })
            .collect();
        Self { adj, degree }
    }

    fn modularity(&self, assignment: &[usize], resolution: f64) -> f64 {
        let m2: f64 = self.degree.iter().sum();
        if m2 == 0.0 {
            return 0.0;
        }
        let mut internal: HashMap<usize, f64> = HashMap::new();
        let mut tot: HashMap<usize, f64> = HashMap::new();
        for i in 0..self.n() {
            let c = assignment[i];
            *tot.entry(c).or_default() += self.degree[i];
            for &(j, w) in &self.adj[i] {
                if assignment[j] == c {
                    *internal.entry(c).or_default() += w;
                }
            }
        }
        tot.iter()
            .map(|(c, &t)| internal.get(c).copied().unwrap_or(0.0) / m2 - resolution * (t / m2).powi(2))
            .sum()
    }
}

fn index_nodes(graph: &Graph) -> Result<HashMap<&NodeId, usize>> {
    let mut index = HashMap::with_capacity(graph.nodes.len());
    for (i, node) in graph.nodes.iter().enumerate() {
        if index.insert(&node.id, i).is_some() {
            return Err(Error::InputShape(format!("duplicate node id '{}'", node.id)));
        }
    }
    Ok(index)
}

/// Relabel to 0..count in order of first appearance.
fn renumber(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    let dense = labels
        .iter()
        .map(|&c| {
            let next = mapping.len();
            *mapping.entry(c).or_insert(next)
        })
        .collect();
    (dense, mapping.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SimEdge, SimNode};

    fn graph(n: usize, edges: &[(usize, usize, f64)]) -> Graph {
        Graph::new(
            (0..n).map(|i| SimNode::new(i, format!("t{i}"))).collect(),
            edges.iter().map(|&(a, b, w)| SimEdge::new(a, b, w)).collect(),
        )
    }

    fn two_cliques() -> Graph {
        let mut edges = vec![];
        for (a, b) in [(0, 1), (0, 2), (1, 2)] {
            edges.push((a, b, 0.9));
        }
        for a in 3..7 {
            for b in (a + 1)..7 {
                edges.push((a, b, 0.8));
            }
        }
        graph(7, &edges)
    }

    #[test]
    fn test_two_disjoint_cliques() {
        let result = detect_communities(&two_cliques(), 1.0).unwrap();
        assert_eq!(result.cluster_count, 2);
        let c = &result.communities;
        assert_eq!(c[&NodeId::from(0)], c[&NodeId::from(1)]);
        assert_eq!(c[&NodeId::from(1)], c[&NodeId::from(2)]);
        assert_eq!(c[&NodeId::from(3)], c[&NodeId::from(6)]);
        assert_ne!(c[&NodeId::from(0)], c[&NodeId::from(3)]);
    }

    #[test]
    fn test_empty_graph() {
        let result = detect_communities(&Graph::default(), 1.0).unwrap();
        assert_eq!(result.cluster_count, 0);
        assert!(result.graph.nodes.is_empty());
    }

    #[test]
    fn test_single_node() {
        let result = detect_communities(&graph(1, &[]), 1.0).unwrap();
        assert_eq!(result.cluster_count, 1);
        assert_eq!(result.graph.nodes[0].community, Some(0));
    }

    #[test]
    fn test_isolated_nodes_are_singletons() {
        let result = detect_communities(&graph(4, &[(0, 1, 0.9)]), 1.0).unwrap();
        assert_eq!(result.cluster_count, 3);
    }

    #[test]
    fn test_self_loops_ignored() {
        let result = detect_communities(&graph(2, &[(0, 0, 1.0), (1, 1, 1.0)]), 1.0).unwrap();
        assert_eq!(result.cluster_count, 2);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let g = two_cliques();
        let a = CommunityDetector::new(1.0).with_seed(7).detect(&g).unwrap();
        let b = CommunityDetector::new(1.0).with_seed(7).detect(&g).unwrap();
        assert_eq!(a.communities, b.communities);
    }

    #[test]
    fn test_duplicate_edges_are_additive() {
        let mut dup = graph(3, &[(0, 1, 0.5), (0, 1, 0.5), (1, 2, 1.0)]);
        let single = graph(3, &[(0, 1, 1.0), (1, 2, 1.0)]);
        for (i, node) in dup.nodes.iter_mut().enumerate() {
            node.community = Some(if i < 2 { 0 } else { 1 });
        }
        let mut single = single;
        for (i, node) in single.nodes.iter_mut().enumerate() {
            node.community = Some(if i < 2 { 0 } else { 1 });
        }
        assert!((modularity(&dup, 1.0) - modularity(&single, 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_detection_improves_modularity_over_singletons() {
        let g = two_cliques();
        let singletons = modularity(&g, 1.0);
        let detected = detect_communities(&g, 1.0).unwrap();
        assert!(modularity(&detected.graph, 1.0) > singletons);
    }

    #[test]
    fn test_invalid_resolution() {
        assert!(matches!(detect_communities(&two_cliques(), 0.0), Err(Error::InputShape(_))));
    }

    #[test]
    fn test_duplicate_node_ids_rejected() {
        let g = Graph::new(vec![SimNode::new("a", ""), SimNode::new("a", "")], vec![]);
        assert!(matches!(detect_communities(&g, 1.0), Err(Error::InputShape(_))));
    }
}
