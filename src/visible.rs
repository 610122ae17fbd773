//! Render reduction: community filter plus an edge budget.
//!
//! Lossy: when the budget is exceeded only the
//! strongest edges survive. Nodes are never dropped for budget reasons.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::model::{CommunityId, Graph, NodeId, SimEdge};

/// Options for `reduce_for_display`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayOptions {
    /// Keep only this community when set.
    #[serde(default)]
    pub community_id: Option<CommunityId>,
    pub max_live_edges: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self { community_id: None, max_live_edges: 1000 }
    }
}

impl DisplayOptions {
    pub fn new(max_live_edges: usize) -> Self {
        Self { community_id: None, max_live_edges }
    }

    pub fn community(mut self, community_id: CommunityId) -> Self {
        self.community_id = Some(community_id);
        self
    }
}

/// Reduce `graph` for rendering. The input is never mutated.
///
/// Edges whose endpoints did not survive the node filter are dropped. When
/// more than `max_live_edges` remain they are ordered by descending weight
/// (stable, so equal weights keep input order) and the tail is cut.
pub fn reduce_for_display(graph: &Graph, opts: &DisplayOptions) -> Graph {
    let nodes: Vec<_> = match opts.community_id {
        Some(c) => graph.nodes.iter().filter(|n| n.community == Some(c)).cloned().collect(),
        None => graph.nodes.clone(),
    };
    let mut edges: Vec<SimEdge> = {
        let allowed: HashSet<&NodeId> = nodes.iter().map(|n| &n.id).collect();
        graph
            .edges
            .iter()
            .filter(|e| allowed.contains(&e.source) && allowed.contains(&e.target))
            .cloned()
            .collect()
    };

    if edges.len() > opts.max_live_edges {
        let dropped = edges.len() - opts.max_live_edges;
        edges.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        edges.truncate(opts.max_live_edges);
        tracing::debug!(kept = edges.len(), dropped, "edge budget applied");
    }

    Graph::new(nodes, edges)
}
