//! Graph: the node/edge pair every pure stage takes and returns.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use super::{CommunityId, NodeId, SimEdge, SimNode};

/// A similarity graph: nodes plus undirected weighted edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<SimNode>,
    pub edges: Vec<SimEdge>,
}

impl Graph {
    pub fn new(nodes: Vec<SimNode>, edges: Vec<SimEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&SimNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// node id → community, for nodes that have one.
    pub fn community_map(&self) -> HashMap<&NodeId, CommunityId> {
        self.nodes
            .iter()
            .filter_map(|n| n.community.map(|c| (&n.id, c)))
            .collect()
    }

    /// Distinct community labels, ascending.
    pub fn communities(&self) -> Vec<CommunityId> {
        let mut ids: Vec<CommunityId> = self.nodes.iter().filter_map(|n| n.community).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Map of node id → text, the shape the labeler consumes.
    pub fn texts_by_id(&self) -> HashMap<NodeId, String> {
        self.nodes.iter().map(|n| (n.id.clone(), n.text.clone())).collect()
    }
}
