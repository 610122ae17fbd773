//! Undirected similarity edge.

use serde::{Deserialize, Serialize};
use super::NodeId;

/// An undirected similarity edge produced by the k-NN builder.
///
/// `weight` is the cosine similarity of the endpoints. Never user-editable;
/// the builder guarantees no self-loops and one edge per unordered pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
}

impl SimEdge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, weight: f64) -> Self {
        Self { source: source.into(), target: target.into(), weight }
    }

    /// True if the edge touches `id` at either end.
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }

    /// The "other" end of the edge from the given node.
    pub fn other_node(&self, from: &NodeId) -> Option<&NodeId> {
        if from == &self.source { Some(&self.target) }
        else if from == &self.target { Some(&self.source) }
        else { None }
    }

    /// Endpoints ordered so `(a, b)` and `(b, a)` produce the same key.
    pub fn unordered_key(&self) -> (&NodeId, &NodeId) {
        if self.source <= self.target {
            (&self.source, &self.target)
        } else {
            (&self.target, &self.source)
        }
    }
}
