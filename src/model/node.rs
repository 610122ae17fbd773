//! Node in the similarity graph.

use serde::{Deserialize, Serialize};
use super::{CommunityId, Vector};

/// Stable string key for a node, commonly the stringified chunk index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

impl From<usize> for NodeId {
    fn from(i: usize) -> Self {
        NodeId(i.to_string())
    }
}

impl std::borrow::Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A 2D layout coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A sentence/chunk node produced when a corpus is chunked and embedded.
///
/// `x`/`y` stay `None` until an external projector lays the graph out;
/// `community` stays `None` until the detector runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimNode {
    pub id: NodeId,
    pub text: String,
    #[serde(default)]
    pub vector: Vector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default)]
    pub community: Option<CommunityId>,
}

impl SimNode {
    pub fn new(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            vector: Vector::new(),
            x: None,
            y: None,
            community: None,
        }
    }

    pub fn with_vector(mut self, vector: Vector) -> Self {
        self.vector = vector;
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_community(mut self, community: CommunityId) -> Self {
        self.community = Some(community);
        self
    }

    /// Both coordinates, if the node has been laid out.
    pub fn position(&self) -> Option<Position> {
        Some(Position::new(self.x?, self.y?))
    }
}
