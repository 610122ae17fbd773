//! Relation layer: typed nodes and directed, typed, weighted causal edges.
//!
//! The closed sets (`NodeType`, `EdgeType`) carry their display strings,
//! polarity and color hints as `match` tables so that adding a variant is a
//! compile error everywhere a table is missing an arm.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use super::{CommunityId, NodeId, Vector};
use crate::Error;

// ============================================================================
// NodeType
// ============================================================================

/// Causal classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeType {
    Problem,
    Insight,
    Mechanism,
    Outcome,
    Actor,
    Resource,
    #[default]
    Note,
}

impl NodeType {
    pub const ALL: [NodeType; 7] = [
        NodeType::Problem,
        NodeType::Insight,
        NodeType::Mechanism,
        NodeType::Outcome,
        NodeType::Actor,
        NodeType::Resource,
        NodeType::Note,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Problem => "Problem",
            NodeType::Insight => "Insight",
            NodeType::Mechanism => "Mechanism",
            NodeType::Outcome => "Outcome",
            NodeType::Actor => "Actor",
            NodeType::Resource => "Resource",
            NodeType::Note => "Note",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InputShape(format!("unknown node type '{s}'")))
    }
}

// ============================================================================
// EdgeType + Polarity
// ============================================================================

/// Sign of a relation as seen by the equilibrium simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Conflicting,
    Neutral,
    Supportive,
}

impl Polarity {
    /// -1, 0 or +1.
    pub fn sign(&self) -> f64 {
        match self {
            Polarity::Conflicting => -1.0,
            Polarity::Neutral => 0.0,
            Polarity::Supportive => 1.0,
        }
    }
}

/// Type of a causal edge. `Solves` is the schema-panel variant; the rest are
/// the editor's relation palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Causes,
    Explains,
    DependsOn,
    Contradicts,
    LeadsTo,
    RelatesTo,
    Solves,
}

impl EdgeType {
    pub const ALL: [EdgeType; 7] = [
        EdgeType::Causes,
        EdgeType::Explains,
        EdgeType::DependsOn,
        EdgeType::Contradicts,
        EdgeType::LeadsTo,
        EdgeType::RelatesTo,
        EdgeType::Solves,
    ];

    /// Wire name (`depends_on`, `leads_to`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Causes => "causes",
            EdgeType::Explains => "explains",
            EdgeType::DependsOn => "depends_on",
            EdgeType::Contradicts => "contradicts",
            EdgeType::LeadsTo => "leads_to",
            EdgeType::RelatesTo => "relates_to",
            EdgeType::Solves => "solves",
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            EdgeType::Causes => "Causes",
            EdgeType::Explains => "Explains",
            EdgeType::DependsOn => "Depends On",
            EdgeType::Contradicts => "Contradicts",
            EdgeType::LeadsTo => "Leads To",
            EdgeType::RelatesTo => "Relates To",
            EdgeType::Solves => "Solves",
        }
    }

    pub fn polarity(&self) -> Polarity {
        match self {
            EdgeType::Causes | EdgeType::Explains | EdgeType::LeadsTo => Polarity::Supportive,
            EdgeType::DependsOn | EdgeType::RelatesTo | EdgeType::Solves => Polarity::Neutral,
            EdgeType::Contradicts => Polarity::Conflicting,
        }
    }

    /// UI color hint.
    pub fn color(&self) -> &'static str {
        match self {
            EdgeType::Causes => "#f87171",
            EdgeType::Explains => "#34d399",
            EdgeType::DependsOn => "#60a5fa",
            EdgeType::Contradicts => "#facc15",
            EdgeType::LeadsTo => "#a78bfa",
            EdgeType::RelatesTo => "#94a3b8",
            EdgeType::Solves => "#fb923c",
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InputShape(format!("unknown edge type '{s}'")))
    }
}

// ============================================================================
// View mode
// ============================================================================

/// Which layer the UI renders; persisted in the project bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    Resonance,
    Structure,
    Hybrid,
}

// ============================================================================
// RelationNode / RelationEdge
// ============================================================================

/// Opaque relation-edge identifier (`e_000001`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        EdgeId(s.to_string())
    }
}

/// Mutable superset of a `SimNode`, keyed by the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationNode {
    pub id: NodeId,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
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

impl RelationNode {
    pub fn new(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: NodeType::Note,
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

    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = node_type;
        self
    }

    pub fn position(&self) -> Option<super::Position> {
        Some(super::Position::new(self.x?, self.y?))
    }

    /// First sentence fragment, at most 80 chars; used for schema summaries.
    pub fn title(&self) -> String {
        let first = self
            .text
            .split_inclusive(['.', '!', '?'])
            .next()
            .unwrap_or("")
            .trim();
        first.chars().take(80).collect()
    }
}

/// A directed, user-asserted causal edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationEdge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub weight: f64,
    #[serde(default)]
    pub notes: String,
}

impl RelationEdge {
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.from == id || &self.to == id
    }

    /// The "other" end of the edge from the given node.
    pub fn other_node(&self, from: &NodeId) -> Option<&NodeId> {
        if from == &self.from { Some(&self.to) }
        else if from == &self.to { Some(&self.from) }
        else { None }
    }
}
