//! # Semantic Graph Model
//!
//! Plain DTOs shared by every layer: builder ↔ detector ↔ labeler ↔ store ↔
//! simulator ↔ export. Everything here serializes to plain JSON records
//! (no cycles, no handles), which is what the project bundle relies on.
//!
//! This module is pure data with no I/O or async.

pub mod node;
pub mod edge;
pub mod graph;
pub mod relation;

pub use node::{NodeId, SimNode, Position};
pub use edge::SimEdge;
pub use graph::Graph;
pub use relation::{
    NodeType, EdgeType, EdgeId, RelationNode, RelationEdge, ViewMode, Polarity,
};

/// An embedding vector. Dimensionality is fixed per run but never enforced
/// here; every consumer tolerates unequal lengths.
pub type Vector = Vec<f32>;

/// Opaque community label assigned by the detector.
///
/// Labels are dense within one detection run but callers must not use them
/// as indices.
pub type CommunityId = u32;
