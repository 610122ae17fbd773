//! # Relation Store
//!
//! The mutable, user-editable layer: typed nodes, directed causal edges,
//! selection, view state and the simulation state machine.
//!
//! ## Soft mutations
//!
//! Every mutation that names a missing node or edge is a no-op that returns
//! `false`/`None` and logs at `debug`. Graph edits may race with node
//! deletion, so a dangling id is expected, not exceptional.
//!
//! ## Ownership
//!
//! Relation edge weights are owned here and never written back to the
//! similarity graph (and vice versa).

pub mod history;
pub mod schema;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::ResonatorConfig;
use crate::heuristics;
use crate::model::{
    EdgeId, EdgeType, Graph, NodeId, NodeType, Position, RelationEdge, RelationNode, Vector, ViewMode,
};
use crate::sim::{self, SimParamsPatch, SimState, TickResult};
use crate::vector::{batch_cosine, cosine};
use crate::{Error, Result};

pub use history::{Edit, History};
pub use schema::IdeaSchema;

/// Weight of a new edge whose endpoints lack vectors.
pub const DEFAULT_EDGE_WEIGHT: f64 = 0.5;
/// Share of the distance to the neighbour centroid covered by one nudge.
pub const NUDGE_FACTOR: f64 = 0.2;
/// Default size of the causal-edge candidate list.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 16;

// ============================================================================
// NodePatch
// ============================================================================

/// Partial node update. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePatch {
    pub text: Option<String>,
    pub vector: Option<Vector>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    #[serde(rename = "type")]
    pub node_type: Option<NodeType>,
}

impl NodePatch {
    /// Every patchable field of `node`.
    pub fn snapshot(node: &RelationNode) -> Self {
        Self {
            text: Some(node.text.clone()),
            vector: Some(node.vector.clone()),
            x: node.x,
            y: node.y,
            node_type: Some(node.node_type),
        }
    }

    fn apply_to(&self, node: &mut RelationNode) {
        if let Some(text) = &self.text {
            node.text = text.clone();
        }
        if let Some(vector) = &self.vector {
            node.vector = vector.clone();
        }
        if let Some(x) = self.x {
            node.x = Some(x);
        }
        if let Some(y) = self.y {
            node.y = Some(y);
        }
        if let Some(t) = self.node_type {
            node.node_type = t;
        }
    }
}

// ============================================================================
// RelationStore
// ============================================================================

/// Owned state container for the relation layer.
#[derive(Debug, Clone, Default)]
pub struct RelationStore {
    nodes: BTreeMap<NodeId, RelationNode>,
    edges: BTreeMap<EdgeId, RelationEdge>,
    next_edge_id: u64,
    view_mode: ViewMode,
    selection: BTreeSet<NodeId>,
    highlight_base: Option<NodeId>,
    ghost_types: BTreeMap<NodeId, NodeType>,
    sim: SimState,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store with simulation and oscillator settings from `config`.
    pub fn from_config(config: &ResonatorConfig) -> Self {
        let mut store = Self::default();
        store.sim.params = config.sim;
        store.sim.oscillator = config.oscillator;
        store
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn node(&self, id: &NodeId) -> Option<&RelationNode> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&RelationEdge> {
        self.edges.get(id)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &RelationNode> {
        self.nodes.values()
    }

    /// Edges in id order (creation order for generated ids).
    pub fn edges(&self) -> impl Iterator<Item = &RelationEdge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges_touching<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a RelationEdge> + 'a {
        self.edges.values().filter(move |e| e.touches(id))
    }

    /// First edge `from → to`, if any.
    pub fn find_edge(&self, from: &NodeId, to: &NodeId) -> Option<&RelationEdge> {
        self.edges.values().find(|e| &e.from == from && &e.to == to)
    }

    // ========================================================================
    // Seeding
    // ========================================================================

    /// Replace every node with one per similarity-graph node and drop all
    /// relation edges. `texts`/`embeddings` are index-aligned with
    /// `graph.nodes`; missing entries fall back to the node's own fields.
    pub fn seed_from_similarity_graph(&mut self, graph: &Graph, texts: &[String], embeddings: &[Vector]) {
        self.nodes = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let text = texts.get(i).filter(|t| !t.is_empty()).unwrap_or(&n.text).clone();
                let vector = embeddings.get(i).unwrap_or(&n.vector).clone();
                let node = RelationNode {
                    id: n.id.clone(),
                    node_type: NodeType::Note,
                    text,
                    vector,
                    x: n.x,
                    y: n.y,
                    community: n.community,
                };
                (node.id.clone(), node)
            })
            .collect();
        self.edges.clear();
        self.selection.retain(|id| self.nodes.contains_key(id));
        self.ghost_types.retain(|id, _| self.nodes.contains_key(id));
        if self.highlight_base.as_ref().is_some_and(|id| !self.nodes.contains_key(id)) {
            self.highlight_base = None;
        }
        tracing::info!(node_count = self.nodes.len(), "relation store seeded");
    }

    /// Insert or replace a node as-is.
    pub fn upsert_node(&mut self, node: RelationNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Insert an edge as-is, keeping its id. Used when restoring a bundle.
    pub fn insert_edge(&mut self, edge: RelationEdge) {
        if let Some(n) = parse_edge_seq(&edge.id) {
            self.next_edge_id = self.next_edge_id.max(n);
        }
        self.edges.insert(edge.id.clone(), edge);
    }

    /// Drop nodes, edges, selection and highlight. View mode and simulation
    /// settings survive.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.selection.clear();
        self.ghost_types.clear();
        self.highlight_base = None;
    }

    // ========================================================================
    // Node mutations
    // ========================================================================

    pub fn set_node_type(&mut self, id: &NodeId, node_type: NodeType) -> bool {
        let Some(node) = self.node_mut(id, "set_node_type") else {
            return false;
        };
        node.node_type = node_type;
        self.ghost_types.remove(id);
        true
    }

    /// Replace text and embedding together. Re-embedding is the caller's job.
    pub fn set_node_text_and_vector(&mut self, id: &NodeId, text: impl Into<String>, vector: Vector) -> bool {
        let Some(node) = self.node_mut(id, "set_node_text_and_vector") else {
            return false;
        };
        node.text = text.into();
        node.vector = vector;
        true
    }

    pub fn apply_node_patch(&mut self, id: &NodeId, patch: &NodePatch) -> bool {
        let Some(node) = self.node_mut(id, "apply_node_patch") else {
            return false;
        };
        patch.apply_to(node);
        true
    }

    /// Snapshot of every patchable field, for undo records.
    pub fn node_patch(&self, id: &NodeId) -> Option<NodePatch> {
        self.nodes.get(id).map(NodePatch::snapshot)
    }

    /// Put a node back to a `node_patch` snapshot. Unlike `apply_node_patch`,
    /// an absent coordinate in the snapshot clears the node's coordinate.
    pub fn restore_node_snapshot(&mut self, id: &NodeId, snapshot: &NodePatch) -> bool {
        let Some(node) = self.node_mut(id, "restore_node_snapshot") else {
            return false;
        };
        snapshot.apply_to(node);
        node.x = snapshot.x;
        node.y = snapshot.y;
        true
    }

    pub fn set_node_position(&mut self, id: &NodeId, position: Position) -> bool {
        let Some(node) = self.node_mut(id, "set_node_position") else {
            return false;
        };
        node.x = Some(position.x);
        node.y = Some(position.y);
        true
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<RelationNode> {
        let node = self.nodes.remove(id)?;
        self.edges.retain(|_, e| !e.touches(id));
        self.selection.remove(id);
        self.ghost_types.remove(id);
        if self.highlight_base.as_ref() == Some(id) {
            self.highlight_base = None;
        }
        Some(node)
    }

    /// Re-derive the weight of every edge touching `id` from the endpoint
    /// vectors. Edges with an empty endpoint vector keep their weight.
    /// Returns the number of edges updated.
    pub fn recompute_adjacent_edge_weights(&mut self, id: &NodeId) -> usize {
        let Some(me) = self.nodes.get(id) else {
            tracing::debug!(node = %id, "recompute_adjacent_edge_weights: unknown node");
            return 0;
        };
        let mut updated = 0;
        for edge in self.edges.values_mut().filter(|e| e.touches(id)) {
            let Some(other) = edge.other_node(id).and_then(|o| self.nodes.get(o)) else {
                continue;
            };
            if me.vector.is_empty() || other.vector.is_empty() {
                continue;
            }
            edge.weight = cosine(&me.vector, &other.vector);
            updated += 1;
        }
        updated
    }

    /// Move the node `NUDGE_FACTOR` of the way toward the mean position of
    /// its laid-out neighbours. Returns the new position, or `None` when the
    /// node or all of its neighbours lack a position.
    pub fn nudge_node_position(&mut self, id: &NodeId) -> Option<Position> {
        let me = self.nodes.get(id)?.position()?;
        let (mut sx, mut sy, mut count) = (0.0, 0.0, 0usize);
        for edge in self.edges.values().filter(|e| e.touches(id)) {
            let Some(p) = edge.other_node(id).and_then(|o| self.nodes.get(o)).and_then(|n| n.position()) else {
                continue;
            };
            sx += p.x;
            sy += p.y;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let (cx, cy) = (sx / count as f64, sy / count as f64);
        let next = Position::new(me.x + (cx - me.x) * NUDGE_FACTOR, me.y + (cy - me.y) * NUDGE_FACTOR);
        self.set_node_position(id, next);
        Some(next)
    }

    // ========================================================================
    // Edge mutations
    // ========================================================================

    /// Create a directed edge with a fresh id. Duplicates of an existing
    /// `from → to` pair are allowed; see `ensure_edge`.
    ///
    /// Initial weight is the endpoint cosine, or `DEFAULT_EDGE_WEIGHT` when a
    /// vector is missing. `None` if either endpoint does not exist.
    pub fn add_edge(&mut self, from: &NodeId, to: &NodeId, edge_type: EdgeType) -> Option<EdgeId> {
        let (Some(a), Some(b)) = (self.nodes.get(from), self.nodes.get(to)) else {
            tracing::debug!(%from, %to, "add_edge: unknown endpoint");
            return None;
        };
        let weight = if a.vector.is_empty() || b.vector.is_empty() {
            DEFAULT_EDGE_WEIGHT
        } else {
            cosine(&a.vector, &b.vector)
        };
        let id = self.fresh_edge_id();
        self.edges.insert(
            id.clone(),
            RelationEdge {
                id: id.clone(),
                from: from.clone(),
                to: to.clone(),
                edge_type,
                weight,
                notes: String::new(),
            },
        );
        Some(id)
    }

    /// Search-then-upsert: update the first `from → to` edge if one exists,
    /// otherwise create it. `weight` overrides the derived weight when set.
    pub fn ensure_edge(
        &mut self,
        from: &NodeId,
        to: &NodeId,
        edge_type: EdgeType,
        weight: Option<f64>,
    ) -> Option<EdgeId> {
        let id = match self.find_edge(from, to) {
            Some(existing) => {
                let id = existing.id.clone();
                self.set_edge_type(&id, edge_type);
                id
            }
            None => self.add_edge(from, to, edge_type)?,
        };
        if let Some(w) = weight {
            self.set_edge_weight(&id, w);
        }
        Some(id)
    }

    pub fn set_edge_type(&mut self, id: &EdgeId, edge_type: EdgeType) -> bool {
        let Some(edge) = self.edge_mut(id, "set_edge_type") else {
            return false;
        };
        edge.edge_type = edge_type;
        true
    }

    /// Set a weight, clamped to `[0, 1]`. Non-finite weights are rejected.
    pub fn set_edge_weight(&mut self, id: &EdgeId, weight: f64) -> bool {
        if !weight.is_finite() {
            tracing::debug!(edge = %id, weight, "set_edge_weight: non-finite weight ignored");
            return false;
        }
        let Some(edge) = self.edge_mut(id, "set_edge_weight") else {
            return false;
        };
        edge.weight = weight.clamp(0.0, 1.0);
        true
    }

    pub fn set_edge_notes(&mut self, id: &EdgeId, notes: impl Into<String>) -> bool {
        let Some(edge) = self.edge_mut(id, "set_edge_notes") else {
            return false;
        };
        edge.notes = notes.into();
        true
    }

    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<RelationEdge> {
        self.edges.remove(id)
    }

    /// Nodes closest to `source` by cosine, best first, optionally filtered
    /// by a case-insensitive substring of their text.
    pub fn edge_candidates(&self, source: &NodeId, query: &str, limit: usize) -> Vec<(NodeId, f64)> {
        let Some(src) = self.nodes.get(source).filter(|n| !n.vector.is_empty()) else {
            return Vec::new();
        };
        let needle = query.trim().to_lowercase();
        let (same_dim, other_dim): (Vec<&RelationNode>, Vec<&RelationNode>) = self
            .nodes
            .values()
            .filter(|n| &n.id != source && !n.vector.is_empty())
            .filter(|n| needle.is_empty() || n.text.to_lowercase().contains(&needle))
            .partition(|n| n.vector.len() == src.vector.len());

        let flat: Vec<f32> = same_dim.iter().flat_map(|n| n.vector.iter().copied()).collect();
        let mut scored: Vec<(NodeId, f64)> = same_dim
            .iter()
            .map(|n| n.id.clone())
            .zip(batch_cosine(&src.vector, &flat))
            .chain(other_dim.iter().map(|n| (n.id.clone(), cosine(&src.vector, &n.vector))))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);
        scored
    }

    // ========================================================================
    // Selection, view, highlight, ghost types
    // ========================================================================

    /// Select a node. `append` toggles membership; otherwise the selection is
    /// replaced. An empty id clears the selection.
    pub fn select_node(&mut self, id: &NodeId, append: bool) {
        if id.as_str().is_empty() {
            self.selection.clear();
            return;
        }
        if !self.nodes.contains_key(id) {
            tracing::debug!(node = %id, "select_node: unknown node");
            return;
        }
        if append {
            if !self.selection.remove(id) {
                self.selection.insert(id.clone());
            }
        } else {
            self.selection.clear();
            self.selection.insert(id.clone());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> &BTreeSet<NodeId> {
        &self.selection
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn highlight_base(&self) -> Option<&NodeId> {
        self.highlight_base.as_ref()
    }

    pub fn set_highlight_base(&mut self, id: Option<NodeId>) {
        self.highlight_base = id.filter(|id| self.nodes.contains_key(id));
    }

    pub fn clear_highlight(&mut self) {
        self.highlight_base = None;
    }

    /// Similarity in `[0, 1]` of every node to the highlight base.
    pub fn highlight_scores(&self) -> BTreeMap<NodeId, f64> {
        let Some(base) = self.highlight_base.as_ref().and_then(|id| self.nodes.get(id)) else {
            return BTreeMap::new();
        };
        self.nodes
            .values()
            .filter(|n| !n.vector.is_empty() && !base.vector.is_empty())
            .map(|n| (n.id.clone(), crate::vector::cos01(&base.vector, &n.vector)))
            .collect()
    }

    pub fn ghost_type(&self, id: &NodeId) -> Option<NodeType> {
        self.ghost_types.get(id).copied()
    }

    /// Record (or with `None`, drop) a suggested type for a node.
    pub fn set_ghost_type(&mut self, id: &NodeId, suggestion: Option<NodeType>) {
        match suggestion {
            Some(t) if self.nodes.contains_key(id) => {
                self.ghost_types.insert(id.clone(), t);
            }
            Some(_) => tracing::debug!(node = %id, "set_ghost_type: unknown node"),
            None => {
                self.ghost_types.remove(id);
            }
        }
    }

    /// Fill the ghost table for every `Note` node from the text heuristics.
    /// Returns the number of suggestions recorded.
    pub fn suggest_ghost_types(&mut self, min_confidence: f64) -> usize {
        let suggestions: Vec<(NodeId, NodeType)> = self
            .nodes
            .values()
            .filter(|n| n.node_type == NodeType::Note)
            .filter_map(|n| {
                let s = heuristics::suggest_node_type(&n.text);
                (s.node_type != NodeType::Note && s.confidence >= min_confidence).then(|| (n.id.clone(), s.node_type))
            })
            .collect();
        let count = suggestions.len();
        self.ghost_types.extend(suggestions);
        count
    }

    /// Promote a ghost suggestion to the node's real type.
    pub fn accept_ghost_type(&mut self, id: &NodeId) -> bool {
        match self.ghost_types.get(id).copied() {
            Some(t) => self.set_node_type(id, t),
            None => false,
        }
    }

    // ========================================================================
    // Schema
    // ========================================================================

    /// Causal schema over the selection, or over every node when nothing is
    /// selected. Only edges with both ends in that set are included.
    pub fn idea_schema(&self) -> IdeaSchema {
        let nodes: Vec<RelationNode> = if self.selection.is_empty() {
            self.nodes.values().cloned().collect()
        } else {
            self.selection.iter().filter_map(|id| self.nodes.get(id)).cloned().collect()
        };
        let allowed: BTreeSet<&NodeId> = nodes.iter().map(|n| &n.id).collect();
        let edges: Vec<RelationEdge> = self
            .edges
            .values()
            .filter(|e| allowed.contains(&e.from) && allowed.contains(&e.to))
            .cloned()
            .collect();
        IdeaSchema::new(nodes, edges)
    }

    // ========================================================================
    // Simulation state
    // ========================================================================

    pub fn sim(&self) -> &SimState {
        &self.sim
    }

    pub fn set_sim_params(&mut self, patch: &SimParamsPatch) {
        patch.apply(&mut self.sim.params, &mut self.sim.oscillator);
    }

    /// Idle → Running. Captures the current positions for snapback, resets
    /// the tick counter and returns the new run generation.
    pub fn start_sim(&mut self, patch: Option<&SimParamsPatch>) -> Result<u64> {
        if self.sim.running {
            return Err(Error::Simulation("simulation already running".into()));
        }
        if let Some(p) = patch {
            self.set_sim_params(p);
        }
        self.sim.pre_sim_positions = Some(self.positions());
        self.sim.running = true;
        self.sim.tick = 0;
        self.sim.avg_tension = 0.0;
        self.sim.run += 1;
        tracing::info!(run = self.sim.run, max_ticks = self.sim.params.max_ticks, "simulation started");
        Ok(self.sim.run)
    }

    /// Running → Idle. Returns whether a run was active.
    pub fn stop_sim(&mut self) -> bool {
        let was_running = std::mem::replace(&mut self.sim.running, false);
        if was_running {
            tracing::info!(run = self.sim.run, tick = self.sim.tick, avg_tension = self.sim.avg_tension, "simulation stopped");
        }
        was_running
    }

    /// Apply a tick computed for generation `run`. Discarded (returns
    /// `false`) if the simulation is idle or has been restarted since.
    pub fn apply_sim_tick(&mut self, run: u64, result: &TickResult) -> bool {
        if !self.sim.running || run != self.sim.run {
            tracing::trace!(run, current = self.sim.run, running = self.sim.running, "stale tick discarded");
            return false;
        }
        for (id, p) in &result.positions {
            if let Some(node) = self.nodes.get_mut(id) {
                node.x = Some(p.x);
                node.y = Some(p.y);
            }
        }
        self.sim.tick += 1;
        self.sim.avg_tension = result.avg_tension;
        true
    }

    /// Restore the positions captured at the last start. Idle only.
    pub fn snapback(&mut self) -> bool {
        if self.sim.running {
            tracing::debug!("snapback ignored while running");
            return false;
        }
        let Some(pre) = self.sim.pre_sim_positions.clone() else {
            return false;
        };
        for (id, p) in pre {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.x = Some(p.x);
                node.y = Some(p.y);
            }
        }
        true
    }

    /// Owned copy of what a tick needs, for off-thread computation.
    pub fn sim_snapshot(&self) -> (Vec<RelationNode>, Vec<RelationEdge>) {
        (self.nodes.values().cloned().collect(), self.edges.values().cloned().collect())
    }

    /// Pulse Hz per node when the oscillator is on.
    pub fn pulse_map(&self) -> Option<BTreeMap<NodeId, f64>> {
        if !self.sim.oscillator.on {
            return None;
        }
        let (nodes, edges) = self.sim_snapshot();
        Some(sim::oscillator_map(&nodes, &edges, self.sim.oscillator.sensitivity))
    }

    /// Current positions of every laid-out node.
    pub fn positions(&self) -> BTreeMap<NodeId, Position> {
        self.nodes.values().filter_map(|n| Some((n.id.clone(), n.position()?))).collect()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn node_mut(&mut self, id: &NodeId, op: &'static str) -> Option<&mut RelationNode> {
        let node = self.nodes.get_mut(id);
        if node.is_none() {
            tracing::debug!(node = %id, op, "unknown node, mutation skipped");
        }
        node
    }

    fn edge_mut(&mut self, id: &EdgeId, op: &'static str) -> Option<&mut RelationEdge> {
        let edge = self.edges.get_mut(id);
        if edge.is_none() {
            tracing::debug!(edge = %id, op, "unknown edge, mutation skipped");
        }
        edge
    }

    fn fresh_edge_id(&mut self) -> EdgeId {
        loop {
            self.next_edge_id += 1;
            let id = EdgeId(format!("e_{:06}", self.next_edge_id));
            if !self.edges.contains_key(&id) {
                return id;
            }
        }
    }
}

fn parse_edge_seq(id: &EdgeId) -> Option<u64> {
    id.0.strip_prefix("e_")?.parse().ok()
}
