//! One relaxation tick.
//!
//! For every relation edge `from → to`:
//!
//! ```text
//! t = |cos(v_from, v_to) − w|          tension, in [0, 2], not renormalised
//! k = t · (1 + 0.5 · polarity)         polarity ∈ {−1, 0, +1}
//! u = unit(p_to − p_from)              distance floored at 1e-6
//! F_from += k·u,   F_to −= k·u         (positive k pulls the pair together)
//! ```
//!
//! then every node that received force moves by `step · damping · F` and is
//! clamped to the bounds. Pure: takes a full snapshot, returns a full result.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::model::{NodeId, Position, RelationEdge, RelationNode};
use crate::vector::cosine;
use super::SimParams;

const MIN_DISTANCE: f64 = 1e-6;

/// Result of one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickResult {
    /// New positions of the nodes that received force.
    pub positions: BTreeMap<NodeId, Position>,
    /// Mean tension over edges whose endpoints both carry a vector.
    pub avg_tension: f64,
}

/// `|cosine(a, b) − weight|`, or `None` if either vector is empty.
pub fn tension(a: &[f32], b: &[f32], weight: f64) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    Some((cosine(a, b) - weight).abs())
}

pub fn sim_tick(nodes: &[RelationNode], edges: &[RelationEdge], params: &SimParams) -> TickResult {
    let by_id: HashMap<&NodeId, &RelationNode> = nodes.iter().map(|n| (&n.id, n)).collect();

    let mut force: HashMap<&NodeId, (f64, f64)> = HashMap::new();
    let mut total = 0.0;
    let mut counted = 0usize;

    for e in edges {
        let (Some(a), Some(b)) = (by_id.get(&e.from), by_id.get(&e.to)) else {
            continue;
        };
        let Some(t) = tension(&a.vector, &b.vector, e.weight) else {
            continue;
        };
        total += t;
        counted += 1;

        let (Some(pa), Some(pb)) = (a.position(), b.position()) else {
            continue;
        };
        let (dx, dy) = (pb.x - pa.x, pb.y - pa.y);
        let dist = dx.hypot(dy).max(MIN_DISTANCE);
        let (ux, uy) = (dx / dist, dy / dist);
        let k = t * (1.0 + 0.5 * e.edge_type.polarity().sign());

        let f = force.entry(&a.id).or_default();
        f.0 += k * ux;
        f.1 += k * uy;
        let f = force.entry(&b.id).or_default();
        f.0 -= k * ux;
        f.1 -= k * uy;
    }

    let scale = params.step * params.damping;
    let positions = force
        .into_iter()
        .filter_map(|(id, (fx, fy))| {
            let p = by_id.get(id)?.position()?;
            let moved = Position::new(p.x + scale * fx, p.y + scale * fy);
            // non-finite step or damping: hold the node in place
            let moved = if moved.x.is_finite() && moved.y.is_finite() { moved } else { p };
            Some((id.clone(), params.bounds.clamp(moved)))
        })
        .collect();

    TickResult {
        positions,
        avg_tension: if counted > 0 { total / counted as f64 } else { 0.0 },
    }
}
