//! Instability pulse. Render-only; never feeds back into positions.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::model::{NodeId, RelationEdge, RelationNode};
use super::equilibrium::tension;

/// Population standard deviation of the tensions on `id`'s incident edges.
/// 0 with fewer than two measurable edges.
pub fn node_instability(id: &NodeId, nodes: &[RelationNode], edges: &[RelationEdge]) -> f64 {
    let by_id: HashMap<&NodeId, &RelationNode> = nodes.iter().map(|n| (&n.id, n)).collect();
    let tensions: SmallVec<[f64; 8]> = edges
        .iter()
        .filter(|e| e.touches(id))
        .filter_map(|e| edge_tension(&by_id, e))
        .collect();
    std_dev(&tensions)
}

/// Pulse frequency in Hz, in `[0.5, 2.0]`.
pub fn pulse_hz(instability: f64, sensitivity: f64) -> f64 {
    let scaled = (instability * sensitivity * 2.0).clamp(0.0, 1.0);
    0.5 + 1.5 * scaled
}

/// Render scale at time `t_secs` for a node pulsing at `hz`.
pub fn pulse_scale(hz: f64, t_secs: f64) -> f64 {
    1.0 + 0.15 * (std::f64::consts::TAU * hz * t_secs).sin()
}

/// node id → pulse Hz for every node.
pub fn oscillator_map(nodes: &[RelationNode], edges: &[RelationEdge], sensitivity: f64) -> BTreeMap<NodeId, f64> {
    let by_id: HashMap<&NodeId, &RelationNode> = nodes.iter().map(|n| (&n.id, n)).collect();
    let mut incident: HashMap<&NodeId, SmallVec<[f64; 8]>> = HashMap::new();
    for e in edges {
        let Some(t) = edge_tension(&by_id, e) else {
            continue;
        };
        incident.entry(&e.from).or_default().push(t);
        if e.to != e.from {
            incident.entry(&e.to).or_default().push(t);
        }
    }
    nodes
        .iter()
        .map(|n| {
            let sigma = incident.get(&n.id).map_or(0.0, |ts| std_dev(ts));
            (n.id.clone(), pulse_hz(sigma, sensitivity))
        })
        .collect()
}

fn edge_tension(by_id: &HashMap<&NodeId, &RelationNode>, e: &RelationEdge) -> Option<f64> {
    let a = by_id.get(&e.from)?;
    let b = by_id.get(&e.to)?;
    tension(&a.vector, &b.vector, e.weight)
}

fn std_dev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    (xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt()
}
