//! Cheap type suggestions for the causal editor.
//!
//! Keyword cues only; no language model. Results are suggestions that the
//! store keeps in its ghost-type table until the user accepts them.

use serde::{Deserialize, Serialize};

use crate::labels::topic::is_stopword;
use crate::model::{EdgeType, NodeType, RelationNode};
use crate::vector::cosine;

const PROBLEM_CUES: &[&str] = &[
    "can't", "cannot", "hard to", "difficult", "lack", "issue", "problem", "blocked", "friction",
];
const MECHANISM_CUES: &[&str] = &[
    "use", "apply", "build", "design", "algorithm", "module", "flow", "system", "pipeline", "process",
    "mechanism",
];
const OUTCOME_CUES: &[&str] = &[
    "so that", "result in", "results in", "lead to", "leads to", "increase", "decrease", "improve",
    "reduce", "boost", "kpi", "roi", "benefit",
];

/// A suggested node type with a rough confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeSuggestion {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub confidence: f64,
}

impl TypeSuggestion {
    fn new(node_type: NodeType, confidence: f64) -> Self {
        Self { node_type, confidence }
    }
}

/// Suggest a node type from its text.
///
/// Order of precedence: problem cues (or a trailing `?`), mechanism words,
/// outcome phrases, then a capitalised word after the first as a stand-in
/// for a named actor, then any remaining content word as a resource.
pub fn suggest_node_type(text: &str) -> TypeSuggestion {
    let lower = text.trim().to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();

    if lower.ends_with('?') || PROBLEM_CUES.iter().any(|cue| contains_phrase(&lower, &words, cue)) {
        return TypeSuggestion::new(NodeType::Problem, 0.7);
    }
    if MECHANISM_CUES.iter().any(|cue| words.contains(cue)) {
        return TypeSuggestion::new(NodeType::Mechanism, 0.6);
    }
    if OUTCOME_CUES.iter().any(|cue| contains_phrase(&lower, &words, cue)) {
        return TypeSuggestion::new(NodeType::Outcome, 0.6);
    }

    let has_proper = text
        .split_whitespace()
        .skip(1)
        .any(|w| w.chars().next().is_some_and(char::is_uppercase));
    if has_proper {
        return TypeSuggestion::new(NodeType::Actor, 0.5);
    }
    if words.iter().any(|w| !is_stopword(w) && w.chars().count() > 2) {
        return TypeSuggestion::new(NodeType::Resource, 0.4);
    }
    TypeSuggestion::new(NodeType::Note, 0.3)
}

/// Multi-word cues match as substrings, single words as whole words.
fn contains_phrase(lower: &str, words: &[&str], cue: &str) -> bool {
    if cue.contains(' ') || cue.contains('\'') {
        lower.contains(cue)
    } else {
        words.contains(&cue)
    }
}

/// Suggest an edge type from the endpoint types.
pub fn suggest_edge_type(from: &RelationNode, to: &RelationNode) -> EdgeType {
    match (from.node_type, to.node_type) {
        (NodeType::Problem, NodeType::Mechanism) => EdgeType::Solves,
        (NodeType::Mechanism, NodeType::Outcome) | (NodeType::Problem, NodeType::Outcome) => EdgeType::LeadsTo,
        _ => EdgeType::RelatesTo,
    }
}

/// Endpoint cosine clamped to `[0, 1]`; 0.5 when a vector is missing.
pub fn default_edge_weight(from: &RelationNode, to: &RelationNode) -> f64 {
    if from.vector.is_empty() || to.vector.is_empty() {
        return 0.5;
    }
    cosine(&from.vector, &to.vector).clamp(0.0, 1.0)
}
