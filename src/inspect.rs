//! Community inspection: summaries and embedding relevance.
//!
//! Both read node text and vectors from the `RelationStore` (which may have
//! been edited since the similarity graph was built) and community
//! membership from the similarity graph.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::labels::topic::is_stopword;
use crate::model::{CommunityId, Graph, NodeId};
use crate::store::RelationStore;
use crate::vector::{centroid, cos01, cosine};

const KEYWORDS: usize = 5;
const REPRESENTATIVES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Representative {
    pub id: NodeId,
    pub text: String,
    /// Cosine to the community centroid; -1 without a vector.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub community: CommunityId,
    pub size: usize,
    pub keywords: Vec<String>,
    pub representatives: Vec<Representative>,
    pub centroid: Vec<f32>,
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|t| !t.is_empty() && !is_stopword(t) && t.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// Size, top keywords, representatives and centroid of one community.
///
/// Keywords are TF-IDF within the community, with
/// `idf = ln((N + 1) / (df + 1)) + 1`.
pub fn summarize_community(community: CommunityId, graph: &Graph, store: &RelationStore) -> ClusterSummary {
    let members: Vec<&NodeId> = graph
        .nodes
        .iter()
        .filter(|n| n.community == Some(community))
        .map(|n| &n.id)
        .collect();

    let text_of = |id: &NodeId| store.node(id).map_or("", |n| n.text.as_str());
    let vectors: Vec<&[f32]> = members
        .iter()
        .filter_map(|id| store.node(id).map(|n| n.vector.as_slice()))
        .filter(|v| !v.is_empty())
        .collect();
    let center = centroid(&vectors);

    let docs: Vec<Vec<String>> = members.iter().map(|id| tokenize(text_of(id))).collect();
    let mut df: HashMap<&str, usize> = HashMap::new();
    for doc in &docs {
        let mut seen: Vec<&str> = doc.iter().map(String::as_str).collect();
        seen.sort_unstable();
        seen.dedup();
        for tok in seen {
            *df.entry(tok).or_default() += 1;
        }
    }
    let n_docs = docs.len().max(1) as f64;
    let mut tfidf: BTreeMap<&str, f64> = BTreeMap::new();
    for doc in &docs {
        let mut tf: HashMap<&str, usize> = HashMap::new();
        for tok in doc {
            *tf.entry(tok.as_str()).or_default() += 1;
        }
        for (tok, freq) in tf {
            let idf = ((n_docs + 1.0) / (df.get(tok).copied().unwrap_or(0) as f64 + 1.0)).ln() + 1.0;
            *tfidf.entry(tok).or_default() += freq as f64 * idf;
        }
    }
    let mut ranked: Vec<(&str, f64)> = tfidf.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let keywords = ranked.into_iter().take(KEYWORDS).map(|(t, _)| t.to_string()).collect();

    let mut representatives: Vec<Representative> = members
        .iter()
        .map(|&id| {
            let v = store.node(id).map_or(&[][..], |n| n.vector.as_slice());
            let score = if center.is_empty() || v.is_empty() { -1.0 } else { cosine(v, &center) };
            Representative { id: id.clone(), text: text_of(id).to_string(), score }
        })
        .collect();
    representatives.sort_by(|a, b| b.score.total_cmp(&a.score));
    representatives.truncate(REPRESENTATIVES);

    ClusterSummary { community, size: members.len(), keywords, representatives, centroid: center }
}

/// Per-node relevance in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relevance {
    /// cos01 to the centroid of all vectors.
    pub r_global: BTreeMap<NodeId, f64>,
    /// cos01 to the centroid of the node's community.
    pub r_cluster: BTreeMap<NodeId, f64>,
}

/// Relevance of every similarity-graph node. Nodes without a vector score
/// 0.5 (cosine 0). Nodes without a community share one "unassigned" group.
pub fn embedding_relevance(graph: &Graph, store: &RelationStore) -> Relevance {
    let vector_of = |id: &NodeId| store.node(id).map_or(&[][..], |n| n.vector.as_slice());

    let all: Vec<&[f32]> = graph.nodes.iter().map(|n| vector_of(&n.id)).filter(|v| !v.is_empty()).collect();
    let global = centroid(&all);

    let mut groups: HashMap<Option<CommunityId>, Vec<&[f32]>> = HashMap::new();
    for n in &graph.nodes {
        let v = vector_of(&n.id);
        let group = groups.entry(n.community).or_default();
        if !v.is_empty() {
            group.push(v);
        }
    }
    let centroids: HashMap<Option<CommunityId>, Vec<f32>> =
        groups.into_iter().map(|(c, vs)| (c, centroid(&vs))).collect();

    let score = |v: &[f32], c: &[f32]| if v.is_empty() || c.is_empty() { 0.5 } else { cos01(v, c) };

    let mut out = Relevance::default();
    for n in &graph.nodes {
        let v = vector_of(&n.id);
        out.r_global.insert(n.id.clone(), score(v, &global));
        let c = centroids.get(&n.community).map_or(&[][..], Vec::as_slice);
        out.r_cluster.insert(n.id.clone(), score(v, c));
    }
    out
}
