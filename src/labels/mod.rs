//! # Cluster Labeling
//!
//! Short human-readable names for communities, scored against the whole
//! corpus so a term common everywhere never names a single cluster.
//!
//! ```rust
//! use resonator::labels::ClusterLabeler;
//!
//! let corpus = ["the dog ran", "the dog barked", "stocks fell sharply", "bond yields rose"];
//! let labeler = ClusterLabeler::new(&corpus);
//! let label = labeler.label(&["the dog ran", "the dog barked"]);
//! assert!(label.contains("dog"));
//! ```

pub mod topic;

use std::collections::BTreeMap;

use hashbrown::HashMap;

use crate::model::{CommunityId, Graph, NodeId};

pub use topic::{label_from_cluster_docs, CorpusStats, FALLBACK_LABEL};

/// Labeler bound to one corpus. Cheap to re-run on any subset of documents.
#[derive(Debug, Clone)]
pub struct ClusterLabeler {
    corpus: CorpusStats,
    pub max_terms: usize,
    pub max_len: usize,
}

impl ClusterLabeler {
    pub fn new<S: AsRef<str>>(all_docs: &[S]) -> Self {
        Self::from_stats(CorpusStats::build(all_docs))
    }

    pub fn from_stats(corpus: CorpusStats) -> Self {
        Self { corpus, max_terms: 3, max_len: 48 }
    }

    pub fn with_limits(mut self, max_terms: usize, max_len: usize) -> Self {
        self.max_terms = max_terms;
        self.max_len = max_len;
        self
    }

    pub fn corpus(&self) -> &CorpusStats {
        &self.corpus
    }

    pub fn label<S: AsRef<str>>(&self, docs: &[S]) -> String {
        label_from_cluster_docs(docs, &self.corpus, self.max_terms, self.max_len)
    }

    /// Label every community present on `graph`.
    ///
    /// Nodes without a community or without text are skipped. The corpus is
    /// whatever this labeler was built from.
    pub fn label_graph(&self, graph: &Graph, texts_by_id: &HashMap<NodeId, String>) -> BTreeMap<CommunityId, String> {
        let mut groups: BTreeMap<CommunityId, Vec<&str>> = BTreeMap::new();
        for node in &graph.nodes {
            let (Some(c), Some(text)) = (node.community, texts_by_id.get(&node.id)) else {
                continue;
            };
            groups.entry(c).or_default().push(text.as_str());
        }
        groups
            .into_iter()
            .map(|(c, docs)| (c, self.label(&docs)))
            .collect()
    }
}

/// Label every community on `graph`, using the texts of all its nodes as
/// the corpus.
pub fn label_communities(graph: &Graph, texts_by_id: &HashMap<NodeId, String>) -> BTreeMap<CommunityId, String> {
    let all_docs: Vec<&str> = graph
        .nodes
        .iter()
        .filter_map(|n| texts_by_id.get(&n.id).map(String::as_str))
        .collect();
    let labels = ClusterLabeler::new(&all_docs).label_graph(graph, texts_by_id);
    tracing::debug!(docs = all_docs.len(), communities = labels.len(), "communities labeled");
    labels
}
