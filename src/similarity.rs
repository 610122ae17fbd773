//! k-nearest-neighbour similarity graph construction.
//!
//! For every node the builder ranks all other nodes by cosine similarity and
//! keeps the best `k` whose similarity is at least `threshold`. Selection is
//! directed (j may be among i's neighbours without the converse) but edges are
//! stored once per unordered pair: when both sides select each other the
//! first-seen orientation is kept along with the larger weight.
//!
//! Cost is O(N² · D). Synchronous callers are capped at `max_nodes`; larger
//! corpora get `Error::ResourceCeilingExceeded` and should be delegated.

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

use crate::model::{Graph, SimEdge, SimNode, Vector};
use crate::vector::cosine;
use crate::{Error, Result};

/// Default synchronous node ceiling.
pub const DEFAULT_MAX_NODES: usize = 400;

/// Builder for a k-NN similarity graph.
#[derive(Debug, Clone)]
pub struct SimilarityGraphBuilder {
    pub k: usize,
    pub threshold: f64,
    /// `None` disables the ceiling (off-thread callers).
    pub max_nodes: Option<usize>,
}

impl Default for SimilarityGraphBuilder {
    fn default() -> Self {
        Self { k: 7, threshold: 0.7, max_nodes: Some(DEFAULT_MAX_NODES) }
    }
}

impl SimilarityGraphBuilder {
    pub fn new(k: usize, threshold: f64) -> Self {
        Self { k, threshold, ..Default::default() }
    }

    pub fn with_max_nodes(mut self, max_nodes: Option<usize>) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Build the graph. Node ids are the stringified input indices.
    pub fn build(&self, texts: &[String], embeddings: &[Vector]) -> Result<Graph> {
        validate_corpus(texts, embeddings)?;
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::InputShape(format!("threshold must lie in [0, 1], got {}", self.threshold)));
        }
        if self.k == 0 {
            return Err(Error::InputShape("k must be at least 1".into()));
        }
        let n = embeddings.len();
        if let Some(ceiling) = self.max_nodes {
            if n > ceiling {
                return Err(Error::ResourceCeilingExceeded { requested: n, ceiling });
            }
        }

        let nodes: Vec<SimNode> = texts
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (text, vec))| SimNode::new(i, text.as_str()).with_vector(vec.clone()))
            .collect();

        // (lo, hi) → index into `edges`
        let mut seen: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edges: Vec<SimEdge> = Vec::new();
        let mut candidates: Vec<(usize, f64)> = Vec::with_capacity(n.saturating_sub(1));

        for i in 0..n {
            candidates.clear();
            candidates.extend(
                (0..n)
                    .filter(|&j| j != i)
                    .map(|j| (j, cosine(&embeddings[i], &embeddings[j]))),
            );
            // Stable: equal similarities keep ascending index order.
            candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

            for &(j, w) in candidates.iter().take(self.k) {
                if w < self.threshold {
                    break;
                }
                let key = (i.min(j), i.max(j));
                match seen.entry(key) {
                    Entry::Occupied(slot) => {
                        let edge = &mut edges[*slot.get()];
                        edge.weight = edge.weight.max(w);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(edges.len());
                        edges.push(SimEdge::new(i, j, w));
                    }
                }
            }
        }

        tracing::debug!(
            node_count = n,
            edge_count = edges.len(),
            k = self.k,
            threshold = self.threshold,
            "similarity graph built"
        );

        Ok(Graph::new(nodes, edges))
    }
}

/// Shorthand for `SimilarityGraphBuilder::new(k, threshold).build(..)` with
/// the default node ceiling.
pub fn build_similarity_graph(
    texts: &[String],
    embeddings: &[Vector],
    k: usize,
    threshold: f64,
) -> Result<Graph> {
    SimilarityGraphBuilder::new(k, threshold).build(texts, embeddings)
}

/// Shape checks shared by every corpus-level entry point.
pub(crate) fn validate_corpus(texts: &[String], embeddings: &[Vector]) -> Result<()> {
    if texts.is_empty() || embeddings.is_empty() {
        return Err(Error::InputShape("empty corpus".into()));
    }
    if texts.len() != embeddings.len() {
        return Err(Error::InputShape(format!(
            "{} texts but {} embeddings",
            texts.len(),
            embeddings.len()
        )));
    }
    if let Some(i) = embeddings.iter().position(|v| v.is_empty()) {
        return Err(Error::InputShape(format!("embedding {i} has zero dimensions")));
    }
    Ok(())
}
