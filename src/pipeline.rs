//! End-to-end analysis: text → chunks → embeddings → graph → communities →
//! labels → layout → metrics.
//!
//! Embedding and projection are external collaborators behind async traits.
//! Their failures are terminal for the request: a wrong-length or failed
//! response aborts with `Error::Collaborator`, partial results are never
//! used.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chunk::{split_corpus, Chunk};
use crate::community::CommunityDetector;
use crate::config::ResonatorConfig;
use crate::labels::ClusterLabeler;
use crate::metrics::GraphMetrics;
use crate::model::{CommunityId, Graph, Position, Vector};
use crate::similarity::{validate_corpus, SimilarityGraphBuilder};
use crate::{Error, Result};

const DEFAULT_EMBED_BATCH: usize = 64;

// ============================================================================
// Collaborators
// ============================================================================

/// Text → vector service. Output must be index-aligned with the input.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>>;
}

/// Vector → 2D layout service. Output must be index-aligned with the input.
#[async_trait]
pub trait Projector: Send + Sync {
    async fn project(&self, vectors: &[Vector]) -> Result<Vec<Position>>;
}

fn collaborator_error(what: &str, err: Error) -> Error {
    match err {
        Error::Collaborator(_) => err,
        other => Error::Collaborator(format!("{what} failed: {other}")),
    }
}

// ============================================================================
// Result
// ============================================================================

/// Wall time per phase, in milliseconds. Skipped phases stay 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub chunk_ms: u64,
    pub embed_ms: u64,
    pub graph_ms: u64,
    pub community_ms: u64,
    pub label_ms: u64,
    pub project_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Empty when the caller supplied texts directly.
    pub chunks: Vec<Chunk>,
    pub texts: Vec<String>,
    pub embeddings: Vec<Vector>,
    /// Similarity graph with communities (and positions, if projected).
    pub graph: Graph,
    pub cluster_count: usize,
    /// Empty when the corpus reached `labels.max_docs`.
    pub labels: BTreeMap<CommunityId, String>,
    pub metrics: GraphMetrics,
    pub timings: PhaseTimings,
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

// ============================================================================
// Shared stages
// ============================================================================

struct Stages {
    graph: Graph,
    cluster_count: usize,
    labels: BTreeMap<CommunityId, String>,
}

/// Community detection and labeling over an already built graph.
fn detect_and_label(
    graph: Graph,
    texts: &[String],
    config: &ResonatorConfig,
    timings: &mut PhaseTimings,
) -> Result<Stages> {
    let t = Instant::now();
    let detected = CommunityDetector::new(config.community.resolution)
        .with_seed(config.community.seed)
        .with_max_iter(config.community.max_iter)
        .detect(&graph)?;
    timings.community_ms = elapsed_ms(t);

    let t = Instant::now();
    let labels = if texts.len() < config.labels.max_docs {
        ClusterLabeler::new(texts)
            .with_limits(config.labels.max_terms, config.labels.max_len)
            .label_graph(&detected.graph, &detected.graph.texts_by_id())
    } else {
        tracing::debug!(docs = texts.len(), max_docs = config.labels.max_docs, "cluster labeling skipped");
        BTreeMap::new()
    };
    timings.label_ms = elapsed_ms(t);

    Ok(Stages { graph: detected.graph, cluster_count: detected.cluster_count, labels })
}

fn finish(
    chunks: Vec<Chunk>,
    texts: Vec<String>,
    embeddings: Vec<Vector>,
    stages: Stages,
    timings: PhaseTimings,
) -> Analysis {
    let metrics = GraphMetrics::compute(&stages.graph, stages.cluster_count);
    tracing::info!(
        node_count = metrics.node_count,
        edge_count = metrics.edge_count,
        clusters = metrics.clusters,
        resonance = metrics.resonance,
        graph_ms = timings.graph_ms,
        community_ms = timings.community_ms,
        "analysis complete"
    );
    Analysis {
        chunks,
        texts,
        embeddings,
        graph: stages.graph,
        cluster_count: stages.cluster_count,
        labels: stages.labels,
        metrics,
        timings,
    }
}

/// Synchronous analysis of pre-embedded texts.
///
/// Uses `graph.k_desktop`, `graph.sim_threshold` and the `max_sync_nodes`
/// ceiling. No chunking, embedding or projection.
pub fn analyze(texts: &[String], embeddings: &[Vector], config: &ResonatorConfig) -> Result<Analysis> {
    let mut timings = PhaseTimings::default();

    let t = Instant::now();
    let graph = SimilarityGraphBuilder::new(config.graph.k_desktop, config.graph.sim_threshold)
        .with_max_nodes(Some(config.graph.max_sync_nodes))
        .build(texts, embeddings)?;
    timings.graph_ms = elapsed_ms(t);

    let stages = detect_and_label(graph, texts, config, &mut timings)?;
    Ok(finish(Vec::new(), texts.to_vec(), embeddings.to_vec(), stages, timings))
}

// ============================================================================
// Analyzer
// ============================================================================

/// Async pipeline over external collaborators.
pub struct Analyzer {
    config: ResonatorConfig,
    embedder: Arc<dyn Embedder>,
    projector: Option<Arc<dyn Projector>>,
    batch_size: usize,
    mobile: bool,
}

impl Analyzer {
    pub fn new(config: ResonatorConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self { config, embedder, projector: None, batch_size: DEFAULT_EMBED_BATCH, mobile: false }
    }

    pub fn with_projector(mut self, projector: Arc<dyn Projector>) -> Self {
        self.projector = Some(projector);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Use `graph.k_mobile` instead of `graph.k_desktop`.
    pub fn mobile(mut self, mobile: bool) -> Self {
        self.mobile = mobile;
        self
    }

    pub fn config(&self) -> &ResonatorConfig {
        &self.config
    }

    fn k(&self) -> usize {
        if self.mobile { self.config.graph.k_mobile } else { self.config.graph.k_desktop }
    }

    /// Embed `texts` in batches, checking every batch's length.
    pub async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = self.embedder.embed(batch).await.map_err(|e| collaborator_error("embed", e))?;
            if vectors.len() != batch.len() {
                return Err(Error::Collaborator(format!(
                    "embed returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            out.extend(vectors);
        }
        Ok(out)
    }

    /// Run the full pipeline over raw documents.
    pub async fn analyze(&self, documents: &[String]) -> Result<Analysis> {
        let mut timings = PhaseTimings::default();

        let t = Instant::now();
        let chunks = split_corpus(documents, &self.config.chunk);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        timings.chunk_ms = elapsed_ms(t);
        if texts.is_empty() {
            return Err(Error::InputShape("no text to analyze".into()));
        }
        tracing::info!(documents = documents.len(), chunks = texts.len(), "corpus chunked");

        let t = Instant::now();
        let embeddings = self.embed_all(&texts).await?;
        timings.embed_ms = elapsed_ms(t);
        validate_corpus(&texts, &embeddings)?;
        tracing::info!(count = embeddings.len(), elapsed_ms = timings.embed_ms, "corpus embedded");

        let t = Instant::now();
        let graph = self.build_graph(&texts, &embeddings).await?;
        timings.graph_ms = elapsed_ms(t);

        let mut stages = detect_and_label(graph, &texts, &self.config, &mut timings)?;

        if let Some(projector) = &self.projector {
            let t = Instant::now();
            let positions = projector.project(&embeddings).await.map_err(|e| collaborator_error("project", e))?;
            if positions.len() != embeddings.len() {
                return Err(Error::Collaborator(format!(
                    "project returned {} positions for {} vectors",
                    positions.len(),
                    embeddings.len()
                )));
            }
            for (node, p) in stages.graph.nodes.iter_mut().zip(positions) {
                node.x = Some(p.x);
                node.y = Some(p.y);
            }
            timings.project_ms = elapsed_ms(t);
        }

        Ok(finish(chunks, texts, embeddings, stages, timings))
    }

    /// With the runtime the build is offloaded and uncapped; without it the
    /// synchronous ceiling applies.
    #[cfg(feature = "runtime")]
    async fn build_graph(&self, texts: &[String], embeddings: &[Vector]) -> Result<Graph> {
        use crate::worker::{offload, WorkerRequest, WorkerResponse};

        let request = WorkerRequest::SimilarityGraph {
            texts: texts.to_vec(),
            embeddings: embeddings.to_vec(),
            k: self.k(),
            threshold: self.config.graph.sim_threshold,
        };
        match offload(request).await {
            WorkerResponse::Graph(graph) => Ok(graph),
            WorkerResponse::Error(msg) => Err(Error::InputShape(msg)),
            other => Err(Error::Collaborator(format!("unexpected worker response: {other:?}"))),
        }
    }

    #[cfg(not(feature = "runtime"))]
    async fn build_graph(&self, texts: &[String], embeddings: &[Vector]) -> Result<Graph> {
        SimilarityGraphBuilder::new(self.k(), self.config.graph.sim_threshold)
            .with_max_nodes(Some(self.config.graph.max_sync_nodes))
            .build(texts, embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>> {
            Ok(texts
                .iter()
                .map(|t| if t.contains("cat") { vec![1.0, 0.05] } else { vec![0.0, 1.0] })
                .collect())
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vector>> {
            Ok(vec![vec![1.0]])
        }
    }

    struct LineProjector;

    #[async_trait]
    impl Projector for LineProjector {
        async fn project(&self, vectors: &[Vector]) -> Result<Vec<Position>> {
            Ok((0..vectors.len()).map(|i| Position::new(i as f64 * 10.0, 0.0)).collect())
        }
    }

    fn sentences_only() -> ResonatorConfig {
        let mut cfg = ResonatorConfig::default();
        cfg.chunk.target_chars = 0;
        cfg
    }

    #[test]
    fn test_sync_analyze_three_sentence_scenario() {
        let texts: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let embeddings = vec![vec![1.0, 0.0], vec![0.99, 0.14], vec![0.0, 1.0]];
        let mut cfg = ResonatorConfig::default();
        cfg.graph.k_desktop = 2;
        cfg.graph.sim_threshold = 0.5;
        let a = analyze(&texts, &embeddings, &cfg).unwrap();
        assert_eq!(a.graph.edge_count(), 1);
        assert_eq!(a.cluster_count, 2);
        assert!(a.chunks.is_empty());
    }

    #[test]
    fn test_sync_analyze_enforces_ceiling() {
        let mut cfg = ResonatorConfig::default();
        cfg.graph.max_sync_nodes = 2;
        let texts: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let embeddings = vec![vec![1.0]; 3];
        let err = analyze(&texts, &embeddings, &cfg).unwrap_err();
        assert!(matches!(err, Error::ResourceCeilingExceeded { requested: 3, ceiling: 2 }));
    }

    #[test]
    fn test_labels_skipped_at_max_docs() {
        let mut cfg = ResonatorConfig::default();
        cfg.labels.max_docs = 2;
        let texts: Vec<String> = vec!["cats purr".into(), "kittens purr".into()];
        let embeddings = vec![vec![1.0, 0.0], vec![1.0, 0.0]];
        let a = analyze(&texts, &embeddings, &cfg).unwrap();
        assert!(a.labels.is_empty());
    }

    #[tokio::test]
    async fn test_async_pipeline_with_projection() {
        let analyzer = Analyzer::new(sentences_only(), Arc::new(FixedEmbedder))
            .with_projector(Arc::new(LineProjector))
            .with_batch_size(2);
        let docs = vec!["The cat sat. A cat slept. Markets fell sharply.".to_string()];
        let a = analyzer.analyze(&docs).await.unwrap();
        assert_eq!(a.chunks.len(), 3);
        assert_eq!(a.embeddings.len(), 3);
        assert_eq!(a.cluster_count, 2);
        assert_eq!(a.graph.nodes[2].x, Some(20.0));
        assert_eq!(a.labels.len(), 2);
    }

    #[tokio::test]
    async fn test_wrong_length_embedding_is_collaborator_error() {
        let analyzer = Analyzer::new(sentences_only(), Arc::new(ShortEmbedder));
        let docs = vec!["One. Two.".to_string()];
        let err = analyzer.analyze(&docs).await.unwrap_err();
        assert!(matches!(err, Error::Collaborator(_)));
    }

    #[tokio::test]
    async fn test_empty_documents_rejected() {
        let analyzer = Analyzer::new(sentences_only(), Arc::new(FixedEmbedder));
        let err = analyzer.analyze(&["   ".to_string()]).await.unwrap_err();
        assert!(matches!(err, Error::InputShape(_)));
    }
}
