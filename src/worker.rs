//! Message-passing boundary for the heavy numeric stages.
//!
//! A request carries a full owned snapshot; the response carries a full
//! result. `handle` is the pure dispatcher and runs identically in-process;
//! `offload` moves it onto tokio's blocking pool. Both message types are
//! plain serde records so they can cross a process boundary as JSON too.

use serde::{Deserialize, Serialize};

use crate::model::{Graph, RelationEdge, RelationNode, Vector};
use crate::sim::{sim_tick, SimParams, TickResult};
use crate::similarity::SimilarityGraphBuilder;
use crate::vector::batch_cosine;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerRequest {
    SimilarityGraph {
        texts: Vec<String>,
        embeddings: Vec<Vector>,
        k: usize,
        threshold: f64,
    },
    /// `vectors` is row-major with row length `base.len()`.
    BatchCosine { base: Vec<f32>, vectors: Vec<f32> },
    SimTick {
        nodes: Vec<RelationNode>,
        edges: Vec<RelationEdge>,
        params: SimParams,
    },
}

impl WorkerRequest {
    fn kind(&self) -> &'static str {
        match self {
            WorkerRequest::SimilarityGraph { .. } => "similarity_graph",
            WorkerRequest::BatchCosine { .. } => "batch_cosine",
            WorkerRequest::SimTick { .. } => "sim_tick",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WorkerResponse {
    Graph(Graph),
    Cosines(Vec<f64>),
    Tick(TickResult),
    Error(String),
}

/// Serve one request.
///
/// The similarity build runs without the synchronous node ceiling: this is
/// where oversized corpora are meant to be delegated.
pub fn handle(request: WorkerRequest) -> WorkerResponse {
    let kind = request.kind();
    let response = match request {
        WorkerRequest::SimilarityGraph { texts, embeddings, k, threshold } => {
            match SimilarityGraphBuilder::new(k, threshold)
                .with_max_nodes(None)
                .build(&texts, &embeddings)
            {
                Ok(graph) => WorkerResponse::Graph(graph),
                Err(e) => WorkerResponse::Error(e.to_string()),
            }
        }
        WorkerRequest::BatchCosine { base, vectors } => WorkerResponse::Cosines(batch_cosine(&base, &vectors)),
        WorkerRequest::SimTick { nodes, edges, params } => WorkerResponse::Tick(sim_tick(&nodes, &edges, &params)),
    };
    if let WorkerResponse::Error(msg) = &response {
        tracing::warn!(kind, error = %msg, "worker request failed");
    }
    response
}

/// Run `handle` on the blocking pool.
#[cfg(feature = "runtime")]
pub async fn offload(request: WorkerRequest) -> WorkerResponse {
    match tokio::task::spawn_blocking(move || handle(request)).await {
        Ok(response) => response,
        Err(e) => WorkerResponse::Error(format!("worker task failed: {e}")),
    }
}
