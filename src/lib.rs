//! # resonator: semantic graph engine
//!
//! Turns embedded text into an interactive semantic graph and lets a user
//! check a hand-drawn causal structure against the embedding geometry.
//!
//! ## Design Principles
//!
//! 1. **Pure stages**: builder, detector, labeler, reducer and the simulation
//!    tick are functions of a full input snapshot. They run the same in-process
//!    or behind the worker boundary.
//! 2. **One explicit store**: `RelationStore` owns every mutable thing (typed
//!    nodes, causal edges, selection, simulation state). No globals.
//! 3. **Soft edits**: store mutations that reference a missing id are no-ops,
//!    not errors. Graph edits may race with node deletion.
//! 4. **Plain DTOs**: every entity is a JSON-serializable record.
//!
//! ## Quick Start
//!
//! ```rust
//! use resonator::{analyze, ResonatorConfig, RelationStore, EdgeType};
//!
//! # fn example() -> resonator::Result<()> {
//! let texts = vec!["cats purr".to_string(), "kittens purr".to_string(), "stocks fell".to_string()];
//! let embeddings = vec![vec![1.0, 0.1], vec![0.99, 0.12], vec![0.0, 1.0]];
//!
//! let analysis = analyze(&texts, &embeddings, &ResonatorConfig::default())?;
//!
//! let mut store = RelationStore::new();
//! store.seed_from_similarity_graph(&analysis.graph, &texts, &embeddings);
//! store.add_edge(&"0".into(), &"2".into(), EdgeType::Causes);
//! # Ok(())
//! # }
//! ```
//!
//! ## Data flow
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | k-NN similarity graph | `similarity` | `Graph` |
//! | Louvain communities | `community` | `Graph` + cluster count |
//! | Cluster labels | `labels` | community → label |
//! | Render reduction | `visible` | `Graph` |
//! | Causal layer | `store` | `RelationStore` |
//! | Equilibrium | `sim` | positions + tension |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod vector;
pub mod config;
pub mod similarity;
pub mod community;
pub mod labels;
pub mod visible;
pub mod metrics;
pub mod inspect;
pub mod heuristics;
pub mod store;
pub mod sim;
pub mod worker;
pub mod chunk;
pub mod pipeline;
pub mod bundle;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Graph, SimNode, SimEdge, NodeId, Position, Vector, CommunityId,
    RelationNode, RelationEdge, NodeType, EdgeType, EdgeId, ViewMode, Polarity,
};

// ============================================================================
// Re-exports: Core stages
// ============================================================================

pub use config::ResonatorConfig;
pub use similarity::{build_similarity_graph, SimilarityGraphBuilder};
pub use community::{detect_communities, CommunityDetector, CommunityResult};
pub use labels::{label_communities, ClusterLabeler, CorpusStats};
pub use visible::{reduce_for_display, DisplayOptions};
pub use metrics::GraphMetrics;

// ============================================================================
// Re-exports: Store + Simulation
// ============================================================================

pub use store::{RelationStore, History};
pub use sim::{SimParams, SimState, TickResult, sim_tick};

// ============================================================================
// Re-exports: Pipeline
// ============================================================================

pub use pipeline::{analyze, Analysis, Analyzer, Embedder, Projector};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Input shape error: {0}")]
    InputShape(String),

    #[error("Resource ceiling exceeded: {requested} nodes requested, synchronous ceiling is {ceiling}; retry with at most {ceiling} nodes or delegate the build")]
    ResourceCeilingExceeded { requested: usize, ceiling: usize },

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
