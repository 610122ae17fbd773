//! Engine configuration.
//!
//! Every field has a default, so a partial JSON document is a valid config:
//!
//! ```json
//! { "graph": { "sim_threshold": 0.8 }, "community": { "resolution": 1.2 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::{Bounds, OscillatorSettings, SimParams};
use crate::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResonatorConfig {
    pub chunk: ChunkConfig,
    pub graph: GraphConfig,
    pub community: CommunityConfig,
    pub labels: LabelConfig,
    pub sim: SimParams,
    pub oscillator: OscillatorSettings,
}

/// Sentence chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    pub target_chars: usize,
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { target_chars: 400, overlap: 60 }
    }
}

/// Similarity graph construction and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub k_desktop: usize,
    pub k_mobile: usize,
    pub sim_threshold: f64,
    /// Edge budget for the render reduction.
    pub max_live_edges: usize,
    /// Quadratic-cost ceiling for a synchronous build.
    pub max_sync_nodes: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            k_desktop: 7,
            k_mobile: 5,
            sim_threshold: 0.7,
            max_live_edges: 1000,
            max_sync_nodes: 400,
        }
    }
}

/// Louvain parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    /// Higher → smaller communities.
    pub resolution: f64,
    /// Cap on local-moving passes per level.
    pub max_iter: usize,
    /// Seed for the node visiting order.
    pub seed: u64,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self { resolution: 1.0, max_iter: 100, seed: 42 }
    }
}

/// Cluster labeling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Labeling is skipped when the corpus has this many documents or more.
    pub max_docs: usize,
    pub max_terms: usize,
    pub max_len: usize,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self { max_docs: 500, max_terms: 3, max_len: 48 }
    }
}

impl ResonatorConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        let g = &self.graph;
        if !(0.0..=1.0).contains(&g.sim_threshold) {
            return Err(Error::Config(format!("graph.sim_threshold must be in [0, 1], got {}", g.sim_threshold)));
        }
        if g.k_desktop == 0 || g.k_mobile == 0 {
            return Err(Error::Config("graph.k_desktop and graph.k_mobile must be positive".into()));
        }
        if g.max_sync_nodes == 0 {
            return Err(Error::Config("graph.max_sync_nodes must be positive".into()));
        }
        if !(self.community.resolution.is_finite() && self.community.resolution > 0.0) {
            return Err(Error::Config(format!("community.resolution must be > 0, got {}", self.community.resolution)));
        }
        if self.labels.max_terms == 0 {
            return Err(Error::Config("labels.max_terms must be positive".into()));
        }
        let s = &self.sim;
        if !(0.0..=1.0).contains(&s.damping) {
            return Err(Error::Config(format!("sim.damping must be in [0, 1], got {}", s.damping)));
        }
        if !s.epsilon.is_finite() || s.epsilon < 0.0 {
            return Err(Error::Config(format!("sim.epsilon must be >= 0, got {}", s.epsilon)));
        }
        let Bounds { x, y } = s.bounds;
        if !(x > 0.0 && y > 0.0) {
            return Err(Error::Config("sim.bounds must be positive".into()));
        }
        Ok(())
    }
}
