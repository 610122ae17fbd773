//! Project bundle: the persisted form of a causal workspace.
//!
//! A bundle is one JSON document holding every relation node and edge plus
//! the view mode. Field names are camelCase on the wire.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{RelationEdge, RelationNode, ViewMode};
use crate::store::RelationStore;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    pub nodes: Vec<RelationNode>,
    pub edges: Vec<RelationEdge>,
    #[serde(default)]
    pub view_mode: ViewMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBundle {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data: ProjectData,
}

impl ProjectBundle {
    /// Capture the store's nodes, edges and view mode.
    pub fn from_store(name: impl Into<String>, store: &RelationStore) -> Self {
        let now = Utc::now();
        Self {
            id: format!("proj_{}", now.timestamp_millis()),
            name: name.into(),
            created_at: now,
            updated_at: now,
            data: capture(store),
        }
    }

    /// Re-capture the store, keeping id, name and creation time.
    pub fn refresh(&mut self, store: &RelationStore) {
        self.data = capture(store);
        self.updated_at = Utc::now();
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Replace the store's contents with this bundle.
    ///
    /// Any running simulation is stopped first. Edges whose endpoints are
    /// not in the bundle are skipped. Returns the number of edges restored.
    pub fn restore_into(&self, store: &mut RelationStore) -> usize {
        store.stop_sim();
        store.clear();
        for node in &self.data.nodes {
            store.upsert_node(node.clone());
        }
        let mut restored = 0;
        for edge in &self.data.edges {
            if store.node(&edge.from).is_none() || store.node(&edge.to).is_none() {
                tracing::debug!(edge = %edge.id, "dangling edge skipped on restore");
                continue;
            }
            store.insert_edge(edge.clone());
            restored += 1;
        }
        store.set_view_mode(self.data.view_mode);
        tracing::info!(
            bundle = %self.id,
            node_count = self.data.nodes.len(),
            edge_count = restored,
            "project restored"
        );
        restored
    }
}

fn capture(store: &RelationStore) -> ProjectData {
    let (nodes, edges) = store.sim_snapshot();
    ProjectData { nodes, edges, view_mode: store.view_mode() }
}
