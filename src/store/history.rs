//! Undo/redo for node edits.
//!
//! Layered on top of the store rather than built into it: an edit is recorded
//! by wrapping the mutation in `History::record`, which snapshots the node
//! before and after. Undo and redo replay those snapshots as node patches.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::NodeId;
use super::{NodePatch, RelationStore};

pub const DEFAULT_CAPACITY: usize = 100;

/// One recorded node edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    pub id: NodeId,
    pub prev: NodePatch,
    pub next: NodePatch,
}

/// Bounded two-stack history. Pushing a new edit clears the redo stack.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Edit>,
    future: Vec<Edit>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { past: VecDeque::new(), future: Vec::new(), capacity: capacity.max(1) }
    }

    pub fn push(&mut self, edit: Edit) {
        if self.past.len() == self.capacity {
            self.past.pop_front();
        }
        self.past.push_back(edit);
        self.future.clear();
    }

    /// Run `mutate` against `store` and record the change to node `id`.
    ///
    /// Nothing is recorded if the node does not exist before or after, or if
    /// the mutation left it unchanged.
    pub fn record<R>(
        &mut self,
        store: &mut RelationStore,
        id: &NodeId,
        mutate: impl FnOnce(&mut RelationStore) -> R,
    ) -> R {
        let prev = store.node_patch(id);
        let out = mutate(store);
        if let (Some(prev), Some(next)) = (prev, store.node_patch(id)) {
            if prev != next {
                self.push(Edit { id: id.clone(), prev, next });
            }
        }
        out
    }

    /// Revert the latest edit. Returns the node it touched.
    ///
    /// If the node no longer exists the edit stays on the undo stack and
    /// `None` is returned.
    pub fn undo(&mut self, store: &mut RelationStore) -> Option<NodeId> {
        let edit = self.past.back()?;
        if !store.restore_node_snapshot(&edit.id, &edit.prev) {
            return None;
        }
        let edit = self.past.pop_back()?;
        let id = edit.id.clone();
        self.future.push(edit);
        Some(id)
    }

    /// Re-apply the latest undone edit.
    pub fn redo(&mut self, store: &mut RelationStore) -> Option<NodeId> {
        let edit = self.future.last()?;
        if !store.restore_node_snapshot(&edit.id, &edit.next) {
            return None;
        }
        let edit = self.future.pop()?;
        let id = edit.id.clone();
        self.past.push_back(edit);
        Some(id)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn len(&self) -> usize {
        self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.past.is_empty()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}
