//! The ordered log of change records shared by every change handler.

use std::sync::Arc;

use parking_lot::Mutex;

use super::change::{ChangeId, ChangeKind, DataChange};
use super::key::CellKey;

#[derive(Debug, Default)]
struct LogState {
    changes: Vec<DataChange>,
    next_id: ChangeId,
}

/// Creation-ordered change records behind one coarse lock.
///
/// Cloning yields another handle to the same log.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    inner: Arc<Mutex<LogState>>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and return its id.
    pub fn append(&self, key: CellKey, kind: ChangeKind) -> ChangeId {
        let mut state = self.inner.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.changes.push(DataChange { id, key, kind });
        id
    }

    pub fn get(&self, id: ChangeId) -> Option<DataChange> {
        self.inner
            .lock()
            .changes
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// Re-key a record in place, keeping its position in the log.
    pub fn update_key(&self, id: ChangeId, key: CellKey) {
        if let Some(change) = self.inner.lock().changes.iter_mut().find(|c| c.id == id) {
            change.key = key;
        }
    }

    /// Replace a record's kind in place, keeping its position in the log.
    pub fn update_kind(&self, id: ChangeId, kind: ChangeKind) {
        if let Some(change) = self.inner.lock().changes.iter_mut().find(|c| c.id == id) {
            change.kind = kind;
        }
    }

    pub fn remove(&self, id: ChangeId) -> Option<DataChange> {
        let mut state = self.inner.lock();
        let at = state.changes.iter().position(|c| c.id == id)?;
        Some(state.changes.remove(at))
    }

    /// Ids in creation order.
    pub fn ids(&self) -> Vec<ChangeId> {
        self.inner.lock().changes.iter().map(|c| c.id).collect()
    }

    /// Copy of every record in creation order.
    pub fn snapshot(&self) -> Vec<DataChange> {
        self.inner.lock().changes.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().changes.is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().changes.clear();
    }
}
