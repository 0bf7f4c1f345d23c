//! Change handlers: one per tracked mutation kind, all writing to one shared log.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::change::{ChangeId, ChangeKind, DataChange};
use super::key::{CellKey, KeyHandler, PositionKeyHandler};
use super::log::ChangeLog;
use crate::config::TrackingMode;
use crate::event::renumber::{renumber_gap, renumber_index};
use crate::event::{LayerEvent, StructuralDiff};
use crate::types::{Axis, CellValue, RowId};

/// A handler's records: `id → key`, mirrored in the shared log.
///
/// Keyed by id because row-delete gaps of different records can coincide.
pub struct KeyedChanges {
    keys: Box<dyn KeyHandler>,
    entries: BTreeMap<ChangeId, CellKey>,
    log: ChangeLog,
    /// Row part of keys is a gap between rows rather than a live row.
    row_gaps: bool,
}

impl KeyedChanges {
    pub fn new(keys: Box<dyn KeyHandler>, log: ChangeLog) -> Self {
        Self {
            keys,
            entries: BTreeMap::new(),
            log,
            row_gaps: false,
        }
    }

    /// Records whose row is a reinsertion gap (never dropped by deletes).
    pub fn with_row_gaps(keys: Box<dyn KeyHandler>, log: ChangeLog) -> Self {
        Self {
            row_gaps: true,
            ..Self::new(keys, log)
        }
    }

    pub fn key_handler(&self) -> &dyn KeyHandler {
        self.keys.as_ref()
    }

    pub fn find(&self, key: &CellKey) -> Option<ChangeId> {
        self.entries
            .iter()
            .find_map(|(id, k)| (k == key).then_some(*id))
    }

    pub fn contains_id(&self, id: ChangeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: ChangeId) -> Option<DataChange> {
        self.entries.contains_key(&id).then(|| self.log.get(id)).flatten()
    }

    pub fn track(&mut self, key: CellKey, kind: ChangeKind) -> ChangeId {
        let id = self.log.append(key, kind);
        self.entries.insert(id, key);
        id
    }

    pub fn remove(&mut self, id: ChangeId) -> Option<DataChange> {
        self.entries.remove(&id)?;
        self.log.remove(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ChangeId> + '_ {
        self.entries.keys().copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CellKey> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every record (the tracker clears the log).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current `(column, row)` indices of every record.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries
            .values()
            .filter_map(|key| Some((self.keys.column_index(key)?, self.keys.row_index(key)?)))
    }

    /// Renumber keys after rows/columns were added or removed along `axis`.
    ///
    /// Returns the records dropped because their target was deleted, with their
    /// pre-change keys.
    pub fn renumber(&mut self, axis: Axis, diffs: &[StructuralDiff]) -> Vec<DataChange> {
        let updates = match axis {
            Axis::Column => self.keys.updates_on_horizontal_structural_change(),
            Axis::Row => self.keys.updates_on_vertical_structural_change(),
        };
        if !updates {
            return Vec::new();
        }

        let gaps = self.row_gaps && axis == Axis::Row;
        let mut dropped = Vec::new();
        let mut rekeyed = Vec::new();
        for (&id, key) in &self.entries {
            let index = match axis {
                Axis::Column => self.keys.column_index(key),
                Axis::Row => self.keys.row_index(key),
            };
            let Some(index) = index else {
                continue;
            };
            let renumbered = if gaps {
                Some(renumber_gap(index, diffs))
            } else {
                renumber_index(index, diffs)
            };
            match renumbered {
                None => dropped.push(id),
                Some(next) if next != index => {
                    let next_key = match axis {
                        Axis::Column => self.keys.key_with_column_update(key, next),
                        Axis::Row => self.keys.key_with_row_update(key, next),
                    };
                    rekeyed.push((id, next_key));
                }
                Some(_) => {}
            }
        }

        for (id, key) in rekeyed {
            self.entries.insert(id, key);
            self.log.update_key(id, key);
        }
        dropped
            .into_iter()
            .filter_map(|id| {
                let change = self.remove(id)?;
                debug!(id, key = ?change.key, "dropped change for deleted target");
                Some(change)
            })
            .collect()
    }

    /// Drop records whose keys cannot survive a refresh along `axis`.
    ///
    /// Every key carries a column index; only position keys carry a row index.
    pub fn refresh(&mut self, axis: Axis) -> Vec<DataChange> {
        let stale: Vec<ChangeId> = self
            .entries
            .iter()
            .filter(|(_, key)| axis == Axis::Column || key.is_position())
            .map(|(id, _)| *id)
            .collect();
        stale.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Drop identity-keyed records whose row no longer exists, unless their row id
    /// is in `restorable`.
    pub fn drop_unresolved_rows(&mut self, restorable: &BTreeSet<RowId>) -> Vec<DataChange> {
        let stale: Vec<ChangeId> = self
            .entries
            .iter()
            .filter(|(_, key)| match key {
                CellKey::RowIdentity { row_id, .. } => {
                    !restorable.contains(row_id) && self.keys.row_index(key).is_none()
                }
                CellKey::Position { .. } => false,
            })
            .map(|(id, _)| *id)
            .collect();
        stale
            .into_iter()
            .filter_map(|id| {
                let change = self.remove(id)?;
                debug!(id, key = ?change.key, "dropped change for removed row");
                Some(change)
            })
            .collect()
    }
}

/// Observes one kind of mutation and records it.
pub trait ChangeHandler {
    fn changes(&self) -> &KeyedChanges;

    fn changes_mut(&mut self) -> &mut KeyedChanges;

    /// Record `event` if it is a mutation this handler tracks.
    fn track(&mut self, event: &LayerEvent);

    fn is_cell_dirty(&self, column: usize, row: usize) -> bool {
        self.changes().cells().any(|cell| cell == (column, row))
    }

    fn is_row_dirty(&self, row: usize) -> bool {
        self.changes().cells().any(|(_, r)| r == row)
    }

    fn is_column_dirty(&self, column: usize) -> bool {
        self.changes().cells().any(|(c, _)| c == column)
    }
}

/// Tracks cell value edits: written-through updates or shadowed pending values.
pub struct UpdateChangeHandler {
    changes: KeyedChanges,
    mode: TrackingMode,
}

impl UpdateChangeHandler {
    pub fn new(keys: Box<dyn KeyHandler>, log: ChangeLog, mode: TrackingMode) -> Self {
        Self {
            changes: KeyedChanges::new(keys, log),
            mode,
        }
    }

    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    fn record_at(&self, column: usize, row: usize) -> Option<DataChange> {
        let key = self.changes.key_handler().key(column, row)?;
        let id = self.changes.find(&key)?;
        self.changes.get(id)
    }

    /// Shadow value of a cell in temporary mode.
    pub fn pending_value(&self, column: usize, row: usize) -> Option<CellValue> {
        match self.record_at(column, row)?.kind {
            ChangeKind::PendingUpdate { value } => Some(value),
            _ => None,
        }
    }

    /// Create or replace the pending value of a cell. Returns false when the cell
    /// has no key.
    pub fn set_pending(&mut self, column: usize, row: usize, value: CellValue) -> bool {
        let Some(key) = self.changes.key_handler().key(column, row) else {
            return false;
        };
        match self.changes.find(&key) {
            Some(id) => self
                .changes
                .log
                .update_kind(id, ChangeKind::PendingUpdate { value }),
            None => {
                self.changes.track(key, ChangeKind::PendingUpdate { value });
            }
        }
        true
    }

    /// Forget the pending value of a cell. Returns true when one existed.
    pub fn remove_pending(&mut self, column: usize, row: usize) -> bool {
        let Some(id) = self
            .changes
            .key_handler()
            .key(column, row)
            .and_then(|key| self.changes.find(&key))
        else {
            return false;
        };
        self.changes.remove(id).is_some()
    }

    fn track_update(&mut self, column: usize, row: usize, previous: &CellValue, value: &CellValue) {
        let Some(key) = self.changes.key_handler().key(column, row) else {
            debug!(column, row, "edit left untracked: cell has no key");
            return;
        };
        let Some(id) = self.changes.find(&key) else {
            self.changes.track(
                key,
                ChangeKind::Update {
                    previous: previous.clone(),
                },
            );
            return;
        };
        let original = self.changes.get(id).and_then(|change| match change.kind {
            ChangeKind::Update { previous } => Some(previous),
            _ => None,
        });
        if original.as_ref() == Some(value) {
            let _ = self.changes.remove(id);
        }
    }
}

impl ChangeHandler for UpdateChangeHandler {
    fn changes(&self) -> &KeyedChanges {
        &self.changes
    }

    fn changes_mut(&mut self) -> &mut KeyedChanges {
        &mut self.changes
    }

    fn track(&mut self, event: &LayerEvent) {
        if self.mode != TrackingMode::Persistent {
            return;
        }
        if let LayerEvent::CellValueUpdated {
            column_index,
            row_index,
            previous,
            value,
        } = event
        {
            self.track_update(*column_index, *row_index, previous, value);
        }
    }
}

/// Tracks inserted rows. Keys are `(0, row index)`.
pub struct RowInsertHandler {
    changes: KeyedChanges,
}

impl RowInsertHandler {
    pub fn new(log: ChangeLog) -> Self {
        Self {
            changes: KeyedChanges::new(Box::new(PositionKeyHandler), log),
        }
    }
}

impl ChangeHandler for RowInsertHandler {
    fn changes(&self) -> &KeyedChanges {
        &self.changes
    }

    fn changes_mut(&mut self) -> &mut KeyedChanges {
        &mut self.changes
    }

    fn track(&mut self, event: &LayerEvent) {
        if let LayerEvent::RowsInserted { indexes } = event {
            for row in indexes.positions() {
                self.changes
                    .track(CellKey::position(0, row), ChangeKind::RowInsert);
            }
        }
    }

    fn is_cell_dirty(&self, _column: usize, row: usize) -> bool {
        self.is_row_dirty(row)
    }

    fn is_column_dirty(&self, _column: usize) -> bool {
        false
    }
}

/// Tracks deleted rows. Keys are `(0, gap)`: the row index the removed row must be
/// reinserted at once every younger change has been reverted.
pub struct RowDeleteHandler {
    changes: KeyedChanges,
    /// Pre-delete indices of tracked inserted rows being deleted again.
    cancelled: BTreeSet<usize>,
}

impl RowDeleteHandler {
    pub fn new(log: ChangeLog) -> Self {
        Self {
            changes: KeyedChanges::with_row_gaps(Box::new(PositionKeyHandler), log),
            cancelled: BTreeSet::new(),
        }
    }

    /// Skip the given rows in the next deletion: they were tracked inserts, and
    /// deleting an inserted row leaves no net change.
    pub fn cancel(&mut self, rows: impl IntoIterator<Item = usize>) {
        self.cancelled.extend(rows);
    }
}

impl ChangeHandler for RowDeleteHandler {
    fn changes(&self) -> &KeyedChanges {
        &self.changes
    }

    fn changes_mut(&mut self) -> &mut KeyedChanges {
        &mut self.changes
    }

    fn track(&mut self, event: &LayerEvent) {
        let LayerEvent::RowsDeleted { rows } = event else {
            return;
        };
        let cancelled = std::mem::take(&mut self.cancelled);
        // Newest record = lowest row, so reverting newest-first reinserts ascending.
        for (ordinal, (index, row)) in rows.iter().enumerate().rev() {
            if cancelled.contains(index) {
                continue;
            }
            let gap = index - ordinal;
            self.changes.track(
                CellKey::position(0, gap),
                ChangeKind::RowDelete { row: row.clone() },
            );
        }
    }

    /// Deleted rows are not on screen.
    fn is_cell_dirty(&self, _column: usize, _row: usize) -> bool {
        false
    }

    fn is_row_dirty(&self, _row: usize) -> bool {
        false
    }

    fn is_column_dirty(&self, _column: usize) -> bool {
        false
    }
}
