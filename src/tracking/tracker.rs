//! Coordinates the change handlers over one shared change log.

use std::collections::BTreeSet;

use tracing::{debug, info};

use super::change::{ChangeId, ChangeKind, DataChange};
use super::handler::{ChangeHandler, RowDeleteHandler, RowInsertHandler, UpdateChangeHandler};
use super::key::{KeyHandler, PositionKeyHandler, RowIdentityKeyHandler};
use super::log::ChangeLog;
use crate::command::CommandOutcome;
use crate::config::{KeyStrategy, TrackingConfig, TrackingMode};
use crate::data::SharedDataProvider;
use crate::event::{LayerEvent, StructuralChangeEvent};
use crate::layer::Layer;
use crate::types::{Axis, CellValue, RowId};

/// Which direction a batch replay runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    /// Oldest first, committing each change.
    Save,
    /// Newest first, reverting each change.
    Discard,
}

/// Records pending edits and replays them on save or discard.
///
/// All indices are data-source indices.
pub struct ChangeTracker {
    log: ChangeLog,
    updates: UpdateChangeHandler,
    inserts: Option<RowInsertHandler>,
    deletes: Option<RowDeleteHandler>,
    tracking: bool,
}

impl ChangeTracker {
    pub fn new(config: &TrackingConfig, provider: &SharedDataProvider) -> Self {
        let log = ChangeLog::new();
        let keys: Box<dyn KeyHandler> = match config.keys {
            KeyStrategy::Position => Box::new(PositionKeyHandler),
            KeyStrategy::RowIdentity => Box::new(RowIdentityKeyHandler::new(provider)),
        };
        Self {
            updates: UpdateChangeHandler::new(keys, log.clone(), config.mode),
            inserts: config
                .track_row_inserts
                .then(|| RowInsertHandler::new(log.clone())),
            deletes: config
                .track_row_deletes
                .then(|| RowDeleteHandler::new(log.clone())),
            log,
            tracking: true,
        }
    }

    pub fn mode(&self) -> TrackingMode {
        self.updates.mode()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn log(&self) -> &ChangeLog {
        &self.log
    }

    /// Copy of all records in creation order.
    pub fn changes(&self) -> Vec<DataChange> {
        self.log.snapshot()
    }

    pub fn is_dirty(&self) -> bool {
        !self.log.is_empty()
    }

    fn handlers(&self) -> impl Iterator<Item = &dyn ChangeHandler> {
        let inserts = self.inserts.as_ref().map(|h| h as &dyn ChangeHandler);
        let deletes = self.deletes.as_ref().map(|h| h as &dyn ChangeHandler);
        std::iter::once(&self.updates as &dyn ChangeHandler)
            .chain(inserts)
            .chain(deletes)
    }

    pub fn is_cell_dirty(&self, column: usize, row: usize) -> bool {
        self.handlers().any(|h| h.is_cell_dirty(column, row))
    }

    pub fn is_row_dirty(&self, row: usize) -> bool {
        self.handlers().any(|h| h.is_row_dirty(row))
    }

    pub fn is_column_dirty(&self, column: usize) -> bool {
        self.handlers().any(|h| h.is_column_dirty(column))
    }

    /// Shadow value of a cell (temporary mode).
    pub fn pending_value(&self, column: usize, row: usize) -> Option<CellValue> {
        self.updates.pending_value(column, row)
    }

    /// Returns false when the cell cannot be keyed.
    pub fn set_pending(&mut self, column: usize, row: usize, value: CellValue) -> bool {
        self.updates.set_pending(column, row, value)
    }

    pub fn remove_pending(&mut self, column: usize, row: usize) -> bool {
        self.updates.remove_pending(column, row)
    }

    /// Every id reachable from a handler appears exactly once in the log, and vice
    /// versa.
    pub fn is_consistent(&self) -> bool {
        let log_ids = self.log.ids();
        let unique: BTreeSet<ChangeId> = log_ids.iter().copied().collect();
        let mut handler_ids = BTreeSet::new();
        let mut handler_count = 0;
        for handler in self.handlers() {
            for id in handler.changes().ids() {
                handler_ids.insert(id);
                handler_count += 1;
            }
        }
        unique.len() == log_ids.len() && handler_count == handler_ids.len() && unique == handler_ids
    }

    /// Observe one event coming up from the data layer.
    ///
    /// Structural changes are applied to the records first; the data notifications
    /// that follow them are then tracked against the renumbered state.
    pub fn handle_layer_event(&mut self, event: &LayerEvent) {
        if let LayerEvent::Structural(structural) = event {
            self.handle_structural_change(structural);
            return;
        }
        if !self.tracking {
            return;
        }
        self.updates.track(event);
        if let Some(inserts) = &mut self.inserts {
            inserts.track(event);
        }
        if let Some(deletes) = &mut self.deletes {
            deletes.track(event);
        }
        if matches!(event, LayerEvent::RowsDeleted { .. }) {
            self.drop_orphaned_updates();
        }
    }

    /// Forget edits of rows that were deleted for good: no deletion record holds
    /// the row to reinsert it.
    fn drop_orphaned_updates(&mut self) {
        let restorable: BTreeSet<RowId> = self
            .log
            .snapshot()
            .into_iter()
            .filter_map(|change| match change.kind {
                ChangeKind::RowDelete { row } => Some(row.id),
                _ => None,
            })
            .collect();
        let dropped = self.updates.changes_mut().drop_unresolved_rows(&restorable);
        if !dropped.is_empty() {
            debug!(dropped = dropped.len(), "dropped changes of removed rows");
        }
    }

    /// Re-key records after rows/columns were added or removed in the data source.
    ///
    /// Row records only follow row changes. Inserted rows that are deleted again
    /// cancel the deletion record the following `RowsDeleted` would create.
    pub fn handle_structural_change(&mut self, event: &StructuralChangeEvent) {
        for axis in [Axis::Column, Axis::Row] {
            let change = event.indexes(axis);
            if change.is_refresh() {
                let mut dropped = self.updates.changes_mut().refresh(axis).len();
                if axis == Axis::Row {
                    dropped += self.inserts.as_mut().map_or(0, |h| h.changes_mut().refresh(axis).len());
                    dropped += self.deletes.as_mut().map_or(0, |h| h.changes_mut().refresh(axis).len());
                }
                if dropped > 0 {
                    debug!(?axis, dropped, "refresh dropped changes");
                }
                continue;
            }
            let Some(diffs) = change.renumbering_diffs() else {
                continue;
            };
            let _ = self.updates.changes_mut().renumber(axis, diffs);
            if axis != Axis::Row {
                continue;
            }
            let dropped_inserts = self
                .inserts
                .as_mut()
                .map(|h| h.changes_mut().renumber(axis, diffs))
                .unwrap_or_default();
            if let Some(deletes) = &mut self.deletes {
                let _ = deletes.changes_mut().renumber(axis, diffs);
                if self.tracking {
                    deletes.cancel(
                        dropped_inserts
                            .iter()
                            .filter_map(|change| PositionKeyHandler.row_index(&change.key)),
                    );
                }
            }
        }
    }

    /// Commit every change, oldest first.
    pub fn save_all<L: Layer + ?Sized>(&mut self, layer: &mut L) -> Vec<LayerEvent> {
        self.replay(layer, Replay::Save)
    }

    /// Revert every change, newest first.
    pub fn discard_all<L: Layer + ?Sized>(&mut self, layer: &mut L) -> Vec<LayerEvent> {
        self.replay(layer, Replay::Discard)
    }

    fn replay<L: Layer + ?Sized>(&mut self, layer: &mut L, replay: Replay) -> Vec<LayerEvent> {
        let mut ids = self.log.ids();
        if replay == Replay::Discard {
            ids.reverse();
        }
        info!(?replay, changes = ids.len(), "replaying data changes");

        // Cells whose shadow value disappears must be redrawn.
        let mut events: Vec<LayerEvent> =
            if replay == Replay::Discard && self.mode() == TrackingMode::Temporary {
                self.updates
                    .changes()
                    .cells()
                    .map(|(column, row)| LayerEvent::CellVisualChange { column, row })
                    .collect()
            } else {
                Vec::new()
            };

        self.tracking = false;
        for id in ids {
            // Re-resolve: earlier replays may have re-keyed or dropped this record.
            let Some(change) = self.log.get(id) else {
                continue;
            };
            // Row records carry position keys, which every key handler resolves.
            let keys = self.updates.changes().key_handler();
            let outcome: CommandOutcome = match replay {
                Replay::Save => change.save(keys, layer),
                Replay::Discard => change.discard(keys, layer),
            };
            if !outcome.handled {
                debug!(id, key = ?change.key, "change could not be replayed");
            }
            for event in outcome.events {
                if let LayerEvent::Structural(structural) = &event {
                    self.handle_structural_change(structural);
                }
                events.push(event);
            }
        }
        self.tracking = true;

        self.clear();
        events.push(match replay {
            Replay::Save => LayerEvent::DataChangesSaved,
            Replay::Discard => LayerEvent::DataChangesDiscarded,
        });
        events
    }

    /// Forget every record.
    pub fn clear(&mut self) {
        self.updates.changes_mut().clear();
        if let Some(inserts) = &mut self.inserts {
            inserts.changes_mut().clear();
        }
        if let Some(deletes) = &mut self.deletes {
            deletes.changes_mut().clear();
        }
        self.log.clear();
    }
}
