//! Layer hosting the change tracker.

use tracing::debug;

use super::tracker::ChangeTracker;
use crate::command::{CommandOutcome, LayerCommand};
use crate::config::TrackingMode;
use crate::event::LayerEvent;
use crate::layer::{Labels, Layer, DIRTY_LABEL};
use crate::persistence::Properties;
use crate::types::{Axis, CellValue};

/// Tracks data changes made through it; maps coordinates 1:1.
///
/// In temporary mode edits are shadowed here and never reach the layer beneath
/// until saved. In persistent mode they pass through and the tracker remembers the
/// values they replaced.
pub struct DataChangeLayer<L> {
    underlying: L,
    tracker: ChangeTracker,
}

impl<L: Layer> DataChangeLayer<L> {
    pub fn new(underlying: L, tracker: ChangeTracker) -> Self {
        Self {
            underlying,
            tracker,
        }
    }

    pub fn underlying(&self) -> &L {
        &self.underlying
    }

    pub fn underlying_mut(&mut self) -> &mut L {
        &mut self.underlying
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    fn indexes(&self, column: usize, row: usize) -> Option<(usize, usize)> {
        Some((
            self.underlying.index_by_position(Axis::Column, column)?,
            self.underlying.index_by_position(Axis::Row, row)?,
        ))
    }

    /// Temporary-mode edit: shadow the value instead of writing it.
    fn update_pending(&mut self, column: usize, row: usize, value: &CellValue) -> CommandOutcome {
        let Some(visible) = self.data_value(column, row) else {
            return CommandOutcome::unhandled();
        };
        if visible == *value {
            return CommandOutcome::handled(Vec::new());
        }
        let Some((column_index, row_index)) = self.indexes(column, row) else {
            return CommandOutcome::unhandled();
        };
        let original = self.underlying.data_value(column, row);
        let changed = if original.as_ref() == Some(value) {
            self.tracker.remove_pending(column_index, row_index)
        } else {
            self.tracker
                .set_pending(column_index, row_index, value.clone())
        };
        if !changed {
            debug!(column_index, row_index, "edit written through: cell has no key");
            return self.forward(&LayerCommand::UpdateCell {
                column,
                row,
                value: value.clone(),
            });
        }
        CommandOutcome::handled(vec![LayerEvent::CellVisualChange { column, row }])
    }

    fn forward(&mut self, command: &LayerCommand) -> CommandOutcome {
        self.underlying
            .do_command(command)
            .map_events(|e| self.handle_layer_event(e))
    }

    fn handle_layer_event(&mut self, event: LayerEvent) -> Option<LayerEvent> {
        self.tracker.handle_layer_event(&event);
        Some(event)
    }
}

impl<L: Layer> Layer for DataChangeLayer<L> {
    fn count(&self, axis: Axis) -> usize {
        self.underlying.count(axis)
    }

    fn local_to_underlying(&self, axis: Axis, position: usize) -> Option<usize> {
        (position < self.count(axis)).then_some(position)
    }

    fn underlying_to_local(&self, axis: Axis, position: usize) -> Option<usize> {
        (position < self.count(axis)).then_some(position)
    }

    fn local_to_underlying_boundary(&self, axis: Axis, position: usize) -> Option<usize> {
        (position <= self.count(axis)).then_some(position)
    }

    fn index_by_position(&self, axis: Axis, position: usize) -> Option<usize> {
        self.underlying.index_by_position(axis, position)
    }

    fn position_by_index(&self, axis: Axis, index: usize) -> Option<usize> {
        self.underlying.position_by_index(axis, index)
    }

    fn data_value(&self, column: usize, row: usize) -> Option<CellValue> {
        if self.tracker.mode() == TrackingMode::Temporary {
            if let Some((column_index, row_index)) = self.indexes(column, row) {
                if let Some(value) = self.tracker.pending_value(column_index, row_index) {
                    return Some(value);
                }
            }
        }
        self.underlying.data_value(column, row)
    }

    fn size(&self, axis: Axis, position: usize) -> Option<u32> {
        self.underlying.size(axis, position)
    }

    fn labels(&self, column: usize, row: usize) -> Labels {
        let mut labels = self.underlying.labels(column, row);
        if let Some((column_index, row_index)) = self.indexes(column, row) {
            if self.tracker.is_cell_dirty(column_index, row_index) {
                labels.push(DIRTY_LABEL);
            }
        }
        labels
    }

    fn do_command(&mut self, command: &LayerCommand) -> CommandOutcome {
        match command {
            LayerCommand::UpdateCell { column, row, value }
                if self.tracker.mode() == TrackingMode::Temporary =>
            {
                self.update_pending(*column, *row, value)
            }
            LayerCommand::SaveDataChanges => {
                CommandOutcome::handled(self.tracker.save_all(&mut self.underlying))
            }
            LayerCommand::DiscardDataChanges => {
                CommandOutcome::handled(self.tracker.discard_all(&mut self.underlying))
            }
            _ => self.forward(command),
        }
    }

    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        self.underlying.save_state(prefix, properties);
    }

    fn load_state(&mut self, prefix: &str, properties: &Properties) -> CommandOutcome {
        self.underlying
            .load_state(prefix, properties)
            .map_events(|e| self.handle_layer_event(e))
    }
}
