//! Commands issued to a layer stack.
//!
//! A command is expressed in the position space of the layer it is issued to. Layers
//! that do not handle a command convert it to their underlying layer's positions and
//! pass it down.

use crate::event::LayerEvent;
use crate::layer::Layer;
use crate::types::{Axis, CellValue, RowObject};

/// Everything a layer stack can be asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerCommand {
    /// Set the value of one cell.
    UpdateCell {
        column: usize,
        row: usize,
        value: CellValue,
    },
    /// Insert row objects before `position` (`position == row count` appends).
    InsertRows { position: usize, rows: Vec<RowObject> },
    /// Delete the rows at the given positions.
    DeleteRows { positions: Vec<usize> },
    /// Insert `count` empty columns before `position`.
    InsertColumns { position: usize, count: usize },
    /// Delete the columns at the given positions.
    DeleteColumns { positions: Vec<usize> },
    /// Move the given positions so they land before `to`.
    Reorder {
        axis: Axis,
        from: Vec<usize>,
        to: usize,
    },
    /// Hide the given positions.
    Hide { axis: Axis, positions: Vec<usize> },
    /// Show everything hidden along `axis`.
    ShowAll { axis: Axis },
    /// Show the given hidden indices.
    ShowIndexes { axis: Axis, indexes: Vec<usize> },
    /// Set the size (pixels) of one position.
    Resize {
        axis: Axis,
        position: usize,
        size: u32,
    },
    /// Bring a cell into the visible window.
    ScrollTo { column: usize, row: usize },
    /// Select one cell; `extend` grows the selection from the anchor, `toggle` adds.
    Select {
        column: usize,
        row: usize,
        extend: bool,
        toggle: bool,
    },
    /// Select an entire column or row.
    SelectAxis { axis: Axis, position: usize },
    SelectAll,
    ClearSelection,
    /// Commit every pending data change.
    SaveDataChanges,
    /// Revert every pending data change.
    DiscardDataChanges,
    /// Re-read the structure of the data source.
    StructuralRefresh,
}

impl LayerCommand {
    /// Convert this command from `layer`'s positions into its underlying layer's.
    ///
    /// Returns `None` when a single position the command depends on does not map.
    /// Multi-position commands drop positions that do not map.
    pub fn convert_to_underlying<L: Layer + ?Sized>(&self, layer: &L) -> Option<LayerCommand> {
        let single = |axis: Axis, position: usize| layer.local_to_underlying(axis, position);
        let many = |axis: Axis, positions: &[usize]| -> Vec<usize> {
            positions
                .iter()
                .filter_map(|&p| layer.local_to_underlying(axis, p))
                .collect()
        };

        let converted = match self {
            LayerCommand::UpdateCell { column, row, value } => LayerCommand::UpdateCell {
                column: single(Axis::Column, *column)?,
                row: single(Axis::Row, *row)?,
                value: value.clone(),
            },
            LayerCommand::InsertRows { position, rows } => LayerCommand::InsertRows {
                position: layer.local_to_underlying_boundary(Axis::Row, *position)?,
                rows: rows.clone(),
            },
            LayerCommand::DeleteRows { positions } => LayerCommand::DeleteRows {
                positions: many(Axis::Row, positions),
            },
            LayerCommand::InsertColumns { position, count } => LayerCommand::InsertColumns {
                position: layer.local_to_underlying_boundary(Axis::Column, *position)?,
                count: *count,
            },
            LayerCommand::DeleteColumns { positions } => LayerCommand::DeleteColumns {
                positions: many(Axis::Column, positions),
            },
            LayerCommand::Reorder { axis, from, to } => LayerCommand::Reorder {
                axis: *axis,
                from: many(*axis, from),
                to: layer.local_to_underlying_boundary(*axis, *to)?,
            },
            LayerCommand::Hide { axis, positions } => LayerCommand::Hide {
                axis: *axis,
                positions: many(*axis, positions),
            },
            LayerCommand::Resize {
                axis,
                position,
                size,
            } => LayerCommand::Resize {
                axis: *axis,
                position: single(*axis, *position)?,
                size: *size,
            },
            LayerCommand::ScrollTo { column, row } => LayerCommand::ScrollTo {
                column: single(Axis::Column, *column)?,
                row: single(Axis::Row, *row)?,
            },
            LayerCommand::Select {
                column,
                row,
                extend,
                toggle,
            } => LayerCommand::Select {
                column: single(Axis::Column, *column)?,
                row: single(Axis::Row, *row)?,
                extend: *extend,
                toggle: *toggle,
            },
            LayerCommand::SelectAxis { axis, position } => LayerCommand::SelectAxis {
                axis: *axis,
                position: single(*axis, *position)?,
            },
            LayerCommand::ShowAll { .. }
            | LayerCommand::ShowIndexes { .. }
            | LayerCommand::SelectAll
            | LayerCommand::ClearSelection
            | LayerCommand::SaveDataChanges
            | LayerCommand::DiscardDataChanges
            | LayerCommand::StructuralRefresh => self.clone(),
        };
        Some(converted)
    }
}

/// Result of issuing a command: whether some layer handled it, and the events it
/// produced, expressed in the position space of the layer that returned the outcome.
#[derive(Debug, Clone, PartialEq, Default)]
#[must_use]
pub struct CommandOutcome {
    pub handled: bool,
    pub events: Vec<LayerEvent>,
}

impl CommandOutcome {
    /// Handled, with the given events.
    pub fn handled(events: Vec<LayerEvent>) -> Self {
        Self {
            handled: true,
            events,
        }
    }

    /// Nobody handled the command.
    pub fn unhandled() -> Self {
        Self::default()
    }

    /// Pass every event through `f` (typically a layer's event handler), keeping the
    /// translated results.
    pub fn map_events<F>(self, f: F) -> Self
    where
        F: FnMut(LayerEvent) -> Option<LayerEvent>,
    {
        Self {
            handled: self.handled,
            events: self.events.into_iter().filter_map(f).collect(),
        }
    }
}
