//! Events flowing upward through a layer stack.
//!
//! Every event is expressed in the position space of the layer that returned it.
//! A layer receiving an event from below builds a *new* event in its own space
//! instead of mutating the one it received.

mod diff;
pub mod renumber;
mod translate;

pub use diff::{is_reorder, DiffKind, StructuralDiff};
pub use translate::{offset_diffs, translate_diffs};

use crate::types::{Axis, CellValue, Range, RowObject};

/// How one axis changed in a structural change event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AxisChange {
    /// Nothing changed along this axis.
    #[default]
    Unchanged,
    /// Granular diffs.
    Diffs(Vec<StructuralDiff>),
    /// Structure changed without granular diffs: cached state must be discarded.
    Refresh,
}

impl AxisChange {
    /// The granular diffs, if any.
    pub fn diffs(&self) -> Option<&[StructuralDiff]> {
        match self {
            AxisChange::Diffs(diffs) => Some(diffs),
            AxisChange::Unchanged | AxisChange::Refresh => None,
        }
    }

    pub fn is_refresh(&self) -> bool {
        matches!(self, AxisChange::Refresh)
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, AxisChange::Unchanged)
    }

    /// True for a pure reorder (one delete and one add of equal width).
    pub fn is_reorder(&self) -> bool {
        self.diffs().is_some_and(is_reorder)
    }

    /// True when positions were added or removed (not merely changed in place).
    pub fn changes_structure(&self) -> bool {
        self.is_refresh()
            || self
                .diffs()
                .is_some_and(|diffs| diffs.iter().any(|d| d.kind != DiffKind::Change))
    }

    /// Diffs that require renumbering of caches: present, adding or removing
    /// positions, and not a reorder.
    pub fn renumbering_diffs(&self) -> Option<&[StructuralDiff]> {
        self.diffs()
            .filter(|diffs| !is_reorder(diffs))
            .filter(|diffs| diffs.iter().any(|d| d.kind != DiffKind::Change))
    }
}

/// Insert, delete, reorder or refresh of rows and/or columns.
///
/// `columns`/`rows` are in the emitting layer's position space. `column_indexes` /
/// `row_indexes` describe the same change in index space when the underlying data
/// itself changed; they are forwarded unchanged by every layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuralChangeEvent {
    pub columns: AxisChange,
    pub rows: AxisChange,
    pub column_indexes: AxisChange,
    pub row_indexes: AxisChange,
}

impl StructuralChangeEvent {
    /// Positional change along one axis (index space untouched).
    pub fn positional(axis: Axis, diffs: Vec<StructuralDiff>) -> Self {
        Self::default().with_positions(axis, AxisChange::Diffs(diffs))
    }

    /// Change of the underlying data along one axis: positions and indices coincide.
    pub fn data(axis: Axis, diffs: Vec<StructuralDiff>) -> Self {
        Self::default()
            .with_positions(axis, AxisChange::Diffs(diffs.clone()))
            .with_indexes(axis, AxisChange::Diffs(diffs))
    }

    /// Full refresh of both axes.
    pub fn refresh() -> Self {
        Self {
            columns: AxisChange::Refresh,
            rows: AxisChange::Refresh,
            column_indexes: AxisChange::Refresh,
            row_indexes: AxisChange::Refresh,
        }
    }

    /// Positional change along `axis`.
    pub fn positions(&self, axis: Axis) -> &AxisChange {
        match axis {
            Axis::Column => &self.columns,
            Axis::Row => &self.rows,
        }
    }

    /// Index-space change along `axis`.
    pub fn indexes(&self, axis: Axis) -> &AxisChange {
        match axis {
            Axis::Column => &self.column_indexes,
            Axis::Row => &self.row_indexes,
        }
    }

    #[must_use]
    pub fn with_positions(mut self, axis: Axis, change: AxisChange) -> Self {
        match axis {
            Axis::Column => self.columns = change,
            Axis::Row => self.rows = change,
        }
        self
    }

    #[must_use]
    pub fn with_indexes(mut self, axis: Axis, change: AxisChange) -> Self {
        match axis {
            Axis::Column => self.column_indexes = change,
            Axis::Row => self.row_indexes = change,
        }
        self
    }

    /// Build the event seen one layer up along `axis`, keeping everything else.
    #[must_use]
    pub fn translated<B, A>(&self, axis: Axis, before: B, after: A) -> Self
    where
        B: Fn(usize) -> Option<usize>,
        A: Fn(usize) -> Option<usize>,
    {
        let change = match self.positions(axis) {
            AxisChange::Diffs(diffs) => AxisChange::Diffs(translate_diffs(diffs, before, after)),
            other => other.clone(),
        };
        self.clone().with_positions(axis, change)
    }
}

/// Notifications returned by layers as commands execute.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    /// One cell must be redrawn because its content or state changed.
    CellVisualChange { column: usize, row: usize },
    /// Lighter-weight redraw hint: a calculated value for one cell landed.
    CellVisualUpdate { column: usize, row: usize },
    /// The data source applied a value update (index space).
    CellValueUpdated {
        column_index: usize,
        row_index: usize,
        previous: CellValue,
        value: CellValue,
    },
    /// Rows were inserted into the data source (index space).
    RowsInserted { indexes: Range },
    /// Rows were removed from the data source; indices are pre-removal, ascending.
    RowsDeleted { rows: Vec<(usize, RowObject)> },
    /// Rows or columns were inserted, deleted, reordered or refreshed.
    Structural(StructuralChangeEvent),
    /// The selection changed.
    SelectionChanged,
    /// All pending data changes were saved.
    DataChangesSaved,
    /// All pending data changes were discarded.
    DataChangesDiscarded,
}

impl LayerEvent {
    /// Re-express a cell-visual event in another position space.
    ///
    /// Events that carry no positions are returned unchanged; cell events whose
    /// position does not map are dropped.
    pub fn map_cell<F>(self, map: F) -> Option<LayerEvent>
    where
        F: Fn(Axis, usize) -> Option<usize>,
    {
        match self {
            LayerEvent::CellVisualChange { column, row } => Some(LayerEvent::CellVisualChange {
                column: map(Axis::Column, column)?,
                row: map(Axis::Row, row)?,
            }),
            LayerEvent::CellVisualUpdate { column, row } => Some(LayerEvent::CellVisualUpdate {
                column: map(Axis::Column, column)?,
                row: map(Axis::Row, row)?,
            }),
            other => Some(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_event_sets_positions_and_indexes() {
        let event = StructuralChangeEvent::data(Axis::Row, vec![StructuralDiff::add(2, 1)]);
        assert_eq!(event.positions(Axis::Row), event.indexes(Axis::Row));
        assert!(event.positions(Axis::Column).is_unchanged());
    }

    #[test]
    fn test_reorder_is_not_renumbering() {
        let change = AxisChange::Diffs(vec![
            StructuralDiff::delete(Range::single(1)),
            StructuralDiff::add(3, 1),
        ]);
        assert!(change.is_reorder());
        assert!(change.renumbering_diffs().is_none());
        assert!(change.changes_structure());
    }

    #[test]
    fn test_resize_is_not_structural() {
        let change = AxisChange::Diffs(vec![StructuralDiff::change(Range::single(2))]);
        assert!(!change.changes_structure());
        assert!(change.renumbering_diffs().is_none());
    }

    #[test]
    fn test_translated_leaves_other_axis() {
        let event = StructuralChangeEvent::data(Axis::Column, vec![StructuralDiff::add(4, 1)]);
        let up = event.translated(Axis::Row, |p| p.checked_sub(1), |p| p.checked_sub(1));
        assert_eq!(up, event);

        let shifted = event.translated(Axis::Column, |p| p.checked_sub(1), |p| p.checked_sub(1));
        assert_eq!(
            shifted.positions(Axis::Column),
            &AxisChange::Diffs(vec![StructuralDiff::add(3, 1)])
        );
        assert_eq!(shifted.indexes(Axis::Column), event.indexes(Axis::Column));
    }

    #[test]
    fn test_map_cell_drops_unmapped() {
        let event = LayerEvent::CellVisualChange { column: 1, row: 1 };
        assert_eq!(event.map_cell(|_, _| None), None);
        assert_eq!(
            LayerEvent::DataChangesSaved.map_cell(|_, _| None),
            Some(LayerEvent::DataChangesSaved)
        );
    }

    #[test]
    fn test_map_cell_shifts_visual_update() {
        let event = LayerEvent::CellVisualUpdate { column: 4, row: 7 };
        assert_eq!(
            event.map_cell(|_, p| p.checked_sub(2)),
            Some(LayerEvent::CellVisualUpdate { column: 2, row: 5 })
        );
    }
}
