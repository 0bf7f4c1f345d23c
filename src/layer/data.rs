//! Root layer: positions are data-source indices.

use std::rc::Rc;

use tracing::{debug, trace};

use super::{Labels, Layer, SizeConfig};
use crate::command::{CommandOutcome, LayerCommand};
use crate::data::SharedDataProvider;
use crate::event::{LayerEvent, StructuralChangeEvent, StructuralDiff};
use crate::persistence::Properties;
use crate::types::{Axis, CellValue, Range, RowObject};

/// Layer over a [`DataProvider`](crate::data::DataProvider).
///
/// Executes value and structural edits against the provider and owns the column
/// widths and row heights.
pub struct DataLayer {
    provider: SharedDataProvider,
    widths: SizeConfig,
    heights: SizeConfig,
}

impl DataLayer {
    pub fn new(provider: SharedDataProvider) -> Self {
        let (columns, rows) = {
            let data = provider.borrow();
            (data.column_count(), data.row_count())
        };
        Self {
            provider,
            widths: SizeConfig::columns(columns),
            heights: SizeConfig::rows(rows),
        }
    }

    /// Handle to the shared provider.
    pub fn provider(&self) -> SharedDataProvider {
        Rc::clone(&self.provider)
    }

    pub fn sizes(&self, axis: Axis) -> &SizeConfig {
        match axis {
            Axis::Column => &self.widths,
            Axis::Row => &self.heights,
        }
    }

    fn sizes_mut(&mut self, axis: Axis) -> &mut SizeConfig {
        match axis {
            Axis::Column => &mut self.widths,
            Axis::Row => &mut self.heights,
        }
    }

    /// Apply a data-space structural edit to the size tables and build its event.
    fn structural(&mut self, axis: Axis, diffs: Vec<StructuralDiff>) -> LayerEvent {
        let count = self.count(axis);
        self.sizes_mut(axis).apply_diffs(&diffs, count);
        LayerEvent::Structural(StructuralChangeEvent::data(axis, diffs))
    }

    fn update_cell(&mut self, column: usize, row: usize, value: &CellValue) -> CommandOutcome {
        let Some(previous) = self.provider.borrow().value(column, row) else {
            return CommandOutcome::unhandled();
        };
        if previous == *value {
            return CommandOutcome::handled(Vec::new());
        }
        self.provider
            .borrow_mut()
            .set_value(column, row, value.clone());
        trace!(column, row, "cell updated");
        CommandOutcome::handled(vec![
            LayerEvent::CellValueUpdated {
                column_index: column,
                row_index: row,
                previous,
                value: value.clone(),
            },
            LayerEvent::CellVisualChange { column, row },
        ])
    }

    fn insert_rows(&mut self, position: usize, rows: &[RowObject]) -> CommandOutcome {
        if position > self.row_count() || rows.is_empty() {
            return CommandOutcome::unhandled();
        }
        let mut inserted = 0;
        {
            let mut data = self.provider.borrow_mut();
            for row in rows {
                if data.insert_row(position + inserted, row.clone()) {
                    inserted += 1;
                }
            }
        }
        if inserted == 0 {
            return CommandOutcome::unhandled();
        }
        debug!(position, count = inserted, "rows inserted");
        let event = self.structural(Axis::Row, vec![StructuralDiff::add(position, inserted)]);
        CommandOutcome::handled(vec![
            event,
            LayerEvent::RowsInserted {
                indexes: Range::new(position, position + inserted),
            },
        ])
    }

    fn delete_rows(&mut self, positions: &[usize]) -> CommandOutcome {
        let count = self.row_count();
        let mut targets: Vec<usize> = positions.iter().copied().filter(|p| *p < count).collect();
        targets.sort_unstable();
        targets.dedup();
        if targets.is_empty() {
            return CommandOutcome::unhandled();
        }

        let mut removed = Vec::with_capacity(targets.len());
        {
            let mut data = self.provider.borrow_mut();
            for &index in targets.iter().rev() {
                if let Some(row) = data.remove_row(index) {
                    removed.push((index, row));
                }
            }
        }
        removed.reverse();
        debug!(count = removed.len(), "rows deleted");

        let diffs = Range::from_positions(removed.iter().map(|(i, _)| *i))
            .into_iter()
            .map(StructuralDiff::delete)
            .collect();
        let event = self.structural(Axis::Row, diffs);
        CommandOutcome::handled(vec![event, LayerEvent::RowsDeleted { rows: removed }])
    }

    fn insert_columns(&mut self, position: usize, count: usize) -> CommandOutcome {
        if position > self.column_count() || count == 0 {
            return CommandOutcome::unhandled();
        }
        let mut inserted = 0;
        {
            let mut data = self.provider.borrow_mut();
            for _ in 0..count {
                if data.insert_column(position) {
                    inserted += 1;
                }
            }
        }
        debug!(position, count = inserted, "columns inserted");
        let event = self.structural(Axis::Column, vec![StructuralDiff::add(position, inserted)]);
        CommandOutcome::handled(vec![event])
    }

    fn delete_columns(&mut self, positions: &[usize]) -> CommandOutcome {
        let count = self.column_count();
        let mut targets: Vec<usize> = positions.iter().copied().filter(|p| *p < count).collect();
        targets.sort_unstable();
        targets.dedup();
        if targets.is_empty() {
            return CommandOutcome::unhandled();
        }
        {
            let mut data = self.provider.borrow_mut();
            for &index in targets.iter().rev() {
                data.remove_column(index);
            }
        }
        debug!(count = targets.len(), "columns deleted");
        let diffs = Range::from_positions(targets)
            .into_iter()
            .map(StructuralDiff::delete)
            .collect();
        let event = self.structural(Axis::Column, diffs);
        CommandOutcome::handled(vec![event])
    }

    fn resize(&mut self, axis: Axis, position: usize, size: u32) -> CommandOutcome {
        if position >= self.count(axis) {
            return CommandOutcome::unhandled();
        }
        self.sizes_mut(axis).set_size(position, size);
        CommandOutcome::handled(vec![LayerEvent::Structural(
            StructuralChangeEvent::positional(
                axis,
                vec![StructuralDiff::change(Range::single(position))],
            ),
        )])
    }

    fn refresh(&mut self) -> CommandOutcome {
        let (columns, rows) = (self.column_count(), self.row_count());
        self.widths.reset_count(columns);
        self.heights.reset_count(rows);
        debug!(columns, rows, "structure refreshed");
        CommandOutcome::handled(vec![LayerEvent::Structural(
            StructuralChangeEvent::refresh(),
        )])
    }
}

impl Layer for DataLayer {
    fn count(&self, axis: Axis) -> usize {
        let data = self.provider.borrow();
        match axis {
            Axis::Column => data.column_count(),
            Axis::Row => data.row_count(),
        }
    }

    fn local_to_underlying(&self, axis: Axis, position: usize) -> Option<usize> {
        (position < self.count(axis)).then_some(position)
    }

    fn underlying_to_local(&self, axis: Axis, position: usize) -> Option<usize> {
        (position < self.count(axis)).then_some(position)
    }

    fn index_by_position(&self, axis: Axis, position: usize) -> Option<usize> {
        self.local_to_underlying(axis, position)
    }

    fn position_by_index(&self, axis: Axis, index: usize) -> Option<usize> {
        self.underlying_to_local(axis, index)
    }

    fn data_value(&self, column: usize, row: usize) -> Option<CellValue> {
        self.provider.borrow().value(column, row)
    }

    fn size(&self, axis: Axis, position: usize) -> Option<u32> {
        (position < self.count(axis)).then(|| self.sizes(axis).size(position))
    }

    fn labels(&self, _column: usize, _row: usize) -> Labels {
        Labels::new()
    }

    fn do_command(&mut self, command: &LayerCommand) -> CommandOutcome {
        match command {
            LayerCommand::UpdateCell { column, row, value } => {
                self.update_cell(*column, *row, value)
            }
            LayerCommand::InsertRows { position, rows } => self.insert_rows(*position, rows),
            LayerCommand::DeleteRows { positions } => self.delete_rows(positions),
            LayerCommand::InsertColumns { position, count } => {
                self.insert_columns(*position, *count)
            }
            LayerCommand::DeleteColumns { positions } => self.delete_columns(positions),
            LayerCommand::Resize {
                axis,
                position,
                size,
            } => self.resize(*axis, *position, *size),
            LayerCommand::StructuralRefresh => self.refresh(),
            _ => CommandOutcome::unhandled(),
        }
    }

    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        self.widths.save_state(prefix, properties);
        self.heights.save_state(prefix, properties);
    }

    fn load_state(&mut self, prefix: &str, properties: &Properties) -> CommandOutcome {
        let mut events = Vec::new();
        for axis in [Axis::Column, Axis::Row] {
            let count = self.count(axis);
            if self.sizes_mut(axis).load_state(prefix, properties) && count > 0 {
                events.push(LayerEvent::Structural(StructuralChangeEvent::positional(
                    axis,
                    vec![StructuralDiff::change(Range::new(0, count))],
                )));
            }
        }
        CommandOutcome::handled(events)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::data::ListDataProvider;
    use crate::event::AxisChange;

    fn layer() -> DataLayer {
        DataLayer::new(ListDataProvider::sample(4, 6).into_shared())
    }

    #[test]
    fn test_update_emits_previous_value() {
        let mut layer = layer();
        let outcome = layer.do_command(&LayerCommand::UpdateCell {
            column: 1,
            row: 2,
            value: "x".into(),
        });
        assert!(outcome.handled);
        assert_eq!(
            outcome.events[0],
            LayerEvent::CellValueUpdated {
                column_index: 1,
                row_index: 2,
                previous: "c1r2".into(),
                value: "x".into(),
            }
        );
        assert_eq!(layer.data_value(1, 2), Some("x".into()));
    }

    #[test]
    fn test_update_to_same_value_is_silent() {
        let mut layer = layer();
        let outcome = layer.do_command(&LayerCommand::UpdateCell {
            column: 0,
            row: 0,
            value: "c0r0".into(),
        });
        assert!(outcome.handled);
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn test_delete_rows_reports_removed_objects() {
        let mut layer = layer();
        let outcome = layer.do_command(&LayerCommand::DeleteRows {
            positions: vec![4, 1, 2],
        });
        assert_eq!(layer.row_count(), 3);
        let LayerEvent::Structural(event) = &outcome.events[0] else {
            panic!("expected structural event");
        };
        assert_eq!(
            event.indexes(Axis::Row),
            &AxisChange::Diffs(vec![
                StructuralDiff::delete(Range::new(1, 3)),
                StructuralDiff::delete(Range::single(4)),
            ])
        );
        let LayerEvent::RowsDeleted { rows } = &outcome.events[1] else {
            panic!("expected rows deleted");
        };
        let indexes: Vec<usize> = rows.iter().map(|(i, _)| *i).collect();
        assert_eq!(indexes, vec![1, 2, 4]);
        assert_eq!(rows[0].1.cell(0), Some(&"c0r1".into()));
    }

    #[test]
    fn test_sizes_follow_column_insert() {
        let mut layer = layer();
        let _ = layer.do_command(&LayerCommand::Resize {
            axis: Axis::Column,
            position: 2,
            size: 42,
        });
        let _ = layer.do_command(&LayerCommand::InsertColumns {
            position: 1,
            count: 1,
        });
        assert_eq!(layer.size(Axis::Column, 3), Some(42));
        assert_eq!(layer.size(Axis::Column, 5), None);
    }

    #[test]
    fn test_invalid_positions_are_unhandled() {
        let mut layer = layer();
        assert!(!layer
            .do_command(&LayerCommand::InsertRows {
                position: 7,
                rows: Vec::new(),
            })
            .handled);
        assert!(!layer
            .do_command(&LayerCommand::DeleteRows {
                positions: vec![9],
            })
            .handled);
        assert_eq!(layer.local_to_underlying(Axis::Row, 6), None);
    }
}
