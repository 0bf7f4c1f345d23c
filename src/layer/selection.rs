//! Selected cells.

use tracing::trace;

use super::{Labels, Layer, SELECT_LABEL};
use crate::command::{CommandOutcome, LayerCommand};
use crate::event::renumber::{renumber_index, reorder_position};
use crate::event::{LayerEvent, StructuralChangeEvent, StructuralDiff};
use crate::persistence::Properties;
use crate::types::{Axis, CellValue, Range, Selection};

/// Tracks selected rectangles in its own positions; maps coordinates 1:1.
pub struct SelectionLayer<L> {
    underlying: L,
    /// `(column, row)` the last plain selection started at.
    anchor: Option<(usize, usize)>,
    selections: Vec<Selection>,
}

impl<L: Layer> SelectionLayer<L> {
    pub fn new(underlying: L) -> Self {
        Self {
            underlying,
            anchor: None,
            selections: Vec::new(),
        }
    }

    pub fn underlying(&self) -> &L {
        &self.underlying
    }

    pub fn underlying_mut(&mut self) -> &mut L {
        &mut self.underlying
    }

    pub fn anchor(&self) -> Option<(usize, usize)> {
        self.anchor
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn is_selected(&self, column: usize, row: usize) -> bool {
        self.selections.iter().any(|s| s.contains(column, row))
    }

    fn in_range(&self, column: usize, row: usize) -> bool {
        column < self.column_count() && row < self.row_count()
    }

    fn select(&mut self, column: usize, row: usize, extend: bool, toggle: bool) -> CommandOutcome {
        if !self.in_range(column, row) {
            return CommandOutcome::unhandled();
        }
        match (extend, self.anchor) {
            (true, Some((anchor_col, anchor_row))) => {
                let rect = Selection::cells((anchor_col, anchor_row), (column, row));
                match self.selections.last_mut() {
                    Some(last) => *last = rect,
                    None => self.selections.push(rect),
                }
            }
            _ => {
                if !toggle {
                    self.selections.clear();
                }
                self.selections.push(Selection::cells((column, row), (column, row)));
                self.anchor = Some((column, row));
            }
        }
        trace!(column, row, extend, toggle, "selected");
        CommandOutcome::handled(vec![LayerEvent::SelectionChanged])
    }

    fn select_axis(&mut self, axis: Axis, position: usize) -> CommandOutcome {
        if position >= self.count(axis) {
            return CommandOutcome::unhandled();
        }
        self.selections.clear();
        let (selection, anchor) = match axis {
            Axis::Column => (Selection::columns(Range::single(position)), (position, 0)),
            Axis::Row => (Selection::rows(Range::single(position)), (0, position)),
        };
        self.selections.push(selection);
        self.anchor = Some(anchor);
        CommandOutcome::handled(vec![LayerEvent::SelectionChanged])
    }

    fn replace(&mut self, selections: Vec<Selection>, anchor: Option<(usize, usize)>) -> CommandOutcome {
        self.selections = selections;
        self.anchor = anchor;
        CommandOutcome::handled(vec![LayerEvent::SelectionChanged])
    }

    fn handle_layer_event(&mut self, event: LayerEvent) -> Option<LayerEvent> {
        if let LayerEvent::Structural(structural) = &event {
            self.handle_structural_change(structural);
        }
        Some(event)
    }

    fn handle_structural_change(&mut self, event: &StructuralChangeEvent) {
        if event.columns.is_refresh() || event.rows.is_refresh() {
            self.selections.clear();
            self.anchor = None;
            return;
        }
        for axis in [Axis::Column, Axis::Row] {
            let change = event.positions(axis);
            if let Some(diffs) = change.diffs().filter(|_| change.is_reorder()) {
                self.follow_reorder(axis, diffs);
            }
        }
        let column_diffs = event.columns.renumbering_diffs();
        let row_diffs = event.rows.renumbering_diffs();
        if column_diffs.is_none() && row_diffs.is_none() {
            return;
        }
        self.selections.clear();
        self.anchor = self.anchor.and_then(|(column, row)| {
            let column = match column_diffs {
                Some(diffs) => renumber_index(column, diffs)?,
                None => column,
            };
            let row = match row_diffs {
                Some(diffs) => renumber_index(row, diffs)?,
                None => row,
            };
            Some((column, row))
        });
    }

    /// Move the anchor and selected spans along with reordered positions.
    ///
    /// A span whose positions are no longer contiguous splits into several
    /// selections.
    fn follow_reorder(&mut self, axis: Axis, diffs: &[StructuralDiff]) {
        self.anchor = self.anchor.and_then(|(column, row)| match axis {
            Axis::Column => Some((reorder_position(column, diffs)?, row)),
            Axis::Row => Some((column, reorder_position(row, diffs)?)),
        });
        self.selections = std::mem::take(&mut self.selections)
            .into_iter()
            .flat_map(|selection| match selection.span(axis) {
                None => vec![selection],
                Some(span) => {
                    let moved = span.positions().filter_map(|p| reorder_position(p, diffs));
                    Range::from_positions(moved)
                        .into_iter()
                        .map(|range| selection.with_span(axis, range))
                        .collect()
                }
            })
            .collect();
        trace!(?axis, selections = self.selections.len(), "selection followed reorder");
    }
}

impl<L: Layer> Layer for SelectionLayer<L> {
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
        self.underlying.data_value(column, row)
    }

    fn size(&self, axis: Axis, position: usize) -> Option<u32> {
        self.underlying.size(axis, position)
    }

    fn labels(&self, column: usize, row: usize) -> Labels {
        let mut labels = self.underlying.labels(column, row);
        if self.is_selected(column, row) {
            labels.push(SELECT_LABEL);
        }
        labels
    }

    fn do_command(&mut self, command: &LayerCommand) -> CommandOutcome {
        match command {
            LayerCommand::Select {
                column,
                row,
                extend,
                toggle,
            } => self.select(*column, *row, *extend, *toggle),
            LayerCommand::SelectAxis { axis, position } => self.select_axis(*axis, *position),
            LayerCommand::SelectAll => self.replace(vec![Selection::all()], Some((0, 0))),
            LayerCommand::ClearSelection => self.replace(Vec::new(), None),
            _ => self
                .underlying
                .do_command(command)
                .map_events(|e| self.handle_layer_event(e)),
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
