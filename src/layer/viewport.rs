//! Visible window over the layer beneath.

use tracing::trace;

use super::{Labels, Layer};
use crate::command::{CommandOutcome, LayerCommand};
use crate::config::ViewportConfig;
use crate::event::{renumber::renumber_gap, AxisChange, LayerEvent, StructuralChangeEvent};
use crate::persistence::Properties;
use crate::types::{Axis, CellValue, Range};

/// Shows `visible_columns × visible_rows` underlying positions starting at an origin.
///
/// `ScrollTo` is interpreted in the underlying (scrollable) positions, since a
/// target outside the window has no local position.
pub struct ViewportLayer<L> {
    underlying: L,
    origin_column: usize,
    origin_row: usize,
    visible_columns: usize,
    visible_rows: usize,
}

impl<L: Layer> ViewportLayer<L> {
    pub fn new(underlying: L, config: ViewportConfig) -> Self {
        Self {
            underlying,
            origin_column: 0,
            origin_row: 0,
            visible_columns: config.visible_columns,
            visible_rows: config.visible_rows,
        }
    }

    pub fn underlying(&self) -> &L {
        &self.underlying
    }

    pub fn underlying_mut(&mut self) -> &mut L {
        &mut self.underlying
    }

    /// First visible underlying position along `axis`.
    pub fn origin(&self, axis: Axis) -> usize {
        match axis {
            Axis::Column => self.origin_column,
            Axis::Row => self.origin_row,
        }
    }

    fn origin_mut(&mut self, axis: Axis) -> &mut usize {
        match axis {
            Axis::Column => &mut self.origin_column,
            Axis::Row => &mut self.origin_row,
        }
    }

    fn visible(&self, axis: Axis) -> usize {
        match axis {
            Axis::Column => self.visible_columns,
            Axis::Row => self.visible_rows,
        }
    }

    /// Underlying positions currently shown along `axis`.
    pub fn window(&self, axis: Axis) -> Range {
        let origin = self.origin(axis);
        Range::new(origin, origin + self.count(axis))
    }

    /// Change the window size, keeping the origin where possible.
    pub fn set_visible(&mut self, columns: usize, rows: usize) {
        self.visible_columns = columns;
        self.visible_rows = rows;
        self.clamp(Axis::Column);
        self.clamp(Axis::Row);
    }

    fn clamp(&mut self, axis: Axis) {
        let max = self
            .underlying
            .count(axis)
            .saturating_sub(self.visible(axis));
        let origin = self.origin_mut(axis);
        *origin = (*origin).min(max);
    }

    fn scroll_to(&mut self, column: usize, row: usize) -> CommandOutcome {
        if column >= self.underlying.column_count() || row >= self.underlying.row_count() {
            return CommandOutcome::unhandled();
        }
        let mut event = StructuralChangeEvent::default();
        for (axis, target) in [(Axis::Column, column), (Axis::Row, row)] {
            let origin = self.origin(axis);
            let visible = self.visible(axis).max(1);
            let next = if target < origin {
                target
            } else if target >= origin + visible {
                target + 1 - visible
            } else {
                origin
            };
            if next != origin {
                *self.origin_mut(axis) = next;
                event = event.with_positions(axis, AxisChange::Refresh);
            }
        }
        trace!(column, row, "scrolled");
        if event == StructuralChangeEvent::default() {
            return CommandOutcome::handled(Vec::new());
        }
        CommandOutcome::handled(vec![LayerEvent::Structural(event)])
    }

    fn handle_layer_event(&mut self, event: LayerEvent) -> Option<LayerEvent> {
        match event {
            LayerEvent::Structural(structural) => {
                Some(LayerEvent::Structural(self.handle_structural_change(&structural)))
            }
            other => other.map_cell(|axis, p| self.underlying_to_local(axis, p)),
        }
    }

    fn handle_structural_change(&mut self, event: &StructuralChangeEvent) -> StructuralChangeEvent {
        let mut translated = event.clone();
        for axis in [Axis::Column, Axis::Row] {
            let change = event.positions(axis);
            let previous = self.origin(axis);
            if let Some(diffs) = change.renumbering_diffs() {
                *self.origin_mut(axis) = renumber_gap(previous, diffs);
            }
            self.clamp(axis);

            let visible = self.visible(axis);
            let origin = self.origin(axis);
            let count = self.count(axis);
            translated = translated.translated(
                axis,
                |p| p.checked_sub(previous).filter(|local| *local < visible),
                |p| p.checked_sub(origin).filter(|local| *local < count),
            );
        }
        translated
    }
}

impl<L: Layer> Layer for ViewportLayer<L> {
    fn count(&self, axis: Axis) -> usize {
        self.underlying
            .count(axis)
            .saturating_sub(self.origin(axis))
            .min(self.visible(axis))
    }

    fn local_to_underlying(&self, axis: Axis, position: usize) -> Option<usize> {
        (position < self.count(axis)).then(|| self.origin(axis) + position)
    }

    fn underlying_to_local(&self, axis: Axis, position: usize) -> Option<usize> {
        position
            .checked_sub(self.origin(axis))
            .filter(|local| *local < self.count(axis))
    }

    fn index_by_position(&self, axis: Axis, position: usize) -> Option<usize> {
        let underlying = self.local_to_underlying(axis, position)?;
        self.underlying.index_by_position(axis, underlying)
    }

    fn position_by_index(&self, axis: Axis, index: usize) -> Option<usize> {
        let underlying = self.underlying.position_by_index(axis, index)?;
        self.underlying_to_local(axis, underlying)
    }

    fn data_value(&self, column: usize, row: usize) -> Option<CellValue> {
        self.underlying.data_value(
            self.local_to_underlying(Axis::Column, column)?,
            self.local_to_underlying(Axis::Row, row)?,
        )
    }

    fn size(&self, axis: Axis, position: usize) -> Option<u32> {
        self.underlying
            .size(axis, self.local_to_underlying(axis, position)?)
    }

    fn labels(&self, column: usize, row: usize) -> Labels {
        match (
            self.local_to_underlying(Axis::Column, column),
            self.local_to_underlying(Axis::Row, row),
        ) {
            (Some(column), Some(row)) => self.underlying.labels(column, row),
            _ => Labels::new(),
        }
    }

    fn do_command(&mut self, command: &LayerCommand) -> CommandOutcome {
        if let LayerCommand::ScrollTo { column, row } = command {
            return self.scroll_to(*column, *row);
        }
        let Some(converted) = command.convert_to_underlying(self) else {
            return CommandOutcome::unhandled();
        };
        self.underlying
            .do_command(&converted)
            .map_events(|e| self.handle_layer_event(e))
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
