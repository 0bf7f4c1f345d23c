//! Explicit position order along one axis.

use tracing::{debug, warn};

use super::{Labels, Layer};
use crate::command::{CommandOutcome, LayerCommand};
use crate::event::{
    renumber::renumber_order, AxisChange, LayerEvent, StructuralChangeEvent, StructuralDiff,
};
use crate::persistence::{decode_list, encode_list, property_key, Properties};
use crate::types::{Axis, CellValue, Range};

/// Reorders the positions of one axis of the layer beneath.
///
/// `order[local]` is the underlying position shown at `local`.
pub struct ReorderLayer<L> {
    underlying: L,
    axis: Axis,
    order: Vec<usize>,
}

impl<L: Layer> ReorderLayer<L> {
    pub fn new(underlying: L, axis: Axis) -> Self {
        let order = (0..underlying.count(axis)).collect();
        Self {
            underlying,
            axis,
            order,
        }
    }

    pub fn underlying(&self) -> &L {
        &self.underlying
    }

    pub fn underlying_mut(&mut self) -> &mut L {
        &mut self.underlying
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Underlying positions in local order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    fn order_key(&self, prefix: &str) -> String {
        property_key(prefix, &format!("{}IndexOrder", self.axis.property_name()))
    }

    fn reset(&mut self) {
        self.order = (0..self.underlying.count(self.axis)).collect();
    }

    fn reorder(&mut self, from: &[usize], to: usize) -> CommandOutcome {
        let Some((deleted, added)) = move_positions(&mut self.order, from, to) else {
            return CommandOutcome::unhandled();
        };
        if deleted.is_empty() {
            return CommandOutcome::handled(Vec::new());
        }
        debug!(axis = ?self.axis, ?from, to, "positions reordered");
        let mut diffs: Vec<StructuralDiff> =
            deleted.into_iter().map(StructuralDiff::delete).collect();
        diffs.push(StructuralDiff::add(added.start, added.width()));
        CommandOutcome::handled(vec![LayerEvent::Structural(
            StructuralChangeEvent::positional(self.axis, diffs),
        )])
    }

    /// Translate an event from the underlying layer into this layer's positions.
    pub(crate) fn handle_layer_event(&mut self, event: LayerEvent) -> Option<LayerEvent> {
        match event {
            LayerEvent::Structural(structural) => {
                Some(LayerEvent::Structural(self.handle_structural_change(&structural)))
            }
            other => other.map_cell(|axis, p| self.underlying_to_local(axis, p)),
        }
    }

    fn handle_structural_change(&mut self, event: &StructuralChangeEvent) -> StructuralChangeEvent {
        let change = event.positions(self.axis);
        if change.is_refresh() {
            self.reset();
            return event.clone();
        }
        let previous = if change.changes_structure() {
            let previous = self.order.clone();
            match change.renumbering_diffs() {
                Some(diffs) => renumber_order(&mut self.order, diffs),
                // Reorder below: underlying positions no longer name the same items.
                None => self.reset(),
            }
            previous
        } else {
            self.order.clone()
        };
        let order = &self.order;
        event.translated(
            self.axis,
            |p| previous.iter().position(|u| *u == p),
            |p| order.iter().position(|u| *u == p),
        )
    }
}

/// Move the entries at local positions `from` so they land before `to`.
///
/// Returns the deleted local ranges (before the move) and the added local range
/// (after the move), or `None` when a position is out of range. A move that leaves
/// the order untouched yields no deleted ranges.
fn move_positions(order: &mut Vec<usize>, from: &[usize], to: usize) -> Option<(Vec<Range>, Range)> {
    let mut moved_positions: Vec<usize> = from.to_vec();
    moved_positions.sort_unstable();
    moved_positions.dedup();
    if moved_positions.is_empty()
        || to > order.len()
        || moved_positions.iter().any(|p| *p >= order.len())
    {
        return None;
    }

    let below = moved_positions.iter().filter(|p| **p < to).count();
    let insert_at = to - below;
    let width = moved_positions.len();

    let mut moved = Vec::with_capacity(width);
    let mut remaining = Vec::with_capacity(order.len() - width);
    for (position, &entry) in order.iter().enumerate() {
        if moved_positions.binary_search(&position).is_ok() {
            moved.push(entry);
        } else {
            remaining.push(entry);
        }
    }
    let tail = remaining.split_off(insert_at.min(remaining.len()));
    remaining.extend(moved);
    remaining.extend(tail);

    if remaining == *order {
        return Some((Vec::new(), Range::empty_at(insert_at)));
    }
    *order = remaining;
    Some((
        Range::from_positions(moved_positions),
        Range::new(insert_at, insert_at + width),
    ))
}

fn is_permutation(order: &[usize], count: usize) -> bool {
    let mut sorted = order.to_vec();
    sorted.sort_unstable();
    sorted.len() == count && sorted.iter().enumerate().all(|(i, v)| i == *v)
}

impl<L: Layer> Layer for ReorderLayer<L> {
    fn count(&self, axis: Axis) -> usize {
        if axis == self.axis {
            self.order.len()
        } else {
            self.underlying.count(axis)
        }
    }

    fn local_to_underlying(&self, axis: Axis, position: usize) -> Option<usize> {
        if axis == self.axis {
            self.order.get(position).copied()
        } else {
            (position < self.underlying.count(axis)).then_some(position)
        }
    }

    fn underlying_to_local(&self, axis: Axis, position: usize) -> Option<usize> {
        if axis == self.axis {
            self.order.iter().position(|u| *u == position)
        } else {
            (position < self.underlying.count(axis)).then_some(position)
        }
    }

    fn local_to_underlying_boundary(&self, axis: Axis, position: usize) -> Option<usize> {
        if position == self.count(axis) {
            Some(self.underlying.count(axis))
        } else {
            self.local_to_underlying(axis, position)
        }
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
        if let LayerCommand::Reorder { axis, from, to } = command {
            if *axis == self.axis {
                return self.reorder(from, *to);
            }
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
        properties.set(self.order_key(prefix), encode_list(self.order.iter().copied()));
    }

    fn load_state(&mut self, prefix: &str, properties: &Properties) -> CommandOutcome {
        let mut outcome = self
            .underlying
            .load_state(prefix, properties)
            .map_events(|e| self.handle_layer_event(e));

        let key = self.order_key(prefix);
        let Some(raw) = properties.get(&key) else {
            return outcome;
        };
        match decode_list(&key, raw) {
            Ok(order) if is_permutation(&order, self.underlying.count(self.axis)) => {
                if order != self.order {
                    debug!(key = %key, "order restored");
                    self.order = order;
                    outcome.events.push(LayerEvent::Structural(
                        StructuralChangeEvent::default().with_positions(self.axis, AxisChange::Refresh),
                    ));
                }
            }
            Ok(_) => warn!(key = %key, value = raw, "ignoring order that does not match the data"),
            Err(e) => warn!(error = %e, "ignoring malformed order"),
        }
        outcome
    }
}
