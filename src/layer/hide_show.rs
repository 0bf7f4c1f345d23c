//! Hidden indices along one axis.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::{Labels, Layer};
use crate::command::{CommandOutcome, LayerCommand};
use crate::event::{
    renumber::renumber_set, AxisChange, LayerEvent, StructuralChangeEvent, StructuralDiff,
};
use crate::persistence::{decode_set, encode_list, property_key, Properties};
use crate::types::{Axis, CellValue, Range};

/// Hides positions of one axis of the layer beneath.
///
/// The hidden set holds data-source indices, so it survives reorders below and is
/// renumbered only when the data itself gains or loses rows/columns.
pub struct HideShowLayer<L> {
    underlying: L,
    axis: Axis,
    hidden: BTreeSet<usize>,
    /// Underlying positions that are visible, ascending.
    visible: Vec<usize>,
}

impl<L: Layer> HideShowLayer<L> {
    pub fn new(underlying: L, axis: Axis) -> Self {
        let mut layer = Self {
            underlying,
            axis,
            hidden: BTreeSet::new(),
            visible: Vec::new(),
        };
        layer.rebuild();
        layer
    }

    pub fn underlying(&self) -> &L {
        &self.underlying
    }

    pub fn underlying_mut(&mut self) -> &mut L {
        &mut self.underlying
    }

    /// Hidden data-source indices.
    pub fn hidden_indexes(&self) -> &BTreeSet<usize> {
        &self.hidden
    }

    pub fn is_index_hidden(&self, index: usize) -> bool {
        self.hidden.contains(&index)
    }

    fn hidden_key(&self, prefix: &str) -> String {
        property_key(prefix, &format!("hidden{}Indexes", self.axis.title()))
    }

    fn rebuild(&mut self) {
        let axis = self.axis;
        let underlying = &self.underlying;
        let hidden = &self.hidden;
        self.visible = (0..underlying.count(axis))
            .filter(|&p| {
                underlying
                    .index_by_position(axis, p)
                    .is_some_and(|index| !hidden.contains(&index))
            })
            .collect();
    }

    fn local_of(visible: &[usize], position: usize) -> Option<usize> {
        visible.binary_search(&position).ok()
    }

    fn hide(&mut self, positions: &[usize]) -> CommandOutcome {
        let local: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|p| *p < self.visible.len())
            .collect();
        let indexes: Vec<usize> = local
            .iter()
            .filter_map(|&p| self.index_by_position(self.axis, p))
            .collect();
        if indexes.is_empty() {
            return CommandOutcome::unhandled();
        }
        self.hidden.extend(indexes.iter().copied());
        self.rebuild();
        debug!(axis = ?self.axis, ?indexes, "hidden");
        let diffs = Range::from_positions(local)
            .into_iter()
            .map(StructuralDiff::delete)
            .collect();
        CommandOutcome::handled(vec![LayerEvent::Structural(
            StructuralChangeEvent::positional(self.axis, diffs),
        )])
    }

    fn show(&mut self, indexes: &BTreeSet<usize>) -> CommandOutcome {
        let shown: BTreeSet<usize> = self.hidden.intersection(indexes).copied().collect();
        if shown.is_empty() {
            return CommandOutcome::handled(Vec::new());
        }
        self.hidden.retain(|index| !shown.contains(index));
        self.rebuild();
        debug!(axis = ?self.axis, ?shown, "shown");
        let local = shown
            .iter()
            .filter_map(|&index| self.position_by_index(self.axis, index));
        let diffs = StructuralDiff::adds(&Range::from_positions(local));
        CommandOutcome::handled(vec![LayerEvent::Structural(
            StructuralChangeEvent::positional(self.axis, diffs),
        )])
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
        match event.indexes(self.axis) {
            AxisChange::Refresh => self.hidden.clear(),
            change => {
                if let Some(diffs) = change.renumbering_diffs() {
                    self.hidden = renumber_set(&self.hidden, diffs);
                }
            }
        }
        let previous = std::mem::take(&mut self.visible);
        self.rebuild();
        let visible = &self.visible;
        event.translated(
            self.axis,
            |p| Self::local_of(&previous, p),
            |p| Self::local_of(visible, p),
        )
    }
}

impl<L: Layer> Layer for HideShowLayer<L> {
    fn count(&self, axis: Axis) -> usize {
        if axis == self.axis {
            self.visible.len()
        } else {
            self.underlying.count(axis)
        }
    }

    fn local_to_underlying(&self, axis: Axis, position: usize) -> Option<usize> {
        if axis == self.axis {
            self.visible.get(position).copied()
        } else {
            (position < self.underlying.count(axis)).then_some(position)
        }
    }

    fn underlying_to_local(&self, axis: Axis, position: usize) -> Option<usize> {
        if axis == self.axis {
            Self::local_of(&self.visible, position)
        } else {
            (position < self.underlying.count(axis)).then_some(position)
        }
    }

    fn local_to_underlying_boundary(&self, axis: Axis, position: usize) -> Option<usize> {
        if axis == self.axis && position == self.visible.len() {
            // Append after the last visible position, ahead of trailing hidden ones.
            return Some(
                self.visible
                    .last()
                    .map_or(self.underlying.count(axis), |last| last + 1),
            );
        }
        if position == self.count(axis) {
            return Some(self.underlying.count(axis));
        }
        self.local_to_underlying(axis, position)
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
        match command {
            LayerCommand::Hide { axis, positions } if *axis == self.axis => self.hide(positions),
            LayerCommand::ShowAll { axis } if *axis == self.axis => {
                let all = self.hidden.clone();
                self.show(&all)
            }
            LayerCommand::ShowIndexes { axis, indexes } if *axis == self.axis => {
                self.show(&indexes.iter().copied().collect())
            }
            _ => {
                let Some(converted) = command.convert_to_underlying(self) else {
                    return CommandOutcome::unhandled();
                };
                self.underlying
                    .do_command(&converted)
                    .map_events(|e| self.handle_layer_event(e))
            }
        }
    }

    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        self.underlying.save_state(prefix, properties);
        let key = self.hidden_key(prefix);
        if self.hidden.is_empty() {
            properties.remove(&key);
        } else {
            properties.set(key, encode_list(self.hidden.iter().copied()));
        }
    }

    fn load_state(&mut self, prefix: &str, properties: &Properties) -> CommandOutcome {
        let mut outcome = self
            .underlying
            .load_state(prefix, properties)
            .map_events(|e| self.handle_layer_event(e));

        let key = self.hidden_key(prefix);
        let Some(raw) = properties.get(&key) else {
            return outcome;
        };
        match decode_set(&key, raw) {
            Ok(hidden) => {
                let count = self.underlying.count(self.axis);
                let hidden: BTreeSet<usize> = hidden.into_iter().filter(|i| *i < count).collect();
                if hidden != self.hidden {
                    debug!(key = %key, ?hidden, "hidden indexes restored");
                    self.hidden = hidden;
                    self.rebuild();
                    outcome.events.push(LayerEvent::Structural(
                        StructuralChangeEvent::default().with_positions(self.axis, AxisChange::Refresh),
                    ));
                }
            }
            Err(e) => warn!(error = %e, "ignoring malformed hidden indexes"),
        }
        outcome
    }
}
