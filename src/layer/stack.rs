//! The default body composition.

use tracing::info;

use super::{
    DataLayer, HideShowLayer, Labels, Layer, ReorderLayer, SelectionLayer, ViewportLayer,
};
use crate::command::{CommandOutcome, LayerCommand};
use crate::config::GridConfig;
use crate::data::SharedDataProvider;
use crate::error::Result;
use crate::persistence::{property_key, Properties};
use crate::tracking::{ChangeTracker, DataChangeLayer};
use crate::types::{Axis, CellValue};

/// Region name under which the body persists its state.
pub const BODY_REGION: &str = "BODY";

type TrackedData = DataChangeLayer<DataLayer>;
type ColumnReorder = ReorderLayer<TrackedData>;
type ColumnHide = HideShowLayer<ColumnReorder>;
type RowHide = HideShowLayer<ColumnHide>;
type Selection = SelectionLayer<RowHide>;

/// Data → change tracking → column reorder → column hide → row hide → selection →
/// viewport.
///
/// Commands issued to the stack are in viewport positions, except `ScrollTo`, which
/// takes positions of the layer beneath the viewport.
pub struct BodyLayerStack {
    viewport: ViewportLayer<Selection>,
    state_prefix: String,
}

impl BodyLayerStack {
    /// Build the stack over `provider`.
    ///
    /// # Errors
    /// Returns [`GridError::Configuration`](crate::error::GridError::Configuration)
    /// when `config` does not validate.
    pub fn new(provider: SharedDataProvider, config: &GridConfig) -> Result<Self> {
        config.validate()?;
        let tracker = ChangeTracker::new(&config.tracking, &provider);
        let data = DataChangeLayer::new(DataLayer::new(provider), tracker);
        let reorder = ReorderLayer::new(data, Axis::Column);
        let column_hide = HideShowLayer::new(reorder, Axis::Column);
        let row_hide = HideShowLayer::new(column_hide, Axis::Row);
        let selection = SelectionLayer::new(row_hide);
        let viewport = ViewportLayer::new(selection, config.viewport);
        info!(
            columns = viewport.column_count(),
            rows = viewport.row_count(),
            mode = ?config.tracking.mode,
            "body layer stack built"
        );
        Ok(Self {
            viewport,
            state_prefix: config.state_prefix.clone(),
        })
    }

    pub fn viewport(&self) -> &ViewportLayer<Selection> {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportLayer<Selection> {
        &mut self.viewport
    }

    pub fn selection(&self) -> &Selection {
        self.viewport.underlying()
    }

    pub fn row_hide(&self) -> &RowHide {
        self.selection().underlying()
    }

    pub fn column_hide(&self) -> &ColumnHide {
        self.row_hide().underlying()
    }

    pub fn column_reorder(&self) -> &ColumnReorder {
        self.column_hide().underlying()
    }

    pub fn data_change(&self) -> &TrackedData {
        self.column_reorder().underlying()
    }

    pub fn data(&self) -> &DataLayer {
        self.data_change().underlying()
    }

    pub fn tracker(&self) -> &ChangeTracker {
        self.data_change().tracker()
    }

    pub fn state_prefix(&self) -> &str {
        &self.state_prefix
    }

    /// State of the whole body under the configured prefix.
    pub fn save(&self) -> Properties {
        let mut properties = Properties::new();
        self.save_state(&self.state_prefix, &mut properties);
        properties
    }

    /// Restore state written by [`BodyLayerStack::save`].
    pub fn load(&mut self, properties: &Properties) -> CommandOutcome {
        let prefix = self.state_prefix.clone();
        self.load_state(&prefix, properties)
    }
}

impl Layer for BodyLayerStack {
    fn count(&self, axis: Axis) -> usize {
        self.viewport.count(axis)
    }

    fn local_to_underlying(&self, axis: Axis, position: usize) -> Option<usize> {
        self.viewport.local_to_underlying(axis, position)
    }

    fn underlying_to_local(&self, axis: Axis, position: usize) -> Option<usize> {
        self.viewport.underlying_to_local(axis, position)
    }

    fn local_to_underlying_boundary(&self, axis: Axis, position: usize) -> Option<usize> {
        self.viewport.local_to_underlying_boundary(axis, position)
    }

    fn index_by_position(&self, axis: Axis, position: usize) -> Option<usize> {
        self.viewport.index_by_position(axis, position)
    }

    fn position_by_index(&self, axis: Axis, index: usize) -> Option<usize> {
        self.viewport.position_by_index(axis, index)
    }

    fn data_value(&self, column: usize, row: usize) -> Option<CellValue> {
        self.viewport.data_value(column, row)
    }

    fn size(&self, axis: Axis, position: usize) -> Option<u32> {
        self.viewport.size(axis, position)
    }

    fn labels(&self, column: usize, row: usize) -> Labels {
        self.viewport.labels(column, row)
    }

    fn do_command(&mut self, command: &LayerCommand) -> CommandOutcome {
        self.viewport.do_command(command)
    }

    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        self.viewport
            .save_state(&property_key(prefix, BODY_REGION), properties);
    }

    fn load_state(&mut self, prefix: &str, properties: &Properties) -> CommandOutcome {
        self.viewport
            .load_state(&property_key(prefix, BODY_REGION), properties)
    }
}
