//! Common test utilities for building layer stacks and reading them back.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use gridlayer::{
    Axis, BodyLayerStack, CellValue, DataProvider, GridConfig, KeyStrategy, Layer, LayerCommand,
    ListDataProvider, RowId, RowObject, TrackingMode,
};

/// Configuration whose viewport shows everything the tests create.
pub fn config() -> GridConfig {
    let mut config = GridConfig::default();
    config.viewport.visible_columns = 100;
    config.viewport.visible_rows = 100;
    config
}

pub fn config_with(mode: TrackingMode, keys: KeyStrategy) -> GridConfig {
    let mut config = config();
    config.tracking.mode = mode;
    config.tracking.keys = keys;
    config
}

/// A body over a `columns × rows` sample grid (cells read `"c{column}r{row}"`).
pub fn body(columns: usize, rows: usize) -> BodyLayerStack {
    body_with(columns, rows, &config())
}

pub fn body_with(columns: usize, rows: usize, config: &GridConfig) -> BodyLayerStack {
    let provider = ListDataProvider::sample(columns, rows).into_shared();
    BodyLayerStack::new(provider, config).expect("valid configuration")
}

/// Column indices in visible order.
pub fn column_indexes(body: &BodyLayerStack) -> Vec<usize> {
    (0..body.column_count())
        .map(|p| body.column_index_by_position(p).unwrap())
        .collect()
}

/// Row indices in visible order.
pub fn row_indexes(body: &BodyLayerStack) -> Vec<usize> {
    (0..body.row_count())
        .map(|p| body.row_index_by_position(p).unwrap())
        .collect()
}

/// Value read straight from the data provider.
pub fn source_value(body: &BodyLayerStack, column: usize, row: usize) -> Option<CellValue> {
    let provider = body.data().provider();
    let value = provider.borrow().value(column, row);
    value
}

pub fn update(column: usize, row: usize, value: &str) -> LayerCommand {
    LayerCommand::UpdateCell {
        column,
        row,
        value: value.into(),
    }
}

pub fn reorder_columns(from: &[usize], to: usize) -> LayerCommand {
    LayerCommand::Reorder {
        axis: Axis::Column,
        from: from.to_vec(),
        to,
    }
}

pub fn hide(axis: Axis, positions: &[usize]) -> LayerCommand {
    LayerCommand::Hide {
        axis,
        positions: positions.to_vec(),
    }
}

pub fn delete_rows(positions: &[usize]) -> LayerCommand {
    LayerCommand::DeleteRows {
        positions: positions.to_vec(),
    }
}

/// Insert one data row with `columns` cells reading `"new{id}"`.
pub fn insert_row(position: usize, id: u64, columns: usize) -> LayerCommand {
    LayerCommand::InsertRows {
        position,
        rows: vec![RowObject::new(
            RowId(id),
            vec![CellValue::Text(format!("new{id}")); columns],
        )],
    }
}

/// Issue a command and require that some layer handled it.
pub fn run(body: &mut BodyLayerStack, command: &LayerCommand) -> Vec<gridlayer::LayerEvent> {
    let outcome = body.do_command(command);
    assert!(outcome.handled, "command not handled: {command:?}");
    outcome.events
}
