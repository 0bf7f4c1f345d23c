//! Viewport clipping and selection through the full body stack

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use common::{body, body_with, config, delete_rows, hide, reorder_columns, run, update};
use gridlayer::{Axis, BodyLayerStack, Layer, LayerCommand, LayerEvent, SELECT_LABEL};

fn small() -> BodyLayerStack {
    let mut config = config();
    config.viewport.visible_columns = 2;
    config.viewport.visible_rows = 3;
    body_with(5, 10, &config)
}

fn select(column: usize, row: usize, extend: bool) -> LayerCommand {
    LayerCommand::Select {
        column,
        row,
        extend,
        toggle: false,
    }
}

#[test]
fn test_viewport_clips() {
    let body = small();
    assert_eq!(body.column_count(), 2);
    assert_eq!(body.row_count(), 3);
    assert_eq!(body.data_value(2, 0), None);
    assert_eq!(body.row_position_by_index(5), None);
}

#[test]
fn test_scroll_then_edit_reaches_right_cell() {
    let mut body = small();
    let events = run(&mut body, &LayerCommand::ScrollTo { column: 4, row: 9 });
    assert_eq!(events.len(), 1);
    assert_eq!(body.viewport().origin(Axis::Column), 3);
    assert_eq!(body.viewport().origin(Axis::Row), 7);
    assert_eq!(body.data_value(1, 2), Some("c4r9".into()));

    run(&mut body, &update(0, 0, "x"));
    assert!(body.tracker().is_cell_dirty(3, 7));
    assert_eq!(body.data_value(0, 0), Some("x".into()));
}

#[test]
fn test_scroll_skips_hidden_rows() {
    let mut body = small();
    run(&mut body, &hide(Axis::Row, &[0, 1]));
    run(&mut body, &LayerCommand::ScrollTo { column: 0, row: 7 });
    // Rows 2..=9 remain; the window ends at the eighth of them.
    assert_eq!(body.row_index_by_position(2), Some(9));
}

#[test]
fn test_origin_follows_delete_above_window() {
    let mut body = small();
    run(&mut body, &LayerCommand::ScrollTo { column: 0, row: 6 });
    assert_eq!(body.viewport().origin(Axis::Row), 4);
    assert_eq!(body.row_index_by_position(0), Some(4));

    // Position 0 of the viewport is index 4; delete it and check the top row.
    run(&mut body, &delete_rows(&[0]));
    assert_eq!(body.viewport().origin(Axis::Row), 4);
    assert_eq!(body.data_value(0, 0), Some("c0r5".into()));
}

#[test]
fn test_select_extend_labels_cells() {
    let mut body = small();
    let events = run(&mut body, &select(0, 0, false));
    assert_eq!(events, vec![LayerEvent::SelectionChanged]);
    run(&mut body, &select(1, 2, true));
    for column in 0..2 {
        for row in 0..3 {
            assert_eq!(body.labels(column, row), vec![SELECT_LABEL]);
        }
    }
    run(&mut body, &LayerCommand::ClearSelection);
    assert!(body.labels(1, 1).is_empty());
}

#[test]
fn test_select_all_and_axis() {
    let mut body = small();
    run(&mut body, &LayerCommand::SelectAll);
    assert!(body.selection().is_selected(4, 9));
    run(
        &mut body,
        &LayerCommand::SelectAxis {
            axis: Axis::Column,
            position: 1,
        },
    );
    assert!(body.selection().is_selected(1, 8));
    assert!(!body.selection().is_selected(0, 8));
}

#[test]
fn test_row_delete_clears_rectangles_keeps_anchor() {
    let mut body = small();
    run(&mut body, &select(1, 2, false));
    run(&mut body, &delete_rows(&[0]));
    assert!(body.selection().selections().is_empty());
    assert_eq!(body.selection().anchor(), Some((1, 1)));
}

#[test]
fn test_dirty_and_selected_labels_combine() {
    let mut body = small();
    run(&mut body, &update(1, 1, "x"));
    run(&mut body, &select(1, 1, false));
    assert_eq!(body.labels(1, 1), vec![gridlayer::DIRTY_LABEL, SELECT_LABEL]);
}

#[test]
fn test_selection_follows_reordered_column() {
    let mut body = body(6, 4);
    run(&mut body, &select(1, 1, false));
    run(&mut body, &reorder_columns(&[1], 4));

    assert_eq!(body.column_index_by_position(3), Some(1));
    assert_eq!(body.labels(3, 1), vec![SELECT_LABEL]);
    assert!(body.labels(1, 1).is_empty());
    assert_eq!(body.selection().anchor(), Some((3, 1)));
}
