//! Column reordering through the full body stack
//!
//! Reorder commands move positions so they land before the target position;
//! inserts and deletes underneath renumber the explicit order.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use common::{body, column_indexes, reorder_columns, run};
use gridlayer::{Axis, Layer, LayerCommand, LayerEvent};
use test_case::test_case;

#[test]
fn test_reorder_moves_then_moves_again() {
    let mut body = body(6, 2);
    run(&mut body, &reorder_columns(&[3], 6));
    assert_eq!(column_indexes(&body), vec![0, 1, 2, 4, 5, 3]);
    run(&mut body, &reorder_columns(&[3], 5));
    assert_eq!(column_indexes(&body), vec![0, 1, 2, 5, 4, 3]);
    assert_eq!(body.column_reorder().order(), &[0, 1, 2, 5, 4, 3]);
}

#[test]
fn test_insert_and_delete_renumber_order() {
    let mut body = body(6, 2);
    run(&mut body, &reorder_columns(&[3], 6));
    run(&mut body, &reorder_columns(&[3], 5));

    // Insert before the column holding index 3 (shown at position 5).
    run(
        &mut body,
        &LayerCommand::InsertColumns {
            position: 5,
            count: 1,
        },
    );
    assert_eq!(column_indexes(&body), vec![0, 1, 2, 3, 6, 5, 4]);
    assert_eq!(body.data_value(3, 0), Some(gridlayer::CellValue::Empty));

    // Delete the inserted column again.
    run(&mut body, &LayerCommand::DeleteColumns { positions: vec![3] });
    assert_eq!(column_indexes(&body), vec![0, 1, 2, 5, 4, 3]);
    assert_eq!(body.data_value(3, 1), Some("c5r1".into()));
}

#[test]
fn test_reorder_event_reaches_top_as_reorder() {
    let mut body = body(4, 1);
    let events = run(&mut body, &reorder_columns(&[0], 4));
    let [LayerEvent::Structural(event)] = events.as_slice() else {
        panic!("expected one structural event, got {events:?}");
    };
    assert!(event.positions(Axis::Column).is_reorder());
    assert!(event.indexes(Axis::Column).is_unchanged());
}

#[test]
fn test_invalid_reorder_not_handled() {
    let mut body = body(4, 1);
    assert!(!body.do_command(&reorder_columns(&[7], 0)).handled);
    assert!(!body.do_command(&reorder_columns(&[0], 9)).handled);
    assert_eq!(column_indexes(&body), vec![0, 1, 2, 3]);
}

#[test_case(&[(&[3], 6), (&[3], 5)] ; "single moves")]
#[test_case(&[(&[0, 1], 6), (&[5], 0)] ; "block to end then back")]
#[test_case(&[(&[1, 4], 3), (&[2, 3, 5], 0), (&[0], 2)] ; "split blocks")]
fn test_position_index_roundtrip(moves: &[(&[usize], usize)]) {
    let mut body = body(6, 3);
    run(&mut body, &LayerCommand::Hide {
        axis: Axis::Row,
        positions: vec![1],
    });
    for (from, to) in moves {
        run(&mut body, &reorder_columns(from, *to));
    }
    let mut seen = column_indexes(&body);
    for position in 0..body.column_count() {
        let index = body.column_index_by_position(position).unwrap();
        assert_eq!(body.column_position_by_index(index), Some(position));
    }
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(body.column_index_by_position(6), None);
    assert_eq!(body.row_position_by_index(1), None);
}

#[test]
fn test_values_follow_reorder() {
    let mut body = body(3, 2);
    run(&mut body, &reorder_columns(&[2], 0));
    assert_eq!(body.data_value(0, 1), Some("c2r1".into()));
    assert_eq!(body.data_value(1, 1), Some("c0r1".into()));
}
