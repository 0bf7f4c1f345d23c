//! Change tracking through the full body stack
//!
//! Edits are tracked as change records keyed by cell identity, renumbered on
//! structural changes and saved (oldest first) or discarded (newest first).

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use common::{
    body, body_with, config, config_with, delete_rows, insert_row, reorder_columns, run,
    source_value, update,
};
use gridlayer::layer::DataLayer;
use gridlayer::tracking::{ChangeKind, RowIdentityKeyHandler};
use gridlayer::{
    BodyLayerStack, CellKey, CellValue, GridConfig, KeyStrategy, Layer, LayerCommand, LayerEvent,
    ListDataProvider, RowId, RowObject, TrackingMode, DIRTY_LABEL,
};

fn without_delete_tracking() -> GridConfig {
    let mut config = config();
    config.tracking.track_row_deletes = false;
    config
}

#[test]
fn test_edit_then_delete_above_renumbers_key() {
    let mut body = body_with(3, 8, &without_delete_tracking());
    run(&mut body, &update(1, 5, "x"));
    assert_eq!(body.tracker().changes().len(), 1);

    run(&mut body, &delete_rows(&[3]));
    let changes = body.tracker().changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].key, CellKey::position(1, 4));
    assert!(body.tracker().is_cell_dirty(1, 4));
    assert!(!body.tracker().is_cell_dirty(1, 5));

    run(&mut body, &LayerCommand::DiscardDataChanges);
    assert_eq!(source_value(&body, 1, 4), Some("c1r5".into()));
    assert_eq!(body.row_count(), 7);
    assert!(!body.tracker().is_dirty());
}

#[test]
fn test_discard_reinserts_deleted_row_before_reverting() {
    let mut body = body(3, 8);
    run(&mut body, &update(1, 5, "x"));
    run(&mut body, &delete_rows(&[3]));
    assert_eq!(body.tracker().changes().len(), 2);

    let events = run(&mut body, &LayerCommand::DiscardDataChanges);
    assert_eq!(events.last(), Some(&LayerEvent::DataChangesDiscarded));
    assert_eq!(body.row_count(), 8);
    assert_eq!(source_value(&body, 1, 3), Some("c1r3".into()));
    assert_eq!(source_value(&body, 1, 5), Some("c1r5".into()));
    assert!(body.tracker().is_consistent());
}

fn edit_then_delete_row(keys: KeyStrategy) -> BodyLayerStack {
    let mut body = body_with(3, 5, &config_with(TrackingMode::Persistent, keys));
    run(&mut body, &update(1, 2, "x"));
    run(&mut body, &delete_rows(&[2]));
    body
}

#[test]
fn test_lifo_discard_restores_deleted_edit() {
    let mut body = edit_then_delete_row(KeyStrategy::RowIdentity);
    assert_eq!(body.tracker().changes().len(), 2);

    run(&mut body, &LayerCommand::DiscardDataChanges);
    assert_eq!(body.row_count(), 5);
    assert_eq!(source_value(&body, 1, 2), Some("c1r2".into()));
    assert_eq!(
        body.data().provider().borrow().row_id(2),
        Some(RowId(2))
    );
}

#[test]
fn test_forward_replay_leaves_wrong_state() {
    let body = edit_then_delete_row(KeyStrategy::RowIdentity);
    let provider = body.data().provider();
    let keys = RowIdentityKeyHandler::new(&provider);
    let mut data = DataLayer::new(provider);

    // Oldest first: the update's row is gone when it is reverted.
    for change in body.tracker().changes() {
        let _ = change.discard(&keys, &mut data);
    }
    assert_eq!(data.data_value(1, 2), Some("x".into()));
}

#[test]
fn test_position_keyed_edit_dies_with_its_row() {
    let mut body = edit_then_delete_row(KeyStrategy::Position);
    let changes = body.tracker().changes();
    assert_eq!(changes.len(), 1);
    assert!(matches!(changes[0].kind, ChangeKind::RowDelete { .. }));

    run(&mut body, &LayerCommand::DiscardDataChanges);
    assert_eq!(body.row_count(), 5);
    // The row comes back as it was deleted.
    assert_eq!(source_value(&body, 1, 2), Some("x".into()));
}

#[test]
fn test_reorder_is_not_destruction() {
    let mut body = body(4, 3);
    run(&mut body, &update(1, 1, "x"));
    run(&mut body, &reorder_columns(&[1], 4));
    assert_eq!(body.tracker().changes().len(), 1);
    assert_eq!(body.labels(3, 1), vec![DIRTY_LABEL]);
    assert!(body.labels(1, 1).is_empty());

    // A true delete of the same column drops the record.
    run(&mut body, &LayerCommand::DeleteColumns { positions: vec![3] });
    assert!(!body.tracker().is_dirty());
    assert!(body.tracker().is_consistent());
}

#[test]
fn test_dirty_labels_until_saved() {
    let mut body = body(3, 3);
    let edits = [(0, 0), (2, 1), (1, 2)];
    for (column, row) in edits {
        run(&mut body, &update(column, row, "e"));
    }
    for column in 0..3 {
        for row in 0..3 {
            let dirty = edits.contains(&(column, row));
            assert_eq!(body.labels(column, row).contains(&DIRTY_LABEL), dirty);
        }
    }
    assert!(body.tracker().is_row_dirty(1));
    assert!(body.tracker().is_column_dirty(2));

    let events = run(&mut body, &LayerCommand::SaveDataChanges);
    assert_eq!(events, vec![LayerEvent::DataChangesSaved]);
    for (column, row) in edits {
        assert!(body.labels(column, row).is_empty());
        assert_eq!(source_value(&body, column, row), Some("e".into()));
    }
}

#[test]
fn test_edit_back_to_original_is_clean() {
    let mut body = body(2, 2);
    run(&mut body, &update(1, 1, "x"));
    run(&mut body, &update(1, 1, "y"));
    assert_eq!(body.tracker().changes().len(), 1);
    run(&mut body, &update(1, 1, "c1r1"));
    assert!(!body.tracker().is_dirty());
}

#[test]
fn test_temporary_mode_shadows_until_saved() {
    let mut body = body_with(3, 3, &config_with(TrackingMode::Temporary, KeyStrategy::Position));
    run(&mut body, &update(2, 0, "t"));
    assert_eq!(body.data_value(2, 0), Some("t".into()));
    assert_eq!(source_value(&body, 2, 0), Some("c2r0".into()));

    // The shadow value moves with its column.
    run(&mut body, &reorder_columns(&[2], 0));
    assert_eq!(body.data_value(0, 0), Some("t".into()));
    assert_eq!(body.labels(0, 0), vec![DIRTY_LABEL]);

    run(&mut body, &LayerCommand::SaveDataChanges);
    assert_eq!(source_value(&body, 2, 0), Some("t".into()));
    assert!(!body.tracker().is_dirty());
}

#[test]
fn test_temporary_discard_leaves_source_untouched() {
    let mut body = body_with(2, 2, &config_with(TrackingMode::Temporary, KeyStrategy::RowIdentity));
    run(&mut body, &update(0, 1, "t"));
    let events = run(&mut body, &LayerCommand::DiscardDataChanges);
    assert_eq!(
        events,
        vec![
            LayerEvent::CellVisualChange { column: 0, row: 1 },
            LayerEvent::DataChangesDiscarded,
        ]
    );
    assert_eq!(body.data_value(0, 1), Some("c0r1".into()));
}

#[test]
fn test_row_insert_is_tracked_and_discarded() {
    let mut body = body(3, 4);
    run(&mut body, &insert_row(2, 100, 3));
    assert_eq!(body.row_count(), 5);
    assert!(body.tracker().is_row_dirty(2));
    assert_eq!(body.labels(0, 2), vec![DIRTY_LABEL]);

    run(&mut body, &LayerCommand::DiscardDataChanges);
    assert_eq!(body.row_count(), 4);
    assert_eq!(source_value(&body, 0, 2), Some("c0r2".into()));
}

#[test]
fn test_inserted_row_deleted_again_leaves_no_change() {
    let mut body = body(3, 4);
    run(&mut body, &insert_row(1, 100, 3));
    run(&mut body, &delete_rows(&[1]));
    assert!(!body.tracker().is_dirty());
    assert!(body.tracker().is_consistent());
}

#[test]
fn test_identity_edit_of_inserted_row_goes_with_it() {
    let config = config_with(TrackingMode::Persistent, KeyStrategy::RowIdentity);
    let mut body = body_with(3, 4, &config);
    run(&mut body, &insert_row(1, 100, 3));
    run(&mut body, &update(0, 1, "x"));
    assert!(body.tracker().is_cell_dirty(0, 1));

    run(&mut body, &delete_rows(&[1]));
    assert!(!body.tracker().is_dirty());
    assert!(body.tracker().changes().is_empty());
    assert!(body.tracker().is_consistent());
}

#[test]
fn test_identity_edit_of_untracked_delete_is_dropped() {
    let mut config = config_with(TrackingMode::Persistent, KeyStrategy::RowIdentity);
    config.tracking.track_row_deletes = false;
    let mut body = body_with(3, 5, &config);
    run(&mut body, &update(1, 2, "x"));
    run(&mut body, &update(1, 3, "y"));

    run(&mut body, &delete_rows(&[2]));
    let changes = body.tracker().changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(
        changes[0].key,
        CellKey::RowIdentity {
            column: 1,
            row_id: RowId(3)
        }
    );
    assert!(body.tracker().is_cell_dirty(1, 2));
}

#[test]
fn test_mixed_history_discards_to_original() {
    let mut body = body(3, 6);
    run(&mut body, &update(0, 4, "a"));
    run(&mut body, &insert_row(1, 100, 3));
    run(&mut body, &update(2, 1, "b"));
    run(&mut body, &delete_rows(&[3, 4]));
    run(&mut body, &update(1, 0, "c"));
    assert!(body.tracker().is_consistent());

    run(&mut body, &LayerCommand::DiscardDataChanges);
    let expected = ListDataProvider::sample(3, 6);
    let provider = body.data().provider();
    let data = provider.borrow();
    assert_eq!(data.row_count(), 6);
    for row in 0..6 {
        for column in 0..3 {
            assert_eq!(
                data.value(column, row),
                gridlayer::DataProvider::value(&expected, column, row),
                "cell ({column}, {row})"
            );
        }
    }
}

#[test]
fn test_summary_rows_are_not_tracked_by_identity() {
    let rows = vec![
        RowObject::new(RowId(0), vec![CellValue::from("a")]),
        RowObject::summary(RowId(1), vec![CellValue::from("total")]),
    ];
    let provider = ListDataProvider::new(1, rows).into_shared();
    let config = config_with(TrackingMode::Persistent, KeyStrategy::RowIdentity);
    let mut body = BodyLayerStack::new(provider, &config).unwrap();

    run(&mut body, &update(0, 1, "sum"));
    assert_eq!(body.data_value(0, 1), Some("sum".into()));
    assert!(!body.tracker().is_dirty());

    run(&mut body, &update(0, 0, "b"));
    assert!(body.tracker().is_cell_dirty(0, 0));
}
