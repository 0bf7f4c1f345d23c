//! Cell identities for pending changes.

use std::rc::Rc;

use crate::data::SharedDataProvider;
use crate::types::{RowId, RowKind};

/// Identity of the cell a change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKey {
    /// Column and row index; both renumbered by structural changes.
    Position { column: usize, row: usize },
    /// Column index and row identity; the row part is stable across row moves.
    RowIdentity { column: usize, row_id: RowId },
}

impl CellKey {
    pub fn position(column: usize, row: usize) -> Self {
        CellKey::Position { column, row }
    }

    pub fn column(&self) -> usize {
        match self {
            CellKey::Position { column, .. } | CellKey::RowIdentity { column, .. } => *column,
        }
    }

    pub fn is_position(&self) -> bool {
        matches!(self, CellKey::Position { .. })
    }
}

/// Derives and projects [`CellKey`]s.
pub trait KeyHandler {
    /// Key for the cell at the given indices, `None` when it cannot be identified.
    fn key(&self, column_index: usize, row_index: usize) -> Option<CellKey>;

    fn key_with_column_update(&self, key: &CellKey, column_index: usize) -> CellKey;

    fn key_with_row_update(&self, key: &CellKey, row_index: usize) -> CellKey;

    fn column_index(&self, key: &CellKey) -> Option<usize>;

    /// Current row index of the key's row, `None` when it no longer exists.
    fn row_index(&self, key: &CellKey) -> Option<usize>;

    /// Whether keys must be renumbered when columns are inserted or removed.
    fn updates_on_horizontal_structural_change(&self) -> bool;

    /// Whether keys must be renumbered when rows are inserted or removed.
    fn updates_on_vertical_structural_change(&self) -> bool;
}

/// Keys cells by `(column index, row index)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionKeyHandler;

impl KeyHandler for PositionKeyHandler {
    fn key(&self, column_index: usize, row_index: usize) -> Option<CellKey> {
        Some(CellKey::position(column_index, row_index))
    }

    fn key_with_column_update(&self, key: &CellKey, column_index: usize) -> CellKey {
        match *key {
            CellKey::Position { row, .. } => CellKey::position(column_index, row),
            CellKey::RowIdentity { row_id, .. } => CellKey::RowIdentity {
                column: column_index,
                row_id,
            },
        }
    }

    fn key_with_row_update(&self, key: &CellKey, row_index: usize) -> CellKey {
        CellKey::position(key.column(), row_index)
    }

    fn column_index(&self, key: &CellKey) -> Option<usize> {
        Some(key.column())
    }

    fn row_index(&self, key: &CellKey) -> Option<usize> {
        match key {
            CellKey::Position { row, .. } => Some(*row),
            CellKey::RowIdentity { .. } => None,
        }
    }

    fn updates_on_horizontal_structural_change(&self) -> bool {
        true
    }

    fn updates_on_vertical_structural_change(&self) -> bool {
        true
    }
}

/// Keys cells by `(column index, row id)`, resolving row ids through the provider.
pub struct RowIdentityKeyHandler {
    provider: SharedDataProvider,
}

impl RowIdentityKeyHandler {
    pub fn new(provider: &SharedDataProvider) -> Self {
        Self {
            provider: Rc::clone(provider),
        }
    }
}

impl KeyHandler for RowIdentityKeyHandler {
    fn key(&self, column_index: usize, row_index: usize) -> Option<CellKey> {
        let data = self.provider.borrow();
        if data.row_kind(row_index)? != RowKind::Data {
            return None;
        }
        Some(CellKey::RowIdentity {
            column: column_index,
            row_id: data.row_id(row_index)?,
        })
    }

    fn key_with_column_update(&self, key: &CellKey, column_index: usize) -> CellKey {
        PositionKeyHandler.key_with_column_update(key, column_index)
    }

    fn key_with_row_update(&self, key: &CellKey, row_index: usize) -> CellKey {
        self.key(key.column(), row_index).unwrap_or(*key)
    }

    fn column_index(&self, key: &CellKey) -> Option<usize> {
        Some(key.column())
    }

    fn row_index(&self, key: &CellKey) -> Option<usize> {
        match key {
            CellKey::Position { row, .. } => Some(*row),
            CellKey::RowIdentity { row_id, .. } => self.provider.borrow().index_of_row(*row_id),
        }
    }

    fn updates_on_horizontal_structural_change(&self) -> bool {
        true
    }

    fn updates_on_vertical_structural_change(&self) -> bool {
        false
    }
}
