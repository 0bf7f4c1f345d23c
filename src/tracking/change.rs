//! Pending change records.

use super::key::{CellKey, KeyHandler};
use crate::command::{CommandOutcome, LayerCommand};
use crate::layer::Layer;
use crate::types::{CellValue, RowObject};

/// Identifier of a record in the change log; increases with creation order.
pub type ChangeId = u64;

/// What a record remembers about one tracked mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    /// A value written through to the data source; remembers the value it replaced.
    Update { previous: CellValue },
    /// A value shadowed above the data source until saved.
    PendingUpdate { value: CellValue },
    /// A row inserted at the key's row.
    RowInsert,
    /// A row removed from the data source; the key's row is the reinsertion gap.
    RowDelete { row: RowObject },
}

/// One pending edit.
#[derive(Debug, Clone, PartialEq)]
pub struct DataChange {
    pub id: ChangeId,
    pub key: CellKey,
    pub kind: ChangeKind,
}

impl DataChange {
    /// Command that makes this change permanent, in index space.
    ///
    /// `None` when saving needs no action or the key no longer resolves.
    pub fn save_command(&self, keys: &dyn KeyHandler) -> Option<LayerCommand> {
        match &self.kind {
            ChangeKind::PendingUpdate { value } => Some(LayerCommand::UpdateCell {
                column: keys.column_index(&self.key)?,
                row: keys.row_index(&self.key)?,
                value: value.clone(),
            }),
            ChangeKind::Update { .. } | ChangeKind::RowInsert | ChangeKind::RowDelete { .. } => None,
        }
    }

    /// Command that reverts this change, in index space.
    ///
    /// `None` when discarding needs no action or the key no longer resolves.
    pub fn discard_command(&self, keys: &dyn KeyHandler) -> Option<LayerCommand> {
        match &self.kind {
            ChangeKind::Update { previous } => Some(LayerCommand::UpdateCell {
                column: keys.column_index(&self.key)?,
                row: keys.row_index(&self.key)?,
                value: previous.clone(),
            }),
            ChangeKind::PendingUpdate { .. } => None,
            ChangeKind::RowInsert => Some(LayerCommand::DeleteRows {
                positions: vec![keys.row_index(&self.key)?],
            }),
            ChangeKind::RowDelete { row } => Some(LayerCommand::InsertRows {
                position: keys.row_index(&self.key)?,
                rows: vec![row.clone()],
            }),
        }
    }

    /// Apply [`DataChange::save_command`] to `layer` (positions there must equal indices).
    pub fn save<L: Layer + ?Sized>(&self, keys: &dyn KeyHandler, layer: &mut L) -> CommandOutcome {
        match self.save_command(keys) {
            Some(command) => layer.do_command(&command),
            None => CommandOutcome::handled(Vec::new()),
        }
    }

    /// Apply [`DataChange::discard_command`] to `layer` (positions there must equal indices).
    pub fn discard<L: Layer + ?Sized>(&self, keys: &dyn KeyHandler, layer: &mut L) -> CommandOutcome {
        match self.discard_command(keys) {
            Some(command) => layer.do_command(&command),
            None => CommandOutcome::handled(Vec::new()),
        }
    }

    /// Whether this record describes a single cell rather than a whole row.
    pub fn is_cell_change(&self) -> bool {
        matches!(
            self.kind,
            ChangeKind::Update { .. } | ChangeKind::PendingUpdate { .. }
        )
    }
}
