//! Coordinate layers.
//!
//! A layer owns the layer beneath it and translates positions between its own
//! position space and the underlying one. The root [`DataLayer`] maps positions 1:1
//! onto data-source indices; every layer above adds one transformation:
//! - [`ReorderLayer`]: explicit position order along one axis
//! - [`HideShowLayer`]: hidden indices along one axis
//! - [`SelectionLayer`]: selected cells (identity mapping)
//! - [`ViewportLayer`]: visible window (offset + clip)
//!
//! Layers are single-threaded: they share the data provider through `Rc`, so a
//! stack can never be sent to another thread.

mod data;
mod hide_show;
mod reorder;
mod selection;
mod size;
pub mod stack;
mod viewport;

pub use data::DataLayer;
pub use hide_show::HideShowLayer;
pub use reorder::ReorderLayer;
pub use selection::SelectionLayer;
pub use size::SizeConfig;
pub use stack::BodyLayerStack;
pub use viewport::ViewportLayer;

use crate::command::{CommandOutcome, LayerCommand};
use crate::persistence::Properties;
use crate::types::{Axis, CellValue};

/// Label attached to cells with a pending data change.
pub const DIRTY_LABEL: &str = "DIRTY";

/// Label attached to selected cells.
pub const SELECT_LABEL: &str = "SELECT";

/// Labels attached to a cell by the layers of a stack, bottom layer first.
pub type Labels = Vec<&'static str>;

/// The coordinate-translation contract every layer honors.
///
/// All translation functions return `None` for positions that are out of range or
/// not present at this layer (hidden, clipped); they never panic.
pub trait Layer {
    /// Number of positions along `axis` in this layer's space.
    fn count(&self, axis: Axis) -> usize;

    /// This layer's position → the underlying layer's position.
    fn local_to_underlying(&self, axis: Axis, position: usize) -> Option<usize>;

    /// The underlying layer's position → this layer's position.
    fn underlying_to_local(&self, axis: Axis, position: usize) -> Option<usize>;

    /// Position → data-source index.
    fn index_by_position(&self, axis: Axis, position: usize) -> Option<usize>;

    /// Data-source index → position at this layer.
    fn position_by_index(&self, axis: Axis, index: usize) -> Option<usize>;

    /// Value displayed at a cell of this layer.
    fn data_value(&self, column: usize, row: usize) -> Option<CellValue>;

    /// Size in pixels of a position.
    fn size(&self, axis: Axis, position: usize) -> Option<u32>;

    /// Labels attached to a cell.
    fn labels(&self, column: usize, row: usize) -> Labels;

    /// Execute a command or pass it down. The returned events are in this layer's
    /// position space.
    fn do_command(&mut self, command: &LayerCommand) -> CommandOutcome;

    /// Write this layer's (and the layers beneath it) state under `prefix`.
    fn save_state(&self, prefix: &str, properties: &mut Properties);

    /// Restore state written by [`Layer::save_state`].
    fn load_state(&mut self, prefix: &str, properties: &Properties) -> CommandOutcome;

    /// Like [`Layer::local_to_underlying`], but also maps the append boundary
    /// (`position == count`).
    fn local_to_underlying_boundary(&self, axis: Axis, position: usize) -> Option<usize> {
        let count = self.count(axis);
        if position < count {
            return self.local_to_underlying(axis, position);
        }
        if position != count {
            return None;
        }
        match position.checked_sub(1) {
            Some(last) => self.local_to_underlying(axis, last).map(|p| p + 1),
            None => Some(0),
        }
    }

    fn column_count(&self) -> usize {
        self.count(Axis::Column)
    }

    fn row_count(&self) -> usize {
        self.count(Axis::Row)
    }

    fn column_index_by_position(&self, position: usize) -> Option<usize> {
        self.index_by_position(Axis::Column, position)
    }

    fn row_index_by_position(&self, position: usize) -> Option<usize> {
        self.index_by_position(Axis::Row, position)
    }

    fn column_position_by_index(&self, index: usize) -> Option<usize> {
        self.position_by_index(Axis::Column, index)
    }

    fn row_position_by_index(&self, index: usize) -> Option<usize> {
        self.position_by_index(Axis::Row, index)
    }
}
