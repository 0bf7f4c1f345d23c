//! Change tracking: pending edits keyed by renumberable cell identities.
//!
//! Handlers share one creation-ordered [`ChangeLog`], so save replays oldest first
//! and discard replays newest first across every kind of change.

pub mod change;
pub mod handler;
pub mod key;
mod layer;
pub mod log;
pub mod tracker;

pub use change::{ChangeId, ChangeKind, DataChange};
pub use handler::{ChangeHandler, KeyedChanges, RowDeleteHandler, RowInsertHandler, UpdateChangeHandler};
pub use key::{CellKey, KeyHandler, PositionKeyHandler, RowIdentityKeyHandler};
pub use layer::DataChangeLayer;
pub use log::ChangeLog;
pub use tracker::ChangeTracker;
