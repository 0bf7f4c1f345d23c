//! gridlayer - layered grid presentation engine
//!
//! A stack of composable layers over a tabular data source, each transforming
//! coordinates on the way:
//! - Reordering, hiding, selection and viewport clipping of rows and columns
//! - Structural change events (insert/delete/reorder) that every layer translates
//!   and uses to renumber its own cached positions or indices
//! - Change tracking of pending edits, saved or discarded as a unit
//! - Background compute-and-cache for calculated values
//!
//! # Usage
//!
//! ```
//! use gridlayer::{BodyLayerStack, GridConfig, Layer, LayerCommand, ListDataProvider};
//!
//! let provider = ListDataProvider::sample(4, 3).into_shared();
//! let mut body = BodyLayerStack::new(provider, &GridConfig::default())?;
//! let _ = body.do_command(&LayerCommand::UpdateCell { column: 1, row: 0, value: "x".into() });
//! assert!(body.tracker().is_dirty());
//! let _ = body.do_command(&LayerCommand::DiscardDataChanges);
//! assert_eq!(body.data_value(1, 0), Some("c1r0".into()));
//! # Ok::<(), gridlayer::GridError>(())
//! ```

pub mod cache;
pub mod command;
pub mod config;
pub mod data;
pub mod error;
pub mod event;
pub mod layer;
pub mod persistence;
pub mod tracking;
pub mod types;

pub use cache::{CacheKey, CalculatedValueCache, Compute};
pub use command::{CommandOutcome, LayerCommand};
pub use config::{CacheConfig, GridConfig, KeyStrategy, TrackingConfig, TrackingMode, ViewportConfig};
pub use data::{DataProvider, ListDataProvider, SharedDataProvider};
pub use error::{GridError, Result};
pub use event::{AxisChange, LayerEvent, StructuralChangeEvent, StructuralDiff};
pub use layer::{BodyLayerStack, Layer, DIRTY_LABEL, SELECT_LABEL};
pub use persistence::Properties;
pub use tracking::{CellKey, ChangeTracker, DataChange, DataChangeLayer};
pub use types::*;

/// Build a body layer stack over CSV text.
///
/// # Errors
/// Returns an error if the configuration does not validate.
pub fn body_stack_from_csv(csv: &str, config: &GridConfig) -> Result<BodyLayerStack> {
    let provider = ListDataProvider::from_csv(csv).into_shared();
    BodyLayerStack::new(provider, config)
}

/// Get the library version
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
