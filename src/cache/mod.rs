//! Compute-and-cache for derived (calculated) cell values.
//!
//! Values are computed on a small worker pool and published into concurrent slots.
//! Each publication that changes what a cell shows queues a single-cell
//! invalidation, which the owning thread drains with
//! [`CalculatedValueCache::take_invalidations`]. Workers never touch a layer stack.

mod pool;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::RwLock;
use rayon::ThreadPool;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::error::{GridError, Result};
use crate::event::LayerEvent;
use crate::types::CellValue;

/// Identity of a cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Column(usize),
    Row(usize),
    Cell { column: usize, row: usize },
}

impl CacheKey {
    /// Derive a key from a cell according to which axes identify values.
    ///
    /// # Errors
    /// Returns [`GridError::Configuration`] when neither axis is configured as key.
    pub fn derive(column: usize, row: usize, use_column: bool, use_row: bool) -> Result<Self> {
        match (use_column, use_row) {
            (true, true) => Ok(Self::Cell { column, row }),
            (true, false) => Ok(Self::Column(column)),
            (false, true) => Ok(Self::Row(row)),
            (false, false) => Err(GridError::Configuration(
                "automatic cache keys need the column or the row as key".to_string(),
            )),
        }
    }
}

/// Where a value is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compute {
    /// On the worker pool; the read returns immediately.
    Background,
    /// On the calling thread; the read returns the fresh value.
    Synchronous,
}

/// State shared with workers.
#[derive(Default)]
struct Slots {
    values: DashMap<CacheKey, CellValue>,
    /// Last published values kept across `clear()` for smooth reads.
    previous: DashMap<CacheKey, CellValue>,
    /// Keys with a computation in flight, with the generation it started in.
    pending: DashMap<CacheKey, u64>,
    generation: AtomicU64,
    /// Held for reading while publishing, for writing while invalidating.
    publish: RwLock<()>,
}

impl Slots {
    fn last_published(&self, key: &CacheKey) -> Option<CellValue> {
        self.values
            .get(key)
            .or_else(|| self.previous.get(key))
            .map(|v| v.value().clone())
    }

    /// Store a finished computation unless the cache was cleared since it started.
    ///
    /// Returns whether the displayed value changed.
    fn publish(&self, key: CacheKey, generation: u64, value: CellValue) -> bool {
        let _guard = self.publish.read();
        if self.generation.load(Ordering::Acquire) != generation {
            trace!(?key, generation, "discarding stale result");
            return false;
        }
        let changed = self.last_published(&key).as_ref() != Some(&value);
        self.values.insert(key, value);
        self.previous.remove(&key);
        changed
    }

    /// Forget an in-flight marker unless a newer computation replaced it.
    fn finish(&self, key: &CacheKey, generation: u64) {
        self.pending.remove_if(key, |_, started| *started == generation);
    }
}

/// Background compute-and-cache of calculated values.
pub struct CalculatedValueCache {
    slots: Arc<Slots>,
    smooth: bool,
    use_column_as_key: bool,
    use_row_as_key: bool,
    pool: Option<ThreadPool>,
    sender: Sender<(usize, usize)>,
    invalidations: Receiver<(usize, usize)>,
}

impl CalculatedValueCache {
    /// # Errors
    /// Returns [`GridError::Configuration`] when `worker_threads` is zero.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        if config.worker_threads == 0 {
            return Err(GridError::Configuration(
                "cache.workerThreads must be at least 1".to_string(),
            ));
        }
        let (sender, invalidations) = mpsc::channel();
        Ok(Self {
            slots: Arc::new(Slots::default()),
            smooth: config.smooth_updates,
            use_column_as_key: config.use_column_as_key,
            use_row_as_key: config.use_row_as_key,
            pool: pool::build_pool(config.worker_threads),
            sender,
            invalidations,
        })
    }

    pub fn is_smooth(&self) -> bool {
        self.smooth
    }

    /// Value of the cell at `(column, row)` under the automatically derived key.
    ///
    /// # Errors
    /// Returns [`GridError::Configuration`] when neither axis is configured as key.
    pub fn value<F>(
        &self,
        column: usize,
        row: usize,
        compute: Compute,
        calculate: F,
    ) -> Result<Option<CellValue>>
    where
        F: FnOnce() -> CellValue + Send + 'static,
    {
        let key = CacheKey::derive(column, row, self.use_column_as_key, self.use_row_as_key)?;
        Ok(self.value_with_key(key, column, row, compute, calculate))
    }

    /// Value cached under `key`, computing it when missing.
    ///
    /// In background mode the computation is queued and the read returns the last
    /// published value (smooth) or `None`; once the result lands an invalidation
    /// for `(column, row)` is queued.
    pub fn value_with_key<F>(
        &self,
        key: CacheKey,
        column: usize,
        row: usize,
        compute: Compute,
        calculate: F,
    ) -> Option<CellValue>
    where
        F: FnOnce() -> CellValue + Send + 'static,
    {
        if let Some(value) = self.slots.values.get(&key) {
            return Some(value.value().clone());
        }
        let generation = self.slots.generation.load(Ordering::Acquire);

        match (compute, &self.pool) {
            (Compute::Background, Some(pool)) => {
                let in_flight = self
                    .slots
                    .pending
                    .get(&key)
                    .is_some_and(|started| *started == generation);
                if !in_flight {
                    self.slots.pending.insert(key, generation);
                    let slots = Arc::clone(&self.slots);
                    let sender = self.sender.clone();
                    pool.spawn(move || {
                        let value = calculate();
                        if slots.publish(key, generation, value) {
                            // The receiver only goes away with the cache itself.
                            let _ = sender.send((column, row));
                        }
                        slots.finish(&key, generation);
                    });
                    trace!(?key, generation, "computation queued");
                }
                if self.smooth {
                    self.slots.previous.get(&key).map(|v| v.value().clone())
                } else {
                    None
                }
            }
            _ => {
                let value = calculate();
                self.slots.publish(key, generation, value.clone());
                Some(value)
            }
        }
    }

    /// Drain published invalidations as redraw events.
    pub fn take_invalidations(&self) -> Vec<LayerEvent> {
        self.invalidations
            .try_iter()
            .map(|(column, row)| LayerEvent::CellVisualUpdate { column, row })
            .collect()
    }

    /// Number of computations still in flight.
    pub fn pending(&self) -> usize {
        self.slots.pending.len()
    }

    /// Block until no computation is in flight or `timeout` passes.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.pending() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }

    /// Inputs changed: drop cached values, keeping them for smooth reads.
    pub fn clear(&self) {
        let _guard = self.slots.publish.write();
        self.slots.generation.fetch_add(1, Ordering::AcqRel);
        if self.smooth {
            for entry in self.slots.values.iter() {
                self.slots.previous.insert(*entry.key(), entry.value().clone());
            }
        }
        self.slots.values.clear();
        self.slots.pending.clear();
        debug!("calculated values cleared");
    }

    /// Drop everything, including values kept for smooth reads.
    pub fn kill(&self) {
        let _guard = self.slots.publish.write();
        self.slots.generation.fetch_add(1, Ordering::AcqRel);
        self.slots.values.clear();
        self.slots.previous.clear();
        self.slots.pending.clear();
        debug!("calculated values killed");
    }

    /// Clear when an event may have changed the inputs of calculated values.
    pub fn handle_layer_event(&self, event: &LayerEvent) {
        match event {
            LayerEvent::CellValueUpdated { .. }
            | LayerEvent::RowsInserted { .. }
            | LayerEvent::RowsDeleted { .. }
            | LayerEvent::Structural(_)
            | LayerEvent::DataChangesSaved
            | LayerEvent::DataChangesDiscarded => self.clear(),
            LayerEvent::CellVisualChange { .. }
            | LayerEvent::CellVisualUpdate { .. }
            | LayerEvent::SelectionChanged => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cache(smooth: bool) -> CalculatedValueCache {
        CalculatedValueCache::new(&CacheConfig {
            smooth_updates: smooth,
            ..CacheConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_derive_key() {
        assert_eq!(CacheKey::derive(1, 2, true, false).unwrap(), CacheKey::Column(1));
        assert_eq!(CacheKey::derive(1, 2, false, true).unwrap(), CacheKey::Row(2));
        assert!(matches!(
            CacheKey::derive(1, 2, false, false),
            Err(GridError::Configuration(_))
        ));
    }

    #[test]
    fn test_synchronous_returns_value() {
        let cache = cache(true);
        let value = cache
            .value(0, 0, Compute::Synchronous, || CellValue::Number(3.0))
            .unwrap();
        assert_eq!(value, Some(CellValue::Number(3.0)));
        // Cached: the calculator is not consulted again.
        let again = cache
            .value(0, 0, Compute::Synchronous, || CellValue::Number(9.0))
            .unwrap();
        assert_eq!(again, Some(CellValue::Number(3.0)));
    }

    #[test]
    fn test_background_publishes_and_invalidates() {
        let cache = cache(false);
        let first = cache
            .value(2, 5, Compute::Background, || CellValue::from("sum"))
            .unwrap();
        assert_eq!(first, None);
        assert!(cache.wait_idle(Duration::from_secs(5)));
        assert_eq!(
            cache.take_invalidations(),
            vec![LayerEvent::CellVisualUpdate { column: 2, row: 5 }]
        );
        let second = cache
            .value(2, 5, Compute::Background, || CellValue::from("other"))
            .unwrap();
        assert_eq!(second, Some(CellValue::from("sum")));
    }

    #[test]
    fn test_smooth_serves_previous_and_suppresses_equal_result() {
        let cache = cache(true);
        let _ = cache.value(0, 0, Compute::Synchronous, || CellValue::from("v"));
        cache.clear();
        let during = cache
            .value(0, 0, Compute::Background, || CellValue::from("v"))
            .unwrap();
        assert_eq!(during, Some(CellValue::from("v")));
        assert!(cache.wait_idle(Duration::from_secs(5)));
        assert!(cache.take_invalidations().is_empty());
    }

    #[test]
    fn test_kill_drops_smooth_copy() {
        let cache = cache(true);
        let _ = cache.value(0, 0, Compute::Synchronous, || CellValue::from("v"));
        cache.kill();
        assert_eq!(cache.slots.last_published(&CacheKey::Cell { column: 0, row: 0 }), None);
    }

    #[test]
    fn test_stale_result_discarded() {
        let cache = cache(false);
        let key = CacheKey::Column(0);
        let generation = cache.slots.generation.load(Ordering::Acquire);
        cache.clear();
        assert!(!cache.slots.publish(key, generation, CellValue::from("late")));
        assert!(cache.slots.values.get(&key).is_none());
    }

    #[test]
    fn test_structural_event_clears() {
        let cache = cache(false);
        let _ = cache.value(0, 0, Compute::Synchronous, || CellValue::from("v"));
        cache.handle_layer_event(&LayerEvent::SelectionChanged);
        assert!(cache.slots.values.get(&CacheKey::Cell { column: 0, row: 0 }).is_some());
        cache.handle_layer_event(&LayerEvent::DataChangesSaved);
        assert!(cache.slots.values.get(&CacheKey::Cell { column: 0, row: 0 }).is_none());
    }
}
