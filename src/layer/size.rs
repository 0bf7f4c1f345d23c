//! Pixel sizes along one axis of the data layer.
//!
//! Sizes are keyed by index. Cumulative offsets are computed once per change,
//! enabling O(log n) hit testing.

use std::collections::BTreeMap;

use tracing::warn;

use crate::event::{renumber::renumber_index, StructuralDiff};
use crate::persistence::{decode_sizes, encode_sizes, property_key, Properties};

/// Default column width in pixels.
pub const DEFAULT_COLUMN_WIDTH: u32 = 100;

/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: u32 = 20;

/// Sizes of the positions along one axis.
#[derive(Debug, Clone)]
pub struct SizeConfig {
    /// `columnWidth` or `rowHeight`
    name: &'static str,
    default_size: u32,
    /// Per-index overrides.
    sizes: BTreeMap<usize, u32>,
    count: usize,
    /// Cumulative offsets (`offsets[i]` = start pixel of index i, plus a final edge).
    offsets: Vec<u64>,
}

impl SizeConfig {
    pub fn new(name: &'static str, default_size: u32, count: usize) -> Self {
        let mut config = Self {
            name,
            default_size,
            sizes: BTreeMap::new(),
            count,
            offsets: Vec::new(),
        };
        config.rebuild();
        config
    }

    pub fn columns(count: usize) -> Self {
        Self::new("columnWidth", DEFAULT_COLUMN_WIDTH, count)
    }

    pub fn rows(count: usize) -> Self {
        Self::new("rowHeight", DEFAULT_ROW_HEIGHT, count)
    }

    fn rebuild(&mut self) {
        self.offsets.clear();
        self.offsets.reserve(self.count + 1);
        let mut edge: u64 = 0;
        for index in 0..self.count {
            self.offsets.push(edge);
            edge += u64::from(self.size(index));
        }
        self.offsets.push(edge);
    }

    pub fn default_size(&self) -> u32 {
        self.default_size
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Size of `index` (default when not overridden).
    pub fn size(&self, index: usize) -> u32 {
        self.sizes.get(&index).copied().unwrap_or(self.default_size)
    }

    pub fn set_size(&mut self, index: usize, size: u32) {
        if size == self.default_size {
            self.sizes.remove(&index);
        } else {
            self.sizes.insert(index, size);
        }
        self.rebuild();
    }

    /// Start pixel of `index`; `index == count` yields the total extent.
    pub fn start(&self, index: usize) -> Option<u64> {
        self.offsets.get(index).copied()
    }

    pub fn total(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Index covering `pixel` (binary search).
    pub fn index_at(&self, pixel: u64) -> Option<usize> {
        if pixel >= self.total() {
            return None;
        }
        match self.offsets.binary_search(&pixel) {
            Ok(i) => Some(i),
            Err(i) => i.checked_sub(1),
        }
    }

    /// Apply structural diffs (index space) to the overrides and the count.
    pub fn apply_diffs(&mut self, diffs: &[StructuralDiff], count: usize) {
        self.sizes = self
            .sizes
            .iter()
            .filter_map(|(&index, &size)| renumber_index(index, diffs).map(|i| (i, size)))
            .collect();
        self.count = count;
        self.rebuild();
    }

    /// Drop all overrides beyond `count` (after a refresh).
    pub fn reset_count(&mut self, count: usize) {
        self.sizes.retain(|&index, _| index < count);
        self.count = count;
        self.rebuild();
    }

    pub fn save_state(&self, prefix: &str, properties: &mut Properties) {
        let base = property_key(prefix, self.name);
        properties.set(
            property_key(&base, "defaultSize"),
            self.default_size.to_string(),
        );
        if self.sizes.is_empty() {
            properties.remove(&property_key(&base, "sizes"));
        } else {
            properties.set(property_key(&base, "sizes"), encode_sizes(&self.sizes));
        }
    }

    /// Restore sizes; malformed entries are skipped. Returns true when anything changed.
    pub fn load_state(&mut self, prefix: &str, properties: &Properties) -> bool {
        let base = property_key(prefix, self.name);
        let mut changed = false;

        let key = property_key(&base, "defaultSize");
        if let Some(raw) = properties.get(&key) {
            match raw.trim().parse::<u32>() {
                Ok(size) => {
                    changed |= size != self.default_size;
                    self.default_size = size;
                }
                Err(_) => warn!(key = %key, value = raw, "ignoring malformed default size"),
            }
        }

        let key = property_key(&base, "sizes");
        if let Some(raw) = properties.get(&key) {
            match decode_sizes(&key, raw) {
                Ok(sizes) => {
                    let sizes: BTreeMap<usize, u32> = sizes
                        .into_iter()
                        .filter(|&(index, _)| index < self.count)
                        .collect();
                    changed |= sizes != self.sizes;
                    self.sizes = sizes;
                }
                Err(e) => warn!(error = %e, "ignoring malformed sizes"),
            }
        }

        self.rebuild();
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Range;

    #[test]
    fn test_offsets_and_hit_testing() {
        let mut sizes = SizeConfig::columns(4);
        sizes.set_size(1, 200);
        assert_eq!(sizes.start(2), Some(300));
        assert_eq!(sizes.total(), 500);
        assert_eq!(sizes.index_at(0), Some(0));
        assert_eq!(sizes.index_at(100), Some(1));
        assert_eq!(sizes.index_at(299), Some(1));
        assert_eq!(sizes.index_at(300), Some(2));
        assert_eq!(sizes.index_at(500), None);
    }

    #[test]
    fn test_overrides_follow_structural_changes() {
        let mut sizes = SizeConfig::columns(5);
        sizes.set_size(3, 40);
        sizes.apply_diffs(&[StructuralDiff::add(1, 2)], 7);
        assert_eq!(sizes.size(5), 40);
        sizes.apply_diffs(&[StructuralDiff::delete(Range::single(5))], 6);
        assert_eq!(sizes.size(5), DEFAULT_COLUMN_WIDTH);
    }

    #[test]
    fn test_state_roundtrip() {
        let mut sizes = SizeConfig::columns(6);
        sizes.set_size(1, 200);
        let mut props = Properties::new();
        sizes.save_state("grid.BODY", &mut props);
        assert_eq!(props.get("grid.BODY.columnWidth.sizes"), Some("1:200,"));

        let mut fresh = SizeConfig::columns(6);
        assert!(fresh.load_state("grid.BODY", &props));
        assert_eq!(fresh.size(1), 200);
    }

    #[test]
    fn test_malformed_state_is_skipped() {
        let mut props = Properties::new();
        props.set("g.rowHeight.sizes", "nope");
        let mut sizes = SizeConfig::rows(3);
        assert!(!sizes.load_state("g", &props));
        assert_eq!(sizes.size(0), DEFAULT_ROW_HEIGHT);
    }
}
