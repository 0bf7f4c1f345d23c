use serde::{Deserialize, Serialize};

/// Half-open span `[start, end)` of positions along one axis of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    /// Create a range. `end` is clamped so that `end >= start`.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Range covering exactly one position.
    pub fn single(position: usize) -> Self {
        Self::new(position, position.saturating_add(1))
    }

    /// Empty range anchored at `position`.
    pub fn empty_at(position: usize) -> Self {
        Self::new(position, position)
    }

    /// Number of positions covered.
    pub fn width(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && position < self.end
    }

    pub fn overlaps(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Iterate the covered positions in ascending order.
    pub fn positions(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// Group positions into maximal contiguous ranges.
    ///
    /// Input order does not matter; duplicates are collapsed.
    pub fn from_positions<I: IntoIterator<Item = usize>>(positions: I) -> Vec<Range> {
        let mut sorted: Vec<usize> = positions.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut ranges: Vec<Range> = Vec::new();
        for position in sorted {
            match ranges.last_mut() {
                Some(last) if last.end == position => last.end += 1,
                _ => ranges.push(Range::single(position)),
            }
        }
        ranges
    }
}
