//! Structural diffs: a single insert, delete or in-place change along one axis.

use crate::types::Range;

/// What happened to a span of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffKind {
    Add,
    Delete,
    Change,
}

/// One structural edit expressed in a layer's position space.
///
/// For `Delete` the `after` range collapses to `(start, start)`; for `Add` the
/// `before` range collapses to `(start, start)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructuralDiff {
    pub kind: DiffKind,
    pub before: Range,
    pub after: Range,
}

impl StructuralDiff {
    /// `width` new positions appear starting at `position`.
    pub fn add(position: usize, width: usize) -> Self {
        Self {
            kind: DiffKind::Add,
            before: Range::empty_at(position),
            after: Range::new(position, position.saturating_add(width)),
        }
    }

    /// Adds for several ranges of new positions (ascending, after-change space).
    ///
    /// Each add's insertion point is expressed in the before-change space, so that
    /// renumbering by several adds at once shifts every existing position correctly.
    pub fn adds(ranges: &[Range]) -> Vec<Self> {
        let mut sorted = ranges.to_vec();
        sorted.sort_unstable_by_key(|r| r.start);
        let mut inserted_below = 0;
        sorted
            .into_iter()
            .filter(|r| !r.is_empty())
            .map(|after| {
                let before = after.start.saturating_sub(inserted_below);
                inserted_below += after.width();
                Self {
                    kind: DiffKind::Add,
                    before: Range::empty_at(before),
                    after,
                }
            })
            .collect()
    }

    /// The positions in `range` disappear.
    pub fn delete(range: Range) -> Self {
        Self {
            kind: DiffKind::Delete,
            before: range,
            after: Range::empty_at(range.start),
        }
    }

    /// Positions in `range` keep their identity but changed in place (e.g. resized).
    pub fn change(range: Range) -> Self {
        Self {
            kind: DiffKind::Change,
            before: range,
            after: range,
        }
    }

    /// Number of positions affected.
    pub fn width(&self) -> usize {
        match self.kind {
            DiffKind::Add => self.after.width(),
            DiffKind::Delete | DiffKind::Change => self.before.width(),
        }
    }
}

/// True when `diffs` is exactly one delete and one add of equal, non-zero width.
///
/// Such a pair moves positions around without destroying or creating anything, so
/// caches that identify items by index must not treat it as a delete.
pub fn is_reorder(diffs: &[StructuralDiff]) -> bool {
    let [first, second] = diffs else {
        return false;
    };
    let (delete, add) = match (first.kind, second.kind) {
        (DiffKind::Delete, DiffKind::Add) => (first, second),
        (DiffKind::Add, DiffKind::Delete) => (second, first),
        _ => return false,
    };
    delete.width() > 0 && delete.width() == add.width()
}
