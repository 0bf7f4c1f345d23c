//! Renumbering of cached index collections after a structural change.
//!
//! Deletes are applied first: indices inside a deleted range vanish and the rest
//! shift down by the number of deleted indices below them. Inserts follow, in
//! descending order of their before-position, shifting every index at or above the
//! insert point up by the insert width.

use std::collections::BTreeSet;

use super::{DiffKind, StructuralDiff};
use crate::types::Range;

/// Deleted before-ranges, ascending by start.
fn deleted_ranges(diffs: &[StructuralDiff]) -> Vec<Range> {
    let mut ranges: Vec<Range> = diffs
        .iter()
        .filter(|d| d.kind == DiffKind::Delete && !d.before.is_empty())
        .map(|d| d.before)
        .collect();
    ranges.sort_unstable_by_key(|r| r.start);
    ranges
}

/// Inserts as `(before_position, width)`, descending by position.
fn inserts(diffs: &[StructuralDiff]) -> Vec<(usize, usize)> {
    let mut inserts: Vec<(usize, usize)> = diffs
        .iter()
        .filter(|d| d.kind == DiffKind::Add && !d.after.is_empty())
        .map(|d| (d.before.start, d.after.width()))
        .collect();
    inserts.sort_unstable_by(|a, b| b.0.cmp(&a.0));
    inserts
}

/// Number of deleted positions strictly below `index`.
fn deleted_below(index: usize, deleted: &[Range]) -> usize {
    deleted
        .iter()
        .take_while(|r| r.start < index)
        .map(|r| r.end.min(index) - r.start)
        .sum()
}

fn apply_inserts(mut index: usize, inserts: &[(usize, usize)]) -> usize {
    for &(position, width) in inserts {
        if index >= position {
            index += width;
        }
    }
    index
}

/// Renumber a single index. Returns `None` when the index was deleted.
pub fn renumber_index(index: usize, diffs: &[StructuralDiff]) -> Option<usize> {
    let deleted = deleted_ranges(diffs);
    if deleted.iter().any(|r| r.contains(index)) {
        return None;
    }
    let shifted = index - deleted_below(index, &deleted);
    Some(apply_inserts(shifted, &inserts(diffs)))
}

/// Renumber a sparse index set (e.g. hidden indices). Deleted members are dropped;
/// inserted indices are not added.
pub fn renumber_set(set: &BTreeSet<usize>, diffs: &[StructuralDiff]) -> BTreeSet<usize> {
    set.iter()
        .filter_map(|&index| renumber_index(index, diffs))
        .collect()
}

/// Renumber an explicit order list that contains every position exactly once.
///
/// Deleted entries are removed; each insert of width `w` at `p` shifts entries
/// `>= p` and splices the new entries `p..p + w` into the list at offset `p`.
pub fn renumber_order(order: &mut Vec<usize>, diffs: &[StructuralDiff]) {
    let deleted = deleted_ranges(diffs);
    if !deleted.is_empty() {
        order.retain(|index| !deleted.iter().any(|r| r.contains(*index)));
        for index in order.iter_mut() {
            *index -= deleted_below(*index, &deleted);
        }
    }

    for (position, width) in inserts(diffs) {
        for index in order.iter_mut() {
            if *index >= position {
                *index += width;
            }
        }
        let at = position.min(order.len());
        for (offset, index) in (position..position + width).enumerate() {
            order.insert(at + offset, index);
        }
    }
}

/// Renumber a gap (an insertion point between two positions).
///
/// Gaps are never dropped: a gap inside a deleted range collapses to the range start.
pub fn renumber_gap(gap: usize, diffs: &[StructuralDiff]) -> usize {
    let deleted = deleted_ranges(diffs);
    let shifted = gap - deleted_below(gap, &deleted);
    apply_inserts(shifted, &inserts(diffs))
}

/// Where `position` lands after a reorder expressed as deletes of the moved
/// positions plus adds of their new positions.
///
/// Moved positions fill the added positions in order; every other position keeps
/// its relative order in the positions left over. Returns `None` when the diffs
/// do not add back as many positions as they delete.
pub fn reorder_position(position: usize, diffs: &[StructuralDiff]) -> Option<usize> {
    let deleted = deleted_ranges(diffs);
    let mut added: Vec<Range> = diffs
        .iter()
        .filter(|d| d.kind == DiffKind::Add && !d.after.is_empty())
        .map(|d| d.after)
        .collect();
    added.sort_unstable_by_key(|r| r.start);

    let below = deleted_below(position, &deleted);
    if deleted.iter().any(|r| r.contains(position)) {
        return added.iter().flat_map(Range::positions).nth(below);
    }
    let mut target = position - below;
    for range in &added {
        if range.start <= target {
            target += range.width();
        }
    }
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delete(start: usize, end: usize) -> StructuralDiff {
        StructuralDiff::delete(Range::new(start, end))
    }

    #[test]
    fn test_delete_drops_and_shifts() {
        let diffs = [delete(3, 5)];
        assert_eq!(renumber_index(2, &diffs), Some(2));
        assert_eq!(renumber_index(3, &diffs), None);
        assert_eq!(renumber_index(4, &diffs), None);
        assert_eq!(renumber_index(7, &diffs), Some(5));
    }

    #[test]
    fn test_multiple_deletes_accumulate() {
        let diffs = [delete(6, 7), delete(1, 2)];
        assert_eq!(renumber_index(0, &diffs), Some(0));
        assert_eq!(renumber_index(4, &diffs), Some(3));
        assert_eq!(renumber_index(9, &diffs), Some(7));
    }

    #[test]
    fn test_multiple_inserts_do_not_double_shift() {
        // Inserts before original positions 2 and 4.
        let diffs = [StructuralDiff::add(2, 1), StructuralDiff::add(4, 1)];
        assert_eq!(renumber_index(1, &diffs), Some(1));
        assert_eq!(renumber_index(3, &diffs), Some(4));
        assert_eq!(renumber_index(4, &diffs), Some(6));
    }

    #[test]
    fn test_insert_then_delete_is_inverse() {
        let set: BTreeSet<usize> = [0, 2, 3, 5, 9].into_iter().collect();
        let inserted = renumber_set(&set, &[StructuralDiff::add(3, 2)]);
        assert_eq!(inserted, [0, 2, 5, 7, 11].into_iter().collect());
        let restored = renumber_set(&inserted, &[delete(3, 5)]);
        assert_eq!(restored, set);
    }

    #[test]
    fn test_hidden_set_follows_insert_and_delete() {
        let hidden: BTreeSet<usize> = [2, 3, 5].into_iter().collect();
        let inserted = renumber_set(&hidden, &[StructuralDiff::add(3, 1)]);
        assert_eq!(inserted, [2, 4, 6].into_iter().collect());
        assert_eq!(renumber_set(&inserted, &[delete(3, 4)]), hidden);
    }

    #[test]
    fn test_reorder_position_moves_block() {
        // Position 1 moved before 4 in six positions: [0, 2, 3, 1, 4, 5].
        let diffs = [delete(1, 2), StructuralDiff::add(3, 1)];
        let moved: Vec<Option<usize>> = (0..6).map(|p| reorder_position(p, &diffs)).collect();
        assert_eq!(moved, vec![Some(0), Some(3), Some(1), Some(2), Some(4), Some(5)]);

        // Positions 0 and 5 moved before 3: [1, 2, 0, 5, 3, 4].
        let diffs = [delete(0, 1), delete(5, 6), StructuralDiff::add(2, 2)];
        let moved: Vec<Option<usize>> = (0..6).map(|p| reorder_position(p, &diffs)).collect();
        assert_eq!(moved, vec![Some(2), Some(0), Some(1), Some(4), Some(5), Some(3)]);
    }

    #[test]
    fn test_order_insert_splices_new_entry() {
        let mut order = vec![0, 1, 2, 5, 4, 3];
        renumber_order(&mut order, &[StructuralDiff::add(3, 1)]);
        assert_eq!(order, vec![0, 1, 2, 3, 6, 5, 4]);

        renumber_order(&mut order, &[delete(3, 4)]);
        assert_eq!(order, vec![0, 1, 2, 5, 4, 3]);
    }

    #[test]
    fn test_order_append_past_end() {
        let mut order = vec![1, 0];
        renumber_order(&mut order, &[StructuralDiff::add(2, 2)]);
        assert_eq!(order, vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_gap_collapses_inside_delete() {
        let diffs = [delete(3, 5)];
        assert_eq!(renumber_gap(3, &diffs), 3);
        assert_eq!(renumber_gap(4, &diffs), 3);
        assert_eq!(renumber_gap(5, &diffs), 3);
        assert_eq!(renumber_gap(8, &diffs), 6);
        assert_eq!(renumber_gap(3, &[StructuralDiff::add(3, 1)]), 4);
    }
}
