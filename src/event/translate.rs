//! Translation of structural diffs from an underlying layer's position space into a
//! local one.

use super::{DiffKind, StructuralDiff};
use crate::types::Range;

/// Translate `diffs` into local positions.
///
/// `before` maps underlying positions as they were *before* the change (used for
/// deleted spans); `after` maps underlying positions in the current state (used for
/// added spans). Positions that do not map are dropped, and non-contiguous local
/// results are split into several diffs.
pub fn translate_diffs<B, A>(diffs: &[StructuralDiff], before: B, after: A) -> Vec<StructuralDiff>
where
    B: Fn(usize) -> Option<usize>,
    A: Fn(usize) -> Option<usize>,
{
    let mut translated = Vec::new();
    let mut added = Vec::new();
    for diff in diffs {
        match diff.kind {
            DiffKind::Delete => {
                let local = diff.before.positions().filter_map(&before);
                translated.extend(
                    Range::from_positions(local)
                        .into_iter()
                        .map(StructuralDiff::delete),
                );
            }
            DiffKind::Add => {
                added.extend(diff.after.positions().filter_map(&after));
            }
            DiffKind::Change => {
                let local = diff.after.positions().filter_map(&after);
                translated.extend(
                    Range::from_positions(local)
                        .into_iter()
                        .map(StructuralDiff::change),
                );
            }
        }
    }
    translated.extend(StructuralDiff::adds(&Range::from_positions(added)));
    translated
}

/// Translate `diffs` through a layer that shifts positions by a fixed offset and
/// clips them to `[0, visible)`.
pub fn offset_diffs(diffs: &[StructuralDiff], offset: usize, visible: usize) -> Vec<StructuralDiff> {
    let shift = |p: usize| p.checked_sub(offset).filter(|local| *local < visible);
    translate_diffs(diffs, shift, shift)
}
