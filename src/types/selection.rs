//! Selected areas in a layer's position space.

use super::{Axis, Range};

/// What a selection spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionKind {
    /// A block of cells.
    #[default]
    Cells,
    /// Whole rows; the column span is ignored.
    Rows,
    /// Whole columns; the row span is ignored.
    Columns,
    /// Every cell.
    All,
}

/// One selected area. Spans are half-open position ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub kind: SelectionKind,
    pub columns: Range,
    pub rows: Range,
}

impl Selection {
    /// The block between two corner cells `(column, row)`, both included.
    pub fn cells(from: (usize, usize), to: (usize, usize)) -> Self {
        Self {
            kind: SelectionKind::Cells,
            columns: Range::new(from.0.min(to.0), from.0.max(to.0) + 1),
            rows: Range::new(from.1.min(to.1), from.1.max(to.1) + 1),
        }
    }

    pub fn rows(rows: Range) -> Self {
        Self {
            kind: SelectionKind::Rows,
            columns: Range::empty_at(0),
            rows,
        }
    }

    pub fn columns(columns: Range) -> Self {
        Self {
            kind: SelectionKind::Columns,
            columns,
            rows: Range::empty_at(0),
        }
    }

    pub fn all() -> Self {
        Self {
            kind: SelectionKind::All,
            columns: Range::empty_at(0),
            rows: Range::empty_at(0),
        }
    }

    /// Positions covered along `axis`, or `None` when the whole axis is covered.
    pub fn span(&self, axis: Axis) -> Option<Range> {
        match (self.kind, axis) {
            (SelectionKind::All, _)
            | (SelectionKind::Rows, Axis::Column)
            | (SelectionKind::Columns, Axis::Row) => None,
            (_, Axis::Column) => Some(self.columns),
            (_, Axis::Row) => Some(self.rows),
        }
    }

    /// The same selection restricted to `span` along `axis`.
    ///
    /// Has no effect along an axis the selection covers entirely.
    pub fn with_span(&self, axis: Axis, span: Range) -> Self {
        let mut selection = self.clone();
        if self.span(axis).is_some() {
            match axis {
                Axis::Column => selection.columns = span,
                Axis::Row => selection.rows = span,
            }
        }
        selection
    }

    /// Whether the cell at `(column, row)` is selected.
    pub fn contains(&self, column: usize, row: usize) -> bool {
        self.span(Axis::Column).map_or(true, |r| r.contains(column))
            && self.span(Axis::Row).map_or(true, |r| r.contains(row))
    }
}
