//! Data providers: the raw tabular source beneath the layer stack.

mod csv;

pub use csv::Delimiter;

use std::cell::RefCell;
use std::rc::Rc;

use crate::types::{CellValue, RowId, RowKind, RowObject};

/// Row-oriented access to the backing collection, addressed by index.
///
/// Out-of-range access yields `None`/`false` rather than panicking.
pub trait DataProvider {
    fn column_count(&self) -> usize;

    fn row_count(&self) -> usize;

    fn value(&self, column: usize, row: usize) -> Option<CellValue>;

    /// Replace a value, returning the previous one (`None` when out of range).
    fn set_value(&mut self, column: usize, row: usize, value: CellValue) -> Option<CellValue>;

    fn row_id(&self, row: usize) -> Option<RowId>;

    fn row_kind(&self, row: usize) -> Option<RowKind>;

    /// Current index of the row with `id`.
    fn index_of_row(&self, id: RowId) -> Option<usize>;

    /// Copy of the row object at `row`.
    fn row_object(&self, row: usize) -> Option<RowObject>;

    /// Insert `row` before `index` (`index == row_count` appends).
    fn insert_row(&mut self, index: usize, row: RowObject) -> bool;

    fn remove_row(&mut self, index: usize) -> Option<RowObject>;

    /// Insert an empty column before `index`.
    fn insert_column(&mut self, index: usize) -> bool;

    fn remove_column(&mut self, index: usize) -> bool;
}

/// Provider handle shared by the data layer and the row-identity key handler.
pub type SharedDataProvider = Rc<RefCell<dyn DataProvider>>;

/// In-memory provider over a list of row objects.
#[derive(Debug, Clone, Default)]
pub struct ListDataProvider {
    columns: usize,
    rows: Vec<RowObject>,
    next_id: u64,
}

impl ListDataProvider {
    /// Build from row objects; rows shorter than `columns` read as empty cells.
    pub fn new(columns: usize, rows: Vec<RowObject>) -> Self {
        let next_id = rows.iter().map(|r| r.id.0 + 1).max().unwrap_or(0);
        Self {
            columns,
            rows,
            next_id,
        }
    }

    /// Build from plain value rows, assigning sequential row ids.
    pub fn from_values(rows: Vec<Vec<CellValue>>) -> Self {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .zip(0u64..)
            .map(|(cells, id)| RowObject::new(RowId(id), cells))
            .collect();
        Self::new(columns, rows)
    }

    /// A `columns × rows` grid whose cells read `"c{column}r{row}"`.
    pub fn sample(columns: usize, rows: usize) -> Self {
        Self::from_values(
            (0..rows)
                .map(|r| {
                    (0..columns)
                        .map(|c| CellValue::Text(format!("c{c}r{r}")))
                        .collect()
                })
                .collect(),
        )
    }

    /// Allocate a fresh row id for a row about to be inserted.
    pub fn next_row_id(&mut self) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn rows(&self) -> &[RowObject] {
        &self.rows
    }

    /// Wrap in the shared handle the layer stack expects.
    pub fn into_shared(self) -> SharedDataProvider {
        Rc::new(RefCell::new(self))
    }
}

impl DataProvider for ListDataProvider {
    fn column_count(&self) -> usize {
        self.columns
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn value(&self, column: usize, row: usize) -> Option<CellValue> {
        if column >= self.columns {
            return None;
        }
        let row = self.rows.get(row)?;
        Some(row.cell(column).cloned().unwrap_or_default())
    }

    fn set_value(&mut self, column: usize, row: usize, value: CellValue) -> Option<CellValue> {
        if column >= self.columns {
            return None;
        }
        let row = self.rows.get_mut(row)?;
        if row.cells.len() <= column {
            row.cells.resize(column + 1, CellValue::Empty);
        }
        let cell = row.cells.get_mut(column)?;
        Some(std::mem::replace(cell, value))
    }

    fn row_id(&self, row: usize) -> Option<RowId> {
        self.rows.get(row).map(|r| r.id)
    }

    fn row_kind(&self, row: usize) -> Option<RowKind> {
        self.rows.get(row).map(|r| r.kind)
    }

    fn index_of_row(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    fn row_object(&self, row: usize) -> Option<RowObject> {
        self.rows.get(row).cloned()
    }

    fn insert_row(&mut self, index: usize, row: RowObject) -> bool {
        if index > self.rows.len() {
            return false;
        }
        self.next_id = self.next_id.max(row.id.0 + 1);
        self.rows.insert(index, row);
        true
    }

    fn remove_row(&mut self, index: usize) -> Option<RowObject> {
        if index >= self.rows.len() {
            return None;
        }
        Some(self.rows.remove(index))
    }

    fn insert_column(&mut self, index: usize) -> bool {
        if index > self.columns {
            return false;
        }
        for row in &mut self.rows {
            if row.cells.len() > index {
                row.cells.insert(index, CellValue::Empty);
            }
        }
        self.columns += 1;
        true
    }

    fn remove_column(&mut self, index: usize) -> bool {
        if index >= self.columns {
            return false;
        }
        for row in &mut self.rows {
            if row.cells.len() > index {
                row.cells.remove(index);
            }
        }
        self.columns -= 1;
        true
    }
}
