/// LazyGrid Row Store
///
/// Sparse, chunk-addressable cache of fetched rows. Rows arrive in
/// caller-defined windows and may land anywhere, so storage is a vector of
/// optional slots: `None` marks an index whose row has not been fetched yet.
/// Column metadata is set once per result set and survives `reset_data` so
/// the grid header does not flicker on refresh.

use crate::value::{CellValue, Column, Row};

/// Holds fetched rows and column metadata for one result set.
#[derive(Debug, Default)]
pub struct RowStore {
    rows: Vec<Option<Row>>,
    columns: Vec<Column>,
}

impl RowStore {
    pub fn new() -> Self {
        RowStore::default()
    }

    /// True when no row has been fetched yet.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.is_none())
    }

    /// Logical length of the store, including unloaded gaps.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True iff every index in `[offset, offset + count)` is populated.
    /// A zero-length window is trivially loaded.
    pub fn is_chunk_loaded(&self, offset: usize, count: usize) -> bool {
        let end = offset.saturating_add(count);
        if end > self.rows.len() {
            return false;
        }
        self.rows[offset..end].iter().all(|r| r.is_some())
    }

    /// Returns the loaded prefix of the requested window. The result is
    /// shorter than `count` when an unloaded tail exists.
    pub fn get_chunk(&self, offset: usize, count: usize) -> Vec<Row> {
        let end = offset.saturating_add(count).min(self.rows.len());
        if offset >= end {
            return Vec::new();
        }
        self.rows[offset..end]
            .iter()
            .map_while(|r| r.clone())
            .collect()
    }

    /// Overwrites or extends storage starting at `position`, growing the
    /// logical length with unloaded slots as needed.
    pub fn insert_rows(&mut self, position: usize, rows: Vec<Row>) {
        let needed = position + rows.len();
        if needed > self.rows.len() {
            self.rows.resize(needed, None);
        }
        for (i, row) in rows.into_iter().enumerate() {
            self.rows[position + i] = Some(row);
        }
    }

    /// Replaces the row at `row_index`, growing the store if necessary.
    pub fn set_row(&mut self, row_index: usize, row: Row) {
        if row_index >= self.rows.len() {
            self.rows.resize(row_index + 1, None);
        }
        self.rows[row_index] = Some(row);
    }

    /// Baseline value of one cell, or `None` when the row is not loaded or
    /// the column id is unknown.
    pub fn get_value(&self, row_index: usize, column_id: &str) -> Option<&CellValue> {
        let col_idx = self.column_index(column_id)?;
        self.rows.get(row_index)?.as_ref()?.get(col_idx)
    }

    /// Writes one cell of a loaded row. Silently ignores unloaded rows and
    /// unknown columns; the caller already validated both when the edit was
    /// first recorded.
    pub fn set_value(&mut self, row_index: usize, column_id: &str, value: CellValue) {
        let Some(col_idx) = self.column_index(column_id) else {
            return;
        };
        if let Some(Some(row)) = self.rows.get_mut(row_index) {
            if let Some(cell) = row.get_mut(col_idx) {
                *cell = value;
            }
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_index(&self, column_id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == column_id)
    }

    /// Sets column metadata. The result set's columns are fixed, so this is
    /// called once after the first fetch (or again after a reset when the
    /// shape of the result changed).
    pub fn set_columns(&mut self, columns: Vec<Column>) {
        self.columns = columns;
    }

    /// Clears all rows. Column metadata persists across reset.
    pub fn reset_data(&mut self) {
        self.rows.clear();
    }
}
