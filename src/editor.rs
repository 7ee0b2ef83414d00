/// LazyGrid Edit Tracker
///
/// Records per-cell pending edits against the row store's baseline and turns
/// them into a minimal diff set for saving. Committing a value equal to the
/// baseline removes the record instead of storing a no-op diff. The tracker
/// is pure state: it never fails, and the surrounding save loop owns all
/// transport error handling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::RowStore;
use crate::value::{CellValue, Row};

/// Cell-level changes for one edited row. Only the changed columns appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowDiff {
    pub row_index: usize,
    pub values: BTreeMap<String, CellValue>,
}

#[derive(Debug, Default)]
pub struct EditTracker {
    // Keyed by row index; inner map keyed by column id.
    edits: BTreeMap<usize, BTreeMap<String, CellValue>>,
}

impl EditTracker {
    pub fn new() -> Self {
        EditTracker::default()
    }

    /// Records or updates a pending edit. A value equal to the store's
    /// baseline for that cell removes the record (treated as a revert). Rows
    /// that are not loaded in the store are ignored: an edit can only exist
    /// for a row that existed when the user touched it.
    pub fn edit_cell_value(
        &mut self,
        store: &RowStore,
        row_index: usize,
        column_id: &str,
        value: CellValue,
    ) {
        let Some(baseline) = store.get_value(row_index, column_id) else {
            return;
        };
        if *baseline == value {
            self.revert_cell_value(row_index, column_id);
            return;
        }
        self.edits
            .entry(row_index)
            .or_default()
            .insert(column_id.to_string(), value);
    }

    pub fn is_cell_edited(&self, row_index: usize, column_id: &str) -> bool {
        self.edits
            .get(&row_index)
            .is_some_and(|row| row.contains_key(column_id))
    }

    /// True iff any edit record exists.
    pub fn is_edited(&self) -> bool {
        !self.edits.is_empty()
    }

    /// The pending value for a cell, if one is recorded.
    pub fn get_cell_value(&self, row_index: usize, column_id: &str) -> Option<&CellValue> {
        self.edits.get(&row_index)?.get(column_id)
    }

    /// Removes a single edit record.
    pub fn revert_cell_value(&mut self, row_index: usize, column_id: &str) {
        if let Some(row) = self.edits.get_mut(&row_index) {
            row.remove(column_id);
            if row.is_empty() {
                self.edits.remove(&row_index);
            }
        }
    }

    /// One diff per edited row, ordered by row index. Rows with zero net
    /// changes are excluded by construction.
    pub fn get_changes(&self) -> Vec<RowDiff> {
        self.edits
            .iter()
            .map(|(row_index, values)| RowDiff {
                row_index: *row_index,
                values: values.clone(),
            })
            .collect()
    }

    /// Clears every edit record. `silent` is for the caller layer: it
    /// suppresses whatever change notification the host attaches to an
    /// explicit cancel, and this tracker only carries the flag through.
    pub fn cancel_changes(&mut self, _silent: bool) {
        self.edits.clear();
    }

    /// Merges server-confirmed rows back into the baseline after a
    /// successful save. `diffs` is the exact set that was sent; confirmed
    /// rows are zipped against it positionally. Each confirmed row replaces
    /// the store row at the diff's index, and only the cells that were part
    /// of that diff have their edit records cleared, because the response
    /// reflects only the submitted changes' resolution. Edits made elsewhere
    /// while the save was in flight stay pending.
    pub fn apply_changes(&mut self, store: &mut RowStore, diffs: &[RowDiff], confirmed: &[Row]) {
        for (diff, row) in diffs.iter().zip(confirmed.iter()) {
            store.set_row(diff.row_index, row.clone());
            for column_id in diff.values.keys() {
                self.revert_cell_value(diff.row_index, column_id);
            }
        }
    }
}
