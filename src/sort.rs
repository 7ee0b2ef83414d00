/// LazyGrid Sort Tracker
///
/// Ordered set of per-column sort directives. Each column gets a monotonic
/// order position the first time it is referenced, and keeps it on later
/// updates, so the first-toggled column retains primacy in multi-column sort
/// until it is explicitly cleared. Sorting itself is server-delegated; this
/// tracker only feeds the ORDER BY the hosting layer builds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One column's sort directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    pub column_id: String,
    /// `Some(true)` ascending, `Some(false)` descending, `None` unset.
    pub order_asc: Option<bool>,
    /// Insertion sequence number; breaks ties for multi-column sort.
    pub order_position: u32,
}

#[derive(Debug, Default)]
pub struct SortTracker {
    directives: HashMap<String, SortDirective>,
    next_position: u32,
}

impl SortTracker {
    pub fn new() -> Self {
        SortTracker::default()
    }

    /// Directives ordered by `order_position` ascending.
    pub fn get(&self) -> Vec<SortDirective> {
        let mut out: Vec<SortDirective> = self.directives.values().cloned().collect();
        out.sort_by_key(|d| d.order_position);
        out
    }

    /// Inserts or updates the directive for `column_id`. When `multiple` is
    /// false all existing directives are cleared first. A fresh order
    /// position is assigned only when the column had no prior directive.
    pub fn set_column_sorting(&mut self, column_id: &str, order_asc: Option<bool>, multiple: bool) {
        if !multiple {
            self.clear();
        }
        match self.directives.get_mut(column_id) {
            Some(directive) => directive.order_asc = order_asc,
            None => {
                let directive = SortDirective {
                    column_id: column_id.to_string(),
                    order_asc,
                    order_position: self.next_position,
                };
                self.next_position += 1;
                self.directives.insert(column_id.to_string(), directive);
            }
        }
    }

    /// Removes the directive if present; an absent id is not an error.
    pub fn remove_column_sorting(&mut self, column_id: &str) {
        self.directives.remove(column_id);
    }

    pub fn clear(&mut self) {
        self.directives.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}
