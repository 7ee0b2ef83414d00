/// LazyGrid - Client-Side Data-Grid Controller
///
/// Manages lazily-fetched, paginated, sortable, editable tabular data backed
/// by a remote query service. The hosting application injects an async data
/// source and a dialog service; the controller owns the chunked row cache,
/// the per-cell edit tracker, the sort directives and the fetch/save
/// coordination around them. Rendering and transport stay outside.

pub mod editor;
pub mod error;
pub mod model;
pub mod sort;
pub mod source;
pub mod store;
pub mod value;

pub use editor::{EditTracker, RowDiff};
pub use error::ServiceError;
pub use model::{
    AccessMode, GridModel, GridModelOptions, RequestedData, SortSpec, FETCH_DEFAULT, FETCH_MAX,
    FETCH_MIN,
};
pub use sort::{SortDirective, SortTracker};
pub use source::{DialogService, FetchResult, GridDataSource, SaveResult};
pub use store::RowStore;
pub use value::{CellValue, Column, DataKind, Row};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use async_trait::async_trait;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    fn make_row(i: usize) -> Row {
        vec![
            CellValue::Int(i as i64),
            CellValue::Text(format!("name{i}")),
        ]
    }

    fn make_columns() -> Vec<Column> {
        vec![
            Column::new("id", "Id").with_data_kind(DataKind::Numeric),
            Column::new("name", "Name").with_data_kind(DataKind::String),
        ]
    }

    /// Data source over a fixed dataset with programmable failures and call
    /// counting.
    struct ScriptedSource {
        total_rows: usize,
        fetch_calls: Cell<usize>,
        save_calls: Cell<usize>,
        fetch_failures: Cell<usize>,
        save_failures: Cell<usize>,
    }

    impl ScriptedSource {
        fn new(total_rows: usize) -> Rc<Self> {
            Rc::new(ScriptedSource {
                total_rows,
                fetch_calls: Cell::new(0),
                save_calls: Cell::new(0),
                fetch_failures: Cell::new(0),
                save_failures: Cell::new(0),
            })
        }
    }

    #[async_trait(?Send)]
    impl GridDataSource for ScriptedSource {
        async fn fetch_rows(
            &self,
            offset: usize,
            count: usize,
        ) -> Result<FetchResult, ServiceError> {
            self.fetch_calls.set(self.fetch_calls.get() + 1);
            if self.fetch_failures.get() > 0 {
                self.fetch_failures.set(self.fetch_failures.get() - 1);
                return Err(ServiceError::service(
                    "query failed",
                    "ERROR: query failed\nDETAIL: scripted",
                    true,
                ));
            }
            let end = (offset + count).min(self.total_rows);
            let rows: Vec<Row> = (offset..end).map(make_row).collect();
            Ok(FetchResult {
                rows,
                columns: Some(make_columns()),
                is_fully_loaded: offset + count >= self.total_rows,
                duration_ms: Some(12.0),
                status_message: "ok".to_string(),
            })
        }

        async fn save_rows(&self, diffs: &[RowDiff]) -> Result<SaveResult, ServiceError> {
            self.save_calls.set(self.save_calls.get() + 1);
            if self.save_failures.get() > 0 {
                self.save_failures.set(self.save_failures.get() - 1);
                return Err(ServiceError::other("IoError", "connection reset"));
            }
            // Confirm each diff by echoing a full row with the edited values
            // applied over the baseline.
            let rows = diffs
                .iter()
                .map(|diff| {
                    let mut row = make_row(diff.row_index);
                    if let Some(v) = diff.values.get("id") {
                        row[0] = v.clone();
                    }
                    if let Some(v) = diff.values.get("name") {
                        row[1] = v.clone();
                    }
                    row
                })
                .collect();
            Ok(SaveResult {
                rows,
                status_message: "saved".to_string(),
                duration_ms: Some(5.0),
            })
        }
    }

    /// Dialog service answering retry prompts from a script.
    struct ScriptedDialog {
        answers: RefCell<VecDeque<bool>>,
        prompts: Cell<usize>,
        details_shown: Cell<usize>,
    }

    impl ScriptedDialog {
        fn new(answers: &[bool]) -> Rc<Self> {
            Rc::new(ScriptedDialog {
                answers: RefCell::new(answers.iter().copied().collect()),
                prompts: Cell::new(0),
                details_shown: Cell::new(0),
            })
        }
    }

    #[async_trait(?Send)]
    impl DialogService for ScriptedDialog {
        async fn confirm_retry(&self, _error: &ServiceError) -> bool {
            self.prompts.set(self.prompts.get() + 1);
            self.answers.borrow_mut().pop_front().unwrap_or(false)
        }

        async fn show_error_details(&self, _error: &ServiceError) {
            self.details_shown.set(self.details_shown.get() + 1);
        }
    }

    fn make_model(
        source: Rc<ScriptedSource>,
        dialogs: Rc<ScriptedDialog>,
        access: AccessMode,
    ) -> GridModel {
        let mut options = GridModelOptions::new("conn-1");
        options.access = access;
        GridModel::new(options, source, dialogs)
    }

    #[tokio::test]
    async fn cached_window_short_circuits_the_data_source() {
        let source = ScriptedSource::new(100);
        let dialogs = ScriptedDialog::new(&[]);
        let mut model = make_model(source.clone(), dialogs, AccessMode::Default);

        let first = model.request_rows(0, 10).await.unwrap();
        assert_eq!(first.rows.len(), 10);
        assert_eq!(source.fetch_calls.get(), 1);

        // Fully contained windows are answered from the cache.
        let again = model.request_rows(0, 10).await.unwrap();
        assert_eq!(again.rows, first.rows);
        let inner = model.request_rows(3, 4).await.unwrap();
        assert_eq!(inner.rows, (3..7).map(make_row).collect::<Vec<_>>());
        assert_eq!(source.fetch_calls.get(), 1);

        // A window past the cached range goes back to the source.
        model.request_rows(10, 10).await.unwrap();
        assert_eq!(source.fetch_calls.get(), 2);
    }

    #[tokio::test]
    async fn fully_loaded_set_answers_every_window_from_cache() {
        let source = ScriptedSource::new(5);
        let dialogs = ScriptedDialog::new(&[]);
        let mut model = make_model(source.clone(), dialogs, AccessMode::Default);

        let data = model.request_rows(0, 10).await.unwrap();
        assert_eq!(data.rows.len(), 5);
        assert!(data.is_fully_loaded);
        assert!(model.is_fully_loaded());

        // Even uncovered windows short-circuit once the set is fully loaded.
        let tail = model.request_rows(3, 10).await.unwrap();
        assert_eq!(tail.rows.len(), 2);
        assert_eq!(source.fetch_calls.get(), 1);
    }

    #[tokio::test]
    async fn insert_inside_known_bounds_preserves_has_more() {
        let source = ScriptedSource::new(100);
        let dialogs = ScriptedDialog::new(&[]);
        let mut model = make_model(source, dialogs, AccessMode::Default);

        model.insert_rows(0, (0..10).map(make_row).collect(), false);
        assert!(model.is_fully_loaded());

        // Re-inserting inside the known range must not resurrect has-more.
        model.insert_rows(2, vec![make_row(2)], true);
        assert!(model.is_fully_loaded());

        // Extending past the known range updates the flag again.
        model.insert_rows(10, vec![make_row(10)], true);
        assert!(!model.is_fully_loaded());
    }

    #[tokio::test]
    async fn edit_back_to_original_value_yields_empty_diff() {
        let source = ScriptedSource::new(10);
        let dialogs = ScriptedDialog::new(&[]);
        let mut model = make_model(source, dialogs, AccessMode::Default);
        model.request_rows(0, 10).await.unwrap();

        model.on_cell_editing_stopped(2, "name", CellValue::Text("changed".to_string()));
        assert!(model.is_cell_edited(2, "name"));

        model.on_cell_editing_stopped(2, "name", CellValue::Text("name2".to_string()));
        assert!(!model.is_cell_edited(2, "name"));
        assert!(!model.is_edited());
    }

    #[tokio::test]
    async fn cancel_changes_clears_every_pending_edit() {
        let source = ScriptedSource::new(10);
        let dialogs = ScriptedDialog::new(&[]);
        let mut model = make_model(source, dialogs, AccessMode::Default);
        model.request_rows(0, 10).await.unwrap();

        for row in 0..4 {
            model.on_cell_editing_stopped(row, "id", CellValue::Int(100 + row as i64));
            model.on_cell_editing_stopped(row, "name", CellValue::Text("x".to_string()));
        }
        assert!(model.is_edited());

        model.cancel_changes();
        assert!(!model.is_edited());
        for row in 0..4 {
            assert!(!model.is_cell_edited(row, "id"));
        }
    }

    #[tokio::test]
    async fn sort_toggle_updates_in_place_without_reordering() {
        let source = ScriptedSource::new(10);
        let dialogs = ScriptedDialog::new(&[]);
        let mut model = make_model(source, dialogs, AccessMode::Default);

        model.set_column_sorting("a", Some(true), false);
        model.set_column_sorting("b", Some(false), true);
        let sorted = model.sorted_columns();
        assert_eq!(sorted.len(), 2);
        assert_eq!(
            (&sorted[0].column_id[..], sorted[0].order_asc),
            ("a", Some(true))
        );
        assert_eq!(
            (&sorted[1].column_id[..], sorted[1].order_asc),
            ("b", Some(false))
        );

        model.set_column_sorting("a", Some(false), true);
        let sorted = model.sorted_columns();
        assert_eq!(
            (&sorted[0].column_id[..], sorted[0].order_asc),
            ("a", Some(false))
        );
        assert_eq!(
            (&sorted[1].column_id[..], sorted[1].order_asc),
            ("b", Some(false))
        );
    }

    #[tokio::test]
    async fn sort_change_refetches_from_offset_zero() {
        let source = ScriptedSource::new(50);
        let dialogs = ScriptedDialog::new(&[]);
        let mut model = make_model(source.clone(), dialogs, AccessMode::Default);
        model.set_chunk_size(20);
        model.request_rows(0, 20).await.unwrap();
        model.on_cell_editing_stopped(0, "name", CellValue::Text("pending".to_string()));
        let mut reset_rx = model.subscribe_reset();

        model
            .on_sort_changed(&[SortSpec {
                column_id: "name".to_string(),
                order_asc: Some(true),
            }])
            .await
            .unwrap();

        assert_eq!(source.fetch_calls.get(), 2);
        assert_eq!(model.sorted_columns().len(), 1);
        // Refresh dropped the pending edit and notified subscribers.
        assert!(!model.is_edited());
        assert!(reset_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn save_retry_loop_converges_after_scripted_failures() {
        let source = ScriptedSource::new(10);
        source.save_failures.set(2);
        let dialogs = ScriptedDialog::new(&[true, true]);
        let mut model = make_model(source.clone(), dialogs.clone(), AccessMode::Default);
        model.request_rows(0, 10).await.unwrap();

        model.on_cell_editing_stopped(1, "name", CellValue::Text("edited".to_string()));
        model.save_changes().await;

        assert_eq!(source.save_calls.get(), 3);
        assert_eq!(dialogs.prompts.get(), 2);
        assert!(!model.is_edited());
        // Confirmed values were merged into the baseline.
        assert_eq!(
            model.request_rows(1, 1).await.unwrap().rows[0][1],
            CellValue::Text("edited".to_string())
        );
        assert_eq!(model.status_message(), "saved");
        assert!(!model.is_loader_visible());
    }

    #[tokio::test]
    async fn declining_retry_leaves_edits_pending() {
        let source = ScriptedSource::new(10);
        source.save_failures.set(5);
        let dialogs = ScriptedDialog::new(&[false]);
        let mut model = make_model(source.clone(), dialogs.clone(), AccessMode::Default);
        model.request_rows(0, 10).await.unwrap();

        model.on_cell_editing_stopped(0, "id", CellValue::Int(999));
        model.save_changes().await;

        assert_eq!(source.save_calls.get(), 1);
        assert_eq!(dialogs.prompts.get(), 1);
        // No silent data loss: the edit stays pending for a manual retry.
        assert!(model.is_edited());
        assert!(model.is_cell_edited(0, "id"));
    }

    #[tokio::test]
    async fn readonly_access_gates_edits_and_saves() {
        let source = ScriptedSource::new(10);
        let dialogs = ScriptedDialog::new(&[]);
        let mut model = make_model(source.clone(), dialogs, AccessMode::Readonly);
        model.request_rows(0, 10).await.unwrap();

        model.on_cell_editing_stopped(0, "name", CellValue::Text("nope".to_string()));
        assert!(!model.is_edited());
        assert!(!model.is_cell_edited(0, "name"));

        model.save_changes().await;
        assert_eq!(source.save_calls.get(), 0);
    }

    #[tokio::test]
    async fn fetch_failure_records_durable_error_state_and_propagates() {
        let source = ScriptedSource::new(10);
        source.fetch_failures.set(1);
        let dialogs = ScriptedDialog::new(&[]);
        let mut model = make_model(source.clone(), dialogs.clone(), AccessMode::Default);

        let err = model.request_rows(0, 10).await.unwrap_err();
        assert_eq!(err.display_message(), "query failed");
        assert_eq!(model.error_message(), "query failed");
        assert!(model.has_details());
        assert!(!model.is_loader_visible());

        model.on_show_details().await;
        assert_eq!(dialogs.details_shown.get(), 1);

        // The next successful fetch clears the durable error state.
        model.request_rows(0, 10).await.unwrap();
        assert_eq!(model.error_message(), "");
        assert!(!model.has_details());
        model.on_show_details().await;
        assert_eq!(dialogs.details_shown.get(), 1);
    }

    #[tokio::test]
    async fn refresh_failure_skips_the_reset_signal() {
        let source = ScriptedSource::new(10);
        let dialogs = ScriptedDialog::new(&[]);
        let mut model = make_model(source.clone(), dialogs, AccessMode::Default);
        let mut reset_rx = model.subscribe_reset();

        source.fetch_failures.set(1);
        assert!(model.refresh().await.is_err());
        assert!(reset_rx.try_recv().is_err());

        model.refresh().await.unwrap();
        assert!(reset_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn chunk_size_change_notifies_without_refetching() {
        let source = ScriptedSource::new(10);
        let dialogs = ScriptedDialog::new(&[]);
        let mut model = make_model(source.clone(), dialogs, AccessMode::Default);
        let mut chunk_rx = model.subscribe_chunk_size_changed();

        model.set_chunk_size(0);
        assert_eq!(model.chunk_size(), FETCH_DEFAULT);
        model.set_chunk_size(9_999);
        assert_eq!(model.chunk_size(), FETCH_MAX);
        assert!(chunk_rx.try_recv().is_ok());
        assert_eq!(source.fetch_calls.get(), 0);
    }

    #[tokio::test]
    async fn loader_suppression_mode_still_fetches() {
        let source = ScriptedSource::new(10);
        let dialogs = ScriptedDialog::new(&[]);
        let mut options = GridModelOptions::new("conn-1");
        options.no_loader_while_fetching = true;
        let mut model = GridModel::new(options, source.clone(), dialogs);

        model.request_rows(0, 5).await.unwrap();
        assert_eq!(source.fetch_calls.get(), 1);
        assert!(!model.is_loader_visible());
    }
}
