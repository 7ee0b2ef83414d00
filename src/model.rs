/// LazyGrid Grid Model
///
/// Composes the row store, edit tracker and sort tracker behind the contract
/// the rendering layer consumes, and orchestrates chunked fetches and the
/// save-retry loop around the injected data source. One model instance is
/// one logical actor: every operation takes `&mut self`, so overlapping
/// fetches cannot be issued through a single owner. The model does not queue
/// or coalesce concurrent requests; that discipline belongs to the caller.

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};
use tokio::sync::broadcast;

use crate::editor::{EditTracker, RowDiff};
use crate::error::ServiceError;
use crate::sort::{SortDirective, SortTracker};
use crate::source::{DialogService, GridDataSource};
use crate::store::RowStore;
use crate::value::{CellValue, Column, Row};

/// Chunk-size bounds. A requested size is clamped into
/// `[FETCH_MIN, FETCH_MAX]`; zero means "use the default".
pub const FETCH_MIN: usize = 1;
pub const FETCH_MAX: usize = 5000;
pub const FETCH_DEFAULT: usize = 200;

/// Read-write vs read-only policy gate on edit and save operations. This is
/// policy, not a data-model restriction: a readonly grid still caches rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    #[default]
    Default,
    Readonly,
}

/// Identity and policy for one grid model. The identity fields are fixed for
/// the model's lifetime; `result_id` may be filled in after the first fetch.
#[derive(Debug, Clone, Default)]
pub struct GridModelOptions {
    /// Caller-supplied id; generated from a process-wide counter when absent.
    pub table_id: Option<String>,
    pub connection_id: String,
    pub container_node_path: Option<String>,
    pub result_id: Option<String>,
    /// Source description used by the host, e.g. the SQL text for export.
    pub source_name: Option<String>,
    /// Suppresses the loader flag during fetches (background refresh).
    pub no_loader_while_fetching: bool,
    pub access: AccessMode,
}

impl GridModelOptions {
    pub fn new(connection_id: impl Into<String>) -> Self {
        GridModelOptions {
            connection_id: connection_id.into(),
            ..GridModelOptions::default()
        }
    }
}

/// One entry of the rendering layer's sort state, in grid order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column_id: String,
    pub order_asc: Option<bool>,
}

/// Rows handed back to the rendering layer for one requested window.
#[derive(Debug, Clone)]
pub struct RequestedData {
    pub rows: Vec<Row>,
    pub columns: Vec<Column>,
    pub is_fully_loaded: bool,
}

fn next_table_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    format!("grid-{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// The grid controller: chunked fetch/cache coordination, edit tracking and
/// error/retry orchestration for one result set.
pub struct GridModel {
    table_id: String,
    connection_id: String,
    container_node_path: Option<String>,
    result_id: Option<String>,
    source_name: Option<String>,
    no_loader_while_fetching: bool,
    access: AccessMode,

    source: Rc<dyn GridDataSource>,
    dialogs: Rc<dyn DialogService>,

    store: RowStore,
    editor: EditTracker,
    sorting: SortTracker,

    chunk_size: usize,
    has_more_rows: bool,
    loader_visible: bool,
    query_duration_ms: f64,
    status_message: String,
    error_message: String,
    has_details: bool,
    last_error: Option<ServiceError>,
    query_where_filter: Option<String>,

    reset_tx: broadcast::Sender<()>,
    chunk_size_tx: broadcast::Sender<()>,
}

impl GridModel {
    pub fn new(
        options: GridModelOptions,
        source: Rc<dyn GridDataSource>,
        dialogs: Rc<dyn DialogService>,
    ) -> Self {
        let (reset_tx, _) = broadcast::channel(16);
        let (chunk_size_tx, _) = broadcast::channel(16);
        GridModel {
            table_id: options.table_id.unwrap_or_else(next_table_id),
            connection_id: options.connection_id,
            container_node_path: options.container_node_path,
            result_id: options.result_id,
            source_name: options.source_name,
            no_loader_while_fetching: options.no_loader_while_fetching,
            access: options.access,
            source,
            dialogs,
            store: RowStore::new(),
            editor: EditTracker::new(),
            sorting: SortTracker::new(),
            chunk_size: FETCH_DEFAULT,
            has_more_rows: true,
            loader_visible: false,
            query_duration_ms: 0.0,
            status_message: String::new(),
            error_message: String::new(),
            has_details: false,
            last_error: None,
            query_where_filter: None,
            reset_tx,
            chunk_size_tx,
        }
    }

    // ==================== Identity and state getters ====================

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn container_node_path(&self) -> Option<&str> {
        self.container_node_path.as_deref()
    }

    pub fn result_id(&self) -> Option<&str> {
        self.result_id.as_deref()
    }

    /// Filled in by the host once the first fetch reports the result id.
    pub fn set_result_id(&mut self, result_id: Option<String>) {
        self.result_id = result_id;
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    pub fn set_access(&mut self, access: AccessMode) {
        self.access = access;
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn is_loader_visible(&self) -> bool {
        self.loader_visible
    }

    pub fn is_fully_loaded(&self) -> bool {
        !self.has_more_rows
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn columns(&self) -> &[Column] {
        self.store.columns()
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn has_details(&self) -> bool {
        self.has_details
    }

    pub fn query_duration_ms(&self) -> f64 {
        self.query_duration_ms
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn query_where_filter(&self) -> Option<&str> {
        self.query_where_filter.as_deref()
    }

    pub fn set_query_where_filter(&mut self, filter: Option<String>) {
        self.query_where_filter = filter;
    }

    // ==================== Notification streams ====================

    /// Fires after a refresh completes. Zero-payload; re-pull state through
    /// the getters. Events sent before subscription are not replayed.
    pub fn subscribe_reset(&self) -> broadcast::Receiver<()> {
        self.reset_tx.subscribe()
    }

    /// Fires after the chunk size changes.
    pub fn subscribe_chunk_size_changed(&self) -> broadcast::Receiver<()> {
        self.chunk_size_tx.subscribe()
    }

    // ==================== Sorting ====================

    /// Directives ordered by first-toggled column first.
    pub fn sorted_columns(&self) -> Vec<SortDirective> {
        self.sorting.get()
    }

    pub fn set_column_sorting(&mut self, column_id: &str, order_asc: Option<bool>, multiple: bool) {
        self.sorting.set_column_sorting(column_id, order_asc, multiple);
    }

    pub fn remove_column_sorting(&mut self, column_id: &str) {
        self.sorting.remove_column_sorting(column_id);
    }

    /// Replaces the sort state with the grid's and refetches from offset 0.
    /// Sorting is server-delegated; cached rows are never re-sorted locally.
    pub async fn on_sort_changed(&mut self, sorting: &[SortSpec]) -> Result<(), ServiceError> {
        self.sorting.clear();
        for spec in sorting {
            self.sorting
                .set_column_sorting(&spec.column_id, spec.order_asc, true);
        }
        self.refresh().await
    }

    // ==================== Rows and columns ====================

    /// Merges rows at `position`. The has-more flag only updates when the
    /// insert extended beyond the previously known row count; a fetch that
    /// lands entirely within known bounds must not disturb it.
    pub fn insert_rows(&mut self, position: usize, rows: Vec<Row>, has_more: bool) {
        let is_rows_addition = self.store.row_count() < position + rows.len();
        self.store.insert_rows(position, rows);
        if is_rows_addition {
            self.has_more_rows = has_more;
        }
    }

    pub fn set_columns(&mut self, columns: Vec<Column>) {
        self.store.set_columns(columns);
    }

    /// Cache-aware read path. Windows fully covered by the store (or any
    /// window once the set is fully loaded) are answered synchronously
    /// without touching the data source.
    pub async fn request_rows(
        &mut self,
        offset: usize,
        count: usize,
    ) -> Result<RequestedData, ServiceError> {
        if self.store.is_chunk_loaded(offset, count) || self.is_fully_loaded() {
            debug!(
                "grid {}: cache hit for rows [{}, {})",
                self.table_id,
                offset,
                offset + count
            );
            return Ok(RequestedData {
                rows: self.store.get_chunk(offset, count),
                columns: self.store.columns().to_vec(),
                is_fully_loaded: self.is_fully_loaded(),
            });
        }

        self.loader_visible = !self.no_loader_while_fetching;
        let result = self.source.fetch_rows(offset, count).await;
        // Released on every exit path, error included; a stuck spinner is
        // worse than a missed frame of it.
        self.loader_visible = false;

        match result {
            Ok(response) => {
                let is_fully_loaded = response.is_fully_loaded;
                self.insert_rows(offset, response.rows.clone(), !is_fully_loaded);
                if self.store.columns().is_empty() {
                    if let Some(columns) = response.columns {
                        self.store.set_columns(columns);
                    }
                }
                self.clear_errors();
                self.update_info(response.status_message, response.duration_ms);
                Ok(RequestedData {
                    rows: response.rows,
                    columns: self.store.columns().to_vec(),
                    is_fully_loaded,
                })
            }
            Err(err) => {
                self.record_error(&err);
                Err(err)
            }
        }
    }

    /// Resets local state, fetches the first chunk, then notifies reset
    /// subscribers. A fetch failure propagates before the signal fires.
    pub async fn refresh(&mut self) -> Result<(), ServiceError> {
        self.reset_data();
        self.request_rows(0, self.chunk_size).await?;
        let _ = self.reset_tx.send(());
        Ok(())
    }

    /// Best-effort cooperative cancellation hook. The default model performs
    /// no action; a host wanting real cancellation threads a token through
    /// its data source instead.
    pub fn cancel_fetch(&self) {}

    /// Clamps into `[FETCH_MIN, FETCH_MAX]`, zero meaning the default, and
    /// notifies subscribers. Does not refetch; the caller decides.
    pub fn set_chunk_size(&mut self, count: usize) {
        self.chunk_size = clamp_chunk_size(count);
        let _ = self.chunk_size_tx.send(());
    }

    // ==================== Editing ====================

    pub fn is_edited(&self) -> bool {
        if self.access == AccessMode::Readonly {
            return false;
        }
        self.editor.is_edited()
    }

    pub fn is_cell_edited(&self, row_index: usize, column_id: &str) -> bool {
        self.editor.is_cell_edited(row_index, column_id)
    }

    /// Records the value the user left in a cell. No-op under readonly
    /// access; the policy gate sits here, not in the tracker.
    pub fn on_cell_editing_stopped(&mut self, row_index: usize, column_id: &str, value: CellValue) {
        if self.access == AccessMode::Readonly {
            return;
        }
        self.editor
            .edit_cell_value(&self.store, row_index, column_id, value);
    }

    pub fn revert_cell_value(&mut self, row_index: usize, column_id: &str) {
        self.editor.revert_cell_value(row_index, column_id);
    }

    pub fn cancel_changes(&mut self) {
        self.editor.cancel_changes(false);
    }

    /// Sends the pending diff set through the data source, asking the user
    /// to retry on failure. The same snapshot is resent on every retry.
    /// Declining leaves the edits in place, unsent; save errors never
    /// propagate past this method.
    pub async fn save_changes(&mut self) {
        if self.access == AccessMode::Readonly {
            return;
        }
        let diffs = self.editor.get_changes();
        if diffs.is_empty() {
            return;
        }

        loop {
            match self.try_save_changes(&diffs).await {
                Ok(()) => return,
                Err(err) => {
                    warn!(
                        "grid {}: save failed: {}",
                        self.table_id,
                        err.display_message()
                    );
                    if !self.dialogs.confirm_retry(&err).await {
                        return;
                    }
                }
            }
        }
    }

    /// Opens the details dialog for the last recorded fetch error, if the
    /// error carries details.
    pub async fn on_show_details(&self) {
        if let Some(err) = &self.last_error {
            self.dialogs.show_error_details(err).await;
        }
    }

    // ==================== Internals ====================

    async fn try_save_changes(&mut self, diffs: &[RowDiff]) -> Result<(), ServiceError> {
        self.loader_visible = true;
        let result = self.source.save_rows(diffs).await;
        self.loader_visible = false;

        let data = result?;
        self.editor.apply_changes(&mut self.store, diffs, &data.rows);
        self.clear_errors();
        self.update_info(data.status_message, data.duration_ms);
        Ok(())
    }

    fn update_info(&mut self, status: String, duration_ms: Option<f64>) {
        self.query_duration_ms = duration_ms.unwrap_or(0.0);
        self.status_message = status;
    }

    fn record_error(&mut self, err: &ServiceError) {
        warn!(
            "grid {}: fetch failed: {}",
            self.table_id,
            err.display_message()
        );
        self.error_message = err.display_message();
        self.has_details = err.has_details();
        self.last_error = Some(err.clone());
    }

    fn clear_errors(&mut self) {
        self.error_message.clear();
        self.has_details = false;
        self.last_error = None;
    }

    /// Clears rows, pending edits (silently), telemetry and error state.
    /// Identity, columns and sort directives survive, so a refresh keeps the
    /// header and the user's chosen ordering.
    fn reset_data(&mut self) {
        self.store.reset_data();
        self.editor.cancel_changes(true);
        self.status_message.clear();
        self.query_duration_ms = 0.0;
        self.has_more_rows = true;
        self.clear_errors();
    }
}

fn clamp_chunk_size(count: usize) -> usize {
    if count == 0 {
        FETCH_DEFAULT
    } else {
        count.clamp(FETCH_MIN, FETCH_MAX)
    }
}
