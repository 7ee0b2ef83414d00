/// LazyGrid External Interfaces
///
/// The controller is transport-agnostic: the hosting application injects an
/// async data source for row fetch/save and a dialog service for the
/// error-details and retry prompts. Both traits are `?Send` because the
/// controller runs as a single logical actor; nothing here crosses threads.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::editor::RowDiff;
use crate::error::ServiceError;
use crate::value::{Column, Row};

/// Result of one chunked row fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub rows: Vec<Row>,
    /// Present on the first fetch of a result set; later fetches may omit it.
    pub columns: Option<Vec<Column>>,
    /// True when no rows exist beyond the ones returned so far.
    pub is_fully_loaded: bool,
    pub duration_ms: Option<f64>,
    pub status_message: String,
}

/// Result of persisting a diff set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResult {
    /// Server-confirmed rows, positionally aligned with the submitted diffs.
    pub rows: Vec<Row>,
    pub status_message: String,
    pub duration_ms: Option<f64>,
}

/// Asynchronous row provider backed by the remote query service.
#[async_trait(?Send)]
pub trait GridDataSource {
    /// Fetches `count` rows starting at `offset`.
    async fn fetch_rows(&self, offset: usize, count: usize) -> Result<FetchResult, ServiceError>;

    /// Persists the given diff set and returns the confirmed rows.
    async fn save_rows(&self, diffs: &[RowDiff]) -> Result<SaveResult, ServiceError>;
}

/// Dialog presentation hooks consumed by the save-retry loop and the
/// details affordance.
#[async_trait(?Send)]
pub trait DialogService {
    /// Asks the user whether a failed save should be retried. The dialog
    /// renders `error.display_message()` and offers a details view only
    /// when `error.has_details()` is true.
    async fn confirm_retry(&self, error: &ServiceError) -> bool;

    /// Shows the full error details. Fire-and-forget from the controller's
    /// point of view; the returned future resolves when the dialog closes.
    async fn show_error_details(&self, error: &ServiceError);
}
