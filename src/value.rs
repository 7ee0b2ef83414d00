/// LazyGrid Cell Values and Column Descriptors
///
/// Cells carry an explicit tagged value so the controller can compare a
/// pending edit against its baseline without caring what the hosting
/// application renders. `Structured` wraps arbitrary JSON for nested server
/// payloads (documents, arrays) that the grid treats as opaque.

use serde::{Deserialize, Serialize};

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Text(String),
    Int(i64),
    Real(f64),
    Bool(bool),
    Binary(Vec<u8>),
    Structured(serde_json::Value),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            CellValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Int(v)
    }
}

/// A row is an ordered sequence of cell values, positionally aligned with the
/// result set's columns.
pub type Row = Vec<CellValue>;

/// Declared kind of the data a column holds. Advisory only; the controller
/// never coerces values based on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataKind {
    String,
    Numeric,
    Boolean,
    Datetime,
    Binary,
    Document,
    Object,
    Unknown,
}

/// Column descriptor for one result-set column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Unique identifier within the result set; edit and sort state key on it.
    pub id: String,
    /// Header text shown by the rendering layer.
    pub label: String,
    /// Optional icon hint for the header.
    pub icon: Option<String>,
    /// Declared position in the source result set.
    pub position: Option<u32>,
    pub data_kind: Option<DataKind>,
}

impl Column {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Column {
            id: id.into(),
            label: label.into(),
            icon: None,
            position: None,
            data_kind: None,
        }
    }

    pub fn with_data_kind(mut self, kind: DataKind) -> Self {
        self.data_kind = Some(kind);
        self
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }
}
