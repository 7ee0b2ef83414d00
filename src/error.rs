/// LazyGrid Service Errors
///
/// Failures crossing the data-source boundary come in two shapes: structured
/// errors from the query service, which carry a display message plus raw
/// text for a details view, and generic errors, which are rendered as
/// "name: message" with no details affordance.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Structured failure reported by the query service.
    #[error("{message}")]
    Service {
        /// Human-readable display text.
        message: String,
        /// Full error text shown in the details dialog.
        raw: String,
        /// Gates whether a "show details" affordance appears.
        has_details: bool,
    },

    /// Any other failure, formatted from its name and message.
    #[error("{name}: {message}")]
    Other { name: String, message: String },
}

impl ServiceError {
    pub fn service(message: impl Into<String>, raw: impl Into<String>, has_details: bool) -> Self {
        ServiceError::Service {
            message: message.into(),
            raw: raw.into(),
            has_details,
        }
    }

    pub fn other(name: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Other {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Text to surface in the grid's inline error slot and retry prompt.
    pub fn display_message(&self) -> String {
        self.to_string()
    }

    /// True when a details view can show more than the display message.
    pub fn has_details(&self) -> bool {
        match self {
            ServiceError::Service { has_details, .. } => *has_details,
            ServiceError::Other { .. } => false,
        }
    }
}
