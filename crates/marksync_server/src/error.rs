//! Request-level server errors.

use thiserror::Error;

/// Result type for server request handling.
pub type ServerResult<T> = Result<T, ServerError>;

/// A request rejected before reaching the reconciler.
///
/// Per-operation failures are not server errors; they travel in the
/// response outcomes. These cover whole-request problems only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// The batch exceeds the configured operation cap.
    #[error("batch of {submitted} operations exceeds the limit of {limit}")]
    BatchTooLarge {
        /// Operations in the rejected batch.
        submitted: usize,
        /// Configured cap.
        limit: usize,
    },

    /// The request is structurally unusable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
