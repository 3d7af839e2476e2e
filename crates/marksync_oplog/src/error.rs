//! Error types for the operation log.

use thiserror::Error;

/// Result type for operation log calls.
pub type OplogResult<T> = Result<T, OplogError>;

/// Errors surfaced by an [`crate::OperationLog`] backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OplogError {
    /// A uniqueness collision the dedup path could not absorb.
    #[error("operation log conflict: {0}")]
    Conflict(String),

    /// The underlying persistence layer failed.
    #[error("operation log storage failure: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_detail() {
        let err = OplogError::Storage("disk full".into());
        assert!(err.to_string().contains("disk full"));
    }
}
