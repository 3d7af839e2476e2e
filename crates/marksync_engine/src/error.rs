//! Reconciler error taxonomy.

use marksync_oplog::OplogError;
use marksync_protocol::{ErrorKind, NodeId};
use marksync_store::StoreError;
use thiserror::Error;

/// Result type for per-operation application.
pub type ApplyResult<T> = Result<T, ApplyError>;

/// Why a single operation failed to apply.
///
/// Per-operation errors are captured into that operation's outcome and
/// never abort the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// Malformed or missing operation fields; rejected before touching
    /// the log or the store.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The target, parent, or anchor node does not exist.
    #[error("node not found: {0}")]
    NotFound(NodeId),

    /// The move would make the node its own ancestor.
    #[error("move would create a cycle at {0}")]
    Cycle(NodeId),

    /// A uniqueness collision the dedup path could not absorb.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Underlying persistence failure; the operation was not marked
    /// processed and may be retried with the same id.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ApplyError {
    /// Maps the error onto the wire-level failure classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplyError::Validation(_) => ErrorKind::Validation,
            ApplyError::NotFound(_) => ErrorKind::NotFound,
            ApplyError::Cycle(_) => ErrorKind::Cycle,
            ApplyError::Conflict(_) => ErrorKind::Conflict,
            ApplyError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<StoreError> for ApplyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApplyError::NotFound(id),
            StoreError::AlreadyExists(id) => {
                ApplyError::Conflict(format!("node already exists: {id}"))
            }
            StoreError::Cycle { node, .. } => ApplyError::Cycle(node),
            StoreError::KindMismatch { .. } => ApplyError::Validation(err.to_string()),
            // A bad order key in the store is corrupted state, not a
            // client mistake.
            StoreError::Order(err) => ApplyError::Storage(err.to_string()),
        }
    }
}

impl From<OplogError> for ApplyError {
    fn from(err: OplogError) -> Self {
        match err {
            OplogError::Conflict(msg) => ApplyError::Conflict(msg),
            OplogError::Storage(msg) => ApplyError::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_onto_wire_taxonomy() {
        assert_eq!(
            ApplyError::Validation("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ApplyError::NotFound(NodeId::from("n")).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(ApplyError::Cycle(NodeId::from("n")).kind(), ErrorKind::Cycle);
        assert_eq!(ApplyError::Storage("x".into()).kind(), ErrorKind::Storage);
    }

    #[test]
    fn store_errors_convert() {
        let err: ApplyError = StoreError::NotFound(NodeId::from("ghost")).into();
        assert_eq!(err, ApplyError::NotFound(NodeId::from("ghost")));

        let err: ApplyError = StoreError::KindMismatch {
            node: NodeId::from("b1"),
            expected: "folder",
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
