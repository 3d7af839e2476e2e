//! Error types for the tree store.

use marksync_order::OrderError;
use marksync_protocol::NodeId;
use thiserror::Error;

/// Result type for tree store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur when mutating the tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced node does not exist in the namespace.
    #[error("node not found: {0}")]
    NotFound(NodeId),

    /// A node with this id already exists in the namespace.
    #[error("node already exists: {0}")]
    AlreadyExists(NodeId),

    /// The move would make the node its own ancestor.
    #[error("move of {node} under {new_parent} would create a cycle")]
    Cycle {
        /// The node being moved.
        node: NodeId,
        /// The requested new parent.
        new_parent: NodeId,
    },

    /// The node exists but has the wrong kind for the operation
    /// (e.g. a bookmark used as a parent).
    #[error("node {node} is not a {expected}")]
    KindMismatch {
        /// The offending node.
        node: NodeId,
        /// What the operation required.
        expected: &'static str,
    },

    /// An order key in the store failed validation or generation.
    /// Indicates corrupted state rather than a bad request.
    #[error("order key failure: {0}")]
    Order(#[from] OrderError),
}
