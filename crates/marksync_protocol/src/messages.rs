//! Sync batch request/response messages.

use crate::ids::{Namespace, NodeId, OperationId};
use crate::operation::Operation;
use crate::time::now_millis;
use serde::{Deserialize, Serialize};

/// A batch of operations submitted by one device for one namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Namespace all operations in the batch must belong to.
    pub namespace: Namespace,
    /// Operations, applied strictly in this order.
    pub operations: Vec<Operation>,
}

impl SyncRequest {
    /// Creates a new sync request.
    pub fn new(namespace: impl Into<Namespace>, operations: Vec<Operation>) -> Self {
        Self {
            namespace: namespace.into(),
            operations,
        }
    }
}

/// Response to a [`SyncRequest`]: one outcome per submitted operation,
/// in submission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// Per-operation outcomes, in submission order.
    pub applied: Vec<OperationOutcome>,
    /// Server wall-clock time the batch finished, unix millis.
    pub server_timestamp: u64,
}

impl SyncResponse {
    /// Creates a response stamped with the current server time.
    pub fn new(applied: Vec<OperationOutcome>) -> Self {
        Self {
            applied,
            server_timestamp: now_millis(),
        }
    }
}

/// Whether an operation was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The operation was applied, or had already been applied.
    Success,
    /// The operation was rejected; see the attached error.
    Failed,
}

/// Classification of a per-operation failure.
///
/// Callers use the kind to decide whether a retry with the same
/// operation id can succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing operation fields. Not retryable verbatim.
    Validation,
    /// The target (or an anchor/parent) node does not exist.
    NotFound,
    /// The move would make a node its own ancestor. Not retryable verbatim.
    Cycle,
    /// A storage-level uniqueness collision outside the dedup path.
    Conflict,
    /// Underlying persistence failure. Retryable with the same id.
    Storage,
}

impl ErrorKind {
    /// Returns true if resubmitting the same operation can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Storage | ErrorKind::Conflict)
    }
}

/// Failure detail attached to a failed outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeError {
    /// Failure classification.
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub message: String,
}

/// The outcome of one submitted operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    /// The operation this outcome answers.
    pub operation_id: OperationId,
    /// Whether the operation was applied.
    pub status: OutcomeStatus,
    /// Node the operation resolved to, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resulting_node_id: Option<NodeId>,
    /// Failure detail for failed outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
}

impl OperationOutcome {
    /// Creates a success outcome.
    pub fn success(operation_id: OperationId, resulting_node_id: Option<NodeId>) -> Self {
        Self {
            operation_id,
            status: OutcomeStatus::Success,
            resulting_node_id,
            error: None,
        }
    }

    /// Creates a failed outcome.
    pub fn failed(operation_id: OperationId, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation_id,
            status: OutcomeStatus::Failed,
            resulting_node_id: None,
            error: Some(OutcomeError {
                kind,
                message: message.into(),
            }),
        }
    }

    /// Returns true if the operation was applied.
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}
