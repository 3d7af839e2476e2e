//! Operation log records.

use marksync_protocol::{now_millis, Namespace, NodeId, Operation, OperationId, OperationPayload};
use serde::{Deserialize, Serialize};

/// A logged, idempotency-tracked unit of client intent.
///
/// Created in the unprocessed state at ingestion; transitions to
/// processed exactly once, when the operation's side effects have been
/// applied. Retained for a bounded dedup window after processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    /// Client-generated operation id (the idempotency key).
    pub id: OperationId,
    /// Namespace the operation belongs to.
    pub namespace: Namespace,
    /// Kind-tagged payload as submitted.
    #[serde(flatten)]
    pub payload: OperationPayload,
    /// Node the operation targets.
    pub target_node_id: NodeId,
    /// Device that produced the operation.
    pub origin_device_id: String,
    /// Client wall-clock time, unix millis.
    pub client_timestamp: u64,
    /// Server time the record was logged, unix millis. Retention is
    /// measured against this, not the client clock.
    pub logged_at: u64,
    /// Whether the operation's side effects have been applied.
    pub processed: bool,
}

impl OperationRecord {
    /// Builds an unprocessed record from a submitted operation.
    pub fn from_operation(op: &Operation) -> Self {
        Self {
            id: op.id.clone(),
            namespace: op.namespace.clone(),
            payload: op.payload.clone(),
            target_node_id: op.target_node_id().clone(),
            origin_device_id: op.origin_device_id.clone(),
            client_timestamp: op.client_timestamp,
            logged_at: now_millis(),
            processed: false,
        }
    }

    /// Consumes the record, marking it processed.
    pub fn into_processed(mut self) -> Self {
        self.processed = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marksync_protocol::DeleteItem;

    fn sample_op() -> Operation {
        Operation {
            id: OperationId::from("op1"),
            namespace: Namespace::from("ns1"),
            payload: OperationPayload::DeleteItem(DeleteItem {
                id: NodeId::from("b1"),
            }),
            origin_device_id: "device-a".into(),
            client_timestamp: 42,
        }
    }

    #[test]
    fn record_starts_unprocessed() {
        let record = OperationRecord::from_operation(&sample_op());
        assert!(!record.processed);
        assert_eq!(record.target_node_id, NodeId::from("b1"));
        assert!(record.logged_at > 0);
    }

    #[test]
    fn into_processed_flips_the_flag() {
        let record = OperationRecord::from_operation(&sample_op()).into_processed();
        assert!(record.processed);
    }
}
