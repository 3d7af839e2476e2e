//! Event-stream messages pushed to live subscribers.

use crate::ids::{Namespace, NodeId, OperationId};
use crate::operation::OperationType;
use crate::time::now_millis;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of a pushed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Initial confirmation after a successful subscribe.
    Subscribed,
    /// Periodic liveness probe sent to every connection.
    Heartbeat,
    /// Notice that the server will close the connection shortly;
    /// clients are expected to reconnect transparently.
    Closing,
    /// A mutation was applied to the namespace's tree.
    Mutation,
}

/// Detail carried by [`EventKind::Mutation`] events.
///
/// Events are independent deltas; on a suspected gap, consumers re-fetch
/// authoritative state through the tree read surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationEvent {
    /// The operation kind that was applied.
    pub operation_type: OperationType,
    /// The operation that caused the mutation.
    pub operation_id: OperationId,
    /// The node that was created, changed, moved, or deleted.
    pub node_id: NodeId,
}

/// A message delivered on the subscriber event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    /// Unique message id.
    pub id: Uuid,
    /// Event kind.
    pub event_type: EventKind,
    /// Kind-specific detail; `null` for liveness events.
    pub data: serde_json::Value,
    /// Server wall-clock time the event was produced, unix millis.
    pub timestamp: u64,
    /// Namespace the receiving connection is subscribed to.
    pub namespace: Namespace,
}

impl EventMessage {
    fn new(event_type: EventKind, data: serde_json::Value, namespace: Namespace) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            data,
            timestamp: now_millis(),
            namespace,
        }
    }

    /// Creates the initial subscription confirmation.
    pub fn subscribed(namespace: Namespace) -> Self {
        Self::new(EventKind::Subscribed, serde_json::Value::Null, namespace)
    }

    /// Creates a liveness probe.
    pub fn heartbeat(namespace: Namespace) -> Self {
        Self::new(EventKind::Heartbeat, serde_json::Value::Null, namespace)
    }

    /// Creates a pre-close notice.
    pub fn closing(namespace: Namespace) -> Self {
        Self::new(EventKind::Closing, serde_json::Value::Null, namespace)
    }

    /// Creates an applied-mutation event.
    pub fn mutation(namespace: Namespace, mutation: &MutationEvent) -> Self {
        let data = serde_json::to_value(mutation).unwrap_or(serde_json::Value::Null);
        Self::new(EventKind::Mutation, data, namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_event_carries_detail() {
        let mutation = MutationEvent {
            operation_type: OperationType::CreateFolder,
            operation_id: OperationId::from("op1"),
            node_id: NodeId::from("f1"),
        };
        let event = EventMessage::mutation(Namespace::from("ns1"), &mutation);

        assert_eq!(event.event_type, EventKind::Mutation);
        assert_eq!(event.data["operationType"], "CREATE_FOLDER");
        assert_eq!(event.data["nodeId"], "f1");
        assert_eq!(event.namespace.as_str(), "ns1");
    }

    #[test]
    fn liveness_events_have_null_data() {
        let event = EventMessage::heartbeat(Namespace::from("ns1"));
        assert_eq!(event.event_type, EventKind::Heartbeat);
        assert!(event.data.is_null());
        assert!(event.timestamp > 0);
    }

    #[test]
    fn event_ids_are_unique() {
        let a = EventMessage::closing(Namespace::from("ns1"));
        let b = EventMessage::closing(Namespace::from("ns1"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn event_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&EventKind::Subscribed).unwrap(),
            "\"subscribed\""
        );
        assert_eq!(
            serde_json::to_string(&EventKind::Closing).unwrap(),
            "\"closing\""
        );
    }
}
