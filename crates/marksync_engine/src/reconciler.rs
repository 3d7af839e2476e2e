//! Batch application against the tree store.

use crate::error::{ApplyError, ApplyResult};
use marksync_bus::EventBus;
use marksync_oplog::{OperationLog, OperationRecord};
use marksync_protocol::{
    EventMessage, MutationEvent, Namespace, NodeId, Operation, OperationOutcome, OperationPayload,
    OrderPosition, SyncRequest, SyncResponse,
};
use marksync_store::{StoreError, TreeStore};
use std::sync::Arc;
use tracing::debug;

/// The sync reconciler.
///
/// Shared process-wide behind an `Arc`; batches for different
/// namespaces reconcile concurrently, serialized only at the store and
/// log locks they touch.
pub struct Reconciler<L: OperationLog> {
    store: Arc<TreeStore>,
    oplog: Arc<L>,
    bus: Arc<EventBus>,
}

impl<L: OperationLog> Reconciler<L> {
    /// Creates a reconciler over the given store, log, and bus.
    pub fn new(store: Arc<TreeStore>, oplog: Arc<L>, bus: Arc<EventBus>) -> Self {
        Self { store, oplog, bus }
    }

    /// Returns the tree store the reconciler applies against.
    pub fn store(&self) -> &Arc<TreeStore> {
        &self.store
    }

    /// Returns the operation log backing dedup.
    pub fn oplog(&self) -> &Arc<L> {
        &self.oplog
    }

    /// Applies a batch, strictly in submission order.
    ///
    /// A failed operation is captured in its outcome and the batch
    /// continues; the response carries one outcome per submitted
    /// operation, in order.
    pub fn apply_batch(&self, request: &SyncRequest) -> SyncResponse {
        let mut applied = Vec::with_capacity(request.operations.len());
        for op in &request.operations {
            let outcome = match self.apply_one(&request.namespace, op) {
                Ok(node_id) => OperationOutcome::success(op.id.clone(), node_id),
                Err(err) => {
                    debug!(
                        operation = %op.id,
                        kind = ?err.kind(),
                        error = %err,
                        "operation rejected"
                    );
                    OperationOutcome::failed(op.id.clone(), err.kind(), err.to_string())
                }
            };
            applied.push(outcome);
        }
        SyncResponse::new(applied)
    }

    /// Runs one operation through the full pipeline: dedup check,
    /// validation, mutation, log-and-mark, publish.
    fn apply_one(
        &self,
        namespace: &Namespace,
        op: &Operation,
    ) -> ApplyResult<Option<NodeId>> {
        // Replay: a processed id succeeds again with its recorded
        // identity and no further side effects.
        if self.oplog.is_processed(namespace, &op.id)? {
            debug!(operation = %op.id, "duplicate of processed operation, replaying outcome");
            let recorded = self.oplog.get(namespace, &op.id)?;
            return Ok(recorded.map(|r| r.target_node_id));
        }

        validate(namespace, op)?;

        let (node_id, mutated) = self.apply_mutation(namespace, op)?;

        // Processed-marking comes before publish: an operation is never
        // announced unless a retry of it would replay as a duplicate.
        self.oplog
            .log_and_mark_processed(OperationRecord::from_operation(op))?;

        if mutated {
            let event = EventMessage::mutation(
                namespace.clone(),
                &MutationEvent {
                    operation_type: op.op_type(),
                    operation_id: op.id.clone(),
                    node_id: node_id.clone(),
                },
            );
            self.bus.publish(namespace, &event);
        }

        Ok(Some(node_id))
    }

    /// Applies the kind-specific mutation. Returns the resolved node id
    /// and whether the tree actually changed.
    fn apply_mutation(
        &self,
        namespace: &Namespace,
        op: &Operation,
    ) -> ApplyResult<(NodeId, bool)> {
        match &op.payload {
            OperationPayload::CreateFolder(p) => {
                // A node that already exists under the requested id was
                // created by an earlier delivery the log lost track of;
                // absorb the retry instead of conflicting.
                let result = self.store.create_folder(
                    namespace,
                    &p.id,
                    &p.name,
                    p.parent_id.as_ref(),
                    &p.order_position,
                );
                match result {
                    Ok(_) => Ok((p.id.clone(), true)),
                    Err(StoreError::AlreadyExists(_)) => Ok((p.id.clone(), false)),
                    Err(err) => Err(err.into()),
                }
            }
            OperationPayload::CreateBookmark(p) => {
                let result = self.store.create_bookmark(
                    namespace,
                    &p.id,
                    &p.name,
                    &p.url,
                    p.favorite,
                    p.icon.as_deref(),
                    p.parent_id.as_ref(),
                    &p.order_position,
                );
                match result {
                    Ok(_) => Ok((p.id.clone(), true)),
                    Err(StoreError::AlreadyExists(_)) => Ok((p.id.clone(), false)),
                    Err(err) => Err(err.into()),
                }
            }
            OperationPayload::UpdateFolder(p) => {
                self.store.update_folder(
                    namespace,
                    &p.id,
                    p.name.as_deref(),
                    p.is_open,
                )?;
                Ok((p.id.clone(), true))
            }
            OperationPayload::UpdateBookmark(p) => {
                self.store.update_bookmark(
                    namespace,
                    &p.id,
                    p.name.as_deref(),
                    p.url.as_deref(),
                    p.favorite,
                    p.icon.as_deref(),
                )?;
                Ok((p.id.clone(), true))
            }
            OperationPayload::DeleteItem(p) => {
                // Deleting an absent node succeeds with nothing to
                // announce.
                let removed = self.store.delete(namespace, &p.id)?;
                Ok((p.id.clone(), !removed.is_empty()))
            }
            OperationPayload::MoveItem(p) => {
                self.store.move_node(
                    namespace,
                    &p.id,
                    p.new_parent_id.as_ref(),
                    &p.target_order_position,
                )?;
                Ok((p.id.clone(), true))
            }
        }
    }
}

/// Structural checks performed before the operation touches the log or
/// the store.
fn validate(namespace: &Namespace, op: &Operation) -> ApplyResult<()> {
    if op.id.is_empty() {
        return Err(ApplyError::Validation(
            "operation id must not be empty".into(),
        ));
    }
    if &op.namespace != namespace {
        return Err(ApplyError::Validation(format!(
            "operation namespace '{}' does not match batch namespace '{}'",
            op.namespace, namespace
        )));
    }
    if op.target_node_id().is_empty() {
        return Err(ApplyError::Validation(
            "target node id must not be empty".into(),
        ));
    }

    match &op.payload {
        OperationPayload::CreateFolder(p) => {
            require_name(&p.name)?;
            require_parent(p.parent_id.as_ref())?;
            require_anchor(&p.order_position)?;
        }
        OperationPayload::CreateBookmark(p) => {
            require_name(&p.name)?;
            if p.url.trim().is_empty() {
                return Err(ApplyError::Validation("url must not be empty".into()));
            }
            require_parent(p.parent_id.as_ref())?;
            require_anchor(&p.order_position)?;
        }
        OperationPayload::UpdateFolder(p) => {
            if let Some(name) = &p.name {
                require_name(name)?;
            }
        }
        OperationPayload::UpdateBookmark(p) => {
            if let Some(name) = &p.name {
                require_name(name)?;
            }
            if let Some(url) = &p.url {
                if url.trim().is_empty() {
                    return Err(ApplyError::Validation("url must not be empty".into()));
                }
            }
        }
        OperationPayload::DeleteItem(_) => {}
        OperationPayload::MoveItem(p) => {
            require_parent(p.new_parent_id.as_ref())?;
            require_anchor(&p.target_order_position)?;
        }
    }
    Ok(())
}

fn require_name(name: &str) -> ApplyResult<()> {
    if name.trim().is_empty() {
        return Err(ApplyError::Validation("name must not be empty".into()));
    }
    Ok(())
}

fn require_parent(parent: Option<&NodeId>) -> ApplyResult<()> {
    if parent.is_some_and(|p| p.is_empty()) {
        return Err(ApplyError::Validation(
            "parent id must not be empty".into(),
        ));
    }
    Ok(())
}

fn require_anchor(position: &OrderPosition) -> ApplyResult<()> {
    let anchor = match position {
        OrderPosition::Before(id) | OrderPosition::After(id) => Some(id),
        OrderPosition::Head | OrderPosition::Tail => None,
    };
    if anchor.is_some_and(|a| a.is_empty()) {
        return Err(ApplyError::Validation(
            "anchor node id must not be empty".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use marksync_bus::BusConfig;
    use marksync_oplog::{MemoryOperationLog, OplogError, OplogResult};
    use marksync_protocol::{CreateFolder, DeleteItem, ErrorKind, MoveItem, OperationId};

    fn ns() -> Namespace {
        Namespace::from("ns1")
    }

    fn reconciler() -> Reconciler<MemoryOperationLog> {
        Reconciler::new(
            Arc::new(TreeStore::new()),
            Arc::new(MemoryOperationLog::new()),
            Arc::new(EventBus::new(BusConfig::default())),
        )
    }

    fn create_folder_op(op_id: &str, node_id: &str, name: &str) -> Operation {
        Operation {
            id: OperationId::from(op_id),
            namespace: ns(),
            payload: OperationPayload::CreateFolder(CreateFolder {
                id: NodeId::from(node_id),
                name: name.into(),
                parent_id: None,
                order_position: OrderPosition::Tail,
            }),
            origin_device_id: "device-a".into(),
            client_timestamp: 1,
        }
    }

    fn move_op(op_id: &str, node_id: &str, parent: Option<&str>) -> Operation {
        Operation {
            id: OperationId::from(op_id),
            namespace: ns(),
            payload: OperationPayload::MoveItem(MoveItem {
                id: NodeId::from(node_id),
                new_parent_id: parent.map(NodeId::from),
                target_order_position: OrderPosition::Tail,
            }),
            origin_device_id: "device-a".into(),
            client_timestamp: 1,
        }
    }

    fn delete_op(op_id: &str, node_id: &str) -> Operation {
        Operation {
            id: OperationId::from(op_id),
            namespace: ns(),
            payload: OperationPayload::DeleteItem(DeleteItem {
                id: NodeId::from(node_id),
            }),
            origin_device_id: "device-a".into(),
            client_timestamp: 1,
        }
    }

    #[test]
    fn applies_in_submission_order() {
        let r = reconciler();
        let request = SyncRequest::new(
            ns(),
            vec![
                create_folder_op("op1", "f1", "Work"),
                create_folder_op("op2", "f2", "Home"),
            ],
        );

        let response = r.apply_batch(&request);
        assert_eq!(response.applied.len(), 2);
        assert!(response.applied.iter().all(|o| o.is_success()));
        assert_eq!(response.applied[0].operation_id, OperationId::from("op1"));

        let ids: Vec<_> = r
            .store()
            .snapshot(&ns())
            .into_iter()
            .map(|s| s.node.id)
            .collect();
        assert_eq!(ids, vec![NodeId::from("f1"), NodeId::from("f2")]);
    }

    #[test]
    fn duplicate_within_batch_replays() {
        let r = reconciler();
        let request = SyncRequest::new(
            ns(),
            vec![
                create_folder_op("op1", "f1", "Work"),
                create_folder_op("op1", "f1", "Work"),
            ],
        );

        let response = r.apply_batch(&request);
        assert!(response.applied.iter().all(|o| o.is_success()));
        assert_eq!(
            response.applied[1].resulting_node_id,
            Some(NodeId::from("f1"))
        );
        assert_eq!(r.store().node_count(&ns()), 1);
    }

    #[test]
    fn resubmitted_batch_replays() {
        let r = reconciler();
        let request = SyncRequest::new(ns(), vec![create_folder_op("op1", "f1", "Work")]);

        r.apply_batch(&request);
        let response = r.apply_batch(&request);

        assert!(response.applied[0].is_success());
        assert_eq!(r.store().node_count(&ns()), 1);
        assert_eq!(r.oplog().len(), 1);
    }

    #[test]
    fn failure_does_not_abort_batch() {
        let r = reconciler();
        let request = SyncRequest::new(
            ns(),
            vec![
                create_folder_op("op1", "f1", "Work"),
                move_op("op2", "f1", Some("ghost")),
                create_folder_op("op3", "f2", "Home"),
            ],
        );

        let response = r.apply_batch(&request);
        assert!(response.applied[0].is_success());
        assert!(!response.applied[1].is_success());
        assert!(response.applied[2].is_success());

        let error = response.applied[1].error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::NotFound);
    }

    #[test]
    fn failed_operation_is_not_marked_processed() {
        let r = reconciler();
        let request = SyncRequest::new(ns(), vec![move_op("op1", "ghost", None)]);

        let response = r.apply_batch(&request);
        assert!(!response.applied[0].is_success());
        assert!(!r
            .oplog()
            .is_processed(&ns(), &OperationId::from("op1"))
            .unwrap());

        // The same id can succeed once the precondition holds.
        r.apply_batch(&SyncRequest::new(
            ns(),
            vec![create_folder_op("op0", "ghost", "Now Exists")],
        ));
        let response = r.apply_batch(&request);
        assert!(response.applied[0].is_success());
    }

    #[test]
    fn validation_rejects_before_logging() {
        let r = reconciler();
        let request = SyncRequest::new(ns(), vec![create_folder_op("op1", "f1", "  ")]);

        let response = r.apply_batch(&request);
        let error = response.applied[0].error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::Validation);
        assert!(r.oplog().is_empty());
        assert_eq!(r.store().node_count(&ns()), 0);
    }

    #[test]
    fn namespace_mismatch_is_a_validation_error() {
        let r = reconciler();
        let mut op = create_folder_op("op1", "f1", "Work");
        op.namespace = Namespace::from("other");
        let response = r.apply_batch(&SyncRequest::new(ns(), vec![op]));

        let error = response.applied[0].error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::Validation);
    }

    #[test]
    fn create_over_existing_node_is_already_applied() {
        let r = reconciler();
        r.apply_batch(&SyncRequest::new(
            ns(),
            vec![create_folder_op("op1", "f1", "Work")],
        ));

        // New op id, same node id: the node is already there, so the
        // operation lands as a success and becomes replayable.
        let response = r.apply_batch(&SyncRequest::new(
            ns(),
            vec![create_folder_op("op2", "f1", "Work")],
        ));
        assert!(response.applied[0].is_success());
        assert_eq!(r.store().node_count(&ns()), 1);
        assert!(r
            .oplog()
            .is_processed(&ns(), &OperationId::from("op2"))
            .unwrap());
    }

    #[test]
    fn delete_missing_node_succeeds() {
        let r = reconciler();
        let response = r.apply_batch(&SyncRequest::new(ns(), vec![delete_op("op1", "ghost")]));

        assert!(response.applied[0].is_success());
        assert!(r
            .oplog()
            .is_processed(&ns(), &OperationId::from("op1"))
            .unwrap());
    }

    #[test]
    fn cycle_is_rejected_with_cycle_kind() {
        let r = reconciler();
        r.apply_batch(&SyncRequest::new(
            ns(),
            vec![create_folder_op("op1", "outer", "Outer"), {
                let mut op = create_folder_op("op2", "inner", "Inner");
                op.payload = OperationPayload::CreateFolder(CreateFolder {
                    id: NodeId::from("inner"),
                    name: "Inner".into(),
                    parent_id: Some(NodeId::from("outer")),
                    order_position: OrderPosition::Tail,
                });
                op
            }],
        ));

        let response = r.apply_batch(&SyncRequest::new(
            ns(),
            vec![move_op("op3", "outer", Some("inner"))],
        ));
        let error = response.applied[0].error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::Cycle);
        assert!(!error.kind.is_retryable());
    }

    /// A log whose write path is down.
    struct BrokenLog {
        inner: MemoryOperationLog,
    }

    impl OperationLog for BrokenLog {
        fn is_processed(&self, namespace: &Namespace, id: &OperationId) -> OplogResult<bool> {
            self.inner.is_processed(namespace, id)
        }

        fn log_if_absent(&self, _record: OperationRecord) -> OplogResult<bool> {
            Err(OplogError::Storage("log unavailable".into()))
        }

        fn mark_processed(&self, _namespace: &Namespace, _id: &OperationId) -> OplogResult<()> {
            Err(OplogError::Storage("log unavailable".into()))
        }

        fn log_and_mark_processed(&self, _record: OperationRecord) -> OplogResult<()> {
            Err(OplogError::Storage("log unavailable".into()))
        }

        fn purge_older_than(&self, _horizon: u64) -> OplogResult<usize> {
            Err(OplogError::Storage("log unavailable".into()))
        }

        fn get(
            &self,
            namespace: &Namespace,
            id: &OperationId,
        ) -> OplogResult<Option<OperationRecord>> {
            self.inner.get(namespace, id)
        }
    }

    #[test]
    fn log_failure_fails_closed_and_is_retryable() {
        let r = Reconciler::new(
            Arc::new(TreeStore::new()),
            Arc::new(BrokenLog {
                inner: MemoryOperationLog::new(),
            }),
            Arc::new(EventBus::new(BusConfig::default())),
        );

        let response = r.apply_batch(&SyncRequest::new(
            ns(),
            vec![create_folder_op("op1", "f1", "Work")],
        ));
        let error = response.applied[0].error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::Storage);
        assert!(error.kind.is_retryable());

        // The retry absorbs the already-created node instead of
        // conflicting; it still fails closed while the log is down.
        let response = r.apply_batch(&SyncRequest::new(
            ns(),
            vec![create_folder_op("op1", "f1", "Work")],
        ));
        let error = response.applied[0].error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::Storage);
    }
}
