//! The operation log trait and its in-memory backend.

use crate::error::OplogResult;
use crate::record::OperationRecord;
use marksync_protocol::{Namespace, OperationId};
use parking_lot::RwLock;
use std::collections::HashMap;

/// The dedup primitive: a durable record of every accepted operation.
///
/// Implementations must be safe under concurrent invocation; the
/// reconciler calls into the log from many requests at once.
pub trait OperationLog: Send + Sync {
    /// Returns true iff a record with this id exists and is processed.
    fn is_processed(&self, namespace: &Namespace, id: &OperationId) -> OplogResult<bool>;

    /// Atomically inserts an unprocessed record unless one with the same
    /// id already exists. Returns whether the insert happened; a
    /// duplicate is "already seen", not an error.
    fn log_if_absent(&self, record: OperationRecord) -> OplogResult<bool>;

    /// Marks the record processed. Idempotent: marking twice is a no-op.
    fn mark_processed(&self, namespace: &Namespace, id: &OperationId) -> OplogResult<()>;

    /// Combined atomic insert-and-mark used on successful application.
    /// On a duplicate-id collision this degrades to [`Self::mark_processed`]
    /// instead of failing the request.
    fn log_and_mark_processed(&self, record: OperationRecord) -> OplogResult<()>;

    /// Removes processed records logged before `horizon` (unix millis).
    /// Unprocessed records are never removed regardless of age; an
    /// unprocessed record signals a stuck or in-flight operation.
    /// Returns the number of records removed.
    fn purge_older_than(&self, horizon: u64) -> OplogResult<usize>;

    /// Returns a copy of the record, if present.
    fn get(&self, namespace: &Namespace, id: &OperationId) -> OplogResult<Option<OperationRecord>>;
}

/// In-memory [`OperationLog`] backend.
///
/// Backs tests and single-process deployments; a database-backed
/// implementation satisfies the same contract for durable setups.
pub struct MemoryOperationLog {
    records: RwLock<HashMap<Namespace, HashMap<OperationId, OperationRecord>>>,
}

impl MemoryOperationLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of records across all namespaces.
    pub fn len(&self) -> usize {
        self.records.read().values().map(|m| m.len()).sum()
    }

    /// Returns true if the log holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryOperationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationLog for MemoryOperationLog {
    fn is_processed(&self, namespace: &Namespace, id: &OperationId) -> OplogResult<bool> {
        Ok(self
            .records
            .read()
            .get(namespace)
            .and_then(|m| m.get(id))
            .map(|r| r.processed)
            .unwrap_or(false))
    }

    fn log_if_absent(&self, record: OperationRecord) -> OplogResult<bool> {
        let mut map = self.records.write();
        let entries = map.entry(record.namespace.clone()).or_default();
        if entries.contains_key(&record.id) {
            return Ok(false);
        }
        entries.insert(record.id.clone(), record);
        Ok(true)
    }

    fn mark_processed(&self, namespace: &Namespace, id: &OperationId) -> OplogResult<()> {
        let mut map = self.records.write();
        if let Some(record) = map.get_mut(namespace).and_then(|m| m.get_mut(id)) {
            record.processed = true;
        }
        Ok(())
    }

    fn log_and_mark_processed(&self, record: OperationRecord) -> OplogResult<()> {
        let mut map = self.records.write();
        let entries = map.entry(record.namespace.clone()).or_default();
        match entries.get_mut(&record.id) {
            // Duplicate id: keep the original record, just mark it.
            Some(existing) => existing.processed = true,
            None => {
                entries.insert(record.id.clone(), record.into_processed());
            }
        }
        Ok(())
    }

    fn purge_older_than(&self, horizon: u64) -> OplogResult<usize> {
        let mut map = self.records.write();
        let mut removed = 0;
        for entries in map.values_mut() {
            let before = entries.len();
            entries.retain(|_, r| !r.processed || r.logged_at >= horizon);
            removed += before - entries.len();
        }
        map.retain(|_, entries| !entries.is_empty());
        Ok(removed)
    }

    fn get(&self, namespace: &Namespace, id: &OperationId) -> OplogResult<Option<OperationRecord>> {
        Ok(self
            .records
            .read()
            .get(namespace)
            .and_then(|m| m.get(id))
            .cloned())
    }
}
