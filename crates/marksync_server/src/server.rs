//! The sync server facade and its maintenance loops.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use marksync_bus::{ConnectionId, EventBus, Subscription};
use marksync_engine::Reconciler;
use marksync_oplog::{MemoryOperationLog, OperationLog};
use marksync_protocol::{now_millis, Namespace, NodeId, SyncRequest, SyncResponse};
use marksync_store::{NodeSnapshot, TreeStore};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The assembled sync server: store, log, bus, and reconciler behind a
/// request-shaped API.
///
/// Shared behind an `Arc` by whatever transport fronts it; every method
/// takes `&self` and is safe under concurrent invocation.
pub struct SyncServer {
    reconciler: Reconciler<MemoryOperationLog>,
    bus: Arc<EventBus>,
    config: ServerConfig,
}

impl SyncServer {
    /// Wires up a server from the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let bus = Arc::new(EventBus::new(config.bus.clone()));
        let reconciler = Reconciler::new(
            Arc::new(TreeStore::new()),
            Arc::new(MemoryOperationLog::new()),
            Arc::clone(&bus),
        );
        info!(
            max_batch_size = config.max_batch_size,
            "sync server initialized"
        );
        Self {
            reconciler,
            bus,
            config,
        }
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Applies a sync batch and returns the per-operation outcomes.
    ///
    /// Rejects the whole request only for structural problems; every
    /// per-operation failure is reported in its outcome instead.
    pub fn handle_sync(&self, request: &SyncRequest) -> ServerResult<SyncResponse> {
        if request.namespace.is_empty() {
            return Err(ServerError::InvalidRequest(
                "namespace must not be empty".into(),
            ));
        }
        if request.operations.len() > self.config.max_batch_size {
            return Err(ServerError::BatchTooLarge {
                submitted: request.operations.len(),
                limit: self.config.max_batch_size,
            });
        }
        debug!(
            namespace = %request.namespace,
            operations = request.operations.len(),
            "applying sync batch"
        );
        Ok(self.reconciler.apply_batch(request))
    }

    /// Registers a live event subscription for a namespace.
    pub fn subscribe(&self, namespace: Namespace) -> ServerResult<Subscription> {
        if namespace.is_empty() {
            return Err(ServerError::InvalidRequest(
                "namespace must not be empty".into(),
            ));
        }
        Ok(self.bus.subscribe(namespace))
    }

    /// Drops a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: &ConnectionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Full tree read for a namespace: depth-first, siblings in order,
    /// parents before children.
    pub fn tree(&self, namespace: &Namespace) -> Vec<NodeSnapshot> {
        self.reconciler.store().snapshot(namespace)
    }

    /// Children of one parent (or the root level), in sibling order.
    pub fn children(&self, namespace: &Namespace, parent: Option<&NodeId>) -> Vec<NodeSnapshot> {
        self.reconciler.store().children(namespace, parent)
    }

    /// Number of live event subscriptions.
    pub fn connection_count(&self) -> usize {
        self.bus.connection_count()
    }

    /// Starts the background maintenance loops: subscriber heartbeats,
    /// the forced-reconnect cycle, and operation-log retention purges.
    ///
    /// The loops run until the returned handle is shut down.
    pub fn spawn_maintenance(&self) -> MaintenanceHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        {
            let bus = Arc::clone(&self.bus);
            let interval = self.config.bus.heartbeat_interval;
            let mut shutdown = shutdown_rx.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(interval) => {
                            bus.heartbeat_all();
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            }));
        }

        {
            let bus = Arc::clone(&self.bus);
            let interval = self.config.bus.cleanup_interval;
            let grace = self.config.bus.cleanup_grace;
            let mut shutdown = shutdown_rx.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(interval) => {
                            let notified = bus.begin_forced_cleanup();
                            tokio::time::sleep(grace).await;
                            let closed = bus.finish_forced_cleanup();
                            if notified > 0 || closed > 0 {
                                debug!(notified, closed, "forced-reconnect cycle completed");
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            }));
        }

        {
            let oplog = Arc::clone(self.reconciler.oplog());
            let interval = self.config.purge_interval;
            let retention =
                u64::try_from(self.config.oplog_retention.as_millis()).unwrap_or(u64::MAX);
            let mut shutdown = shutdown_rx;
            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(interval) => {
                            let horizon = now_millis().saturating_sub(retention);
                            match oplog.purge_older_than(horizon) {
                                Ok(0) => {}
                                Ok(removed) => {
                                    debug!(removed, "purged processed operation records");
                                }
                                Err(err) => {
                                    warn!(error = %err, "operation log purge failed");
                                }
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            }));
        }

        info!("maintenance loops started");
        MaintenanceHandle {
            shutdown: shutdown_tx,
            tasks,
        }
    }

    #[cfg(test)]
    fn oplog(&self) -> &Arc<MemoryOperationLog> {
        self.reconciler.oplog()
    }
}

impl Default for SyncServer {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

/// Handle over the spawned maintenance loops.
pub struct MaintenanceHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl MaintenanceHandle {
    /// Stops every maintenance loop and waits for the tasks to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
        info!("maintenance loops stopped");
    }
}
