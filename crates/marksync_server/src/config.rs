//! Server configuration.

use marksync_bus::BusConfig;
use std::time::Duration;

/// Configuration for a [`crate::SyncServer`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum operations accepted in one sync batch.
    pub max_batch_size: usize,
    /// Event bus settings (channel capacity and connection lifetime
    /// intervals).
    pub bus: BusConfig,
    /// How long processed operation records stay available for dedup.
    pub oplog_retention: Duration,
    /// Interval between retention purge passes.
    pub purge_interval: Duration,
}

impl ServerConfig {
    /// Creates a configuration with default limits and intervals.
    pub fn new() -> Self {
        Self {
            max_batch_size: 500,
            bus: BusConfig::default(),
            oplog_retention: Duration::from_secs(30 * 24 * 60 * 60),
            purge_interval: Duration::from_secs(60 * 60),
        }
    }

    /// Sets the per-batch operation cap.
    pub fn with_max_batch_size(mut self, limit: usize) -> Self {
        self.max_batch_size = limit.max(1);
        self
    }

    /// Sets the event bus configuration.
    pub fn with_bus(mut self, bus: BusConfig) -> Self {
        self.bus = bus;
        self
    }

    /// Sets the dedup retention window for processed operations.
    ///
    /// A retry arriving after this window is no longer recognized as a
    /// duplicate; create and delete absorption in the reconciler keeps
    /// most late retries harmless anyway.
    pub fn with_oplog_retention(mut self, retention: Duration) -> Self {
        self.oplog_retention = retention;
        self
    }

    /// Sets the interval between retention purge passes.
    pub fn with_purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval = interval;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
