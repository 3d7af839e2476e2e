//! Bus configuration.

use std::time::Duration;

/// Configuration for the event bus.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Per-connection event channel capacity. Delivery to a connection
    /// whose channel is full fails, which evicts the connection.
    pub channel_capacity: usize,
    /// Interval between liveness probes to every connection.
    pub heartbeat_interval: Duration,
    /// Interval between forced-reconnect cycles.
    pub cleanup_interval: Duration,
    /// Grace period between the closing notice and the actual close.
    pub cleanup_grace: Duration,
}

impl BusConfig {
    /// Creates a configuration with default intervals.
    pub fn new() -> Self {
        Self {
            channel_capacity: 64,
            heartbeat_interval: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(600),
            cleanup_grace: Duration::from_secs(2),
        }
    }

    /// Sets the per-connection channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Sets the heartbeat interval.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the forced-reconnect interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Sets the grace period before a forced close.
    pub fn with_cleanup_grace(mut self, grace: Duration) -> Self {
        self.cleanup_grace = grace;
        self
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::new()
    }
}
