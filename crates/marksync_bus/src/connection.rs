//! Subscriber connections.

use marksync_protocol::{EventMessage, Namespace};
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique id of a subscriber connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generates a fresh connection id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a subscriber connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Registered but the subscription confirmation has not gone out.
    Connecting,
    /// Live and receiving events.
    Subscribed,
    /// Told to reconnect; will be closed after the grace period.
    Closing,
    /// No longer registered.
    Closed,
}

/// A live subscription handed to the transport layer.
///
/// Dropping the subscription closes the channel; the next delivery
/// attempt then evicts the connection from the registry.
pub struct Subscription {
    id: ConnectionId,
    namespace: Namespace,
    events: mpsc::Receiver<EventMessage>,
}

impl Subscription {
    pub(crate) fn new(
        id: ConnectionId,
        namespace: Namespace,
        events: mpsc::Receiver<EventMessage>,
    ) -> Self {
        Self {
            id,
            namespace,
            events,
        }
    }

    /// The connection id, for explicit unsubscribe.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The namespace this subscription is scoped to.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Waits for the next event. Returns `None` once the connection has
    /// been closed by the server.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        self.events.recv().await
    }

    /// Non-blocking receive, mainly for tests and draining.
    pub fn try_recv(&mut self) -> Option<EventMessage> {
        self.events.try_recv().ok()
    }
}
