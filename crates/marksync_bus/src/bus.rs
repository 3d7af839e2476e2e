//! The event bus registry and fan-out.

use crate::config::BusConfig;
use crate::connection::{ConnectionId, ConnectionState, Subscription};
use marksync_protocol::{EventMessage, Namespace};
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;

struct Subscriber {
    sender: mpsc::Sender<EventMessage>,
    state: ConnectionState,
}

#[derive(Default)]
struct Registry {
    /// namespace -> connection -> subscriber.
    topics: HashMap<Namespace, HashMap<ConnectionId, Subscriber>>,
    /// Reverse lookup for unsubscribe.
    index: HashMap<ConnectionId, Namespace>,
}

impl Registry {
    fn remove(&mut self, id: &ConnectionId) -> bool {
        let Some(namespace) = self.index.remove(id) else {
            return false;
        };
        if let Some(group) = self.topics.get_mut(&namespace) {
            group.remove(id);
            if group.is_empty() {
                self.topics.remove(&namespace);
            }
        }
        true
    }
}

/// The namespace event bus.
///
/// One instance per process; handlers share it behind an `Arc`. All
/// registry mutation is synchronized internally, so `publish`,
/// `subscribe`, and `unsubscribe` may race freely across namespaces
/// and reconciliation threads.
pub struct EventBus {
    registry: RwLock<Registry>,
    config: BusConfig,
}

impl EventBus {
    /// Creates a bus with the given configuration.
    pub fn new(config: BusConfig) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            config,
        }
    }

    /// Returns the bus configuration.
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Registers a new connection under a namespace.
    ///
    /// The subscription's first event is the `subscribed` confirmation.
    pub fn subscribe(&self, namespace: Namespace) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.config.channel_capacity);
        let id = ConnectionId::new();

        let mut registry = self.registry.write();
        let mut subscriber = Subscriber {
            sender,
            state: ConnectionState::Connecting,
        };
        // The channel is fresh, so the confirmation always has room.
        if subscriber
            .sender
            .try_send(EventMessage::subscribed(namespace.clone()))
            .is_ok()
        {
            subscriber.state = ConnectionState::Subscribed;
        }
        registry
            .topics
            .entry(namespace.clone())
            .or_default()
            .insert(id, subscriber);
        registry.index.insert(id, namespace.clone());
        debug!(connection = %id, namespace = %namespace, "subscriber registered");

        Subscription::new(id, namespace, receiver)
    }

    /// Removes a connection from its namespace group. Empty groups are
    /// discarded. Returns false if the connection was already gone.
    pub fn unsubscribe(&self, id: &ConnectionId) -> bool {
        let removed = self.registry.write().remove(id);
        if removed {
            debug!(connection = %id, "subscriber unsubscribed");
        }
        removed
    }

    /// Delivers an event to every live connection in the namespace.
    ///
    /// A connection whose delivery fails is evicted; the failure never
    /// surfaces to the publisher. Returns the number of deliveries.
    pub fn publish(&self, namespace: &Namespace, event: &EventMessage) -> usize {
        let mut registry = self.registry.write();
        let Some(group) = registry.topics.get_mut(namespace) else {
            return 0;
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, subscriber) in group.iter() {
            match subscriber.sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    debug!(connection = %id, error = %err, "delivery failed, evicting subscriber");
                    dead.push(*id);
                }
            }
        }
        for id in dead {
            registry.remove(&id);
        }
        delivered
    }

    /// Sends a liveness probe to every connection in every namespace.
    /// Returns the number of deliveries.
    pub fn heartbeat_all(&self) -> usize {
        let mut registry = self.registry.write();
        let mut delivered = 0;
        let mut dead = Vec::new();
        for (namespace, group) in registry.topics.iter() {
            for (id, subscriber) in group.iter() {
                match subscriber
                    .sender
                    .try_send(EventMessage::heartbeat(namespace.clone()))
                {
                    Ok(()) => delivered += 1,
                    Err(err) => {
                        debug!(connection = %id, error = %err, "heartbeat failed, evicting subscriber");
                        dead.push(*id);
                    }
                }
            }
        }
        for id in dead {
            registry.remove(&id);
        }
        delivered
    }

    /// First half of a forced-reconnect cycle: every connection gets a
    /// `closing` notice and moves to the closing state. Returns the
    /// number of connections notified.
    pub fn begin_forced_cleanup(&self) -> usize {
        let mut registry = self.registry.write();
        let mut notified = 0;
        let mut dead = Vec::new();
        for (namespace, group) in registry.topics.iter_mut() {
            for (id, subscriber) in group.iter_mut() {
                subscriber.state = ConnectionState::Closing;
                match subscriber
                    .sender
                    .try_send(EventMessage::closing(namespace.clone()))
                {
                    Ok(()) => notified += 1,
                    Err(_) => dead.push(*id),
                }
            }
        }
        for id in dead {
            registry.remove(&id);
        }
        notified
    }

    /// Second half of a forced-reconnect cycle, run after the grace
    /// period: closes every connection still in the closing state.
    /// Connections subscribed after [`Self::begin_forced_cleanup`]
    /// survive. Returns the number of connections closed.
    pub fn finish_forced_cleanup(&self) -> usize {
        let mut registry = self.registry.write();
        let closing: Vec<ConnectionId> = registry
            .topics
            .values()
            .flat_map(|group| {
                group
                    .iter()
                    .filter(|(_, s)| s.state == ConnectionState::Closing)
                    .map(|(id, _)| *id)
            })
            .collect();
        for id in &closing {
            registry.remove(id);
        }
        if !closing.is_empty() {
            debug!(closed = closing.len(), "forced cleanup closed connections");
        }
        closing.len()
    }

    /// Current lifecycle state of a connection. Unknown connections
    /// report as closed.
    pub fn connection_state(&self, id: &ConnectionId) -> ConnectionState {
        let registry = self.registry.read();
        registry
            .index
            .get(id)
            .and_then(|ns| registry.topics.get(ns))
            .and_then(|group| group.get(id))
            .map(|s| s.state)
            .unwrap_or(ConnectionState::Closed)
    }

    /// Number of live connections across all namespaces.
    pub fn connection_count(&self) -> usize {
        self.registry.read().index.len()
    }

    /// Number of namespaces with at least one connection.
    pub fn namespace_count(&self) -> usize {
        self.registry.read().topics.len()
    }
}
