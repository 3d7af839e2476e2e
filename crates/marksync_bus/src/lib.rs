//! # Marksync Bus
//!
//! Namespace-scoped event fan-out for marksync.
//!
//! The bus keeps an in-memory registry of live subscriber connections
//! grouped by namespace and delivers applied-mutation events to every
//! connection in the mutated namespace. It is a process-scoped,
//! lifecycle-managed service: one instance is created at startup and
//! all mutation goes through its synchronized API.
//!
//! ## Delivery model
//!
//! - Per-connection bounded channels; delivery is non-blocking
//! - A connection whose delivery fails (closed or saturated channel) is
//!   treated as dead and evicted, so one slow subscriber never stalls
//!   the publisher or its peers
//! - At-least-once per namespace, unordered across racing publishes;
//!   consumers treat events as independent deltas
//!
//! ## Connection lifetime
//!
//! Heartbeats probe every connection on a fixed interval. On a longer
//! interval every connection is told the server is closing, given a
//! short grace period, and then closed, forcing clients to reconnect.
//! This bounds connection accumulation from half-open sockets the
//! transport never reports as closed.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bus;
mod config;
mod connection;

pub use bus::EventBus;
pub use config::BusConfig;
pub use connection::{ConnectionId, ConnectionState, Subscription};
