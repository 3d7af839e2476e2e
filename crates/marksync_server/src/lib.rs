//! # Marksync Server
//!
//! The process-level facade over the marksync subsystems: one tree
//! store, one operation log, one event bus, and one reconciler, wired
//! together and fronted by a request-shaped API.
//!
//! Transport is out of scope here; an HTTP or websocket layer calls
//! [`SyncServer::handle_sync`] with a decoded batch and streams the
//! [`marksync_bus::Subscription`] it gets from [`SyncServer::subscribe`].
//!
//! [`SyncServer::spawn_maintenance`] starts the background loops:
//! subscriber heartbeats, the periodic forced-reconnect cycle, and
//! operation-log retention purges.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{MaintenanceHandle, SyncServer};
