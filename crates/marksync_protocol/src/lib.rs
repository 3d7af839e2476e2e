//! # Marksync Protocol
//!
//! Wire-level types for the marksync bookmark synchronization protocol.
//!
//! This crate provides:
//! - Typed client operations with per-kind payload shapes
//! - Sync batch request/response messages with per-operation outcomes
//! - Event-stream messages pushed to live subscribers
//! - Opaque id newtypes shared across the workspace
//!
//! All types serialize to camelCase JSON. Operation kinds are a tagged
//! enum, so dispatch in the reconciler is exhaustive pattern matching
//! rather than a string-keyed handler table.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod event;
mod ids;
mod messages;
mod operation;
mod payload;
mod time;

pub use event::{EventKind, EventMessage, MutationEvent};
pub use ids::{Namespace, NodeId, OperationId};
pub use messages::{ErrorKind, OperationOutcome, OutcomeError, OutcomeStatus, SyncRequest, SyncResponse};
pub use operation::{Operation, OperationPayload, OperationType};
pub use payload::{
    CreateBookmark, CreateFolder, DeleteItem, MoveItem, OrderPosition, UpdateBookmark,
    UpdateFolder,
};
pub use time::now_millis;
