//! # Marksync Oplog
//!
//! The operation log: marksync's at-most-once application primitive.
//!
//! Every operation accepted for a namespace is recorded here, keyed by
//! its client-generated operation id. The reconciler consults the log
//! before applying anything; a processed record means the operation's
//! side effects already happened and its recorded result is replayed.
//!
//! The [`OperationLog`] trait is the storage seam: the in-memory
//! implementation backs tests and single-process deployments, and a
//! durable backend plugs in behind the same contract.
//!
//! ## Failure semantics
//!
//! Duplicate-id inserts are "already seen", never an error. Every other
//! storage failure propagates so the enclosing operation fails closed:
//! either logged-and-applied or neither.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod log;
mod record;

pub use error::{OplogError, OplogResult};
pub use log::{MemoryOperationLog, OperationLog};
pub use record::OperationRecord;
