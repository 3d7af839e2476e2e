//! # Marksync Engine
//!
//! The sync reconciler: applies batches of client operations against
//! the tree store with exactly-once effects.
//!
//! ## Per-operation pipeline
//!
//! 1. Dedup check against the operation log (processed ids replay their
//!    recorded result)
//! 2. Payload validation
//! 3. Kind-specific preconditions (existence, parentage, cycles)
//! 4. Tree store mutation
//! 5. Log-and-mark-processed
//! 6. Applied-mutation event published to the namespace
//!
//! ## Batch contract
//!
//! Operations apply strictly in submission order. One operation's
//! failure never aborts the rest of the batch; the response carries one
//! outcome per submitted operation, in order. A storage failure leaves
//! its operation unprocessed, so a retry with the same id is safe.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod reconciler;

pub use error::{ApplyError, ApplyResult};
pub use reconciler::Reconciler;
