//! # Marksync Order
//!
//! Dense sibling ordering for marksync trees.
//!
//! This crate provides the order-key algebra used to totally order siblings
//! under one parent node. Keys are strings over a base-36 alphabet compared
//! lexicographically. Between any two keys (or before the first / after the
//! last) another key can always be generated, so inserting or moving a node
//! never rewrites any other sibling's key.
//!
//! ## Design Principles
//!
//! - Pure computation, no I/O and no storage of keys
//! - A generated key is always strictly inside its bounds
//! - Generation terminates by extending key length, never by renumbering
//! - Concurrent inserts that collide on the same key stay well ordered
//!   through a secondary node-id tie-break ([`sibling_cmp`])
//!
//! ## Example
//!
//! ```rust
//! use marksync_order::{key_between, OrderKey};
//!
//! let first = key_between(None, None).unwrap();
//! let before = key_between(None, Some(&first)).unwrap();
//! let after = key_between(Some(&first), None).unwrap();
//! assert!(before < first && first < after);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod key;

pub use error::{OrderError, OrderResult};
pub use key::{key_between, sibling_cmp, OrderKey, DIGITS};
