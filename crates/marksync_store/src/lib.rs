//! # Marksync Store
//!
//! The namespaced tree store for marksync.
//!
//! This crate owns every node record: folders and bookmarks, their 1:1
//! attribute rows, parent edges, and sibling order keys. The ordering
//! engine computes keys; this crate decides when a key is needed and
//! stores the result.
//!
//! ## Invariants
//!
//! - Parent edges always form a forest; moves that would create a cycle
//!   fail and leave the tree untouched
//! - Every mutation bumps the node's `updated_at`
//! - Deleting a folder cascades to all descendants and their attributes
//! - Sibling order is `(order_key, node_id)`; no insert or move ever
//!   rewrites another sibling's key
//!
//! Mutations for one namespace run under a single write lock, so a move
//! resolves its neighbors and writes the new key atomically and
//! concurrent moves of the same node cannot interleave into a lost
//! update.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod node;
mod tree;

pub use error::{StoreError, StoreResult};
pub use node::{BookmarkAttributes, FolderAttributes, Node, NodeKind, NodeSnapshot};
pub use tree::TreeStore;
