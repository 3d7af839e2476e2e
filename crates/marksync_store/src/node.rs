//! Node records and attribute rows.

use marksync_order::OrderKey;
use marksync_protocol::{Namespace, NodeId};
use serde::{Deserialize, Serialize};

/// Whether a node is a folder or a bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A container node; may have children.
    Folder,
    /// A leaf node pointing at a URL.
    Bookmark,
}

/// A node in the tree.
///
/// The store exclusively owns node records; other components only read
/// them through snapshots or the reconciler's outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Opaque unique id (client-chosen).
    pub id: NodeId,
    /// Namespace the node belongs to.
    pub namespace: Namespace,
    /// Folder or bookmark.
    pub kind: NodeKind,
    /// Parent folder, or `None` for a root-level node.
    pub parent_id: Option<NodeId>,
    /// Sibling order key.
    pub order_key: OrderKey,
    /// Creation time, unix millis.
    pub created_at: u64,
    /// Last mutation time, unix millis.
    pub updated_at: u64,
}

/// Attributes stored 1:1 with a folder node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderAttributes {
    /// Folder title.
    pub title: String,
    /// Whether the folder is expanded in clients.
    pub is_open: bool,
}

/// Attributes stored 1:1 with a bookmark node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkAttributes {
    /// Bookmark title.
    pub title: String,
    /// Bookmark URL.
    pub url: String,
    /// Whether the bookmark is favorited.
    pub favorite: bool,
    /// Optional icon reference.
    pub icon: Option<String>,
}

/// A node joined with its attribute row, as returned by tree reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    /// The node record.
    #[serde(flatten)]
    pub node: Node,
    /// Folder attributes, for folder nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<FolderAttributes>,
    /// Bookmark attributes, for bookmark nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<BookmarkAttributes>,
}
