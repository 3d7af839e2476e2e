//! Per-kind operation payload shapes.

use crate::ids::NodeId;
use serde::{Deserialize, Serialize};

/// Where a node should land among its new siblings.
///
/// Anchored variants (`Before`/`After`) name an existing sibling; the
/// reconciler resolves the anchor's neighbors and asks the ordering
/// engine for a key strictly between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderPosition {
    /// Before every existing sibling.
    Head,
    /// After every existing sibling.
    Tail,
    /// Immediately before the named sibling.
    Before(NodeId),
    /// Immediately after the named sibling.
    After(NodeId),
}

/// Payload for `CREATE_FOLDER`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolder {
    /// Client-chosen node id, stable across retries.
    pub id: NodeId,
    /// Folder title.
    pub name: String,
    /// Parent folder, or `None` for a root-level folder.
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    /// Requested position among the new siblings.
    pub order_position: OrderPosition,
}

/// Payload for `CREATE_BOOKMARK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmark {
    /// Client-chosen node id, stable across retries.
    pub id: NodeId,
    /// Bookmark title.
    pub name: String,
    /// Bookmark URL.
    pub url: String,
    /// Parent folder, or `None` for a root-level bookmark.
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    /// Whether the bookmark is favorited.
    #[serde(default)]
    pub favorite: bool,
    /// Optional icon reference.
    #[serde(default)]
    pub icon: Option<String>,
    /// Requested position among the new siblings.
    pub order_position: OrderPosition,
}

/// Payload for `UPDATE_FOLDER`. Absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFolder {
    /// Target folder.
    pub id: NodeId,
    /// New title.
    #[serde(default)]
    pub name: Option<String>,
    /// New open/collapsed state.
    #[serde(default)]
    pub is_open: Option<bool>,
}

/// Payload for `UPDATE_BOOKMARK`. Absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookmark {
    /// Target bookmark.
    pub id: NodeId,
    /// New title.
    #[serde(default)]
    pub name: Option<String>,
    /// New URL.
    #[serde(default)]
    pub url: Option<String>,
    /// New favorite state.
    #[serde(default)]
    pub favorite: Option<bool>,
    /// New icon reference.
    #[serde(default)]
    pub icon: Option<String>,
}

/// Payload for `DELETE_ITEM`. Deleting a folder cascades to all
/// descendants; deleting an absent id succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItem {
    /// Target node.
    pub id: NodeId,
}

/// Payload for `MOVE_ITEM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveItem {
    /// Target node.
    pub id: NodeId,
    /// New parent folder, or `None` for root level.
    #[serde(default)]
    pub new_parent_id: Option<NodeId>,
    /// Requested position among the new siblings.
    pub target_order_position: OrderPosition,
}
