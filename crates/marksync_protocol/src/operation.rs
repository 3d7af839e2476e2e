//! Client operations.

use crate::ids::{Namespace, NodeId, OperationId};
use crate::payload::{
    CreateBookmark, CreateFolder, DeleteItem, MoveItem, UpdateBookmark, UpdateFolder,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a client operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    /// A folder is being created.
    #[serde(rename = "CREATE_FOLDER")]
    CreateFolder,
    /// A bookmark is being created.
    #[serde(rename = "CREATE_BOOKMARK")]
    CreateBookmark,
    /// Folder attributes are being changed.
    #[serde(rename = "UPDATE_FOLDER")]
    UpdateFolder,
    /// Bookmark attributes are being changed.
    #[serde(rename = "UPDATE_BOOKMARK")]
    UpdateBookmark,
    /// A node (and its descendants) is being removed.
    #[serde(rename = "DELETE_ITEM")]
    DeleteItem,
    /// A node is being re-parented or re-ordered.
    #[serde(rename = "MOVE_ITEM")]
    MoveItem,
}

impl OperationType {
    /// Returns the wire name of this operation type.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::CreateFolder => "CREATE_FOLDER",
            OperationType::CreateBookmark => "CREATE_BOOKMARK",
            OperationType::UpdateFolder => "UPDATE_FOLDER",
            OperationType::UpdateBookmark => "UPDATE_BOOKMARK",
            OperationType::DeleteItem => "DELETE_ITEM",
            OperationType::MoveItem => "MOVE_ITEM",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed operation payload, tagged by operation kind.
///
/// On the wire this is `{"type": ..., "payload": {...}}`, flattened into
/// the enclosing [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum OperationPayload {
    /// Create a folder.
    #[serde(rename = "CREATE_FOLDER")]
    CreateFolder(CreateFolder),
    /// Create a bookmark.
    #[serde(rename = "CREATE_BOOKMARK")]
    CreateBookmark(CreateBookmark),
    /// Update folder attributes.
    #[serde(rename = "UPDATE_FOLDER")]
    UpdateFolder(UpdateFolder),
    /// Update bookmark attributes.
    #[serde(rename = "UPDATE_BOOKMARK")]
    UpdateBookmark(UpdateBookmark),
    /// Delete a node, cascading to descendants.
    #[serde(rename = "DELETE_ITEM")]
    DeleteItem(DeleteItem),
    /// Move a node to a new parent/position.
    #[serde(rename = "MOVE_ITEM")]
    MoveItem(MoveItem),
}

impl OperationPayload {
    /// Returns the operation kind.
    pub fn op_type(&self) -> OperationType {
        match self {
            OperationPayload::CreateFolder(_) => OperationType::CreateFolder,
            OperationPayload::CreateBookmark(_) => OperationType::CreateBookmark,
            OperationPayload::UpdateFolder(_) => OperationType::UpdateFolder,
            OperationPayload::UpdateBookmark(_) => OperationType::UpdateBookmark,
            OperationPayload::DeleteItem(_) => OperationType::DeleteItem,
            OperationPayload::MoveItem(_) => OperationType::MoveItem,
        }
    }

    /// Returns the node this operation targets.
    pub fn target_node_id(&self) -> &NodeId {
        match self {
            OperationPayload::CreateFolder(p) => &p.id,
            OperationPayload::CreateBookmark(p) => &p.id,
            OperationPayload::UpdateFolder(p) => &p.id,
            OperationPayload::UpdateBookmark(p) => &p.id,
            OperationPayload::DeleteItem(p) => &p.id,
            OperationPayload::MoveItem(p) => &p.id,
        }
    }
}

/// A single client operation as submitted in a sync batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Client-generated operation id (the idempotency key).
    pub id: OperationId,
    /// Namespace the operation belongs to.
    pub namespace: Namespace,
    /// Kind-tagged payload.
    #[serde(flatten)]
    pub payload: OperationPayload,
    /// Device that produced the operation.
    pub origin_device_id: String,
    /// Client wall-clock time the operation was created, unix millis.
    pub client_timestamp: u64,
}

impl Operation {
    /// Returns the operation kind.
    pub fn op_type(&self) -> OperationType {
        self.payload.op_type()
    }

    /// Returns the node this operation targets.
    pub fn target_node_id(&self) -> &NodeId {
        self.payload.target_node_id()
    }
}
