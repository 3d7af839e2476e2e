//! The namespaced tree store.

use crate::error::{StoreError, StoreResult};
use crate::node::{BookmarkAttributes, FolderAttributes, Node, NodeKind, NodeSnapshot};
use marksync_order::{key_between, sibling_cmp, OrderKey};
use marksync_protocol::{now_millis, Namespace, NodeId, OrderPosition};
use parking_lot::RwLock;
use std::collections::HashMap;

/// All nodes and attribute rows for one namespace.
#[derive(Default)]
struct NamespaceTree {
    nodes: HashMap<NodeId, Node>,
    folders: HashMap<NodeId, FolderAttributes>,
    bookmarks: HashMap<NodeId, BookmarkAttributes>,
}

impl NamespaceTree {
    /// Children of `parent`, in sibling order.
    fn sorted_children(&self, parent: Option<&NodeId>, exclude: Option<&NodeId>) -> Vec<&Node> {
        let mut children: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| n.parent_id.as_ref() == parent)
            .filter(|n| Some(&n.id) != exclude)
            .collect();
        children.sort_by(|a, b| sibling_cmp(&a.order_key, a.id.as_str(), &b.order_key, b.id.as_str()));
        children
    }

    /// Resolves the order-key bounds for a requested position among the
    /// children of `parent`. `exclude` drops the node being moved from
    /// the sibling set so it cannot bound itself.
    fn resolve_bounds(
        &self,
        parent: Option<&NodeId>,
        position: &OrderPosition,
        exclude: Option<&NodeId>,
    ) -> StoreResult<(Option<OrderKey>, Option<OrderKey>)> {
        let children = self.sorted_children(parent, exclude);
        let bounds = match position {
            OrderPosition::Head => (None, children.first().map(|n| n.order_key.clone())),
            OrderPosition::Tail => (children.last().map(|n| n.order_key.clone()), None),
            OrderPosition::Before(anchor) => {
                let idx = children
                    .iter()
                    .position(|n| &n.id == anchor)
                    .ok_or_else(|| StoreError::NotFound(anchor.clone()))?;
                let lower = idx
                    .checked_sub(1)
                    .map(|i| children[i].order_key.clone());
                (lower, Some(children[idx].order_key.clone()))
            }
            OrderPosition::After(anchor) => {
                let idx = children
                    .iter()
                    .position(|n| &n.id == anchor)
                    .ok_or_else(|| StoreError::NotFound(anchor.clone()))?;
                let upper = children.get(idx + 1).map(|n| n.order_key.clone());
                (Some(children[idx].order_key.clone()), upper)
            }
        };
        Ok(bounds)
    }

    /// Requires `parent` (when present) to exist and be a folder.
    fn ensure_parent_folder(&self, parent: Option<&NodeId>) -> StoreResult<()> {
        let Some(parent) = parent else {
            return Ok(());
        };
        let node = self
            .nodes
            .get(parent)
            .ok_or_else(|| StoreError::NotFound(parent.clone()))?;
        if node.kind != NodeKind::Folder {
            return Err(StoreError::KindMismatch {
                node: parent.clone(),
                expected: "folder",
            });
        }
        Ok(())
    }

    /// Returns true if placing `node` under `new_parent` would make it
    /// its own ancestor.
    fn would_cycle(&self, node: &NodeId, new_parent: &NodeId) -> bool {
        let mut current = Some(new_parent.clone());
        while let Some(id) = current {
            if &id == node {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent_id.clone());
        }
        false
    }

    /// Collects `root` and every descendant, parents before children.
    fn subtree_ids(&self, root: &NodeId) -> Vec<NodeId> {
        let mut out = vec![root.clone()];
        let mut frontier = vec![root.clone()];
        while let Some(parent) = frontier.pop() {
            for node in self.nodes.values() {
                if node.parent_id.as_ref() == Some(&parent) {
                    out.push(node.id.clone());
                    frontier.push(node.id.clone());
                }
            }
        }
        out
    }

    fn snapshot_of(&self, node: &Node) -> NodeSnapshot {
        NodeSnapshot {
            node: node.clone(),
            folder: self.folders.get(&node.id).cloned(),
            bookmark: self.bookmarks.get(&node.id).cloned(),
        }
    }

    /// Depth-first snapshot, siblings in order, parents before children.
    fn snapshot_from(&self, parent: Option<&NodeId>, out: &mut Vec<NodeSnapshot>) {
        for child in self.sorted_children(parent, None) {
            out.push(self.snapshot_of(child));
            self.snapshot_from(Some(&child.id), out);
        }
    }
}

/// The tree store: every node record for every namespace.
///
/// One process-wide instance is shared behind an [`std::sync::Arc`];
/// all mutation goes through its synchronized API.
pub struct TreeStore {
    namespaces: RwLock<HashMap<Namespace, NamespaceTree>>,
}

impl TreeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
        }
    }

    /// Returns true if the node exists in the namespace.
    pub fn contains(&self, namespace: &Namespace, id: &NodeId) -> bool {
        self.namespaces
            .read()
            .get(namespace)
            .map(|t| t.nodes.contains_key(id))
            .unwrap_or(false)
    }

    /// Returns a copy of the node record, if present.
    pub fn get(&self, namespace: &Namespace, id: &NodeId) -> Option<Node> {
        self.namespaces
            .read()
            .get(namespace)?
            .nodes
            .get(id)
            .cloned()
    }

    /// Creates a folder at the requested position.
    pub fn create_folder(
        &self,
        namespace: &Namespace,
        id: &NodeId,
        title: &str,
        parent_id: Option<&NodeId>,
        position: &OrderPosition,
    ) -> StoreResult<Node> {
        let mut map = self.namespaces.write();
        let tree = map.entry(namespace.clone()).or_default();
        let node = Self::insert_node(tree, namespace, id, NodeKind::Folder, parent_id, position)?;
        tree.folders.insert(
            id.clone(),
            FolderAttributes {
                title: title.to_string(),
                is_open: false,
            },
        );
        Ok(node)
    }

    /// Creates a bookmark at the requested position.
    #[allow(clippy::too_many_arguments)]
    pub fn create_bookmark(
        &self,
        namespace: &Namespace,
        id: &NodeId,
        title: &str,
        url: &str,
        favorite: bool,
        icon: Option<&str>,
        parent_id: Option<&NodeId>,
        position: &OrderPosition,
    ) -> StoreResult<Node> {
        let mut map = self.namespaces.write();
        let tree = map.entry(namespace.clone()).or_default();
        let node = Self::insert_node(tree, namespace, id, NodeKind::Bookmark, parent_id, position)?;
        tree.bookmarks.insert(
            id.clone(),
            BookmarkAttributes {
                title: title.to_string(),
                url: url.to_string(),
                favorite,
                icon: icon.map(str::to_string),
            },
        );
        Ok(node)
    }

    fn insert_node(
        tree: &mut NamespaceTree,
        namespace: &Namespace,
        id: &NodeId,
        kind: NodeKind,
        parent_id: Option<&NodeId>,
        position: &OrderPosition,
    ) -> StoreResult<Node> {
        if tree.nodes.contains_key(id) {
            return Err(StoreError::AlreadyExists(id.clone()));
        }
        tree.ensure_parent_folder(parent_id)?;
        let (lower, upper) = tree.resolve_bounds(parent_id, position, None)?;
        let order_key = key_between(lower.as_ref(), upper.as_ref())?;
        let now = now_millis();
        let node = Node {
            id: id.clone(),
            namespace: namespace.clone(),
            kind,
            parent_id: parent_id.cloned(),
            order_key,
            created_at: now,
            updated_at: now,
        };
        tree.nodes.insert(id.clone(), node.clone());
        Ok(node)
    }

    /// Updates folder attributes. Absent fields are left unchanged.
    pub fn update_folder(
        &self,
        namespace: &Namespace,
        id: &NodeId,
        name: Option<&str>,
        is_open: Option<bool>,
    ) -> StoreResult<Node> {
        let mut map = self.namespaces.write();
        let tree = map
            .get_mut(namespace)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Self::require_kind(tree, id, NodeKind::Folder)?;

        if let Some(attrs) = tree.folders.get_mut(id) {
            if let Some(name) = name {
                attrs.title = name.to_string();
            }
            if let Some(is_open) = is_open {
                attrs.is_open = is_open;
            }
        }
        Self::touch(tree, id)
    }

    /// Updates bookmark attributes. Absent fields are left unchanged.
    pub fn update_bookmark(
        &self,
        namespace: &Namespace,
        id: &NodeId,
        name: Option<&str>,
        url: Option<&str>,
        favorite: Option<bool>,
        icon: Option<&str>,
    ) -> StoreResult<Node> {
        let mut map = self.namespaces.write();
        let tree = map
            .get_mut(namespace)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Self::require_kind(tree, id, NodeKind::Bookmark)?;

        if let Some(attrs) = tree.bookmarks.get_mut(id) {
            if let Some(name) = name {
                attrs.title = name.to_string();
            }
            if let Some(url) = url {
                attrs.url = url.to_string();
            }
            if let Some(favorite) = favorite {
                attrs.favorite = favorite;
            }
            if let Some(icon) = icon {
                attrs.icon = Some(icon.to_string());
            }
        }
        Self::touch(tree, id)
    }

    /// Moves a node under a new parent at the requested position.
    ///
    /// Neighbor resolution, the cycle check, and the key write happen
    /// under one write lock, so concurrent moves of the same node
    /// serialize instead of losing updates. The old position is simply
    /// abandoned; no other sibling is touched.
    pub fn move_node(
        &self,
        namespace: &Namespace,
        id: &NodeId,
        new_parent_id: Option<&NodeId>,
        position: &OrderPosition,
    ) -> StoreResult<Node> {
        let mut map = self.namespaces.write();
        let tree = map
            .get_mut(namespace)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if !tree.nodes.contains_key(id) {
            return Err(StoreError::NotFound(id.clone()));
        }

        if let Some(parent) = new_parent_id {
            tree.ensure_parent_folder(Some(parent))?;
            if tree.would_cycle(id, parent) {
                return Err(StoreError::Cycle {
                    node: id.clone(),
                    new_parent: parent.clone(),
                });
            }
        }

        let (lower, upper) = tree.resolve_bounds(new_parent_id, position, Some(id))?;
        let order_key = key_between(lower.as_ref(), upper.as_ref())?;

        let node = tree
            .nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        node.parent_id = new_parent_id.cloned();
        node.order_key = order_key;
        node.updated_at = now_millis();
        Ok(node.clone())
    }

    /// Deletes a node and every descendant, including attribute rows.
    ///
    /// Returns the removed ids, parents before children. Deleting an
    /// absent id removes nothing and returns an empty list; deletion
    /// is idempotent by definition.
    pub fn delete(&self, namespace: &Namespace, id: &NodeId) -> StoreResult<Vec<NodeId>> {
        let mut map = self.namespaces.write();
        let Some(tree) = map.get_mut(namespace) else {
            return Ok(Vec::new());
        };
        if !tree.nodes.contains_key(id) {
            return Ok(Vec::new());
        }

        let removed = tree.subtree_ids(id);
        for node_id in &removed {
            tree.nodes.remove(node_id);
            tree.folders.remove(node_id);
            tree.bookmarks.remove(node_id);
        }
        if tree.nodes.is_empty() {
            map.remove(namespace);
        }
        Ok(removed)
    }

    /// Children of `parent` in sibling order, joined with attributes.
    pub fn children(&self, namespace: &Namespace, parent: Option<&NodeId>) -> Vec<NodeSnapshot> {
        let map = self.namespaces.read();
        let Some(tree) = map.get(namespace) else {
            return Vec::new();
        };
        tree.sorted_children(parent, None)
            .into_iter()
            .map(|n| tree.snapshot_of(n))
            .collect()
    }

    /// Full tree read for a namespace: depth-first, siblings in order,
    /// parents before children. Once an operation is marked processed,
    /// this read reflects it.
    pub fn snapshot(&self, namespace: &Namespace) -> Vec<NodeSnapshot> {
        let map = self.namespaces.read();
        let Some(tree) = map.get(namespace) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(tree.nodes.len());
        tree.snapshot_from(None, &mut out);
        out
    }

    /// Number of nodes in a namespace.
    pub fn node_count(&self, namespace: &Namespace) -> usize {
        self.namespaces
            .read()
            .get(namespace)
            .map(|t| t.nodes.len())
            .unwrap_or(0)
    }

    fn require_kind(tree: &NamespaceTree, id: &NodeId, kind: NodeKind) -> StoreResult<()> {
        let node = tree
            .nodes
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if node.kind != kind {
            return Err(StoreError::KindMismatch {
                node: id.clone(),
                expected: match kind {
                    NodeKind::Folder => "folder",
                    NodeKind::Bookmark => "bookmark",
                },
            });
        }
        Ok(())
    }

    fn touch(tree: &mut NamespaceTree, id: &NodeId) -> StoreResult<Node> {
        let node = tree
            .nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        node.updated_at = now_millis();
        Ok(node.clone())
    }
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> Namespace {
        Namespace::from("ns1")
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn store_with_root_folder() -> TreeStore {
        let store = TreeStore::new();
        store
            .create_folder(&ns(), &id("root"), "Root", None, &OrderPosition::Tail)
            .unwrap();
        store
    }

    #[test]
    fn create_orders_siblings() {
        let store = TreeStore::new();
        store
            .create_folder(&ns(), &id("a"), "A", None, &OrderPosition::Tail)
            .unwrap();
        store
            .create_folder(&ns(), &id("b"), "B", None, &OrderPosition::Tail)
            .unwrap();
        store
            .create_folder(&ns(), &id("c"), "C", None, &OrderPosition::Head)
            .unwrap();

        let order: Vec<_> = store
            .children(&ns(), None)
            .into_iter()
            .map(|s| s.node.id)
            .collect();
        assert_eq!(order, vec![id("c"), id("a"), id("b")]);
    }

    #[test]
    fn create_duplicate_id_fails() {
        let store = store_with_root_folder();
        let err = store
            .create_folder(&ns(), &id("root"), "Again", None, &OrderPosition::Tail)
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[test]
    fn create_under_missing_parent_fails() {
        let store = TreeStore::new();
        let err = store
            .create_folder(
                &ns(),
                &id("f1"),
                "F1",
                Some(&id("ghost")),
                &OrderPosition::Tail,
            )
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(id("ghost")));
    }

    #[test]
    fn bookmark_cannot_be_a_parent() {
        let store = TreeStore::new();
        store
            .create_bookmark(
                &ns(),
                &id("b1"),
                "B1",
                "https://example.com",
                false,
                None,
                None,
                &OrderPosition::Tail,
            )
            .unwrap();
        let err = store
            .create_folder(&ns(), &id("f1"), "F1", Some(&id("b1")), &OrderPosition::Tail)
            .unwrap_err();
        assert!(matches!(err, StoreError::KindMismatch { .. }));
    }

    #[test]
    fn update_folder_changes_fields_and_bumps_updated_at() {
        let store = store_with_root_folder();
        let before = store.get(&ns(), &id("root")).unwrap();

        let after = store
            .update_folder(&ns(), &id("root"), Some("Renamed"), Some(true))
            .unwrap();
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(after.created_at, before.created_at);

        let snapshot = store.snapshot(&ns());
        let folder = snapshot[0].folder.as_ref().unwrap();
        assert_eq!(folder.title, "Renamed");
        assert!(folder.is_open);
    }

    #[test]
    fn update_wrong_kind_fails() {
        let store = store_with_root_folder();
        let err = store
            .update_bookmark(&ns(), &id("root"), Some("X"), None, None, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::KindMismatch { .. }));
    }

    #[test]
    fn update_missing_node_fails() {
        let store = store_with_root_folder();
        let err = store
            .update_folder(&ns(), &id("ghost"), Some("X"), None)
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(id("ghost")));
    }

    #[test]
    fn move_with_anchors() {
        let store = TreeStore::new();
        for name in ["a", "b", "c"] {
            store
                .create_folder(&ns(), &id(name), name, None, &OrderPosition::Tail)
                .unwrap();
        }

        // c before a: c a b
        store
            .move_node(&ns(), &id("c"), None, &OrderPosition::Before(id("a")))
            .unwrap();
        let order: Vec<_> = store
            .children(&ns(), None)
            .into_iter()
            .map(|s| s.node.id)
            .collect();
        assert_eq!(order, vec![id("c"), id("a"), id("b")]);

        // c after a: a c b
        store
            .move_node(&ns(), &id("c"), None, &OrderPosition::After(id("a")))
            .unwrap();
        let order: Vec<_> = store
            .children(&ns(), None)
            .into_iter()
            .map(|s| s.node.id)
            .collect();
        assert_eq!(order, vec![id("a"), id("c"), id("b")]);
    }

    #[test]
    fn move_to_new_parent() {
        let store = store_with_root_folder();
        store
            .create_bookmark(
                &ns(),
                &id("b1"),
                "B1",
                "https://example.com",
                false,
                None,
                None,
                &OrderPosition::Tail,
            )
            .unwrap();

        let moved = store
            .move_node(&ns(), &id("b1"), Some(&id("root")), &OrderPosition::Head)
            .unwrap();
        assert_eq!(moved.parent_id, Some(id("root")));
        assert_eq!(store.children(&ns(), Some(&id("root"))).len(), 1);
    }

    #[test]
    fn move_creating_cycle_fails_and_leaves_tree_unchanged() {
        let store = TreeStore::new();
        store
            .create_folder(&ns(), &id("outer"), "Outer", None, &OrderPosition::Tail)
            .unwrap();
        store
            .create_folder(
                &ns(),
                &id("inner"),
                "Inner",
                Some(&id("outer")),
                &OrderPosition::Tail,
            )
            .unwrap();

        let before = store.get(&ns(), &id("outer")).unwrap();
        let err = store
            .move_node(
                &ns(),
                &id("outer"),
                Some(&id("inner")),
                &OrderPosition::Tail,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Cycle { .. }));

        // Self-parenting is a cycle too.
        let err = store
            .move_node(
                &ns(),
                &id("outer"),
                Some(&id("outer")),
                &OrderPosition::Tail,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Cycle { .. }));

        let after = store.get(&ns(), &id("outer")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn move_missing_anchor_fails() {
        let store = store_with_root_folder();
        let err = store
            .move_node(&ns(), &id("root"), None, &OrderPosition::Before(id("ghost")))
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(id("ghost")));
    }

    #[test]
    fn delete_cascades_to_descendants() {
        let store = store_with_root_folder();
        store
            .create_folder(
                &ns(),
                &id("sub"),
                "Sub",
                Some(&id("root")),
                &OrderPosition::Tail,
            )
            .unwrap();
        store
            .create_bookmark(
                &ns(),
                &id("b1"),
                "B1",
                "https://example.com",
                false,
                None,
                Some(&id("sub")),
                &OrderPosition::Tail,
            )
            .unwrap();

        let removed = store.delete(&ns(), &id("root")).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(removed[0], id("root"));
        assert_eq!(store.node_count(&ns()), 0);
        assert!(store.snapshot(&ns()).is_empty());
    }

    #[test]
    fn delete_is_idempotent() {
        let store = store_with_root_folder();
        assert_eq!(store.delete(&ns(), &id("root")).unwrap().len(), 1);
        assert_eq!(store.delete(&ns(), &id("root")).unwrap().len(), 0);
        assert_eq!(store.delete(&ns(), &id("never")).unwrap().len(), 0);
    }

    #[test]
    fn snapshot_lists_parents_before_children() {
        let store = store_with_root_folder();
        store
            .create_folder(
                &ns(),
                &id("sub"),
                "Sub",
                Some(&id("root")),
                &OrderPosition::Tail,
            )
            .unwrap();
        store
            .create_bookmark(
                &ns(),
                &id("b1"),
                "B1",
                "https://example.com",
                true,
                Some("icon.png"),
                Some(&id("sub")),
                &OrderPosition::Tail,
            )
            .unwrap();

        let ids: Vec<_> = store
            .snapshot(&ns())
            .into_iter()
            .map(|s| s.node.id)
            .collect();
        assert_eq!(ids, vec![id("root"), id("sub"), id("b1")]);
    }

    #[test]
    fn namespaces_are_isolated() {
        let store = TreeStore::new();
        let other = Namespace::from("ns2");
        store
            .create_folder(&ns(), &id("f1"), "F1", None, &OrderPosition::Tail)
            .unwrap();

        assert!(store.contains(&ns(), &id("f1")));
        assert!(!store.contains(&other, &id("f1")));
        assert!(store.snapshot(&other).is_empty());
    }
}
