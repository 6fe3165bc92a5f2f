// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation and topology management.

use alloc::vec::Vec;

use super::id::{INVALID, NodeId};
use super::node::NodeKind;
use super::traverse::Children;

/// Struct-of-arrays storage for one window's scene.
///
/// Nodes are addressed by [`NodeId`] handles. Destroyed nodes are recycled
/// via a free list, and generation counters prevent stale handle access.
/// Traversal starts at [`root`](Self::root); nodes not reachable from it are
/// stored but never drawn.
#[derive(Debug)]
pub struct SceneTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Payload --
    pub(crate) kind: Vec<NodeKind>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    pub(crate) root: u32,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    /// Creates an empty tree with no root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            root: INVALID,
        }
    }

    /// Creates a tree whose root is a fresh [`NodeKind::Root`] node.
    #[must_use]
    pub fn with_root() -> (Self, NodeId) {
        let mut tree = Self::new();
        let root = tree.create_node(NodeKind::Root);
        tree.set_root(Some(root));
        (tree, root)
    }

    // -- Allocation API --

    /// Creates a detached node of the given kind and returns its handle.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generation[idx as usize] += 1;
            self.parent[idx as usize] = INVALID;
            self.first_child[idx as usize] = INVALID;
            self.next_sibling[idx as usize] = INVALID;
            self.prev_sibling[idx as usize] = INVALID;
            self.kind[idx as usize] = kind;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.kind.push(kind);
            self.generation.push(0);
            idx
        };

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// If the node is the root, the tree is left without a root.
    ///
    /// # Panics
    ///
    /// Panics if the node has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy node with children"
        );

        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        }
        if self.root == idx {
            self.root = INVALID;
        }

        self.generation[idx as usize] += 1;
        self.kind[idx as usize] = NodeKind::Root;
        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Returns `true` if the tree holds no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- Root --

    /// Sets (or clears) the node traversal starts from.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = match root {
            Some(id) => {
                self.validate(id);
                id.idx
            }
            None => INVALID,
        };
    }

    /// Returns the traversal root, if one is set.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.id_at(self.root)
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, or
    /// if `child` is `parent` or one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(!self.is_ancestor_or_self(c, p), "link would create a cycle");

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, `sibling`
    /// has no parent, or `child` is an ancestor of `sibling`.
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");
        assert!(!self.is_ancestor_or_self(c, p), "link would create a cycle");

        let prev = self.prev_sibling[s as usize];
        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = prev;
        self.prev_sibling[s as usize] = c;
        if prev == INVALID {
            self.first_child[p as usize] = c;
        } else {
            self.next_sibling[prev as usize] = c;
        }
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] != INVALID,
            "node has no parent"
        );
        self.unlink_from_parent(child.idx);
    }

    // -- Property API --

    /// Returns the node's kind and payload.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        self.validate(id);
        &self.kind[id.idx as usize]
    }

    /// Replaces the node's kind and payload.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.validate(id);
        self.kind[id.idx as usize] = kind;
    }

    /// Returns the parent of a node, if attached.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.id_at(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a node, in paint
    /// order.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    // -- Internal helpers --

    pub(crate) fn id_at(&self, idx: u32) -> Option<NodeId> {
        (idx != INVALID).then(|| NodeId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    fn validate(&self, id: NodeId) {
        assert!(id.idx < self.len, "node index out of bounds");
        assert!(
            self.generation[id.idx as usize] == id.generation,
            "stale NodeId: generation mismatch"
        );
    }

    /// Walks up from `node`; the parent chain is acyclic, so this ends.
    fn is_ancestor_or_self(&self, ancestor: u32, mut node: u32) -> bool {
        while node != INVALID {
            if node == ancestor {
                return true;
            }
            node = self.parent[node as usize];
        }
        false
    }

        fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev == INVALID {
            self.first_child[p as usize] = next;
        } else {
            self.next_sibling[prev as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}
