// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sibling iteration.

use super::id::NodeId;
use super::tree::SceneTree;

/// An iterator over the direct children of a node, in paint order.
///
/// Created by [`SceneTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a SceneTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a SceneTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.tree.id_at(self.current)?;
        self.current = self.tree.next_sibling[id.idx as usize];
        Some(id)
    }
}
