// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The constructed component tree.
//!
//! A [`Tree`] is an arena of [`TreeNode`]s keyed by [`NodeId`]. Children are
//! owned by the arena and listed in order on their parent; the parent link
//! on each node is a lookup key only and never affects lifetimes.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::component::Component;
use crate::id::{Key, NodeId};
use crate::state::State;

/// Predicate results cached on a node for the lifetime of its generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodeFlags {
    /// The node's kind asked for bounds animations between generations.
    pub wants_bounds_animation: bool,
    /// The node wants a callback once its layout has been computed.
    pub wants_layout_prepared: bool,
}

/// One node of a constructed tree.
#[derive(Clone, Debug)]
pub struct TreeNode {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) component: Component,
    pub(crate) children: Vec<NodeId>,
    pub(crate) state: Option<State>,
    pub(crate) flags: NodeFlags,
}

impl TreeNode {
    /// Returns the node's identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the parent's identity, or `None` for the root.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the description this node was built from.
    #[must_use]
    pub fn component(&self) -> &Component {
        &self.component
    }

    /// Shorthand for `self.component().kind()`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.component.kind()
    }

    /// Returns the ordered child identities.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the node's state, if it has any.
    #[must_use]
    pub fn state(&self) -> Option<&State> {
        self.state.as_ref()
    }

    /// Returns the cached predicate flags.
    #[must_use]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }
}

/// An arena of tree nodes keyed by identity.
#[derive(Clone, Debug, Default)]
pub struct Tree {
    nodes: BTreeMap<NodeId, TreeNode>,
    root: Option<NodeId>,
}

impl Tree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the root identity, if the tree is non-empty.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the node with identity `id`.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    /// Returns whether a node with identity `id` exists.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Returns the parent of `id`, or `None` for the root or an unknown id.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(TreeNode::parent)
    }

    /// Iterates over the direct children of `id` (empty for unknown ids).
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &TreeNode> + '_ {
        self.nodes
            .get(&id)
            .map(TreeNode::children)
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.nodes.get(child))
    }

    /// Finds the child of `parent` that was declared with `key`.
    #[must_use]
    pub fn child_by_key(&self, parent: NodeId, key: &Key) -> Option<&TreeNode> {
        self.get(NodeId::keyed(Some(parent), key))
            .filter(|node| node.parent == Some(parent))
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all nodes in identity order.
    pub fn iter(&self) -> btree_map::Values<'_, NodeId, TreeNode> {
        self.nodes.values()
    }

    /// Depth-first pre-order walk of the subtree rooted at `id`.
    #[must_use]
    pub fn walk(&self, id: NodeId) -> Walk<'_> {
        let stack = if self.nodes.contains_key(&id) {
            vec![id]
        } else {
            Vec::new()
        };
        Walk { tree: self, stack }
    }

    /// Number of nodes in the subtree rooted at `id`.
    #[must_use]
    pub fn subtree_len(&self, id: NodeId) -> usize {
        self.walk(id).count()
    }

    /// Returns the depth of `id` (root = 0), or `None` for unknown ids.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        let mut node = self.nodes.get(&id)?;
        let mut depth = 0;
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            depth += 1;
        }
        Some(depth)
    }

    pub(crate) fn insert(&mut self, node: TreeNode) {
        debug_assert!(
            !self.nodes.contains_key(&node.id),
            "identity {:?} is already in the tree",
            node.id
        );
        if node.parent.is_none() {
            self.root = Some(node.id);
        }
        self.nodes.insert(node.id, node);
    }
}

/// Pre-order iterator created by [`Tree::walk`].
#[derive(Debug)]
pub struct Walk<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<&'a TreeNode> {
        let id = self.stack.pop()?;
        let node = self.tree.nodes.get(&id)?;
        self.stack.extend(node.children.iter().rev().copied());
        Some(node)
    }
}
