// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sealed per-generation snapshots.

use std::collections::BTreeSet;

use crate::id::{Key, NodeId};
use crate::state::State;
use crate::tree::{NodeFlags, Tree};

/// A structural predicate whose per-node result is cached on the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodePredicate {
    /// Nodes whose kind asked for bounds animations.
    BoundsAnimation,
    /// Nodes that want a callback once layout has been computed.
    LayoutPrepared,
}

/// An immutable snapshot of one generation: every node, its state, and the
/// cached predicate results.
///
/// A `ScopeRoot` only exists in sealed form; the build that produces it owns
/// the mutable tree until [`BuildContext::exit`](crate::BuildContext::exit)
/// seals it. It is `Send + Sync` and is shared as an `Arc` by any number of
/// later builds that read it as their previous generation.
#[derive(Debug)]
pub struct ScopeRoot {
    generation: u64,
    tree: Tree,
    bounds_animated: BTreeSet<NodeId>,
    layout_prepared: BTreeSet<NodeId>,
}

impl ScopeRoot {
    /// Seals a finished tree into a root for `generation`.
    pub(crate) fn seal(tree: Tree, generation: u64) -> Self {
        let mut bounds_animated = BTreeSet::new();
        let mut layout_prepared = BTreeSet::new();
        for node in tree.iter() {
            let NodeFlags {
                wants_bounds_animation,
                wants_layout_prepared,
            } = node.flags;
            if wants_bounds_animation {
                bounds_animated.insert(node.id);
            }
            if wants_layout_prepared {
                layout_prepared.insert(node.id);
            }
        }
        Self {
            generation,
            tree,
            bounds_animated,
            layout_prepared,
        }
    }

    /// Derives the identity of the child keyed by `key` under `parent`.
    ///
    /// Same parent and key always give the same identity, in every
    /// generation.
    #[must_use]
    pub fn next_identity(parent: Option<NodeId>, key: &Key) -> NodeId {
        NodeId::keyed(parent, key)
    }

    /// Returns the generation counter (the first generation is 1).
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the tree built for this generation.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Returns the root identity.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.tree.root()
    }

    /// Returns the state of `id`, or `None` if the node is unknown to this
    /// generation or has no state.
    #[must_use]
    pub fn state_for(&self, id: NodeId) -> Option<&State> {
        self.tree.get(id).and_then(|node| node.state())
    }

    /// Iterates over the nodes that matched `predicate`, in identity order.
    pub fn nodes_matching(&self, predicate: NodePredicate) -> impl Iterator<Item = NodeId> + '_ {
        match predicate {
            NodePredicate::BoundsAnimation => self.bounds_animated.iter(),
            NodePredicate::LayoutPrepared => self.layout_prepared.iter(),
        }
        .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::state::state;
    use crate::tree::TreeNode;

    #[test]
    fn seal_indexes_predicates() {
        let root = NodeId::implicit(None, "Root", 0);
        let child = ScopeRoot::next_identity(Some(root), &Key::from("c"));
        let mut tree = Tree::new();
        tree.insert(TreeNode {
            id: root,
            parent: None,
            component: Component::leaf("Root"),
            children: vec![child],
            state: None,
            flags: NodeFlags {
                wants_bounds_animation: false,
                wants_layout_prepared: true,
            },
        });
        tree.insert(TreeNode {
            id: child,
            parent: Some(root),
            component: Component::leaf("Box"),
            children: vec![],
            state: Some(state(3_i32)),
            flags: NodeFlags {
                wants_bounds_animation: true,
                wants_layout_prepared: true,
            },
        });

        let sealed = ScopeRoot::seal(tree, 4);
        assert_eq!(sealed.generation(), 4);
        assert_eq!(sealed.root(), Some(root));
        let animated: Vec<_> = sealed.nodes_matching(NodePredicate::BoundsAnimation).collect();
        assert_eq!(animated, vec![child]);
        assert_eq!(sealed.nodes_matching(NodePredicate::LayoutPrepared).count(), 2);
        assert_eq!(
            sealed.state_for(child).and_then(|s| s.downcast_ref::<i32>()),
            Some(&3)
        );
        assert!(sealed.state_for(root).is_none());
    }

    #[test]
    fn scope_root_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ScopeRoot>();
    }
}
