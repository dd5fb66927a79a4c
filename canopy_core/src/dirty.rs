// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-id propagation.
//!
//! A node is *dirty* when it, or any of its descendants in the previous
//! generation, has a pending state update. Dirty nodes are never reused: the
//! path from every updated node up to the root must be rebuilt so the new
//! state reaches the render callback that consumes it.
//!
//! # Propagation
//!
//! For each updated id present in the previous tree, walk parent links up to
//! the root, inserting every id visited. The walk stops at the first id that
//! is already in the set, since everything above it was inserted by an
//! earlier walk. Total work is linear in the number of distinct dirty ids.

use std::collections::BTreeSet;

use tracing::debug;

use crate::id::NodeId;
use crate::scope::ScopeRoot;
use crate::state::StateUpdateMap;

/// The set of ids that must be rebuilt because of pending state updates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtyIdSet {
    ids: BTreeSet<NodeId>,
}

impl DirtyIdSet {
    /// Computes the dirty set for `updates` against `previous`.
    ///
    /// Without a previous root the set is empty: every node is constructed
    /// fresh anyway. Updates for ids the previous generation does not contain
    /// are stale and skipped.
    #[must_use]
    pub fn compute(previous: Option<&ScopeRoot>, updates: &StateUpdateMap) -> Self {
        let mut ids = BTreeSet::new();
        let Some(previous) = previous else {
            return Self { ids };
        };
        let tree = previous.tree();
        for updated in updates.ids() {
            if !tree.contains(updated) {
                debug!(id = ?updated, "skipping state update for unknown node");
                continue;
            }
            let mut cursor = Some(updated);
            while let Some(id) = cursor {
                if !ids.insert(id) {
                    break;
                }
                cursor = tree.parent(id);
            }
        }
        Self { ids }
    }

    /// Returns whether `id` is dirty.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    /// Number of dirty ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if nothing is dirty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates over the dirty ids in id order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::component::Component;
    use crate::id::Key;
    use crate::state::state;
    use crate::tree::{NodeFlags, Tree, TreeNode};

    /// Builds a chain `root -> c1 -> ... -> c{depth}` where every chain node
    /// also has `fanout` leaf siblings.
    fn chain(depth: usize, fanout: usize) -> (ScopeRoot, Vec<NodeId>) {
        let root = NodeId::implicit(None, "Root", 0);
        let mut path = vec![root];
        let mut links: Vec<(NodeId, Option<NodeId>, Vec<NodeId>)> = vec![(root, None, vec![])];
        for level in 0..depth {
            let parent = path[level];
            let next = NodeId::keyed(Some(parent), &Key::from("chain"));
            let mut children = vec![next];
            for i in 0..fanout {
                let leaf = NodeId::keyed(Some(parent), &Key::Int(i as u64));
                children.push(leaf);
                links.push((leaf, Some(parent), vec![]));
            }
            links.push((next, Some(parent), vec![]));
            for link in &mut links {
                if link.0 == parent {
                    link.2 = children.clone();
                }
            }
            path.push(next);
        }
        let mut tree = Tree::new();
        for (id, parent, children) in links {
            tree.insert(TreeNode {
                id,
                parent,
                component: Component::leaf("Node"),
                children,
                state: None,
                flags: NodeFlags::default(),
            });
        }
        (ScopeRoot::seal(tree, 1), path)
    }

    #[test]
    fn no_previous_means_empty() {
        let mut updates = StateUpdateMap::new();
        updates.set(NodeId::implicit(None, "Root", 0), state(1_u8));
        assert!(DirtyIdSet::compute(None, &updates).is_empty());
    }

    #[test]
    fn leaf_update_dirties_path_to_root() {
        let (prev, path) = chain(3, 2);
        let mut updates = StateUpdateMap::new();
        updates.set(path[3], state(1_u8));
        let dirty = DirtyIdSet::compute(Some(&prev), &updates);
        assert_eq!(dirty.len(), 4);
        for id in &path {
            assert!(dirty.contains(*id));
        }
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let (prev, _) = chain(2, 0);
        let mut updates = StateUpdateMap::new();
        updates.set(NodeId::implicit(None, "Ghost", 0), state(1_u8));
        assert!(DirtyIdSet::compute(Some(&prev), &updates).is_empty());
    }

    #[test]
    fn overlapping_paths_merge() {
        let (prev, path) = chain(4, 1);
        let mut updates = StateUpdateMap::new();
        updates.set(path[4], state(1_u8));
        updates.set(path[2], state(2_u8));
        let dirty = DirtyIdSet::compute(Some(&prev), &updates);
        assert_eq!(dirty.len(), 5);
    }

    proptest! {
        #[test]
        fn dirty_set_is_exactly_the_ancestor_path(depth in 1_usize..24, fanout in 0_usize..4) {
            let (prev, path) = chain(depth, fanout);
            let mut updates = StateUpdateMap::new();
            updates.set(path[depth], state(0_u8));
            let dirty = DirtyIdSet::compute(Some(&prev), &updates);
            prop_assert_eq!(dirty.len(), depth + 1);
            let expected: BTreeSet<_> = path.iter().copied().collect();
            let actual: BTreeSet<_> = dirty.iter().collect();
            prop_assert_eq!(actual, expected);
            prop_assert_eq!(prev.tree().len(), 1 + depth * (fanout + 1));
        }
    }
}
