// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds-animation pairing between generations.

use crate::id::NodeId;
use crate::scope::{NodePredicate, ScopeRoot};
use crate::state::{State, same_state};
use crate::tree::Tree;

/// A node whose state changed between two generations and whose kind asked
/// for bounds animations.
#[derive(Clone, Debug)]
pub struct BoundsAnimation {
    /// The animated node.
    pub id: NodeId,
    /// State in the previous generation.
    pub from: Option<State>,
    /// State in the new generation.
    pub to: Option<State>,
}

/// Pairs every node of `next` that matched the bounds-animation predicate
/// with its counterpart in `previous`.
///
/// A node is emitted only if it and every one of its ancestors exist in both
/// generations with the same kind, and its state is a different allocation.
/// Newly created and removed nodes, and nodes below a replaced ancestor, are
/// never paired. Output is in id order.
#[must_use]
pub fn diff(previous: Option<&ScopeRoot>, next: &ScopeRoot) -> Vec<BoundsAnimation> {
    let Some(previous) = previous else {
        return Vec::new();
    };
    next.nodes_matching(NodePredicate::BoundsAnimation)
        .filter_map(|id| {
            let new = next.tree().get(id)?;
            let old = previous.tree().get(id)?;
            if !same_lineage(previous.tree(), next.tree(), id)
                || same_state(old.state(), new.state())
            {
                return None;
            }
            Some(BoundsAnimation {
                id,
                from: old.state().cloned(),
                to: new.state().cloned(),
            })
        })
        .collect()
}

/// Whether `id` and all of its ancestors in `next` have a node of the same
/// kind in `previous`.
fn same_lineage(previous: &Tree, next: &Tree, id: NodeId) -> bool {
    let mut cursor = Some(id);
    while let Some(id) = cursor {
        let (Some(old), Some(new)) = (previous.get(id), next.get(id)) else {
            return false;
        };
        if old.kind() != new.kind() {
            return false;
        }
        cursor = new.parent();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::id::Key;
    use crate::state::state;
    use crate::tree::{NodeFlags, TreeNode};

    const ANIMATED: NodeFlags = NodeFlags {
        wants_bounds_animation: true,
        wants_layout_prepared: false,
    };

    fn single(kind: &'static str, id: NodeId, st: Option<State>, flags: NodeFlags) -> Tree {
        let mut tree = Tree::new();
        tree.insert(TreeNode {
            id,
            parent: None,
            component: Component::leaf(kind),
            children: vec![],
            state: st,
            flags,
        });
        tree
    }

    #[test]
    fn changed_state_is_paired() {
        let id = NodeId::keyed(None, &Key::from("box"));
        let old = state(1_u32);
        let new = state(2_u32);
        let prev = ScopeRoot::seal(single("Box", id, Some(old.clone()), ANIMATED), 1);
        let next = ScopeRoot::seal(single("Box", id, Some(new.clone()), ANIMATED), 2);
        let anims = diff(Some(&prev), &next);
        assert_eq!(anims.len(), 1);
        assert_eq!(anims[0].id, id);
        assert!(same_state(anims[0].from.as_ref(), Some(&old)));
        assert!(same_state(anims[0].to.as_ref(), Some(&new)));
    }

    #[test]
    fn unchanged_state_is_not_paired() {
        let id = NodeId::keyed(None, &Key::from("box"));
        let shared = state(1_u32);
        let prev = ScopeRoot::seal(single("Box", id, Some(shared.clone()), ANIMATED), 1);
        let next = ScopeRoot::seal(single("Box", id, Some(shared), ANIMATED), 2);
        assert!(diff(Some(&prev), &next).is_empty());
    }

    #[test]
    fn kind_change_and_predicate_gate_pairing() {
        let id = NodeId::keyed(None, &Key::from("box"));
        let prev = ScopeRoot::seal(single("Box", id, Some(state(1_u32)), ANIMATED), 1);
        let replaced = ScopeRoot::seal(single("Image", id, Some(state(2_u32)), ANIMATED), 2);
        assert!(diff(Some(&prev), &replaced).is_empty());

        let unflagged =
            ScopeRoot::seal(single("Box", id, Some(state(3_u32)), NodeFlags::default()), 2);
        assert!(diff(Some(&prev), &unflagged).is_empty());
        assert!(diff(None, &prev).is_empty());
    }

    fn nested(parent_kind: &'static str, child: NodeId, st: State) -> Tree {
        let parent = NodeId::keyed(None, &Key::from("x"));
        let mut tree = Tree::new();
        tree.insert(TreeNode {
            id: child,
            parent: Some(parent),
            component: Component::leaf("Box"),
            children: vec![],
            state: Some(st),
            flags: ANIMATED,
        });
        tree.insert(TreeNode {
            id: parent,
            parent: None,
            component: Component::leaf(parent_kind),
            children: vec![child],
            state: None,
            flags: NodeFlags::default(),
        });
        tree
    }

    #[test]
    fn replaced_ancestor_blocks_pairing() {
        let parent = NodeId::keyed(None, &Key::from("x"));
        let child = NodeId::keyed(Some(parent), &Key::from("c"));
        let prev = ScopeRoot::seal(nested("Gauge", child, state(1_u32)), 1);
        let kept = ScopeRoot::seal(nested("Gauge", child, state(2_u32)), 2);
        assert_eq!(diff(Some(&prev), &kept).len(), 1);
        let replaced = ScopeRoot::seal(nested("Meter", child, state(2_u32)), 2);
        assert!(diff(Some(&prev), &replaced).is_empty());
    }
}
