// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-first reconciliation of a component description against the
//! previous generation.

use tracing::trace;

use super::{BuildContext, RenderContext};
use crate::component::{Body, Component, EnvMode};
use crate::error::BuildError;
use crate::id::NodeId;
use crate::listener::{RenderEvent, ReuseEvent};
use crate::tree::TreeNode;

impl BuildContext<'_> {
    /// Reconciles one component under the innermost frame.
    ///
    /// Returns the node's id, or `None` if the component was skipped because
    /// its key collided with a sibling's and the misuse policy recovered.
    pub(super) fn reconcile(
        &mut self,
        component: &Component,
    ) -> Result<Option<NodeId>, BuildError> {
        let parent = self.top_frame();
        let Some(id) = self.claim_segment(component) else {
            let key = component.key().cloned();
            if let Some(key) = key {
                self.options
                    .misuse
                    .handle(BuildError::KeyCollision { parent, key })?;
            }
            return Ok(None);
        };

        // A node of a different kind at the same position is a replacement,
        // and nothing below a replacement may match the old subtree.
        let parent_fresh = self.frames.last().is_some_and(|frame| frame.fresh);
        let previous = self
            .previous
            .filter(|_| !parent_fresh)
            .and_then(|root| root.tree().get(id))
            .filter(|node| node.kind() == component.kind());
        let fresh = previous.is_none();

        if let Some(prev) = previous
            && self.can_reuse(id, prev, component)
        {
            self.reuse(id);
            return Ok(Some(id));
        }

        let state = self.updates.apply(
            id,
            previous
                .and_then(TreeNode::state)
                .or_else(|| component.initial_state())
                .cloned(),
        );
        let flags = self.predicates.evaluate(component);
        self.stats.created += 1;
        if self.options.collect_creation_info {
            self.stats.created_ids.push(id);
        }

        let children = match component.body() {
            Body::Leaf => Vec::new(),
            Body::Render(render) => {
                let mut ctx = self.frame(id, true, component.env().cloned(), fresh);
                let child = {
                    let frames = &ctx.frames;
                    let rc = RenderContext {
                        id,
                        state: state.as_ref(),
                        ancestors: &frames[..frames.len() - 1],
                        dirty: &ctx.dirty,
                        build_id: ctx.build_id,
                        generation: ctx.generation,
                        trigger: ctx.trigger,
                    };
                    render(&rc).map_err(|source| BuildError::Render { id, source })?
                };
                ctx.stats.rendered += 1;
                ctx.listener.render(&RenderEvent {
                    build_id: ctx.build_id,
                    id,
                    had_previous: previous.is_some(),
                    state_updated: ctx.updates.contains(id),
                });
                match child {
                    Some(child) => ctx.reconcile(&child)?.into_iter().collect(),
                    None => Vec::new(),
                }
            }
            Body::Children(list) => {
                let mut ctx = self.frame(id, false, component.env().cloned(), fresh);
                let mut children = Vec::with_capacity(list.len());
                for child in list.iter() {
                    if let Some(child) = ctx.reconcile(child)? {
                        children.push(child);
                    }
                }
                children
            }
        };

        trace!(id = ?id, kind = component.kind(), children = children.len(), "built node");
        self.tree.insert(TreeNode {
            id,
            parent,
            component: component.clone(),
            children,
            state,
            flags,
        });
        Ok(Some(id))
    }

    fn can_reuse(&self, id: NodeId, previous: &TreeNode, component: &Component) -> bool {
        if self.options.forces_rebuild(self.trigger) || self.dirty.contains(id) {
            return false;
        }
        // Reusing the provider would carry its descendants over as well.
        if component.env().is_some_and(|env| env.mode() == EnvMode::Mutable) {
            return false;
        }
        let inherited = self
            .frames
            .last()
            .is_some_and(|frame| frame.ancestor_has_state_update || frame.reuse_blocked);
        !inherited && previous.component().same_inputs(component)
    }

    /// Copies the previous subtree rooted at `id` into the new tree.
    fn reuse(&mut self, id: NodeId) {
        let Some(previous) = self.previous else {
            return;
        };
        let mut copied = 0;
        for node in previous.tree().walk(id) {
            self.tree.insert(node.clone());
            copied += 1;
        }
        self.stats.reused += copied;
        trace!(id = ?id, nodes = copied, "reused subtree");
        self.listener.reuse(&ReuseEvent {
            build_id: self.build_id,
            id,
            subtree_len: copied,
        });
    }
}
