// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::any::Any;
use std::fmt;

use super::Frame;
use crate::config::BuildTrigger;
use crate::dirty::DirtyIdSet;
use crate::id::NodeId;
use crate::state::State;

/// Read-only view handed to a render callback.
///
/// Everything a render may depend on is reachable from here: the node's
/// resolved state, environment values provided by ancestors, and a few
/// facts about the build for diagnostics.
pub struct RenderContext<'c> {
    pub(super) id: NodeId,
    pub(super) state: Option<&'c State>,
    /// Frames of the node's ancestors, outermost first.
    pub(super) ancestors: &'c [Frame],
    pub(super) dirty: &'c DirtyIdSet,
    pub(super) build_id: u64,
    pub(super) generation: u64,
    pub(super) trigger: BuildTrigger,
}

impl fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("id", &self.id)
            .field("has_state", &self.state.is_some())
            .field("depth", &self.ancestors.len())
            .field("build_id", &self.build_id)
            .field("generation", &self.generation)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

impl<'c> RenderContext<'c> {
    /// Identity of the node being rendered.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Resolved state: the previous state (or the initial state on first
    /// construction) with all pending updates applied.
    #[must_use]
    pub fn state(&self) -> Option<&'c State> {
        self.state
    }

    /// Resolved state downcast to `T`.
    #[must_use]
    pub fn state_as<T: Any>(&self) -> Option<&'c T> {
        self.state.and_then(|state| state.downcast_ref::<T>())
    }

    /// The innermost environment value of type `T` provided by an ancestor.
    #[must_use]
    pub fn env<T: Any>(&self) -> Option<&'c T> {
        self.ancestors
            .iter()
            .rev()
            .filter_map(|frame| frame.env.as_ref())
            .find_map(|env| env.get::<T>())
    }

    /// Ancestor ids, outermost first.
    pub fn ancestors(&self) -> impl DoubleEndedIterator<Item = NodeId> + 'c {
        self.ancestors.iter().map(|frame| frame.id)
    }

    /// The nearest ancestor that is itself a render component, if any.
    #[must_use]
    pub fn owner(&self) -> Option<NodeId> {
        self.ancestors
            .iter()
            .rev()
            .find(|frame| frame.is_render)
            .map(|frame| frame.id)
    }

    /// Whether this node is on a path from a state update to the root.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.contains(self.id)
    }

    /// Whether any ancestor has a pending state update.
    #[must_use]
    pub fn ancestor_has_state_update(&self) -> bool {
        self.ancestors
            .last()
            .is_some_and(|frame| frame.ancestor_has_state_update)
    }

    /// Process-unique id of the build.
    #[must_use]
    pub fn build_id(&self) -> u64 {
        self.build_id
    }

    /// Generation being built.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Why the build was requested.
    #[must_use]
    pub fn trigger(&self) -> BuildTrigger {
        self.trigger
    }
}
