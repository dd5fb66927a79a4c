// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The in-progress build.
//!
//! A [`BuildContext`] owns everything one build mutates: the frame stack, the
//! tree under construction, the dirty-id set and the allocation counters. It
//! borrows the previous [`ScopeRoot`] and the [`StateUpdateMap`] read-only,
//! so any number of builds on different threads can share the same previous
//! generation.
//!
//! # Lifecycle
//!
//! ```text
//! enter() ──► Entered ──build_root()──► Walking ──exit()──► ScopeRoot (sealed)
//! ```
//!
//! While a context is alive it is registered as [`current`] for its thread.
//! Dropping it (including during unwinding) restores the previously current
//! build, so nested builds form a strict stack.
//!
//! # Frames
//!
//! Each component being built pushes a frame. Frames carry the inherited
//! flags that gate reuse of descendants: whether any ancestor has a pending
//! state update and whether any ancestor provides a mutable environment
//! value. Frames pushed by the reconciler are popped by a scope guard, so an
//! early `?` return or a panic in a render callback never leaves the stack
//! unbalanced.

mod reconcile;
mod render;

pub use render::RenderContext;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use scopeguard::ScopeGuard;
use tracing::trace;

use crate::component::{Component, Env, EnvMode};
use crate::config::{BuildOptions, BuildTrigger, Predicates};
use crate::current::{self, ActiveBuild, Registration};
use crate::dirty::DirtyIdSet;
use crate::error::BuildError;
use crate::id::{Key, NodeId};
use crate::listener::Listener;
use crate::scope::ScopeRoot;
use crate::state::StateUpdateMap;
use crate::tree::Tree;

static NEXT_BUILD_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_build_id() -> u64 {
    NEXT_BUILD_ID.fetch_add(1, Ordering::Relaxed)
}

/// Where a build is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuildPhase {
    /// Entered, nothing built yet.
    Entered,
    /// The component tree is being walked.
    Walking,
}

/// Counters accumulated by one build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Nodes constructed in this build.
    pub created: usize,
    /// Nodes carried over unchanged from the previous generation.
    pub reused: usize,
    /// Render callbacks invoked.
    pub rendered: usize,
    /// Size of the dirty-id set.
    pub dirty: usize,
    /// Ids of created nodes in construction order, collected only with
    /// [`BuildOptions::collect_creation_info`].
    pub created_ids: Vec<NodeId>,
}

/// One entry of the frame stack.
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    pub(crate) id: NodeId,
    pub(crate) is_render: bool,
    /// This frame or an ancestor has a pending state update.
    pub(crate) ancestor_has_state_update: bool,
    /// This frame or an ancestor provides a mutable environment value.
    pub(crate) reuse_blocked: bool,
    /// This frame or an ancestor has no counterpart in the previous
    /// generation, so nothing below it may match an old node.
    pub(crate) fresh: bool,
    pub(crate) env: Option<Env>,
    /// Explicit keys declared by children so far.
    keys: BTreeSet<Key>,
    /// Next implicit occurrence index per unkeyed child kind.
    implicit: BTreeMap<&'static str, u32>,
}

/// State of one build in progress on the calling thread.
pub struct BuildContext<'a> {
    build_id: u64,
    generation: u64,
    previous: Option<&'a ScopeRoot>,
    updates: &'a StateUpdateMap,
    trigger: BuildTrigger,
    options: BuildOptions,
    predicates: &'a Predicates,
    listener: Listener<'a>,
    dirty: DirtyIdSet,
    frames: Vec<Frame>,
    /// Keys declared at the top level, outside any frame.
    root_keys: BTreeSet<Key>,
    root_implicit: BTreeMap<&'static str, u32>,
    tree: Tree,
    phase: BuildPhase,
    stats: BuildStats,
    _registration: Registration,
    // Registered in a thread-local; must not move to another thread.
    _not_send: PhantomData<*const ()>,
}

impl fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("build_id", &self.build_id)
            .field("generation", &self.generation)
            .field("trigger", &self.trigger)
            .field("phase", &self.phase)
            .field("depth", &self.frames.len())
            .field("nodes", &self.tree.len())
            .finish_non_exhaustive()
    }
}

impl<'a> BuildContext<'a> {
    /// Starts a build and makes it current for the calling thread.
    ///
    /// The new generation is `previous.generation() + 1`, or 1 without a
    /// previous root. Entering while another build is current is misuse
    /// unless [`BuildOptions::allow_nested_builds`] is set.
    pub fn enter(
        previous: Option<&'a ScopeRoot>,
        updates: &'a StateUpdateMap,
        trigger: BuildTrigger,
        options: BuildOptions,
    ) -> Result<Self, BuildError> {
        Self::enter_with(
            next_build_id(),
            previous,
            updates,
            trigger,
            options,
            &Predicates::NONE,
            Listener::none(),
        )
    }

    pub(crate) fn enter_with(
        build_id: u64,
        previous: Option<&'a ScopeRoot>,
        updates: &'a StateUpdateMap,
        trigger: BuildTrigger,
        options: BuildOptions,
        predicates: &'a Predicates,
        listener: Listener<'a>,
    ) -> Result<Self, BuildError> {
        if !options.allow_nested_builds
            && let Some(active) = current::current()
        {
            options.misuse.handle(BuildError::NestedBuild {
                active: active.build_id,
            })?;
        }
        let generation = previous.map_or(1, |p| p.generation() + 1);
        let dirty = DirtyIdSet::compute(previous, updates);
        let stats = BuildStats {
            dirty: dirty.len(),
            ..BuildStats::default()
        };
        Ok(Self {
            build_id,
            generation,
            previous,
            updates,
            trigger,
            options,
            predicates,
            listener,
            dirty,
            frames: Vec::new(),
            root_keys: BTreeSet::new(),
            root_implicit: BTreeMap::new(),
            tree: Tree::new(),
            phase: BuildPhase::Entered,
            stats,
            _registration: Registration::push(build_id, generation, trigger),
            _not_send: PhantomData,
        })
    }

    /// Returns the build that is current on the calling thread, if any.
    #[must_use]
    pub fn current() -> Option<ActiveBuild> {
        current::current()
    }

    /// Process-unique id of this build.
    #[must_use]
    pub fn build_id(&self) -> u64 {
        self.build_id
    }

    /// Generation this build produces.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Why the build was requested.
    #[must_use]
    pub fn trigger(&self) -> BuildTrigger {
        self.trigger
    }

    /// Options in effect.
    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// The generation this build reconciles against.
    #[must_use]
    pub fn previous(&self) -> Option<&'a ScopeRoot> {
        self.previous
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Ids that must be rebuilt because of pending state updates.
    #[must_use]
    pub fn dirty(&self) -> &DirtyIdSet {
        &self.dirty
    }

    /// Number of open frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Id of the innermost open frame.
    #[must_use]
    pub fn top_frame(&self) -> Option<NodeId> {
        self.frames.last().map(|frame| frame.id)
    }

    /// Whether the innermost open frame, or any frame below it, has a pending
    /// state update.
    #[must_use]
    pub fn ancestor_has_state_update(&self) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.ancestor_has_state_update)
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Pushes a frame for `id`.
    ///
    /// The frame inherits the parent frame's flags and adds its own pending
    /// update status.
    pub fn push_frame(&mut self, id: NodeId, is_render: bool) {
        let fresh = self.previous.is_none_or(|root| !root.tree().contains(id));
        self.push(id, is_render, None, fresh);
    }

    /// Pops the innermost frame, which must be `expected`.
    ///
    /// Popping any other id is misuse. When the policy recovers, the stack is
    /// unwound down to and including `expected` if it is open at all.
    pub fn pop_frame(&mut self, expected: NodeId) -> Result<(), BuildError> {
        let found = self.top_frame();
        if found == Some(expected) {
            self.frames.pop();
            return Ok(());
        }
        self.options
            .misuse
            .handle(BuildError::FrameMismatch { expected, found })?;
        self.unwind_frame(expected);
        Ok(())
    }

    /// Reconciles `root` against the previous generation, building the new
    /// tree. Any tree built by an earlier call is discarded.
    pub fn build_root(&mut self, root: &Component) -> Result<NodeId, BuildError> {
        self.phase = BuildPhase::Walking;
        self.tree = Tree::new();
        self.stats = BuildStats {
            dirty: self.dirty.len(),
            ..BuildStats::default()
        };
        self.root_keys.clear();
        self.root_implicit.clear();
        let id = self.reconcile(root)?;
        // The top level has no siblings, so a root is never skipped.
        Ok(id.unwrap_or_else(|| NodeId::implicit(None, root.kind(), 0)))
    }

    /// Finishes the build: checks frame balance, restores the previously
    /// current build and seals the new generation.
    pub fn exit(self) -> Result<ScopeRoot, BuildError> {
        self.finish().map(|(root, _)| root)
    }

    pub(crate) fn finish(mut self) -> Result<(ScopeRoot, BuildStats), BuildError> {
        if !self.frames.is_empty() {
            self.options.misuse.handle(BuildError::UnbalancedFrames {
                open: self.frames.len(),
            })?;
            self.frames.clear();
        }
        let Self {
            tree,
            generation,
            stats,
            ..
        } = self;
        trace!(generation, nodes = tree.len(), "sealing scope root");
        Ok((ScopeRoot::seal(tree, generation), stats))
    }

    fn push(&mut self, id: NodeId, is_render: bool, env: Option<Env>, fresh: bool) {
        let (inherited_update, inherited_block, inherited_fresh) =
            self.frames.last().map_or((false, false, false), |f| {
                (f.ancestor_has_state_update, f.reuse_blocked, f.fresh)
            });
        let mutable_env = env.as_ref().is_some_and(|e| e.mode() == EnvMode::Mutable);
        self.frames.push(Frame {
            id,
            is_render,
            ancestor_has_state_update: inherited_update || self.updates.contains(id),
            reuse_blocked: inherited_block || mutable_env,
            fresh: inherited_fresh || fresh,
            env,
            keys: BTreeSet::new(),
            implicit: BTreeMap::new(),
        });
    }

    /// Pops `id` and anything above it.
    fn unwind_frame(&mut self, id: NodeId) {
        if let Some(pos) = self.frames.iter().rposition(|frame| frame.id == id) {
            self.frames.truncate(pos);
        }
    }

    /// Pushes a frame that is popped when the returned guard drops.
    fn frame<'g>(
        &'g mut self,
        id: NodeId,
        is_render: bool,
        env: Option<Env>,
        fresh: bool,
    ) -> ScopeGuard<&'g mut Self, impl FnOnce(&'g mut Self)> {
        self.push(id, is_render, env, fresh);
        scopeguard::guard(self, move |ctx| ctx.unwind_frame(id))
    }

    /// Claims the next identity segment under the innermost frame.
    ///
    /// Returns `None` if `key` is already taken by a sibling.
    fn claim_segment(&mut self, component: &Component) -> Option<NodeId> {
        let parent = self.top_frame();
        let (keys, implicit) = match self.frames.last_mut() {
            Some(frame) => (&mut frame.keys, &mut frame.implicit),
            None => (&mut self.root_keys, &mut self.root_implicit),
        };
        match component.key() {
            Some(key) => keys
                .insert(key.clone())
                .then(|| NodeId::keyed(parent, key)),
            None => {
                let next = implicit.entry(component.kind()).or_insert(0);
                let occurrence = *next;
                *next += 1;
                Some(NodeId::implicit(parent, component.kind(), occurrence))
            }
        }
    }
}
