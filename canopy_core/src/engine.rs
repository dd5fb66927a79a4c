// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build entry points.
//!
//! [`Engine`] holds the configuration shared by every build: default
//! options, registered predicates and the listener. It is `Send + Sync`;
//! any number of threads may build through the same engine at once, each
//! against its own (or a shared) previous [`ScopeRoot`].
//!
//! A build runs to completion on the calling thread:
//!
//! 1. enter a [`BuildContext`] (computing the dirty-id set),
//! 2. call the component factory once,
//! 3. reconcile the returned root against the previous generation,
//! 4. seal the new [`ScopeRoot`],
//! 5. pair bounds animations between the two generations.
//!
//! Any failure tears the context down before the error is returned, so the
//! thread's current build is always restored.

use std::sync::Arc;

use tracing::{debug, debug_span};

use crate::animation::{self, BoundsAnimation};
use crate::component::{BoxError, Component};
use crate::config::{BuildOptions, BuildTrigger, EngineConfig};
use crate::context::{BuildContext, BuildStats, next_build_id};
use crate::error::BuildError;
use crate::id::NodeId;
use crate::layout::{Layout, SizeRange};
use crate::listener::{
    BuildFailEvent, BuildFinishEvent, BuildStartEvent, LayoutPreparedEvent, Listener,
};
use crate::scope::ScopeRoot;
use crate::state::StateUpdateMap;
use crate::tree::Tree;

/// Output of a successful build.
#[derive(Clone, Debug)]
pub struct BuildResult {
    /// Process-unique id of the build.
    pub build_id: u64,
    /// The sealed new generation.
    pub scope_root: Arc<ScopeRoot>,
    /// Identity of the root node.
    pub root: NodeId,
    /// Nodes whose bounds should animate from the previous generation.
    pub bounds_animations: Vec<BoundsAnimation>,
    /// Counters for the build.
    pub stats: BuildStats,
}

/// Output of [`Engine::build_and_layout`].
#[derive(Clone, Debug)]
pub struct BuildAndLayoutResult {
    /// The build.
    pub build: BuildResult,
    /// Layout computed on the new tree.
    pub layout: Layout,
    /// Nodes notified through
    /// [`BuildListener::on_layout_prepared`](crate::listener::BuildListener::on_layout_prepared),
    /// in layout pre-order.
    pub prepared: Vec<NodeId>,
}

/// Runs builds with a fixed configuration.
#[derive(Clone, Debug, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Creates an engine.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds a new generation with the engine's default options.
    ///
    /// `previous` is `None` for the first build. `factory` is called exactly
    /// once, after the build became current on this thread.
    pub fn build<F, E>(
        &self,
        previous: Option<&ScopeRoot>,
        updates: &StateUpdateMap,
        trigger: BuildTrigger,
        factory: F,
    ) -> Result<BuildResult, BuildError>
    where
        F: FnOnce() -> Result<Component, E>,
        E: Into<BoxError>,
    {
        self.build_with_options(previous, updates, trigger, self.config.options, factory)
    }

    /// Builds a new generation with explicit options.
    pub fn build_with_options<F, E>(
        &self,
        previous: Option<&ScopeRoot>,
        updates: &StateUpdateMap,
        trigger: BuildTrigger,
        options: BuildOptions,
        factory: F,
    ) -> Result<BuildResult, BuildError>
    where
        F: FnOnce() -> Result<Component, E>,
        E: Into<BoxError>,
    {
        let build_id = next_build_id();
        let generation = previous.map_or(1, |p| p.generation() + 1);
        let listener = self.listener();
        let _span = debug_span!("build", build_id, generation).entered();

        listener.build_will_start(&BuildStartEvent {
            build_id,
            generation,
            trigger,
            pending_updates: updates.len(),
        });
        debug!(?trigger, pending = updates.len(), "build started");

        let result = self.run(build_id, previous, updates, trigger, options, factory);
        match &result {
            Ok(done) => {
                listener.build_did_finish(&BuildFinishEvent {
                    build_id,
                    generation,
                    created: done.stats.created,
                    reused: done.stats.reused,
                    rendered: done.stats.rendered,
                    dirty: done.stats.dirty,
                    animations: done.bounds_animations.len(),
                });
                debug!(
                    created = done.stats.created,
                    reused = done.stats.reused,
                    rendered = done.stats.rendered,
                    "build finished"
                );
            }
            Err(err) => {
                listener.build_failed(&BuildFailEvent {
                    build_id,
                    generation,
                    misuse: err.is_misuse(),
                });
                debug!(error = %err, "build failed");
            }
        }
        result
    }

    /// Builds a new generation, then lays it out.
    ///
    /// `layout_fn` is called once with the new tree, its root and `range`.
    /// Afterwards every node in the returned layout whose kind matched the
    /// layout-prepared predicate is reported to the listener.
    pub fn build_and_layout<F, E, L>(
        &self,
        previous: Option<&ScopeRoot>,
        updates: &StateUpdateMap,
        trigger: BuildTrigger,
        range: SizeRange,
        factory: F,
        layout_fn: L,
    ) -> Result<BuildAndLayoutResult, BuildError>
    where
        F: FnOnce() -> Result<Component, E>,
        E: Into<BoxError>,
        L: FnOnce(&Tree, NodeId, SizeRange) -> Layout,
    {
        let build = self.build(previous, updates, trigger, factory)?;
        let _span = debug_span!("layout", build_id = build.build_id).entered();
        let tree = build.scope_root.tree();
        let layout = layout_fn(tree, build.root, range);

        let listener = self.listener();
        let prepared: Vec<_> = layout
            .ids()
            .filter(|id| {
                tree.get(*id)
                    .is_some_and(|node| node.flags().wants_layout_prepared)
            })
            .collect();
        for id in &prepared {
            listener.layout_prepared(&LayoutPreparedEvent {
                build_id: build.build_id,
                id: *id,
            });
        }
        debug!(prepared = prepared.len(), "layout prepared");
        Ok(BuildAndLayoutResult {
            build,
            layout,
            prepared,
        })
    }

    fn listener(&self) -> Listener<'_> {
        self.config
            .listener
            .as_deref()
            .map_or_else(Listener::none, Listener::new)
    }

    fn run<F, E>(
        &self,
        build_id: u64,
        previous: Option<&ScopeRoot>,
        updates: &StateUpdateMap,
        trigger: BuildTrigger,
        options: BuildOptions,
        factory: F,
    ) -> Result<BuildResult, BuildError>
    where
        F: FnOnce() -> Result<Component, E>,
        E: Into<BoxError>,
    {
        let mut ctx = BuildContext::enter_with(
            build_id,
            previous,
            updates,
            trigger,
            options,
            &self.config.predicates,
            self.listener(),
        )?;
        let component = factory().map_err(|err| BuildError::Factory(err.into()))?;
        let root = ctx.build_root(&component)?;
        let (scope_root, stats) = ctx.finish()?;
        let bounds_animations = animation::diff(previous, &scope_root);
        Ok(BuildResult {
            build_id,
            scope_root: Arc::new(scope_root),
            root,
            bounds_animations,
            stats,
        })
    }
}
