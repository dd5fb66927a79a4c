// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build event listeners.
//!
//! This module provides a [`BuildListener`] trait with one method per build
//! event. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! Listeners are shared between threads (builds on different threads report
//! to the same engine-wide listener), so every method takes `&self`.
//! Implementations that accumulate data use interior mutability.
//!
//! [`Listener`] wraps an optional `&dyn BuildListener`; every method is a
//! single `Option` branch before dispatching.

use std::fmt;

use crate::config::BuildTrigger;
use crate::id::NodeId;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted before the component factory runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildStartEvent {
    /// Process-unique build id.
    pub build_id: u64,
    /// Generation being produced.
    pub generation: u64,
    /// Why the build was requested.
    pub trigger: BuildTrigger,
    /// Number of ids with pending state updates.
    pub pending_updates: usize,
}

/// Emitted after the scope root was sealed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildFinishEvent {
    /// Process-unique build id.
    pub build_id: u64,
    /// Generation produced.
    pub generation: u64,
    /// Nodes constructed in this build.
    pub created: usize,
    /// Nodes carried over from the previous generation.
    pub reused: usize,
    /// Render callbacks invoked.
    pub rendered: usize,
    /// Size of the dirty-id set.
    pub dirty: usize,
    /// Bounds animations emitted.
    pub animations: usize,
}

/// Emitted when a build fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildFailEvent {
    /// Process-unique build id.
    pub build_id: u64,
    /// Generation that would have been produced.
    pub generation: u64,
    /// Whether the failure was a contract violation.
    pub misuse: bool,
}

/// Emitted for every invoked render callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderEvent {
    /// Process-unique build id.
    pub build_id: u64,
    /// The rendered node.
    pub id: NodeId,
    /// Whether the node existed in the previous generation.
    pub had_previous: bool,
    /// Whether the node had a pending state update.
    pub state_updated: bool,
}

/// Emitted for every subtree reused from the previous generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReuseEvent {
    /// Process-unique build id.
    pub build_id: u64,
    /// Root of the reused subtree.
    pub id: NodeId,
    /// Number of nodes carried over.
    pub subtree_len: usize,
}

/// Emitted after layout for a node that asked to be notified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutPreparedEvent {
    /// Process-unique build id.
    pub build_id: u64,
    /// The prepared node.
    pub id: NodeId,
}

// ---------------------------------------------------------------------------
// BuildListener trait
// ---------------------------------------------------------------------------

/// Receives events from builds.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait BuildListener: Send + Sync {
    /// Called before the component factory runs.
    fn on_build_will_start(&self, e: &BuildStartEvent) {
        _ = e;
    }

    /// Called after a build produced its scope root.
    fn on_build_did_finish(&self, e: &BuildFinishEvent) {
        _ = e;
    }

    /// Called when a build fails. No finish event follows.
    fn on_build_failed(&self, e: &BuildFailEvent) {
        _ = e;
    }

    /// Called after each render callback returns successfully.
    fn on_render(&self, e: &RenderEvent) {
        _ = e;
    }

    /// Called for each reused subtree root.
    fn on_reuse(&self, e: &ReuseEvent) {
        _ = e;
    }

    /// Called once per prepared node after layout.
    fn on_layout_prepared(&self, e: &LayoutPreparedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopListener
// ---------------------------------------------------------------------------

/// A [`BuildListener`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl BuildListener for NoopListener {}

// ---------------------------------------------------------------------------
// Listener wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`BuildListener`].
#[derive(Clone, Copy, Default)]
pub struct Listener<'a> {
    inner: Option<&'a dyn BuildListener>,
}

impl fmt::Debug for Listener<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("attached", &self.inner.is_some())
            .finish()
    }
}

impl<'a> Listener<'a> {
    /// Creates a wrapper that dispatches to `listener`.
    #[inline]
    #[must_use]
    pub fn new(listener: &'a dyn BuildListener) -> Self {
        Self {
            inner: Some(listener),
        }
    }

    /// Creates a wrapper that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// Emits a [`BuildStartEvent`].
    #[inline]
    pub fn build_will_start(&self, e: &BuildStartEvent) {
        if let Some(l) = self.inner {
            l.on_build_will_start(e);
        }
    }

    /// Emits a [`BuildFinishEvent`].
    #[inline]
    pub fn build_did_finish(&self, e: &BuildFinishEvent) {
        if let Some(l) = self.inner {
            l.on_build_did_finish(e);
        }
    }

    /// Emits a [`BuildFailEvent`].
    #[inline]
    pub fn build_failed(&self, e: &BuildFailEvent) {
        if let Some(l) = self.inner {
            l.on_build_failed(e);
        }
    }

    /// Emits a [`RenderEvent`].
    #[inline]
    pub fn render(&self, e: &RenderEvent) {
        if let Some(l) = self.inner {
            l.on_render(e);
        }
    }

    /// Emits a [`ReuseEvent`].
    #[inline]
    pub fn reuse(&self, e: &ReuseEvent) {
        if let Some(l) = self.inner {
            l.on_reuse(e);
        }
    }

    /// Emits a [`LayoutPreparedEvent`].
    #[inline]
    pub fn layout_prepared(&self, e: &LayoutPreparedEvent) {
        if let Some(l) = self.inner {
            l.on_layout_prepared(e);
        }
    }
}
