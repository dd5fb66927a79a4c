// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build configuration: triggers, reuse policy and predicates.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use tracing::warn;

use crate::component::Component;
use crate::error::BuildError;
use crate::listener::BuildListener;
use crate::tree::NodeFlags;

bitflags! {
    /// Why a build was requested.
    ///
    /// The empty set means "unspecified"; both flags may be set at once.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BuildTrigger: u8 {
        /// The root's externally supplied inputs changed.
        const PROPS_UPDATE = 1 << 0;
        /// One or more nodes have pending state updates.
        const STATE_UPDATE = 1 << 1;
    }
}

/// What a build does when the caller breaks a usage contract (unbalanced
/// frames, a disallowed nested build, duplicate sibling keys).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MisuseHandling {
    /// Panic in debug builds; in release builds log a warning and recover.
    #[default]
    DebugAssert,
    /// Fail the build with a [`BuildError`](crate::BuildError).
    Error,
    /// Log a warning and recover.
    Skip,
}

impl MisuseHandling {
    /// Applies the policy to a detected misuse.
    ///
    /// Returns `Ok(())` when the caller should recover and carry on.
    pub(crate) fn handle(self, err: BuildError) -> Result<(), BuildError> {
        match self {
            Self::Error => Err(err),
            Self::DebugAssert if cfg!(debug_assertions) => panic!("build misuse: {err}"),
            Self::DebugAssert | Self::Skip => {
                warn!(error = %err, "recovering from build misuse");
                Ok(())
            }
        }
    }
}

/// Per-build reuse and diagnostics switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BuildOptions {
    /// Reuse unchanged subtrees from the previous generation. When `false`
    /// every node is rebuilt.
    pub enable_reuse: bool,
    /// A trigger containing [`BuildTrigger::PROPS_UPDATE`] rebuilds the
    /// whole tree.
    pub rebuild_on_props_update: bool,
    /// Allow a build to start on a thread that already has one in progress.
    pub allow_nested_builds: bool,
    /// Record the ids of every node created by the build in
    /// [`BuildStats::created_ids`](crate::BuildStats::created_ids).
    pub collect_creation_info: bool,
    /// Response to contract violations.
    pub misuse: MisuseHandling,
}

impl BuildOptions {
    /// Default options: reuse on, props updates rebuild, nesting allowed.
    pub const DEFAULT: Self = Self {
        enable_reuse: true,
        rebuild_on_props_update: true,
        allow_nested_builds: true,
        collect_creation_info: false,
        misuse: MisuseHandling::DebugAssert,
    };

    /// Like [`DEFAULT`](Self::DEFAULT), but every misuse is returned as an
    /// error.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            misuse: MisuseHandling::Error,
            ..Self::DEFAULT
        }
    }

    /// Returns whether `trigger` forces a full rebuild under these options.
    #[must_use]
    pub fn forces_rebuild(&self, trigger: BuildTrigger) -> bool {
        !self.enable_reuse
            || (self.rebuild_on_props_update && trigger.contains(BuildTrigger::PROPS_UPDATE))
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A structural yes/no question asked once per constructed node.
pub type NodePredicateFn = fn(&Component) -> bool;

/// Predicates evaluated for every rebuilt node and cached on the tree.
#[derive(Clone, Copy, Debug, Default)]
pub struct Predicates {
    /// Nodes that animate their bounds between generations.
    pub bounds_animation: Option<NodePredicateFn>,
    /// Nodes notified after layout.
    pub layout_prepared: Option<NodePredicateFn>,
}

impl Predicates {
    /// No predicates registered.
    pub const NONE: Self = Self {
        bounds_animation: None,
        layout_prepared: None,
    };

    /// Evaluates every registered predicate against `component`.
    #[must_use]
    pub fn evaluate(&self, component: &Component) -> NodeFlags {
        NodeFlags {
            wants_bounds_animation: self.bounds_animation.is_some_and(|f| f(component)),
            wants_layout_prepared: self.layout_prepared.is_some_and(|f| f(component)),
        }
    }
}

/// Engine-wide configuration fixed at construction.
#[derive(Clone, Default)]
pub struct EngineConfig {
    /// Options used by [`Engine::build`](crate::Engine::build).
    pub options: BuildOptions,
    /// Registered node predicates.
    pub predicates: Predicates,
    /// Receives build events. `None` discards them.
    pub listener: Option<Arc<dyn BuildListener>>,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("options", &self.options)
            .field("predicates", &self.predicates)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_box(c: &Component) -> bool {
        c.kind() == "Box"
    }

    #[test]
    fn default_options() {
        let opts = BuildOptions::default();
        assert!(opts.enable_reuse);
        assert!(opts.rebuild_on_props_update);
        assert!(opts.allow_nested_builds);
        assert!(!opts.collect_creation_info);
        assert_eq!(opts.misuse, MisuseHandling::DebugAssert);
        assert_eq!(BuildOptions::strict().misuse, MisuseHandling::Error);
    }

    #[test]
    fn props_trigger_forces_rebuild() {
        let opts = BuildOptions::DEFAULT;
        assert!(!opts.forces_rebuild(BuildTrigger::empty()));
        assert!(!opts.forces_rebuild(BuildTrigger::STATE_UPDATE));
        assert!(opts.forces_rebuild(BuildTrigger::PROPS_UPDATE));
        assert!(opts.forces_rebuild(BuildTrigger::all()));

        let lenient = BuildOptions {
            rebuild_on_props_update: false,
            ..BuildOptions::DEFAULT
        };
        assert!(!lenient.forces_rebuild(BuildTrigger::PROPS_UPDATE));

        let no_reuse = BuildOptions {
            enable_reuse: false,
            ..BuildOptions::DEFAULT
        };
        assert!(no_reuse.forces_rebuild(BuildTrigger::empty()));
    }

    #[test]
    fn misuse_policies() {
        let err = || BuildError::UnbalancedFrames { open: 1 };
        assert!(MisuseHandling::Error.handle(err()).is_err());
        assert!(MisuseHandling::Skip.handle(err()).is_ok());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "open frame")]
    fn debug_assert_panics_in_debug_builds() {
        _ = MisuseHandling::DebugAssert.handle(BuildError::UnbalancedFrames { open: 1 });
    }

    #[test]
    fn predicates_evaluate() {
        let preds = Predicates {
            bounds_animation: Some(is_box),
            layout_prepared: None,
        };
        let flags = preds.evaluate(&Component::leaf("Box"));
        assert!(flags.wants_bounds_animation);
        assert!(!flags.wants_layout_prepared);
        assert_eq!(
            Predicates::NONE.evaluate(&Component::leaf("Box")),
            NodeFlags::default()
        );
    }
}
