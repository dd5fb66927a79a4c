// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build errors.

use thiserror::Error;

use crate::component::BoxError;
use crate::id::{Key, NodeId};

/// Broad classification of a [`BuildError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller broke a usage contract of the build context.
    Misuse,
    /// A factory or render callback failed.
    Callback,
}

/// Why a build failed.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A build was entered while another was current on the same thread and
    /// nesting is disabled.
    #[error("nested build entered while build {active} is in progress")]
    NestedBuild {
        /// The build id that was current.
        active: u64,
    },
    /// A frame was popped out of LIFO order.
    #[error("frame mismatch: expected to pop {expected:?}, top is {found:?}")]
    FrameMismatch {
        /// The id the caller tried to pop.
        expected: NodeId,
        /// The id actually on top, if any.
        found: Option<NodeId>,
    },
    /// The build exited with frames still open.
    #[error("build exited with {open} open frame(s)")]
    UnbalancedFrames {
        /// Number of frames left on the stack.
        open: usize,
    },
    /// Two siblings declared the same explicit key.
    #[error("duplicate key {key} under {parent:?}")]
    KeyCollision {
        /// The shared parent (`None` at the root).
        parent: Option<NodeId>,
        /// The colliding key.
        key: Key,
    },
    /// The component factory failed.
    #[error("component factory failed")]
    Factory(#[source] BoxError),
    /// A render callback failed.
    #[error("render of {id:?} failed")]
    Render {
        /// The node whose render failed.
        id: NodeId,
        /// The callback's error.
        #[source]
        source: BoxError,
    },
}

impl BuildError {
    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NestedBuild { .. }
            | Self::FrameMismatch { .. }
            | Self::UnbalancedFrames { .. }
            | Self::KeyCollision { .. } => ErrorKind::Misuse,
            Self::Factory(_) | Self::Render { .. } => ErrorKind::Callback,
        }
    }

    /// Shorthand for `self.kind() == ErrorKind::Misuse`.
    #[must_use]
    pub fn is_misuse(&self) -> bool {
        self.kind() == ErrorKind::Misuse
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn kinds() {
        assert!(BuildError::UnbalancedFrames { open: 2 }.is_misuse());
        assert!(BuildError::NestedBuild { active: 1 }.is_misuse());
        let err = BuildError::Factory("boom".into());
        assert_eq!(err.kind(), ErrorKind::Callback);
    }

    #[test]
    fn key_collision_message() {
        let err = BuildError::KeyCollision {
            parent: None,
            key: Key::from("row-1"),
        };
        assert_eq!(err.to_string(), "duplicate key row-1 under None");
    }

    #[test]
    fn render_error_keeps_source() {
        let id = NodeId::implicit(None, "Root", 0);
        let err = BuildError::Render {
            id,
            source: "bad state".into(),
        };
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("bad state")
        );
    }
}
