// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-thread registry of in-progress builds.
//!
//! The registry is only a stack of lightweight descriptors. Builds own their
//! state in a [`BuildContext`](crate::BuildContext); the registry exists so
//! that deeply nested code can ask "which build am I in?" via [`current`] and
//! so that nested builds restore the outer one when they finish.

use std::cell::RefCell;

use crate::config::BuildTrigger;

/// Descriptor of a build that is current on this thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActiveBuild {
    /// Process-unique build id.
    pub build_id: u64,
    /// Generation being produced.
    pub generation: u64,
    /// Why the build was requested.
    pub trigger: BuildTrigger,
    /// Nesting depth on this thread (0 for the outermost build).
    pub depth: usize,
}

thread_local! {
    static ACTIVE: RefCell<Vec<ActiveBuild>> = const { RefCell::new(Vec::new()) };
}

/// Returns the build that is current on the calling thread, if any.
#[must_use]
pub fn current() -> Option<ActiveBuild> {
    ACTIVE.with(|stack| stack.borrow().last().copied())
}

/// Number of builds in progress on the calling thread.
#[must_use]
pub fn nesting_depth() -> usize {
    ACTIVE.with(|stack| stack.borrow().len())
}

/// Keeps a build registered as current until dropped.
///
/// Dropping restores whichever build was current before, including during
/// unwinding.
#[derive(Debug)]
pub(crate) struct Registration {
    build_id: u64,
}

impl Registration {
    pub(crate) fn push(build_id: u64, generation: u64, trigger: BuildTrigger) -> Self {
        ACTIVE.with(|stack| {
            let mut stack = stack.borrow_mut();
            let depth = stack.len();
            stack.push(ActiveBuild {
                build_id,
                generation,
                trigger,
                depth,
            });
        });
        Self { build_id }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        // The registry may already be gone if the thread is exiting.
        _ = ACTIVE.try_with(|stack| {
            let mut stack = stack.borrow_mut();
            // Registrations are owned by strictly nested scopes, so ours is on
            // top unless the stack was torn down out of order.
            if let Some(pos) = stack.iter().rposition(|b| b.build_id == self.build_id) {
                stack.truncate(pos);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_restore() {
        assert_eq!(current(), None);
        let outer = Registration::push(10, 1, BuildTrigger::empty());
        assert_eq!(current().map(|b| b.build_id), Some(10));
        {
            let _inner = Registration::push(11, 4, BuildTrigger::STATE_UPDATE);
            let active = current().unwrap();
            assert_eq!(active.build_id, 11);
            assert_eq!(active.depth, 1);
            assert_eq!(nesting_depth(), 2);
        }
        assert_eq!(current().map(|b| b.build_id), Some(10));
        drop(outer);
        assert_eq!(current(), None);
    }

    #[test]
    fn registry_is_per_thread() {
        let _reg = Registration::push(20, 1, BuildTrigger::empty());
        let seen = std::thread::spawn(current).join().unwrap();
        assert_eq!(seen, None);
        assert_eq!(current().map(|b| b.build_id), Some(20));
    }
}
