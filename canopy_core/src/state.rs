// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node state payloads and pending state updates.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::id::NodeId;

/// An opaque, shareable state payload attached to a node.
pub type State = Arc<dyn Any + Send + Sync>;

/// Wraps a value as a [`State`].
#[must_use]
pub fn state<T: Any + Send + Sync>(value: T) -> State {
    Arc::new(value)
}

/// Returns `true` if both optional states are the same allocation (or both
/// absent).
#[must_use]
pub fn same_state(a: Option<&State>, b: Option<&State>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// A single pending update: maps the old state (if any) to the new one.
pub type StateUpdate = Box<dyn Fn(Option<&State>) -> State + Send + Sync>;

/// Pending state updates accumulated since the previous generation.
///
/// Updates for the same node are applied in the order they were enqueued.
/// The map is consumed read-only by exactly one build.
#[derive(Default)]
pub struct StateUpdateMap {
    updates: BTreeMap<NodeId, Vec<StateUpdate>>,
}

impl fmt::Debug for StateUpdateMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.updates.iter().map(|(id, list)| (id, list.len())))
            .finish()
    }
}

impl StateUpdateMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues an update function for `id`.
    pub fn enqueue<F>(&mut self, id: NodeId, update: F)
    where
        F: Fn(Option<&State>) -> State + Send + Sync + 'static,
    {
        self.updates.entry(id).or_default().push(Box::new(update));
    }

    /// Enqueues an update that replaces the state of `id` with `value`.
    pub fn set(&mut self, id: NodeId, value: State) {
        self.enqueue(id, move |_| value.clone());
    }

    /// Returns whether `id` has at least one pending update.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.updates.contains_key(&id)
    }

    /// Iterates over the ids that have pending updates, in id order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.updates.keys().copied()
    }

    /// Number of distinct ids with pending updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Returns `true` if no updates are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Applies every pending update for `id` to `base`, in enqueue order.
    ///
    /// Returns `base` unchanged when `id` has no updates.
    #[must_use]
    pub fn apply(&self, id: NodeId, base: Option<State>) -> Option<State> {
        let Some(list) = self.updates.get(&id) else {
            return base;
        };
        list.iter().fold(base, |current, update| Some(update(current.as_ref())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Key;

    fn id(n: u64) -> NodeId {
        NodeId::keyed(None, &Key::Int(n))
    }

    #[test]
    fn apply_without_updates_returns_base() {
        let map = StateUpdateMap::new();
        let base = state(1_u32);
        let out = map.apply(id(1), Some(base.clone()));
        assert!(same_state(out.as_ref(), Some(&base)));
    }

    #[test]
    fn updates_apply_in_order() {
        let mut map = StateUpdateMap::new();
        map.enqueue(id(1), |old| {
            let v = old.and_then(|s| s.downcast_ref::<u32>()).copied().unwrap_or(0);
            state(v + 1)
        });
        map.enqueue(id(1), |old| {
            let v = old.and_then(|s| s.downcast_ref::<u32>()).copied().unwrap_or(0);
            state(v * 10)
        });
        let out = map.apply(id(1), Some(state(4_u32))).unwrap();
        assert_eq!(out.downcast_ref::<u32>(), Some(&50));
    }

    #[test]
    fn set_replaces_missing_state() {
        let mut map = StateUpdateMap::new();
        map.set(id(2), state("hello"));
        assert!(map.contains(id(2)));
        assert!(!map.contains(id(3)));
        let out = map.apply(id(2), None).unwrap();
        assert_eq!(out.downcast_ref::<&str>(), Some(&"hello"));
    }

    #[test]
    fn same_state_compares_allocations() {
        let a = state(1_u8);
        let b = state(1_u8);
        assert!(same_state(Some(&a), Some(&a)));
        assert!(!same_state(Some(&a), Some(&b)));
        assert!(same_state(None, None));
        assert!(!same_state(Some(&a), None));
    }
}
