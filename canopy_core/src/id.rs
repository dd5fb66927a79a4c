// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity and disambiguation keys.
//!
//! A [`NodeId`] names "the same" logical position in the component tree
//! across generations. It is derived, never allocated: hashing the parent's
//! id together with a *segment* (either an explicit [`Key`] or the implicit
//! `(kind, occurrence)` pair of an unkeyed component) yields the same id every
//! time the same position is rebuilt. Reuse detection therefore needs no
//! global bookkeeping.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

/// A stable identity for a node position in the component tree.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// Derives the identity of a child keyed by `key` under `parent`.
    ///
    /// `parent` is `None` for the root of a tree.
    #[must_use]
    pub fn keyed(parent: Option<Self>, key: &Key) -> Self {
        Self::derive(parent, Segment::Keyed(key))
    }

    /// Derives the identity of the `occurrence`-th unkeyed child of `kind`
    /// under `parent`.
    #[must_use]
    pub fn implicit(parent: Option<Self>, kind: &str, occurrence: u32) -> Self {
        Self::derive(parent, Segment::Implicit { kind, occurrence })
    }

    /// Returns the raw token (for diagnostics and recording).
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Rebuilds an id from a token previously returned by [`raw`](Self::raw).
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    fn derive(parent: Option<Self>, segment: Segment<'_>) -> Self {
        let mut hasher = FxHasher::default();
        parent.map(Self::raw).hash(&mut hasher);
        segment.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({:016x})", self.0)
    }
}

/// One step of an identity path.
#[derive(Hash)]
enum Segment<'a> {
    Keyed(&'a Key),
    Implicit { kind: &'a str, occurrence: u32 },
}

/// A caller-supplied key that disambiguates siblings.
///
/// Two siblings under the same parent must never share a key; doing so is a
/// configuration error reported by the build.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// An integer key (row index, database id, ...).
    Int(u64),
    /// A string key.
    Str(Arc<str>),
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "Key({v})"),
            Self::Str(s) => write!(f, "Key({s:?})"),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let root = NodeId::implicit(None, "List", 0);
        assert_eq!(root, NodeId::implicit(None, "List", 0));
        assert_eq!(
            NodeId::keyed(Some(root), &Key::from("a")),
            NodeId::keyed(Some(root), &Key::from("a"))
        );
    }

    #[test]
    fn parent_participates_in_identity() {
        let a = NodeId::implicit(None, "A", 0);
        let b = NodeId::implicit(None, "B", 0);
        let key = Key::Int(7);
        assert_ne!(NodeId::keyed(Some(a), &key), NodeId::keyed(Some(b), &key));
        assert_ne!(NodeId::keyed(Some(a), &key), NodeId::keyed(None, &key));
    }

    #[test]
    fn implicit_occurrences_differ() {
        let root = NodeId::implicit(None, "Stack", 0);
        let first = NodeId::implicit(Some(root), "Text", 0);
        let second = NodeId::implicit(Some(root), "Text", 1);
        let other_kind = NodeId::implicit(Some(root), "Image", 0);
        assert_ne!(first, second);
        assert_ne!(first, other_kind);
    }

    #[test]
    fn int_and_string_keys_are_distinct() {
        let root = NodeId::implicit(None, "Stack", 0);
        assert_ne!(
            NodeId::keyed(Some(root), &Key::Int(1)),
            NodeId::keyed(Some(root), &Key::from("1"))
        );
    }

    #[test]
    fn key_display() {
        assert_eq!(Key::from("row").to_string(), "row");
        assert_eq!(Key::Int(3).to_string(), "3");
    }
}
