// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout results exchanged with the caller's sizing function.
//!
//! The engine does not compute layout. After a build it hands the finished
//! tree and a [`SizeRange`] to a caller-supplied function and receives a
//! [`Layout`]: a tree of sizes and child positions keyed by [`NodeId`].
//! Positions are relative to the parent's origin.

use kurbo::{Point, Rect, Size, Vec2};

use crate::id::NodeId;

/// Minimum and maximum size a node may take.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeRange {
    /// Smallest allowed size.
    pub min: Size,
    /// Largest allowed size. Components may be infinite.
    pub max: Size,
}

impl SizeRange {
    /// No constraints.
    pub const UNCONSTRAINED: Self = Self {
        min: Size::ZERO,
        max: Size::new(f64::INFINITY, f64::INFINITY),
    };

    /// Creates a range from `min` to `max`.
    #[must_use]
    pub const fn new(min: Size, max: Size) -> Self {
        Self { min, max }
    }

    /// A range that admits exactly `size`.
    #[must_use]
    pub const fn exact(size: Size) -> Self {
        Self {
            min: size,
            max: size,
        }
    }

    /// Clamps `size` into the range, per axis.
    #[must_use]
    pub fn clamp(&self, size: Size) -> Size {
        Size::new(
            size.width.max(self.min.width).min(self.max.width),
            size.height.max(self.min.height).min(self.max.height),
        )
    }

    /// Returns whether `size` satisfies the range.
    #[must_use]
    pub fn contains(&self, size: Size) -> bool {
        (self.min.width..=self.max.width).contains(&size.width)
            && (self.min.height..=self.max.height).contains(&size.height)
    }
}

impl Default for SizeRange {
    fn default() -> Self {
        Self::UNCONSTRAINED
    }
}

/// A positioned child of a [`Layout`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutChild {
    /// Origin relative to the parent.
    pub position: Point,
    /// The child's own layout.
    pub layout: Layout,
}

/// The computed size of one node and the placement of its children.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    /// The node laid out.
    pub id: NodeId,
    /// Its size.
    pub size: Size,
    /// Positioned children.
    pub children: Vec<LayoutChild>,
}

impl Layout {
    /// A layout without children.
    #[must_use]
    pub fn leaf(id: NodeId, size: Size) -> Self {
        Self {
            id,
            size,
            children: Vec::new(),
        }
    }

    /// Finds the layout of `id` in this subtree.
    #[must_use]
    pub fn find(&self, id: NodeId) -> Option<&Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.layout.find(id))
    }

    /// Every node with its frame in the coordinate space of this layout's
    /// root, pre-order.
    #[must_use]
    pub fn frames(&self) -> Vec<(NodeId, Rect)> {
        let mut out = Vec::new();
        self.collect_frames(Vec2::ZERO, &mut out);
        out
    }

    fn collect_frames(&self, offset: Vec2, out: &mut Vec<(NodeId, Rect)>) {
        out.push((self.id, Rect::from_origin_size(offset.to_point(), self.size)));
        for child in &self.children {
            child
                .layout
                .collect_frames(offset + child.position.to_vec2(), out);
        }
    }

    /// Pre-order ids in this subtree.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev().map(|child| &child.layout));
            Some(next.id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Key;

    fn id(name: &str) -> NodeId {
        NodeId::keyed(None, &Key::from(name))
    }

    fn sample() -> Layout {
        Layout {
            id: id("root"),
            size: Size::new(100.0, 100.0),
            children: vec![LayoutChild {
                position: Point::new(10.0, 20.0),
                layout: Layout {
                    id: id("row"),
                    size: Size::new(80.0, 30.0),
                    children: vec![LayoutChild {
                        position: Point::new(5.0, 5.0),
                        layout: Layout::leaf(id("label"), Size::new(20.0, 10.0)),
                    }],
                },
            }],
        }
    }

    #[test]
    fn clamp_and_contains() {
        let range = SizeRange::new(Size::new(10.0, 10.0), Size::new(50.0, 40.0));
        assert_eq!(range.clamp(Size::new(5.0, 100.0)), Size::new(10.0, 40.0));
        assert!(range.contains(Size::new(20.0, 20.0)));
        assert!(!range.contains(Size::new(60.0, 20.0)));
        let exact = SizeRange::exact(Size::new(3.0, 4.0));
        assert_eq!(exact.clamp(Size::ZERO), Size::new(3.0, 4.0));
        assert!(SizeRange::UNCONSTRAINED.contains(Size::new(1e9, 1e9)));
    }

    #[test]
    fn frames_accumulate_offsets() {
        let frames = sample().frames();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].0, id("label"));
        assert_eq!(frames[2].1, Rect::new(15.0, 25.0, 35.0, 35.0));
    }

    #[test]
    fn find_and_ids() {
        let layout = sample();
        assert_eq!(
            layout.find(id("label")).map(|l| l.size),
            Some(Size::new(20.0, 10.0))
        );
        assert!(layout.find(id("missing")).is_none());
        let ids: Vec<_> = layout.ids().collect();
        assert_eq!(ids, vec![id("root"), id("row"), id("label")]);
    }
}
