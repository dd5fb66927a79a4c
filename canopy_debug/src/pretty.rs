// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable build output.
//!
//! [`PrettyPrintListener`] implements [`BuildListener`] and writes one line
//! per event to a [`Write`] destination (default: stderr). Times are
//! microseconds since the listener was created. [`write_tree`] dumps a
//! sealed tree with one indented line per node.

use std::io::{self, Write};
use std::time::Instant;

use canopy_core::BuildListener;
use canopy_core::id::NodeId;
use canopy_core::listener::{
    BuildFailEvent, BuildFinishEvent, BuildStartEvent, LayoutPreparedEvent, RenderEvent,
    ReuseEvent,
};
use canopy_core::tree::Tree;
use parking_lot::Mutex;

/// Writes human-readable event lines to a [`Write`] destination.
pub struct PrettyPrintListener<W: Write + Send = Box<dyn Write + Send>> {
    writer: Mutex<W>,
    start: Instant,
}

impl<W: Write + Send> std::fmt::Debug for PrettyPrintListener<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintListener")
            .field("start", &self.start)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintListener {
    /// Creates a listener that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(io::stderr()))
    }

    /// Creates a listener that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write + Send> PrettyPrintListener<W> {
    /// Creates a listener that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            start: Instant::now(),
        }
    }

    /// Consumes the listener and returns its writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn now_us(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1e6
    }

    fn line(&self, args: std::fmt::Arguments<'_>) {
        let at = self.now_us();
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "{at:>10.1}µs {args}");
    }
}

impl<W: Write + Send> BuildListener for PrettyPrintListener<W> {
    fn on_build_will_start(&self, e: &BuildStartEvent) {
        self.line(format_args!(
            "[build:start] build={} gen={} trigger={:?} pending={}",
            e.build_id, e.generation, e.trigger, e.pending_updates,
        ));
    }

    fn on_build_did_finish(&self, e: &BuildFinishEvent) {
        self.line(format_args!(
            "[build:finish] build={} gen={} created={} reused={} rendered={} \
             dirty={} animations={}",
            e.build_id, e.generation, e.created, e.reused, e.rendered, e.dirty, e.animations,
        ));
    }

    fn on_build_failed(&self, e: &BuildFailEvent) {
        let cause = if e.misuse { "misuse" } else { "callback" };
        self.line(format_args!(
            "[build:FAILED] build={} gen={} cause={cause}",
            e.build_id, e.generation,
        ));
    }

    fn on_render(&self, e: &RenderEvent) {
        let origin = if e.had_previous { "update" } else { "new" };
        let updated = if e.state_updated { " state" } else { "" };
        self.line(format_args!(
            "[render] build={} {:?} {origin}{updated}",
            e.build_id, e.id,
        ));
    }

    fn on_reuse(&self, e: &ReuseEvent) {
        self.line(format_args!(
            "[reuse] build={} {:?} nodes={}",
            e.build_id, e.id, e.subtree_len,
        ));
    }

    fn on_layout_prepared(&self, e: &LayoutPreparedEvent) {
        self.line(format_args!("[layout] build={} {:?}", e.build_id, e.id));
    }
}

/// Writes `tree` to `writer`, one line per node in pre-order, indented by
/// depth.
///
/// Each line shows the kind, the key if any, the id, and markers for state
/// (`*`) and cached predicates (`+bounds`, `+layout`).
pub fn write_tree(tree: &Tree, writer: &mut dyn Write) -> io::Result<()> {
    let Some(root) = tree.root() else {
        return writeln!(writer, "(empty)");
    };
    let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
    while let Some((id, depth)) = stack.pop() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        write!(writer, "{:indent$}{}", "", node.kind(), indent = depth * 2)?;
        if let Some(key) = node.component().key() {
            write!(writer, " #{key}")?;
        }
        write!(writer, " {id:?}")?;
        if node.state().is_some() {
            write!(writer, " *")?;
        }
        let flags = node.flags();
        if flags.wants_bounds_animation {
            write!(writer, " +bounds")?;
        }
        if flags.wants_layout_prepared {
            write!(writer, " +layout")?;
        }
        writeln!(writer)?;
        stack.extend(node.children().iter().rev().map(|child| (*child, depth + 1)));
    }
    Ok(())
}
