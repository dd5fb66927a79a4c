// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderListener`] implements [`BuildListener`] and encodes events into
//! a `Vec<u8>` as fixed-size little-endian records. Every record carries a
//! timestamp in nanoseconds since the recorder was created. [`decode`] reads
//! them back as an iterator of [`RecordedEvent`].
//!
//! Counts are stored as `u32` and saturate.

use std::time::Instant;

use canopy_core::BuildListener;
use canopy_core::config::BuildTrigger;
use canopy_core::id::NodeId;
use canopy_core::listener::{
    BuildFailEvent, BuildFinishEvent, BuildStartEvent, LayoutPreparedEvent, RenderEvent,
    ReuseEvent,
};
use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_BUILD_START: u8 = 1;
const TAG_BUILD_FINISH: u8 = 2;
const TAG_BUILD_FAIL: u8 = 3;
const TAG_RENDER: u8 = 4;
const TAG_REUSE: u8 = 5;
const TAG_LAYOUT_PREPARED: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderListener
// ---------------------------------------------------------------------------

/// A [`BuildListener`] that encodes events into a compact binary buffer.
///
/// Builds on several threads may report to the same recorder; records are
/// appended whole, in the order the lock was taken.
#[derive(Debug)]
pub struct RecorderListener {
    start: Instant,
    buf: Mutex<Vec<u8>>,
}

impl Default for RecorderListener {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderListener {
    /// Creates an empty recorder. Timestamps count from now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            buf: Mutex::new(Vec::new()),
        }
    }

    /// Copies the bytes recorded so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        self.buf.lock().clone()
    }

    /// Number of bytes recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }

    /// Discards everything recorded so far.
    pub fn clear(&self) {
        self.buf.lock().clear();
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.into_inner()
    }

    fn record(&self, tag: u8, fields: impl FnOnce(&mut Encoder<'_>)) {
        let mut buf = self.buf.lock();
        let mut enc = Encoder(&mut buf);
        enc.u8(tag);
        enc.u64(self.elapsed_ns());
        fields(&mut enc);
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "u64 nanoseconds cover centuries of recording"
    )]
    fn elapsed_ns(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
}

// -- encoding helpers --------------------------------------------------------

struct Encoder<'a>(&'a mut Vec<u8>);

impl Encoder<'_> {
    fn u8(&mut self, v: u8) {
        self.0.push(v);
    }

    fn bool(&mut self, v: bool) {
        self.u8(u8::from(v));
    }

    fn u64(&mut self, v: u64) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    fn count(&mut self, v: usize) {
        let v = u32::try_from(v).unwrap_or(u32::MAX);
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    fn id(&mut self, id: NodeId) {
        self.u64(id.raw());
    }
}

impl BuildListener for RecorderListener {
    fn on_build_will_start(&self, e: &BuildStartEvent) {
        self.record(TAG_BUILD_START, |enc| {
            enc.u64(e.build_id);
            enc.u64(e.generation);
            enc.u8(e.trigger.bits());
            enc.count(e.pending_updates);
        });
    }

    fn on_build_did_finish(&self, e: &BuildFinishEvent) {
        self.record(TAG_BUILD_FINISH, |enc| {
            enc.u64(e.build_id);
            enc.u64(e.generation);
            enc.count(e.created);
            enc.count(e.reused);
            enc.count(e.rendered);
            enc.count(e.dirty);
            enc.count(e.animations);
        });
    }

    fn on_build_failed(&self, e: &BuildFailEvent) {
        self.record(TAG_BUILD_FAIL, |enc| {
            enc.u64(e.build_id);
            enc.u64(e.generation);
            enc.bool(e.misuse);
        });
    }

    fn on_render(&self, e: &RenderEvent) {
        self.record(TAG_RENDER, |enc| {
            enc.u64(e.build_id);
            enc.id(e.id);
            enc.bool(e.had_previous);
            enc.bool(e.state_updated);
        });
    }

    fn on_reuse(&self, e: &ReuseEvent) {
        self.record(TAG_REUSE, |enc| {
            enc.u64(e.build_id);
            enc.id(e.id);
            enc.count(e.subtree_len);
        });
    }

    fn on_layout_prepared(&self, e: &LayoutPreparedEvent) {
        self.record(TAG_LAYOUT_PREPARED, |enc| {
            enc.u64(e.build_id);
            enc.id(e.id);
        });
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
///
/// `at_ns` is the time since the recorder was created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`BuildStartEvent`].
    BuildStart {
        /// Nanoseconds since recording started.
        at_ns: u64,
        /// The event.
        event: BuildStartEvent,
    },
    /// A [`BuildFinishEvent`].
    BuildFinish {
        /// Nanoseconds since recording started.
        at_ns: u64,
        /// The event.
        event: BuildFinishEvent,
    },
    /// A [`BuildFailEvent`].
    BuildFail {
        /// Nanoseconds since recording started.
        at_ns: u64,
        /// The event.
        event: BuildFailEvent,
    },
    /// A [`RenderEvent`].
    Render {
        /// Nanoseconds since recording started.
        at_ns: u64,
        /// The event.
        event: RenderEvent,
    },
    /// A [`ReuseEvent`].
    Reuse {
        /// Nanoseconds since recording started.
        at_ns: u64,
        /// The event.
        event: ReuseEvent,
    },
    /// A [`LayoutPreparedEvent`].
    LayoutPrepared {
        /// Nanoseconds since recording started.
        at_ns: u64,
        /// The event.
        event: LayoutPreparedEvent,
    },
}

impl RecordedEvent {
    /// Nanoseconds since recording started.
    #[must_use]
    pub fn at_ns(&self) -> u64 {
        match self {
            Self::BuildStart { at_ns, .. }
            | Self::BuildFinish { at_ns, .. }
            | Self::BuildFail { at_ns, .. }
            | Self::Render { at_ns, .. }
            | Self::Reuse { at_ns, .. }
            | Self::LayoutPrepared { at_ns, .. } => *at_ns,
        }
    }

    /// The build the event belongs to.
    #[must_use]
    pub fn build_id(&self) -> u64 {
        match self {
            Self::BuildStart { event, .. } => event.build_id,
            Self::BuildFinish { event, .. } => event.build_id,
            Self::BuildFail { event, .. } => event.build_id,
            Self::Render { event, .. } => event.build_id,
            Self::Reuse { event, .. } => event.build_id,
            Self::LayoutPrepared { event, .. } => event.build_id,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderListener`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_count(&mut self) -> Option<usize> {
        usize::try_from(u32::from_le_bytes(self.take()?)).ok()
    }

    fn read_id(&mut self) -> Option<NodeId> {
        self.read_u64().map(NodeId::from_raw)
    }

    fn decode_build_start(&mut self, at_ns: u64) -> Option<RecordedEvent> {
        Some(RecordedEvent::BuildStart {
            at_ns,
            event: BuildStartEvent {
                build_id: self.read_u64()?,
                generation: self.read_u64()?,
                trigger: BuildTrigger::from_bits_truncate(self.read_u8()?),
                pending_updates: self.read_count()?,
            },
        })
    }

    fn decode_build_finish(&mut self, at_ns: u64) -> Option<RecordedEvent> {
        Some(RecordedEvent::BuildFinish {
            at_ns,
            event: BuildFinishEvent {
                build_id: self.read_u64()?,
                generation: self.read_u64()?,
                created: self.read_count()?,
                reused: self.read_count()?,
                rendered: self.read_count()?,
                dirty: self.read_count()?,
                animations: self.read_count()?,
            },
        })
    }

    fn decode_build_fail(&mut self, at_ns: u64) -> Option<RecordedEvent> {
        Some(RecordedEvent::BuildFail {
            at_ns,
            event: BuildFailEvent {
                build_id: self.read_u64()?,
                generation: self.read_u64()?,
                misuse: self.read_bool()?,
            },
        })
    }

    fn decode_render(&mut self, at_ns: u64) -> Option<RecordedEvent> {
        Some(RecordedEvent::Render {
            at_ns,
            event: RenderEvent {
                build_id: self.read_u64()?,
                id: self.read_id()?,
                had_previous: self.read_bool()?,
                state_updated: self.read_bool()?,
            },
        })
    }

    fn decode_reuse(&mut self, at_ns: u64) -> Option<RecordedEvent> {
        Some(RecordedEvent::Reuse {
            at_ns,
            event: ReuseEvent {
                build_id: self.read_u64()?,
                id: self.read_id()?,
                subtree_len: self.read_count()?,
            },
        })
    }

    fn decode_layout_prepared(&mut self, at_ns: u64) -> Option<RecordedEvent> {
        Some(RecordedEvent::LayoutPrepared {
            at_ns,
            event: LayoutPreparedEvent {
                build_id: self.read_u64()?,
                id: self.read_id()?,
            },
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let at_ns = self.read_u64()?;
        match tag {
            TAG_BUILD_START => self.decode_build_start(at_ns),
            TAG_BUILD_FINISH => self.decode_build_finish(at_ns),
            TAG_BUILD_FAIL => self.decode_build_fail(at_ns),
            TAG_RENDER => self.decode_render(at_ns),
            TAG_REUSE => self.decode_reuse(at_ns),
            TAG_LAYOUT_PREPARED => self.decode_layout_prepared(at_ns),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Arc;

    use canopy_core::{Component, Engine, EngineConfig, StateUpdateMap};

    use super::*;

    fn engine_with(rec: &Arc<RecorderListener>) -> Engine {
        let listener: Arc<dyn BuildListener> = rec.clone();
        Engine::new(EngineConfig {
            listener: Some(listener),
            ..EngineConfig::default()
        })
    }

    fn app() -> Component {
        Component::container(
            "App",
            [Component::render("Greeting", |_| {
                Ok(Some(Component::leaf("Text")))
            })],
        )
    }

    #[test]
    fn records_a_full_build() {
        let rec = Arc::new(RecorderListener::new());
        let engine = engine_with(&rec);
        let result = engine
            .build(None, &StateUpdateMap::new(), BuildTrigger::empty(), || {
                Ok::<_, Infallible>(app())
            })
            .unwrap();

        let events: Vec<_> = decode(&rec.snapshot()).collect();
        assert_eq!(events.len(), 3);
        match &events[0] {
            RecordedEvent::BuildStart { event, .. } => {
                assert_eq!(event.build_id, result.build_id);
                assert_eq!(event.generation, 1);
                assert_eq!(event.trigger, BuildTrigger::empty());
            }
            other => panic!("expected BuildStart, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::Render { event, .. } => {
                assert!(!event.had_previous);
                assert!(!event.state_updated);
            }
            other => panic!("expected Render, got {other:?}"),
        }
        match &events[2] {
            RecordedEvent::BuildFinish { event, .. } => {
                assert_eq!(event.created, 3);
                assert_eq!(event.reused, 0);
                assert_eq!(event.rendered, 1);
            }
            other => panic!("expected BuildFinish, got {other:?}"),
        }
        assert!(events.windows(2).all(|w| w[0].at_ns() <= w[1].at_ns()));
        assert!(events.iter().all(|e| e.build_id() == result.build_id));
    }

    #[test]
    fn records_reuse_and_failure() {
        let rec = Arc::new(RecorderListener::new());
        let engine = engine_with(&rec);
        let none = StateUpdateMap::new();
        let first = engine
            .build(None, &none, BuildTrigger::empty(), || {
                Ok::<_, Infallible>(app())
            })
            .unwrap();
        rec.clear();
        assert!(rec.is_empty());

        engine
            .build(Some(&first.scope_root), &none, BuildTrigger::empty(), || {
                Ok::<_, Infallible>(app())
            })
            .unwrap();
        let reused: Vec<_> = decode(&rec.snapshot())
            .filter_map(|e| match e {
                RecordedEvent::Reuse { event, .. } => Some(event),
                _ => None,
            })
            .collect();
        assert_eq!(reused.len(), 1);
        assert_eq!(reused[0].id, first.root);
        assert_eq!(reused[0].subtree_len, 3);

        rec.clear();
        let err = engine.build(None, &none, BuildTrigger::empty(), || Err("no app"));
        assert!(err.is_err());
        let events: Vec<_> = decode(&rec.snapshot()).collect();
        match events.last() {
            Some(RecordedEvent::BuildFail { event, .. }) => assert!(!event.misuse),
            other => panic!("expected BuildFail, got {other:?}"),
        }
    }

    #[test]
    fn direct_events_decode_with_ids() {
        let rec = RecorderListener::new();
        let id = NodeId::implicit(None, "Root", 0);
        rec.on_layout_prepared(&LayoutPreparedEvent { build_id: 9, id });
        rec.on_build_will_start(&BuildStartEvent {
            build_id: 9,
            generation: 4,
            trigger: BuildTrigger::all(),
            pending_updates: 2,
        });
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::LayoutPrepared { event, .. } => assert_eq!(event.id, id),
            other => panic!("expected LayoutPrepared, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::BuildStart { event, .. } => {
                assert_eq!(event.trigger, BuildTrigger::all());
                assert_eq!(event.pending_updates, 2);
            }
            other => panic!("expected BuildStart, got {other:?}"),
        }
    }

    #[test]
    fn truncated_or_unknown_input_stops() {
        let rec = RecorderListener::new();
        rec.on_build_failed(&BuildFailEvent {
            build_id: 1,
            generation: 1,
            misuse: true,
        });
        let mut bytes = rec.snapshot();
        let whole = bytes.len();
        bytes.truncate(whole - 1);
        assert_eq!(decode(&bytes).count(), 0);

        let mut bytes = rec.snapshot();
        bytes.push(0xff);
        bytes.extend_from_slice(&[0; 8]);
        assert_eq!(decode(&bytes).count(), 1);
        assert_eq!(decode(&[]).count(), 0);
    }
}
