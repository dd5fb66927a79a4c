// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a
//! [`RecorderListener`](super::recorder::RecorderListener) and writes
//! [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Every build gets its own track (`tid` is the build id), so concurrent
//! builds appear side by side. A build is a duration slice from its start
//! event to its finish or failure; renders, reuses and layout notifications
//! are instant events on the same track.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        let ts = ns_to_us(recorded.at_ns());
        match recorded {
            RecordedEvent::BuildStart { event: e, .. } => {
                events.push(json!({
                    "ph": "M",
                    "name": "thread_name",
                    "pid": 0,
                    "tid": e.build_id,
                    "args": {
                        "name": format!("build {} (gen {})", e.build_id, e.generation),
                    }
                }));
                events.push(json!({
                    "ph": "B",
                    "name": "Build",
                    "cat": "Build",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.build_id,
                    "args": {
                        "generation": e.generation,
                        "trigger": format!("{:?}", e.trigger),
                        "pending_updates": e.pending_updates,
                    }
                }));
            }
            RecordedEvent::BuildFinish { event: e, .. } => {
                events.push(json!({
                    "ph": "E",
                    "name": "Build",
                    "cat": "Build",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.build_id,
                    "args": {
                        "created": e.created,
                        "reused": e.reused,
                        "rendered": e.rendered,
                        "dirty": e.dirty,
                        "animations": e.animations,
                    }
                }));
            }
            RecordedEvent::BuildFail { event: e, .. } => {
                events.push(json!({
                    "ph": "E",
                    "name": "Build",
                    "cat": "Build",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.build_id,
                    "args": {
                        "failed": true,
                        "misuse": e.misuse,
                    }
                }));
            }
            RecordedEvent::Render { event: e, .. } => {
                events.push(json!({
                    "ph": "i",
                    "name": "Render",
                    "cat": "Node",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.build_id,
                    "s": "t",
                    "args": {
                        "id": format!("{:?}", e.id),
                        "had_previous": e.had_previous,
                        "state_updated": e.state_updated,
                    }
                }));
            }
            RecordedEvent::Reuse { event: e, .. } => {
                events.push(json!({
                    "ph": "i",
                    "name": "Reuse",
                    "cat": "Node",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.build_id,
                    "s": "t",
                    "args": {
                        "id": format!("{:?}", e.id),
                        "subtree_len": e.subtree_len,
                    }
                }));
            }
            RecordedEvent::LayoutPrepared { event: e, .. } => {
                events.push(json!({
                    "ph": "i",
                    "name": "LayoutPrepared",
                    "cat": "Layout",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.build_id,
                    "s": "t",
                    "args": {
                        "id": format!("{:?}", e.id),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ns_to_us(ns: u64) -> f64 {
    ns as f64 / 1000.0
}
