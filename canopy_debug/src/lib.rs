// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for canopy build
//! diagnostics.
//!
//! This crate provides [`BuildListener`](canopy_core::BuildListener)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintListener`]: human-readable one-line-per-event
//!   output, plus [`pretty::write_tree`] for dumping a sealed tree.
//! - [`recorder::RecorderListener`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.

pub mod chrome;
pub mod pretty;
pub mod recorder;
