// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for scanout
//! diagnostics.
//!
//! This crate provides [`TraceSink`](scanout_core::trace::TraceSink)
//! implementations for development and post-mortem analysis of the flush
//! path:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback. Small enough to keep in a RAM
//!   buffer on the device and pull off later.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from
//!   recorded bytes, with one track per layer.

pub mod chrome;
pub mod pretty;
pub mod recorder;
