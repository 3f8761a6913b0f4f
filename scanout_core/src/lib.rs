// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flush and reload synchronization between a software renderer and a
//! display timing controller.
//!
//! `scanout_core` decides, per flush, whether to hand a whole frame buffer
//! to a hardware layer (direct mode) or to copy a region into a live frame
//! buffer (partial mode), and coordinates the render thread with the
//! controller's register-reload interrupt so that a buffer is never handed
//! back to the renderer while it is still being scanned out. It is `no_std`
//! compatible (with `alloc`) and does not allocate on the flush path.
//!
//! # Architecture
//!
//! ```text
//!   Renderer
//!       │ flush(area, px_map, is_last)
//!       ▼
//!   Display ──► partial: blit::copy_area / rotate_area ──► frame buffer
//!       │
//!       │ direct, double-buffered, last flush
//!       ▼
//!   DisplayController::set_layer_address + request_reload
//!                                           │
//!                 ┌─────────────────────────┘  (reload interrupt)
//!                 ▼
//!   ReloadGate::on_reload_complete ──► SyncPrimitive::signal_from_isr
//!                                           │
//!                 ┌─────────────────────────┘
//!                 ▼
//!   Display::flush_wait returns ──► renderer reuses the other buffer
//! ```
//!
//! **[`display`]**: [`Scanout`](display::Scanout) owns the controller and
//! creates one [`Display`](display::Display) per layer; the
//! [`FlushTarget`](display::FlushTarget) trait is what renderers call.
//!
//! **[`gate`]**: Per-layer flush state shared with the reload interrupt.
//!
//! **[`backend`]**: The [`DisplayController`](backend::DisplayController)
//! and [`ReloadListener`](backend::ReloadListener) contracts that hardware
//! backends implement and call.
//!
//! **[`sync`]**: The [`SyncPrimitive`](sync::SyncPrimitive) a render thread
//! blocks on.
//!
//! **[`blit`]**: Bounds-checked region copy and rotation for 1 to 4 byte
//! pixels.
//!
//! **[`area`]**, **[`format`]**, **[`layer`]**: Flush areas and rotation,
//! pixel format translation, layer identity and descriptors.
//!
//! **[`config`]**: Static controller configuration and flush policy.
//!
//! **[`time`]**: Host tick types for timeouts and trace timestamps.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! flush instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod area;
pub mod backend;
pub mod blit;
pub mod config;
pub mod display;
pub mod format;
pub mod gate;
pub mod layer;
pub mod sync;
pub mod time;
pub mod trace;
