// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-side simulation and flush metrics for scanout.
//!
//! This crate runs the flush engine without hardware:
//!
//! - [`SimulatedController`] plays the display controller. Reloads latch when
//!   a test calls [`SimulatedController::vblank`] or a [`VblankPump`] does it
//!   from a background thread, which then plays the interrupt.
//! - [`CondvarSync`] is a blocking [`SyncPrimitive`] for host threads.
//! - [`FlushTracker`] grades flush-wait pacing and doubles as a
//!   [`TraceSink`].
//! - [`now`] is a nanosecond clock for [`FlushConfig::with_clock`].
//!
//! [`SyncPrimitive`]: scanout_core::sync::SyncPrimitive
//! [`TraceSink`]: scanout_core::trace::TraceSink
//! [`FlushConfig::with_clock`]: scanout_core::config::FlushConfig::with_clock

mod condvar;
mod metrics;
mod sim;

use std::sync::OnceLock;
use std::time::Instant;

use bytemuck::{Pod, PodCastError};
use scanout_core::time::HostTime;

pub use condvar::CondvarSync;
pub use metrics::{FlushGrade, FlushReport, FlushSample, FlushTracker};
pub use sim::{SimulatedController, VblankPump};

/// Nanoseconds since the first call in this process.
#[must_use]
pub fn now() -> HostTime {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let nanos = EPOCH.get_or_init(Instant::now).elapsed().as_nanos();
    HostTime(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Fills `buf` with copies of `pixel`.
///
/// Fails if `buf` is not a whole number of pixels.
pub fn fill<P: Pod>(buf: &mut [u8], pixel: P) -> Result<(), PodCastError> {
    bytemuck::try_cast_slice_mut::<u8, P>(buf)?.fill(pixel);
    Ok(())
}

/// Reads the pixel at `index`, counting in pixels of type `P`.
#[must_use]
pub fn pixel_at<P: Pod>(buf: &[u8], index: usize) -> Option<P> {
    let size = size_of::<P>();
    let bytes = buf.get(index.checked_mul(size)?..)?.get(..size)?;
    Some(bytemuck::pod_read_unaligned(bytes))
}
