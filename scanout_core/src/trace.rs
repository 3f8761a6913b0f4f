// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the flush path.
//!
//! A [`Display`](crate::display::Display) reports what each flush and
//! flush-wait did to the [`TraceSink`] behind its [`Tracer`]. Sinks override
//! only the events they record.
//!
//! Events are only ever emitted on the render thread. The reload interrupt
//! never traces; its effect is reported afterwards as a
//! [`ReloadObservedEvent`] once the waiting flush resumes.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::area::Area;
use crate::display::{FlushPath, RenderMode};
use crate::format::ColorFormat;
use crate::layer::LayerIndex;
use crate::time::{Duration, HostTime};

/// How a flush-wait ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaitOutcome {
    /// The flush had already completed.
    Immediate,
    /// The reload interrupt released the wait.
    Signaled,
    /// The wait gave up.
    TimedOut,
    /// The sync primitive failed.
    Failed,
}

/// Emitted when a display is created for a layer.
#[derive(Clone, Copy, Debug)]
pub struct DisplayCreatedEvent {
    /// Layer the display drives.
    pub layer: LayerIndex,
    /// Render mode.
    pub mode: RenderMode,
    /// Horizontal resolution in pixels.
    pub width: u32,
    /// Vertical resolution in pixels.
    pub height: u32,
    /// Renderer color format.
    pub format: ColorFormat,
    /// Whether two renderer buffers were supplied.
    pub double_buffered: bool,
}

/// Emitted at the end of every flush.
#[derive(Clone, Copy, Debug)]
pub struct FlushEvent {
    /// Layer flushed to.
    pub layer: LayerIndex,
    /// Area in logical coordinates.
    pub area: Area,
    /// Whether the renderer marked this as the last flush of the frame.
    pub is_last: bool,
    /// What the flush did.
    pub path: FlushPath,
    /// Host time when the flush finished.
    pub timestamp: HostTime,
}

/// Emitted when a flush-wait returns.
#[derive(Clone, Copy, Debug)]
pub struct FlushWaitEvent {
    /// Layer waited on.
    pub layer: LayerIndex,
    /// Whether the wait had to block.
    pub blocked: bool,
    /// Time spent waiting.
    pub waited: Duration,
    /// How the wait ended.
    pub outcome: WaitOutcome,
    /// Host time when the wait returned.
    pub timestamp: HostTime,
}

/// Emitted after a blocking flush-wait was released by the reload
/// interrupt.
#[derive(Clone, Copy, Debug)]
pub struct ReloadObservedEvent {
    /// Layer whose reload completed.
    pub layer: LayerIndex,
    /// Reloads acknowledged for this layer so far.
    pub reloads_completed: u32,
    /// Host time when the render thread resumed.
    pub timestamp: HostTime,
}

/// Receives flush-path events. Every method defaults to doing nothing.
pub trait TraceSink {
    /// Called when a display is created.
    fn on_display_created(&mut self, e: &DisplayCreatedEvent) {
        _ = e;
    }

    /// Called at the end of every flush.
    fn on_flush(&mut self, e: &FlushEvent) {
        _ = e;
    }

    /// Called when a flush-wait returns.
    fn on_flush_wait(&mut self, e: &FlushWaitEvent) {
        _ = e;
    }

    /// Called after the render thread observes a completed reload.
    fn on_reload_observed(&mut self, e: &ReloadObservedEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

/// The flush path's handle on an optional [`TraceSink`].
///
/// Without the `trace` feature a `Tracer` is a zero-sized marker and every
/// emit call is empty. With it, each call checks for a sink first.
#[derive(Default)]
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    sink: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &cfg!(feature = "trace"))
            .finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Routes events to `sink`.
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self::none()
        }
    }

    /// Drops every event.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[inline]
    fn emit(&mut self, f: impl FnOnce(&mut dyn TraceSink)) {
        #[cfg(feature = "trace")]
        if let Some(sink) = self.sink.as_deref_mut() {
            f(sink);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = f;
        }
    }

    /// Emits a [`DisplayCreatedEvent`].
    #[inline]
    pub fn display_created(&mut self, e: &DisplayCreatedEvent) {
        self.emit(|sink| sink.on_display_created(e));
    }

    /// Emits a [`FlushEvent`].
    #[inline]
    pub fn flush(&mut self, e: &FlushEvent) {
        self.emit(|sink| sink.on_flush(e));
    }

    /// Emits a [`FlushWaitEvent`].
    #[inline]
    pub fn flush_wait(&mut self, e: &FlushWaitEvent) {
        self.emit(|sink| sink.on_flush_wait(e));
    }

    /// Emits a [`ReloadObservedEvent`].
    #[inline]
    pub fn reload_observed(&mut self, e: &ReloadObservedEvent) {
        self.emit(|sink| sink.on_reload_observed(e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_flush() -> FlushEvent {
        FlushEvent {
            layer: LayerIndex::FIRST,
            area: Area::new(0, 0, 239, 319),
            is_last: true,
            path: FlushPath::ReloadRequested,
            timestamp: HostTime(1_000),
        }
    }

    #[test]
    fn sinks_ignore_unhandled_events() {
        let mut sink = NoopSink;
        sink.on_flush(&frame_flush());
        sink.on_reload_observed(&ReloadObservedEvent {
            layer: LayerIndex::SECOND,
            reloads_completed: 3,
            timestamp: HostTime(0),
        });
    }

    #[test]
    fn detached_tracer_drops_events() {
        let mut tracer = Tracer::none();
        tracer.flush(&frame_flush());
        tracer.flush_wait(&FlushWaitEvent {
            layer: LayerIndex::FIRST,
            blocked: false,
            waited: Duration::ZERO,
            outcome: WaitOutcome::Immediate,
            timestamp: HostTime(0),
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn attached_tracer_reaches_its_sink() {
        use alloc::vec::Vec;

        #[derive(Default)]
        struct Outcomes(Vec<WaitOutcome>);

        impl TraceSink for Outcomes {
            fn on_flush_wait(&mut self, e: &FlushWaitEvent) {
                self.0.push(e.outcome);
            }
        }

        let mut sink = Outcomes::default();
        let mut tracer = Tracer::new(&mut sink);
        tracer.flush(&frame_flush());
        tracer.flush_wait(&FlushWaitEvent {
            layer: LayerIndex::FIRST,
            blocked: true,
            waited: Duration(16),
            outcome: WaitOutcome::Signaled,
            timestamp: HostTime(1_016),
        });
        drop(tracer);
        assert_eq!(sink.0, [WaitOutcome::Signaled]);
    }
}
