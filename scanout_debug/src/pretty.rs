// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line-per-event text output.
//!
//! Times are printed in milliseconds, the scale of a panel's frame period.

use std::io::{self, Write};

use scanout_core::display::{FlushPath, RenderMode};
use scanout_core::time::{Duration, HostTime, Timebase};
use scanout_core::trace::{
    DisplayCreatedEvent, FlushEvent, FlushWaitEvent, ReloadObservedEvent, TraceSink, WaitOutcome,
};

/// Prints one line per event.
///
/// Write errors are ignored; a broken pipe must not stall the flush path.
pub struct PrettyPrintSink<W = io::Stderr> {
    out: W,
    timebase: Timebase,
}

impl<W> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Prints to standard error.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self::with_writer(io::stderr(), timebase)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Prints to `out`.
    #[must_use]
    pub fn with_writer(out: W, timebase: Timebase) -> Self {
        Self { out, timebase }
    }

    /// Returns the destination.
    pub fn into_writer(self) -> W {
        self.out
    }

    fn ms(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1e6
    }

    fn at(&self, t: HostTime) -> f64 {
        self.ms(t.ticks())
    }

    fn span(&self, d: Duration) -> f64 {
        self.ms(d.ticks())
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_display_created(&mut self, e: &DisplayCreatedEvent) {
        let mode = match e.mode {
            RenderMode::Direct => "direct",
            RenderMode::Partial => "partial",
        };
        _ = writeln!(
            self.out,
            "[display] layer={} {mode} {}x{} {:?} buffers={}",
            e.layer.get(),
            e.width,
            e.height,
            e.format,
            if e.double_buffered { 2 } else { 1 },
        );
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        let rect = e.area.to_rect();
        let path = match e.path {
            FlushPath::Synchronous => "sync",
            FlushPath::ReloadRequested => "reload",
        };
        _ = writeln!(
            self.out,
            "[flush] layer={} {}x{}@({},{}) {path}{} t={:.3}ms",
            e.layer.get(),
            rect.width(),
            rect.height(),
            rect.x0,
            rect.y0,
            if e.is_last { " last" } else { "" },
            self.at(e.timestamp),
        );
    }

    fn on_flush_wait(&mut self, e: &FlushWaitEvent) {
        let outcome = match e.outcome {
            WaitOutcome::Immediate => "immediate",
            WaitOutcome::Signaled => "signaled",
            WaitOutcome::TimedOut => "TIMED OUT",
            WaitOutcome::Failed => "FAILED",
        };
        _ = writeln!(
            self.out,
            "[wait] layer={} {outcome} waited={:.3}ms t={:.3}ms",
            e.layer.get(),
            self.span(e.waited),
            self.at(e.timestamp),
        );
    }

    fn on_reload_observed(&mut self, e: &ReloadObservedEvent) {
        _ = writeln!(
            self.out,
            "[reload] layer={} #{} t={:.3}ms",
            e.layer.get(),
            e.reloads_completed,
            self.at(e.timestamp),
        );
    }
}
