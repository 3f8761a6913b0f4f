// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flush-wait metrics and grading.

use scanout_core::display::FlushPath;
use scanout_core::time::{Duration, Timebase};
use scanout_core::trace::{FlushEvent, FlushWaitEvent, TraceSink, WaitOutcome};

/// One flush-wait, as fed into [`FlushTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct FlushSample {
    /// The wait blocked on the sync primitive.
    pub blocked: bool,
    /// Time spent waiting, in milliseconds.
    pub waited_ms: f64,
    /// How the wait ended.
    pub outcome: WaitOutcome,
}

impl FlushSample {
    /// Converts a trace event, reading its duration with `timebase`.
    #[must_use]
    pub fn from_event(e: &FlushWaitEvent, timebase: Timebase) -> Self {
        Self {
            blocked: e.blocked,
            waited_ms: nanos_to_ms(e.waited, timebase),
            outcome: e.outcome,
        }
    }
}

fn nanos_to_ms(d: Duration, timebase: Timebase) -> f64 {
    d.to_nanos(timebase) as f64 / 1_000_000.0
}

/// Letter grade for flush pacing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushGrade {
    /// Every wait ends on the next blank.
    A,
    /// Occasional late or failed waits.
    B,
    /// Degraded but usable.
    C,
    /// Reloads are regularly lost.
    D,
}

impl FlushGrade {
    /// Returns a short label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// Aggregated report returned by [`FlushTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct FlushReport {
    /// Current grade.
    pub grade: FlushGrade,
    /// Timed-out or failed waits per 1000 blocking waits.
    pub failure_rate_per_1000: f64,
    /// Waits longer than two frame periods per 1000 blocking waits.
    pub late_rate_per_1000: f64,
    /// Longest wait observed, in milliseconds.
    pub max_wait_ms: f64,
    /// Total flush-waits observed.
    pub total_waits: u64,
    /// Flush-waits that blocked.
    pub blocked_waits: u64,
    /// Flushes that requested a reload.
    pub reload_requests: u64,
}

/// Rolling flush tracker with a fixed-size history of wait times.
///
/// Also a [`TraceSink`]: attach it to a display's tracer and it observes
/// every flush and flush-wait on its own.
#[derive(Debug)]
pub struct FlushTracker<const N: usize> {
    waits_ms: [f64; N],
    cursor: usize,
    frame_period_ms: f64,
    timebase: Timebase,
    total_waits: u64,
    blocked_waits: u64,
    late_waits: u64,
    failed_waits: u64,
    reload_requests: u64,
    max_wait_ms: f64,
}

impl<const N: usize> Default for FlushTracker<N> {
    fn default() -> Self {
        Self::new(16.67, Timebase::NANOS)
    }
}

impl<const N: usize> FlushTracker<N> {
    /// Creates a tracker for a panel refreshing every `frame_period_ms`,
    /// reading trace durations with `timebase`.
    #[must_use]
    pub const fn new(frame_period_ms: f64, timebase: Timebase) -> Self {
        Self {
            waits_ms: [0.0; N],
            cursor: 0,
            frame_period_ms,
            timebase,
            total_waits: 0,
            blocked_waits: 0,
            late_waits: 0,
            failed_waits: 0,
            reload_requests: 0,
            max_wait_ms: 0.0,
        }
    }

    /// Observes one flush-wait and returns an updated report.
    pub fn observe(&mut self, sample: FlushSample) -> FlushReport {
        self.total_waits = self.total_waits.saturating_add(1);
        if sample.blocked {
            self.blocked_waits = self.blocked_waits.saturating_add(1);
            self.waits_ms[self.cursor % N] = sample.waited_ms;
            self.cursor = (self.cursor + 1) % N;
            self.max_wait_ms = self.max_wait_ms.max(sample.waited_ms);
            if sample.waited_ms > 2.0 * self.frame_period_ms {
                self.late_waits = self.late_waits.saturating_add(1);
            }
        }
        if matches!(sample.outcome, WaitOutcome::TimedOut | WaitOutcome::Failed) {
            self.failed_waits = self.failed_waits.saturating_add(1);
        }
        self.report()
    }

    /// The report as of the last observation.
    #[must_use]
    pub fn report(&self) -> FlushReport {
        let failure_rate = per_1000(self.failed_waits, self.blocked_waits);
        let late_rate = per_1000(self.late_waits, self.blocked_waits);
        FlushReport {
            grade: grade_for(failure_rate, late_rate),
            failure_rate_per_1000: failure_rate,
            late_rate_per_1000: late_rate,
            max_wait_ms: self.max_wait_ms,
            total_waits: self.total_waits,
            blocked_waits: self.blocked_waits,
            reload_requests: self.reload_requests,
        }
    }

    /// Returns blocking wait times oldest→newest.
    #[must_use]
    pub fn waits(&self) -> [f64; N] {
        core::array::from_fn(|i| self.waits_ms[(self.cursor + i) % N])
    }

    /// Returns an ASCII sparkline over [`waits`](Self::waits).
    #[must_use]
    pub fn sparkline_ascii(&self, min_ms: f64, max_ms: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        self.waits()
            .iter()
            .map(|&v| {
                let t = (v.clamp(min_ms, max_ms) - min_ms) / (max_ms - min_ms);
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "index is clamped to ASCII level count"
                )]
                let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
                char::from(LEVELS[level])
            })
            .collect()
    }
}

impl<const N: usize> TraceSink for FlushTracker<N> {
    fn on_flush(&mut self, e: &FlushEvent) {
        if e.path == FlushPath::ReloadRequested {
            self.reload_requests = self.reload_requests.saturating_add(1);
        }
    }

    fn on_flush_wait(&mut self, e: &FlushWaitEvent) {
        let sample = FlushSample::from_event(e, self.timebase);
        self.observe(sample);
    }
}

fn per_1000(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 1000.0 / total as f64
    }
}

fn grade_for(failure_rate_per_1000: f64, late_rate_per_1000: f64) -> FlushGrade {
    if failure_rate_per_1000 < 1.0 && late_rate_per_1000 < 5.0 {
        FlushGrade::A
    } else if failure_rate_per_1000 < 5.0 && late_rate_per_1000 < 20.0 {
        FlushGrade::B
    } else if failure_rate_per_1000 < 20.0 && late_rate_per_1000 < 80.0 {
        FlushGrade::C
    } else {
        FlushGrade::D
    }
}
