// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome trace export.
//!
//! [`export`] turns a [`RecorderSink`](crate::recorder::RecorderSink)
//! recording into the JSON array format read by `chrome://tracing` and
//! [Perfetto](https://ui.perfetto.dev/). Each layer gets its own track.
//! A flush-wait that blocked is drawn as a bar from the moment it started
//! to the moment the reload interrupt (or the timeout) released it, so
//! frames that missed a blank stand out. Flushes and non-blocking waits are
//! instant markers, and completed reloads feed a per-layer counter.

use std::io::{self, Write};

use serde_json::{Value, json};

use scanout_core::time::{Duration, HostTime, Timebase};
use scanout_core::trace::{DisplayCreatedEvent, FlushEvent, FlushWaitEvent, ReloadObservedEvent};

use crate::recorder::{RecordedEvent, decode};

/// Writes `bytes`, a recording, as Chrome trace JSON.
///
/// Ticks are converted to the format's microseconds with `timebase`.
pub fn export(bytes: &[u8], timebase: Timebase, out: &mut dyn Write) -> io::Result<()> {
    let track = Tracks { timebase };
    let events: Vec<Value> = decode(bytes)
        .map(|event| match event {
            RecordedEvent::DisplayCreated(e) => track.name(&e),
            RecordedEvent::Flush(e) => track.flush(&e),
            RecordedEvent::FlushWait(e) => track.wait(&e),
            RecordedEvent::ReloadObserved(e) => track.reloads(&e),
        })
        .collect();
    serde_json::to_writer_pretty(out, &events)?;
    Ok(())
}

struct Tracks {
    timebase: Timebase,
}

impl Tracks {
    fn us(&self, t: HostTime) -> f64 {
        self.span_us(Duration(t.ticks()))
    }

    fn span_us(&self, d: Duration) -> f64 {
        d.to_nanos(self.timebase) as f64 / 1e3
    }

    fn name(&self, e: &DisplayCreatedEvent) -> Value {
        json!({
            "ph": "M",
            "name": "thread_name",
            "pid": 0,
            "tid": e.layer.get(),
            "args": {
                "name": format!(
                    "layer {} {:?} {}x{} {:?}{}",
                    e.layer.get(),
                    e.mode,
                    e.width,
                    e.height,
                    e.format,
                    if e.double_buffered { " double" } else { "" },
                )
            }
        })
    }

    fn flush(&self, e: &FlushEvent) -> Value {
        let rect = e.area.to_rect();
        json!({
            "ph": "i",
            "s": "t",
            "name": format!("{:?}", e.path),
            "cat": "flush",
            "ts": self.us(e.timestamp),
            "pid": 0,
            "tid": e.layer.get(),
            "args": {
                "x": rect.x0,
                "y": rect.y0,
                "width": rect.width(),
                "height": rect.height(),
                "pixels": rect.area(),
                "is_last": e.is_last
            }
        })
    }

    fn wait(&self, e: &FlushWaitEvent) -> Value {
        let end = self.us(e.timestamp);
        let mut event = json!({
            "name": "flush_wait",
            "cat": "wait",
            "pid": 0,
            "tid": e.layer.get(),
            "args": { "outcome": format!("{:?}", e.outcome) }
        });
        if e.blocked {
            let dur = self.span_us(e.waited);
            event["ph"] = "X".into();
            event["ts"] = (end - dur).into();
            event["dur"] = dur.into();
        } else {
            event["ph"] = "i".into();
            event["s"] = "t".into();
            event["ts"] = end.into();
        }
        event
    }

    fn reloads(&self, e: &ReloadObservedEvent) -> Value {
        json!({
            "ph": "C",
            "name": format!("layer {} reloads", e.layer.get()),
            "ts": self.us(e.timestamp),
            "pid": 0,
            "args": { "completed": e.reloads_completed }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use scanout_core::area::Area;
    use scanout_core::display::FlushPath;
    use scanout_core::layer::LayerIndex;
    use scanout_core::trace::{TraceSink, WaitOutcome};

    fn exported(rec: &RecorderSink, timebase: Timebase) -> Vec<Value> {
        let mut out = Vec::new();
        export(rec.as_bytes(), timebase, &mut out).expect("write to Vec");
        serde_json::from_slice(&out).expect("valid JSON")
    }

    #[test]
    fn blocking_wait_becomes_a_bar() {
        let mut rec = RecorderSink::new();
        rec.on_flush(&FlushEvent {
            layer: LayerIndex::SECOND,
            area: Area::new(0, 0, 239, 319),
            is_last: true,
            path: FlushPath::ReloadRequested,
            timestamp: HostTime(1_000_000),
        });
        rec.on_flush_wait(&FlushWaitEvent {
            layer: LayerIndex::SECOND,
            blocked: true,
            waited: Duration(16_000_000),
            outcome: WaitOutcome::Signaled,
            timestamp: HostTime(17_000_000),
        });
        rec.on_flush_wait(&FlushWaitEvent {
            layer: LayerIndex::SECOND,
            blocked: false,
            waited: Duration::ZERO,
            outcome: WaitOutcome::Immediate,
            timestamp: HostTime(17_500_000),
        });

        let events = exported(&rec, Timebase::NANOS);
        assert_eq!(events.len(), 3);

        assert_eq!(events[0]["ph"], "i");
        assert_eq!(events[0]["name"], "ReloadRequested");
        assert_eq!(events[0]["tid"], 1);
        assert_eq!(events[0]["args"]["pixels"], 76_800.0);

        assert_eq!(events[1]["ph"], "X");
        assert_eq!(events[1]["ts"], 1_000.0);
        assert_eq!(events[1]["dur"], 16_000.0);

        assert_eq!(events[2]["ph"], "i");
        assert_eq!(events[2]["ts"], 17_500.0);
        assert_eq!(events[2]["args"]["outcome"], "Immediate");
    }

    #[test]
    fn reload_counter_in_system_ticks() {
        let mut rec = RecorderSink::new();
        rec.on_reload_observed(&ReloadObservedEvent {
            layer: LayerIndex::FIRST,
            reloads_completed: 4,
            timestamp: HostTime(33),
        });
        let events = exported(&rec, Timebase::from_hz(1_000));
        assert_eq!(events[0]["ph"], "C");
        assert_eq!(events[0]["ts"], 33_000.0);
        assert_eq!(events[0]["args"]["completed"], 4);
    }

    #[test]
    fn empty_recording_is_an_empty_array() {
        let events = exported(&RecorderSink::new(), Timebase::NANOS);
        assert!(events.is_empty(), "nothing was recorded");
    }
}
