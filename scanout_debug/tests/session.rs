// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Records a simulated double-buffered session and exports it.

use scanout_core::area::Area;
use scanout_core::config::{ControllerConfig, FlushConfig};
use scanout_core::display::{DrawBuffers, FlushTarget, Scanout};
use scanout_core::layer::LayerIndex;
use scanout_core::time::Timebase;
use scanout_core::trace::Tracer;
use scanout_debug::chrome;
use scanout_debug::pretty::PrettyPrintSink;
use scanout_debug::recorder::{RecordedEvent, RecorderSink, decode};
use scanout_sync_harness::{CondvarSync, SimulatedController, now};
use serde_json::Value;

const FRAME: usize = 240 * 320 * 3;

#[test]
fn recorded_session_exports_one_wait_bar_per_frame() {
    let ctrl = SimulatedController::new();
    let s: Scanout<_, CondvarSync> = Scanout::new(&ctrl, ControllerConfig::portrait_240x320_rgb888())
        .with_flush_config(FlushConfig::reference().with_clock(now));
    let bufs = [vec![0_u8; FRAME], vec![0_u8; FRAME]];
    let full = Area::new(0, 0, 239, 319);

    let mut rec = RecorderSink::new();
    {
        let mut d = s
            .create_direct(DrawBuffers::double(&bufs[0], &bufs[1]), LayerIndex::FIRST)
            .expect("layer 0 is configured")
            .with_tracer(Tracer::new(&mut rec));
        for frame in 0..3 {
            d.flush(&full, &bufs[(frame + 1) % 2], true)
                .expect("reload requested");
            assert!(ctrl.vblank(), "reload was pending");
            d.flush_wait().expect("interrupt already fired");
        }
    }

    let bytes = rec.into_bytes();
    let events: Vec<_> = decode(&bytes).collect();
    // Created, then flush, wait and reload per frame.
    assert_eq!(events.len(), 1 + 3 * 3);
    assert!(matches!(events[0], RecordedEvent::DisplayCreated(_)));
    assert!(matches!(
        events[9],
        RecordedEvent::ReloadObserved(e) if e.reloads_completed == 3
    ));

    let mut pretty = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
    for event in &events {
        event.replay(&mut pretty);
    }
    let text = String::from_utf8(pretty.into_writer()).expect("utf-8 output");
    assert_eq!(text.lines().count(), 10);
    assert!(text.starts_with("[display] layer=0 direct 240x320 Rgb888 buffers=2"), "got: {text}");

    let mut out = Vec::new();
    chrome::export(&bytes, Timebase::NANOS, &mut out).expect("write to Vec");
    let parsed: Vec<Value> = serde_json::from_slice(&out).expect("valid JSON");
    let bars = parsed.iter().filter(|e| e["ph"] == "X").count();
    assert_eq!(bars, 3);
}
