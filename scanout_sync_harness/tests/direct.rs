// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Direct-mode flushes against a simulated controller whose reload
//! interrupt arrives on another thread.

use std::sync::Arc;
use std::thread;
use std::time::{Duration as StdDuration, Instant};

use scanout_core::area::Area;
use scanout_core::backend::{ReloadError, ReloadMode};
use scanout_core::config::{ControllerConfig, FlushConfig};
use scanout_core::display::{DrawBuffers, FlushError, FlushPath, FlushTarget, RenderMode, Scanout};
use scanout_core::format::ColorFormat;
use scanout_core::layer::{FrameAddr, LayerIndex};
use scanout_core::time::Duration;
use scanout_sync_harness::{CondvarSync, SimulatedController, VblankPump, fill, now, pixel_at};

const FRAME: usize = 240 * 320 * 3;
const FULL: Area = Area::new(0, 0, 239, 319);

fn scanout(ctrl: &SimulatedController, flush: FlushConfig) -> Scanout<&SimulatedController, CondvarSync> {
    Scanout::new(ctrl, ControllerConfig::portrait_240x320_rgb888())
        .with_flush_config(flush.with_clock(now))
}

#[test]
fn flush_wait_blocks_until_the_interrupt() {
    let ctrl = SimulatedController::new();
    let s = scanout(&ctrl, FlushConfig::reference());
    let bufs = [vec![0_u8; FRAME], vec![0_u8; FRAME]];
    let mut d = s
        .create_direct(DrawBuffers::double(&bufs[0], &bufs[1]), LayerIndex::FIRST)
        .expect("layer 0 is configured");
    assert_eq!(d.render_mode(), RenderMode::Direct);
    assert_eq!(d.color_format(), ColorFormat::Rgb888);
    assert_eq!(d.resolution(), (240, 320));
    assert!(ctrl.reload_interrupt_enabled());
    assert!(ctrl.is_visible(LayerIndex::FIRST));
    assert_eq!(ctrl.scanned_address(LayerIndex::FIRST), FrameAddr::of(&bufs[0]));

    assert_eq!(d.flush(&FULL, &bufs[1], true), Ok(FlushPath::ReloadRequested));
    let state = s.gate().layer(LayerIndex::FIRST);
    assert!(state.is_interrupt_owned());
    // Still scanning out the old buffer until the blank.
    assert_eq!(ctrl.scanned_address(LayerIndex::FIRST), FrameAddr::of(&bufs[0]));

    thread::scope(|scope| {
        let irq = scope.spawn(|| {
            thread::sleep(StdDuration::from_millis(20));
            ctrl.vblank()
        });
        let start = Instant::now();
        assert_eq!(d.flush_wait(), Ok(()));
        assert!(
            start.elapsed() >= StdDuration::from_millis(15),
            "flush-wait returned before the interrupt"
        );
        assert!(irq.join().expect("interrupt thread"), "reload was latched");
    });
    assert!(!state.is_interrupt_owned());
    assert_eq!(ctrl.scanned_address(LayerIndex::FIRST), FrameAddr::of(&bufs[1]));
    assert_eq!(state.reloads_completed(), 1);
    // Waiting again does not block.
    assert_eq!(d.flush_wait(), Ok(()));
}

#[test]
fn frames_alternate_between_buffers() {
    let ctrl = Arc::new(SimulatedController::new());
    let s = scanout(&ctrl, FlushConfig::hardened(Duration(2_000_000_000)));
    let mut bufs = [vec![0_u8; FRAME], vec![0_u8; FRAME]];
    let buffers = DrawBuffers::double(&bufs[0], &bufs[1]);
    let pump = VblankPump::start(Arc::clone(&ctrl), StdDuration::from_millis(2));
    {
        let mut d = s
            .create_direct(buffers, LayerIndex::FIRST)
            .expect("layer 0 is configured");
        for frame in 0..12_u8 {
            let back = &mut bufs[usize::from(frame % 2 == 0)];
            fill(back, [frame, frame, frame]).expect("whole pixels");
            // Two strips, then the last flush of the frame.
            let top = Area::new(0, 0, 239, 159);
            assert_eq!(d.flush(&top, back, false), Ok(FlushPath::Synchronous));
            assert_eq!(d.flush_wait(), Ok(()));
            assert_eq!(d.flush(&FULL, back, true), Ok(FlushPath::ReloadRequested));
            assert_eq!(d.flush_wait(), Ok(()));
            assert_eq!(ctrl.scanned_address(LayerIndex::FIRST), FrameAddr::of(back));
            assert_eq!(pixel_at::<[u8; 3]>(back, 240 * 320 - 1), Some([frame; 3]));
        }
    }
    assert!(pump.stop() >= 12, "every frame needed a blank");
    assert_eq!(ctrl.reload_requests().len(), 12);
    assert_eq!(s.gate().layer(LayerIndex::FIRST).reloads_completed(), 12);
}

#[test]
fn single_buffer_never_requests_reloads() {
    let ctrl = SimulatedController::new();
    let s = scanout(&ctrl, FlushConfig::reference());
    let buf = vec![0_u8; FRAME];
    let mut d = s
        .create_direct(DrawBuffers::single(&buf), LayerIndex::FIRST)
        .expect("layer 0 is configured");
    assert!(!d.is_double_buffered());
    assert!(!ctrl.reload_interrupt_enabled());
    for _ in 0..3 {
        assert_eq!(d.flush(&FULL, &buf, true), Ok(FlushPath::Synchronous));
        assert_eq!(d.flush_wait(), Ok(()));
    }
    assert!(ctrl.reload_requests().is_empty());
}

#[test]
fn immediate_reload_completes_within_flush() {
    let ctrl = SimulatedController::new();
    let flush = FlushConfig {
        reload_mode: ReloadMode::Immediate,
        ..FlushConfig::reference()
    };
    let s = scanout(&ctrl, flush);
    let bufs = [vec![0_u8; FRAME], vec![0_u8; FRAME]];
    let mut d = s
        .create_direct(DrawBuffers::double(&bufs[0], &bufs[1]), LayerIndex::FIRST)
        .expect("layer 0 is configured");
    assert_eq!(d.flush(&FULL, &bufs[1], true), Ok(FlushPath::ReloadRequested));
    // The listener ran synchronously; no blank is needed.
    assert_eq!(d.flush_wait(), Ok(()));
    assert_eq!(ctrl.scanned_address(LayerIndex::FIRST), FrameAddr::of(&bufs[1]));
    assert_eq!(ctrl.reload_requests(), [ReloadMode::Immediate]);
}

#[test]
fn lost_interrupt_times_out_and_recovers() {
    let ctrl = SimulatedController::new();
    let s = scanout(&ctrl, FlushConfig::hardened(Duration(50_000_000)));
    let bufs = [vec![0_u8; FRAME], vec![0_u8; FRAME]];
    let mut d = s
        .create_direct(DrawBuffers::double(&bufs[0], &bufs[1]), LayerIndex::FIRST)
        .expect("layer 0 is configured");
    let state = s.gate().layer(LayerIndex::FIRST);

    assert_eq!(d.flush(&FULL, &bufs[1], true), Ok(FlushPath::ReloadRequested));
    assert_eq!(d.flush_wait(), Err(FlushError::Timeout));
    assert!(!state.is_interrupt_owned());

    // The late blank latches the buffer but signals nobody.
    assert!(ctrl.vblank());
    assert_eq!(state.reloads_completed(), 0);

    assert_eq!(d.flush(&FULL, &bufs[0], true), Ok(FlushPath::ReloadRequested));
    thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(StdDuration::from_millis(5));
            ctrl.vblank();
        });
        assert_eq!(d.flush_wait(), Ok(()));
    });
    assert_eq!(state.reloads_completed(), 1);
    assert_eq!(ctrl.scanned_address(LayerIndex::FIRST), FrameAddr::of(&bufs[0]));
}

#[test]
fn refused_reload_does_not_block() {
    let ctrl = SimulatedController::new();
    let s = scanout(&ctrl, FlushConfig::reference());
    let bufs = [vec![0_u8; FRAME], vec![0_u8; FRAME]];
    let mut d = s
        .create_direct(DrawBuffers::double(&bufs[0], &bufs[1]), LayerIndex::FIRST)
        .expect("layer 0 is configured");
    ctrl.fail_next_reload(ReloadError::Busy);
    assert_eq!(
        d.flush(&FULL, &bufs[1], true),
        Err(FlushError::Reload(ReloadError::Busy))
    );
    assert_eq!(d.flush_wait(), Ok(()));
    assert!(!ctrl.has_pending_reload());

    assert_eq!(d.flush(&FULL, &bufs[1], true), Ok(FlushPath::ReloadRequested));
    assert!(ctrl.vblank());
    assert_eq!(d.flush_wait(), Ok(()));
}
