// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Partial mode and two-layer configurations sharing one reload interrupt.

use std::thread;
use std::time::Duration as StdDuration;

use scanout_core::area::{Area, Rotation};
use scanout_core::config::{ConfigError, ControllerConfig, FlushConfig};
use scanout_core::display::{DrawBuffers, FlushPath, FlushTarget, RenderMode, Scanout};
use scanout_core::format::{ColorFormat, LayerPixelFormat};
use scanout_core::layer::{FrameAddr, LayerIndex};
use scanout_sync_harness::{CondvarSync, SimulatedController, fill, now, pixel_at};

const RGB888_FRAME: usize = 240 * 320 * 3;
const RGB565_FRAME: usize = 240 * 320 * 2;

fn two_layers() -> ControllerConfig {
    ControllerConfig::portrait_240x320_rgb888()
        .with_fullscreen_layer(LayerIndex::SECOND, LayerPixelFormat::Rgb565)
}

#[test]
fn partial_region_lands_at_its_offset() {
    let config = ControllerConfig::portrait_240x320_rgb888()
        .with_fullscreen_layer(LayerIndex::FIRST, LayerPixelFormat::Rgb565);
    let ctrl = SimulatedController::new();
    let s: Scanout<_, CondvarSync> = Scanout::new(&ctrl, config);
    let mut scratch = vec![0_u8; 10 * 10 * 2];
    fill(&mut scratch, 0x1F_u16.to_ne_bytes()).expect("whole pixels");
    let mut frame = vec![0_u8; RGB565_FRAME];
    let frame_addr = FrameAddr::of(&frame);
    let mut d = s
        .create_partial(DrawBuffers::single(&scratch), &mut frame, LayerIndex::FIRST)
        .expect("layer 0 is configured");
    assert_eq!(d.render_mode(), RenderMode::Partial);
    assert_eq!(d.color_format(), ColorFormat::Rgb565);
    assert_eq!(ctrl.scanned_address(LayerIndex::FIRST), frame_addr);

    let area = Area::from_origin_size(5, 5, 10, 10);
    assert_eq!(d.flush(&area, &scratch, true), Ok(FlushPath::Synchronous));
    assert_eq!(d.flush_wait(), Ok(()));

    let fb = d.frame_buffer().expect("partial display");
    for y in 0..320 {
        for x in 0..240 {
            let inside = (5..15).contains(&y) && (5..15).contains(&x);
            let px = pixel_at::<u16>(fb, y * 240 + x).expect("inside frame");
            assert_eq!(px, if inside { 0x1F } else { 0 }, "pixel ({x}, {y})");
        }
    }
    assert!(ctrl.reload_requests().is_empty());
}

#[test]
fn partial_frame_in_strips_with_rotation() {
    let ctrl = SimulatedController::new();
    let s: Scanout<_, CondvarSync> =
        Scanout::new(&ctrl, ControllerConfig::portrait_240x320_rgb888());
    // Landscape strips of 320x40 pixels.
    let mut strip = vec![0_u8; 320 * 40 * 3];
    let mut frame = vec![0_u8; RGB888_FRAME];
    let mut d = s
        .create_partial(
            DrawBuffers::single(&strip),
            &mut frame,
            LayerIndex::FIRST,
        )
        .expect("layer 0 is configured");
    d.set_rotation(Rotation::Deg270);
    assert_eq!(d.resolution(), (320, 240));

    for (i, y) in (0..240).step_by(40).enumerate() {
        let shade = u8::try_from(i + 1).expect("six strips");
        fill(&mut strip, [shade; 3]).expect("whole pixels");
        let area = Area::from_origin_size(0, y, 320, 40);
        assert_eq!(d.flush(&area, &strip, y == 200), Ok(FlushPath::Synchronous));
        assert_eq!(d.flush_wait(), Ok(()));
    }
    let fb = d.frame_buffer().expect("partial display");
    assert!(
        (0..240 * 320).all(|i| pixel_at::<[u8; 3]>(fb, i).is_some_and(|px| px != [0; 3])),
        "every panel pixel was written"
    );
}

#[test]
fn interrupt_only_signals_the_owning_layer() {
    let ctrl = SimulatedController::new();
    let s: Scanout<_, CondvarSync> = Scanout::new(&ctrl, two_layers())
        .with_flush_config(FlushConfig::reference().with_clock(now));
    let bufs = [vec![0_u8; RGB888_FRAME], vec![0_u8; RGB888_FRAME]];
    let scratch = vec![0_u8; 240 * 2];
    let mut overlay_fb = vec![0_u8; RGB565_FRAME];

    let mut base = s
        .create_direct(DrawBuffers::double(&bufs[0], &bufs[1]), LayerIndex::FIRST)
        .expect("layer 0 is configured");
    let mut overlay = s
        .create_partial(DrawBuffers::single(&scratch), &mut overlay_fb, LayerIndex::SECOND)
        .expect("layer 1 is configured");
    assert_eq!(ctrl.starts(), 1);

    let l0 = s.gate().layer(LayerIndex::FIRST);
    let l1 = s.gate().layer(LayerIndex::SECOND);
    assert!(l0.has_sync());
    assert!(!l1.has_sync());

    assert_eq!(
        base.flush(&Area::new(0, 0, 239, 319), &bufs[1], true),
        Ok(FlushPath::ReloadRequested)
    );
    assert_eq!(
        overlay.flush(&Area::new(0, 0, 239, 0), &scratch, true),
        Ok(FlushPath::Synchronous)
    );
    assert!(l0.is_interrupt_owned());
    assert!(!l1.is_interrupt_owned());

    assert!(ctrl.vblank());
    assert!(!l0.is_interrupt_owned());
    assert_eq!(l0.reloads_completed(), 1);
    assert_eq!(l1.reloads_completed(), 0);
    assert_eq!(base.flush_wait(), Ok(()));
    assert_eq!(overlay.flush_wait(), Ok(()));
}

#[test]
fn both_layers_reload_in_one_blank() {
    let ctrl = SimulatedController::new();
    let s: Scanout<_, CondvarSync> = Scanout::new(&ctrl, two_layers());
    let base_bufs = [vec![0_u8; RGB888_FRAME], vec![0_u8; RGB888_FRAME]];
    let overlay_bufs = [vec![0_u8; RGB565_FRAME], vec![0_u8; RGB565_FRAME]];

    let mut base = s
        .create_direct(
            DrawBuffers::double(&base_bufs[0], &base_bufs[1]),
            LayerIndex::FIRST,
        )
        .expect("layer 0 is configured");
    let mut overlay = s
        .create_direct(
            DrawBuffers::double(&overlay_bufs[0], &overlay_bufs[1]),
            LayerIndex::SECOND,
        )
        .expect("layer 1 is configured");

    assert_eq!(
        base.flush(&Area::new(0, 0, 239, 319), &base_bufs[1], true),
        Ok(FlushPath::ReloadRequested)
    );
    assert_eq!(
        overlay.flush(&Area::new(0, 0, 239, 319), &overlay_bufs[1], true),
        Ok(FlushPath::ReloadRequested)
    );

    thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(StdDuration::from_millis(5));
            assert!(ctrl.vblank(), "one latch covers both layers");
        });
        assert_eq!(base.flush_wait(), Ok(()));
        assert_eq!(overlay.flush_wait(), Ok(()));
    });
    assert_eq!(ctrl.reloads_latched(), 1);
    assert_eq!(
        ctrl.scanned_address(LayerIndex::SECOND),
        FrameAddr::of(&overlay_bufs[1])
    );
    assert_eq!(s.gate().layer(LayerIndex::FIRST).reloads_completed(), 1);
    assert_eq!(s.gate().layer(LayerIndex::SECOND).reloads_completed(), 1);
}

#[test]
fn layers_are_claimed_until_dropped() {
    let ctrl = SimulatedController::new();
    let s: Scanout<_, CondvarSync> = Scanout::new(&ctrl, two_layers());
    let buf = vec![0_u8; RGB888_FRAME];
    let d = s
        .create_direct(DrawBuffers::single(&buf), LayerIndex::FIRST)
        .expect("layer 0 is configured");
    let mut frame = vec![0_u8; RGB888_FRAME];
    assert_eq!(
        s.create_partial(DrawBuffers::single(&buf), &mut frame, LayerIndex::FIRST)
            .map(drop),
        Err(ConfigError::LayerInUse(LayerIndex::FIRST))
    );
    drop(d);
    let _partial = s
        .create_partial(DrawBuffers::single(&buf), &mut frame, LayerIndex::FIRST)
        .expect("layer 0 was released");
    assert_eq!(ctrl.starts(), 1);
}
