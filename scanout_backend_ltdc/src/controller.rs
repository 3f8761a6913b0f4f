// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`DisplayController`] implementation over the LTDC register block.

use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use scanout_core::backend::{
    ControllerError, DisplayController, ReloadError, ReloadListener, ReloadMode,
};
use scanout_core::config::{Blending, ControllerConfig, LayerConfig, PanelTiming, Polarity};
use scanout_core::layer::{FrameAddr, LayerIndex};
use spin::RwLock;

use crate::regs::{self, Registers};

/// Counts of interrupts taken, by cause.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InterruptStats {
    /// Register reloads acknowledged.
    pub reloads: u32,
    /// Line interrupts.
    pub lines: u32,
    /// FIFO underruns.
    pub fifo_underruns: u32,
    /// Transfer errors.
    pub transfer_errors: u32,
}

#[derive(Default)]
struct Counters {
    reloads: AtomicU32,
    lines: AtomicU32,
    fifo_underruns: AtomicU32,
    transfer_errors: AtomicU32,
}

/// Synchronization, back porch, active and total widths, packed as the
/// SSCR, BPCR, AWCR and TWCR register values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TimingWords {
    pub(crate) sscr: u32,
    pub(crate) bpcr: u32,
    pub(crate) awcr: u32,
    pub(crate) twcr: u32,
}

impl TimingWords {
    /// Accumulates the panel timing into the controller's cumulative
    /// counters. Horizontal counters are 12 bits wide, vertical ones 11.
    pub(crate) fn encode(t: &PanelTiming) -> Result<Self, ControllerError> {
        let h = [t.hsync, t.hbp, t.width, t.hfp].map(u32::from);
        let v = [t.vsync, t.vbp, t.height, t.vfp].map(u32::from);
        if h.contains(&0) || v[..3].contains(&0) {
            return Err(ControllerError::TimingOutOfRange);
        }
        let hsw = h[0] - 1;
        let ahbp = hsw + h[1];
        let aaw = ahbp + h[2];
        let totalw = aaw + h[3];
        let vsh = v[0] - 1;
        let avbp = vsh + v[1];
        let aah = avbp + v[2];
        let totalh = aah + v[3];
        if totalw > 0xFFF || totalh > 0x7FF {
            return Err(ControllerError::TimingOutOfRange);
        }
        Ok(Self {
            sscr: (hsw << 16) | vsh,
            bpcr: (ahbp << 16) | avbp,
            awcr: (aaw << 16) | aah,
            twcr: (totalw << 16) | totalh,
        })
    }

    const fn ahbp(&self) -> u32 {
        self.bpcr >> 16
    }

    const fn avbp(&self) -> u32 {
        self.bpcr & 0x7FF
    }
}

fn polarity_bits(p: &Polarity) -> u32 {
    let mut gcr = 0;
    if p.hsync_active_high {
        gcr |= regs::GCR_HSPOL;
    }
    if p.vsync_active_high {
        gcr |= regs::GCR_VSPOL;
    }
    if p.data_enable_active_high {
        gcr |= regs::GCR_DEPOL;
    }
    if p.pixel_clock_inverted {
        gcr |= regs::GCR_PCPOL;
    }
    gcr
}

/// Register values of one layer bank, except the buffer address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LayerWords {
    pub(crate) cr: u32,
    pub(crate) whpcr: u32,
    pub(crate) wvpcr: u32,
    pub(crate) ckcr: u32,
    pub(crate) pfcr: u32,
    pub(crate) cacr: u32,
    pub(crate) dccr: u32,
    pub(crate) bfcr: u32,
    pub(crate) cfblr: u32,
    pub(crate) cfblnr: u32,
}

impl LayerWords {
    pub(crate) fn encode(
        layer: LayerIndex,
        cfg: &LayerConfig,
        timing: &PanelTiming,
        words: &TimingWords,
    ) -> Result<Self, ControllerError> {
        let w = &cfg.window;
        if w.h_start > w.h_stop
            || w.v_start > w.v_stop
            || w.h_stop >= timing.width
            || w.v_stop >= timing.height
        {
            return Err(ControllerError::WindowOutOfRange(layer));
        }
        let frame = &cfg.frame;
        let bpp = u32::try_from(frame.format.bytes_per_pixel()).unwrap_or(u32::MAX);
        let line_len = u32::from(frame.width).saturating_mul(bpp);
        if frame.stride > 0x1FFF || line_len + 3 > 0x1FFF || frame.height > 0x7FF {
            return Err(ControllerError::FrameOutOfRange(layer));
        }

        let h0 = words.ahbp() + 1;
        let v0 = words.avbp() + 1;
        let (bf1, bf2) = match cfg.blending {
            Blending::ConstantAlpha => (4, 5),
            Blending::PixelAlpha => (6, 7),
        };
        let mut cr = 0;
        if cfg.color_key.is_some() {
            cr |= regs::LCR_COLKEN;
        }
        Ok(Self {
            cr,
            whpcr: ((h0 + u32::from(w.h_stop)) << 16) | (h0 + u32::from(w.h_start)),
            wvpcr: ((v0 + u32::from(w.v_stop)) << 16) | (v0 + u32::from(w.v_start)),
            ckcr: cfg.color_key.unwrap_or(0) & 0x00FF_FFFF,
            pfcr: frame.format.code(),
            cacr: u32::from(cfg.constant_alpha),
            dccr: cfg.default_color,
            bfcr: (bf1 << 8) | bf2,
            cfblr: (frame.stride << 16) | (line_len + 3),
            cfblnr: u32::from(frame.height),
        })
    }
}

/// The LTDC peripheral.
///
/// Place it in a `static` so the interrupt vector can reach
/// [`on_interrupt`](Self::on_interrupt).
pub struct LtdcController {
    regs: Registers,
    listener: RwLock<Option<Arc<dyn ReloadListener>>>,
    started: AtomicBool,
    counters: Counters,
}

impl LtdcController {
    /// Creates a controller over `regs`. Nothing is written until
    /// [`start`](DisplayController::start).
    #[must_use]
    pub fn new(regs: Registers) -> Self {
        Self {
            regs,
            listener: RwLock::new(None),
            started: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    /// The register block.
    #[must_use]
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    /// Interrupt entry point. Call from the LTDC global interrupt vector.
    ///
    /// Acknowledges every pending flag and, for a register reload, notifies
    /// the bound listener.
    pub fn on_interrupt(&self) {
        let pending = self.regs.read(regs::ISR) & regs::IRQ_ALL;
        self.regs.write(regs::ICR, pending);

        let c = &self.counters;
        if pending & regs::IRQ_LINE != 0 {
            c.lines.fetch_add(1, Ordering::Relaxed);
        }
        if pending & regs::IRQ_FIFO_UNDERRUN != 0 {
            c.fifo_underruns.fetch_add(1, Ordering::Relaxed);
        }
        if pending & regs::IRQ_TRANSFER_ERROR != 0 {
            c.transfer_errors.fetch_add(1, Ordering::Relaxed);
        }
        if pending & regs::IRQ_RELOAD != 0 {
            c.reloads.fetch_add(1, Ordering::Relaxed);
            // A listener being swapped in is skipped rather than waited for.
            if let Some(guard) = self.listener.try_read()
                && let Some(listener) = guard.as_ref()
            {
                listener.on_reload_complete();
            }
        }
    }

    /// Interrupt counts since creation.
    #[must_use]
    pub fn stats(&self) -> InterruptStats {
        let c = &self.counters;
        InterruptStats {
            reloads: c.reloads.load(Ordering::Relaxed),
            lines: c.lines.load(Ordering::Relaxed),
            fifo_underruns: c.fifo_underruns.load(Ordering::Relaxed),
            transfer_errors: c.transfer_errors.load(Ordering::Relaxed),
        }
    }

    fn layer_reg(layer: LayerIndex, offset: usize) -> usize {
        regs::LAYER_BASE[layer.get()] + offset
    }
}

impl DisplayController for LtdcController {
    fn start(&self, config: &ControllerConfig) -> Result<(), ControllerError> {
        let timing = TimingWords::encode(&config.timing)?;
        let mut layers = [None; 2];
        for layer in LayerIndex::all() {
            if let Some(cfg) = &config.layers[layer.get()] {
                layers[layer.get()] =
                    Some(LayerWords::encode(layer, cfg, &config.timing, &timing)?);
            }
        }

        let r = &self.regs;
        r.modify(regs::GCR, |v| v & !regs::GCR_LTDCEN);
        r.write(regs::SSCR, timing.sscr);
        r.write(regs::BPCR, timing.bpcr);
        r.write(regs::AWCR, timing.awcr);
        r.write(regs::TWCR, timing.twcr);
        r.write(regs::GCR, polarity_bits(&config.polarity));
        r.write(regs::BCCR, config.background & 0x00FF_FFFF);
        for layer in LayerIndex::all() {
            let Some(words) = layers[layer.get()] else {
                r.write(Self::layer_reg(layer, regs::LCR), 0);
                continue;
            };
            let reg = |offset| Self::layer_reg(layer, offset);
            r.write(reg(regs::WHPCR), words.whpcr);
            r.write(reg(regs::WVPCR), words.wvpcr);
            r.write(reg(regs::CKCR), words.ckcr);
            r.write(reg(regs::PFCR), words.pfcr);
            r.write(reg(regs::CACR), words.cacr);
            r.write(reg(regs::DCCR), words.dccr);
            r.write(reg(regs::BFCR), words.bfcr);
            r.write(reg(regs::CFBLR), words.cfblr);
            r.write(reg(regs::CFBLNR), words.cfblnr);
            // Visibility is left to `show_layer`.
            r.write(reg(regs::LCR), words.cr);
        }
        r.modify(regs::IER, |v| {
            v | regs::IRQ_FIFO_UNDERRUN | regs::IRQ_TRANSFER_ERROR
        });
        r.write(regs::SRCR, regs::SRCR_IMR);
        r.modify(regs::GCR, |v| v | regs::GCR_LTDCEN);
        self.started.store(true, Ordering::Release);
        Ok(())
    }

    fn set_reload_interrupt(&self, enabled: bool) {
        self.regs.modify(regs::IER, |v| {
            if enabled {
                v | regs::IRQ_RELOAD
            } else {
                v & !regs::IRQ_RELOAD
            }
        });
    }

    fn bind_reload_listener(&self, listener: Arc<dyn ReloadListener>) {
        *self.listener.write() = Some(listener);
    }

    fn show_layer(&self, layer: LayerIndex, visible: bool) {
        self.regs.modify(Self::layer_reg(layer, regs::LCR), |v| {
            if visible {
                v | regs::LCR_LEN
            } else {
                v & !regs::LCR_LEN
            }
        });
        self.regs.write(regs::SRCR, regs::SRCR_IMR);
    }

    fn layer_address(&self, layer: LayerIndex) -> FrameAddr {
        FrameAddr(self.regs.read(Self::layer_reg(layer, regs::CFBAR)) as usize)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "the controller addresses a 32-bit bus"
    )]
    fn set_layer_address(&self, layer: LayerIndex, addr: FrameAddr) {
        self.regs
            .write(Self::layer_reg(layer, regs::CFBAR), addr.0 as u32);
    }

    fn request_reload(&self, mode: ReloadMode) -> Result<(), ReloadError> {
        if !self.started.load(Ordering::Acquire) {
            return Err(ReloadError::NotStarted);
        }
        // The controller clears SRCR once the shadow registers are latched,
        // so a pending reload also takes every register written before now.
        let pending = self.regs.read(regs::SRCR) & (regs::SRCR_IMR | regs::SRCR_VBR) != 0;
        match mode {
            ReloadMode::VerticalBlanking if pending => {}
            ReloadMode::VerticalBlanking => self.regs.write(regs::SRCR, regs::SRCR_VBR),
            ReloadMode::Immediate => self.regs.write(regs::SRCR, regs::SRCR_IMR),
        }
        Ok(())
    }
}

impl fmt::Debug for LtdcController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LtdcController")
            .field("regs", &self.regs)
            .field("started", &self.started.load(Ordering::Acquire))
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
