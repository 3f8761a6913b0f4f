// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! LTDC register map and volatile access.

use core::fmt;
use core::ptr::NonNull;

/// Size of the register block in 32-bit words.
pub const REGISTER_WORDS: usize = 0x150 / 4;

/// Base address of the LTDC peripheral on STM32F4/F7/H7 parts.
pub const LTDC_BASE: usize = 0x4001_6800;

pub(crate) const SSCR: usize = 0x08;
pub(crate) const BPCR: usize = 0x0C;
pub(crate) const AWCR: usize = 0x10;
pub(crate) const TWCR: usize = 0x14;
pub(crate) const GCR: usize = 0x18;
pub(crate) const SRCR: usize = 0x24;
pub(crate) const BCCR: usize = 0x2C;
pub(crate) const IER: usize = 0x34;
pub(crate) const ISR: usize = 0x38;
pub(crate) const ICR: usize = 0x3C;

pub(crate) const GCR_LTDCEN: u32 = 1 << 0;
pub(crate) const GCR_PCPOL: u32 = 1 << 28;
pub(crate) const GCR_DEPOL: u32 = 1 << 29;
pub(crate) const GCR_VSPOL: u32 = 1 << 30;
pub(crate) const GCR_HSPOL: u32 = 1 << 31;

pub(crate) const SRCR_IMR: u32 = 1 << 0;
pub(crate) const SRCR_VBR: u32 = 1 << 1;

/// Interrupt bits, shared by IER, ISR and ICR.
pub(crate) const IRQ_LINE: u32 = 1 << 0;
pub(crate) const IRQ_FIFO_UNDERRUN: u32 = 1 << 1;
pub(crate) const IRQ_TRANSFER_ERROR: u32 = 1 << 2;
pub(crate) const IRQ_RELOAD: u32 = 1 << 3;
pub(crate) const IRQ_ALL: u32 = 0xF;

/// Offsets of the per-layer register banks.
pub(crate) const LAYER_BASE: [usize; 2] = [0x84, 0x104];

pub(crate) const LCR: usize = 0x00;
pub(crate) const WHPCR: usize = 0x04;
pub(crate) const WVPCR: usize = 0x08;
pub(crate) const CKCR: usize = 0x0C;
pub(crate) const PFCR: usize = 0x10;
pub(crate) const CACR: usize = 0x14;
pub(crate) const DCCR: usize = 0x18;
pub(crate) const BFCR: usize = 0x1C;
pub(crate) const CFBAR: usize = 0x28;
pub(crate) const CFBLR: usize = 0x2C;
pub(crate) const CFBLNR: usize = 0x30;

pub(crate) const LCR_LEN: u32 = 1 << 0;
pub(crate) const LCR_COLKEN: u32 = 1 << 1;

/// A handle to an LTDC register block.
///
/// All accesses are single 32-bit volatile loads and stores.
pub struct Registers {
    base: NonNull<u32>,
}

// SAFETY: the block is only accessed through volatile word loads and stores,
// which the peripheral (or backing memory) tolerates from any context.
unsafe impl Send for Registers {}
// SAFETY: as above; no access creates a reference into the block.
unsafe impl Sync for Registers {}

impl Registers {
    /// Wraps the register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point to [`REGISTER_WORDS`] words that are valid for
    /// volatile reads and writes for the life of the returned value, and no
    /// other handle may access them.
    #[must_use]
    pub const unsafe fn new(base: *mut u32) -> Self {
        // SAFETY: the caller guarantees `base` is valid, hence non-null.
        Self {
            base: unsafe { NonNull::new_unchecked(base) },
        }
    }

    /// Wraps a block of plain memory, for running the controller without
    /// hardware.
    #[must_use]
    pub fn from_memory(block: &'static mut [u32; REGISTER_WORDS]) -> Self {
        Self {
            base: NonNull::from(block).cast(),
        }
    }

    /// Reads the register at byte `offset`.
    #[must_use]
    pub fn read(&self, offset: usize) -> u32 {
        debug_assert!(offset % 4 == 0 && offset / 4 < REGISTER_WORDS, "bad offset {offset:#x}");
        // SAFETY: `offset` is inside the block validated at construction.
        unsafe { self.base.as_ptr().add(offset / 4).read_volatile() }
    }

    /// Writes the register at byte `offset`.
    pub fn write(&self, offset: usize, value: u32) {
        debug_assert!(offset % 4 == 0 && offset / 4 < REGISTER_WORDS, "bad offset {offset:#x}");
        // SAFETY: `offset` is inside the block validated at construction.
        unsafe { self.base.as_ptr().add(offset / 4).write_volatile(value) }
    }

    /// Read-modify-writes the register at byte `offset`.
    pub fn modify(&self, offset: usize, f: impl FnOnce(u32) -> u32) {
        self.write(offset, f(self.read(offset)));
    }
}

impl fmt::Debug for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Registers({:#010x})", self.base.as_ptr() as usize)
    }
}
