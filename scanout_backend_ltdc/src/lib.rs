// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! LTDC backend for scanout.
//!
//! This crate provides the register-level pieces for driving an STM32-class
//! LCD-TFT display controller from `scanout_core`:
//!
//! - [`LtdcController`]: [`DisplayController`] over the memory-mapped
//!   register block, with [`LtdcController::on_interrupt`] as the interrupt
//!   entry point
//! - [`Registers`]: volatile access to the register block, or to plain
//!   memory standing in for it
//! - [`SpinSemaphore`]: a busy-waiting [`SyncPrimitive`] for firmware
//!   without an RTOS
//!
//! # Wiring
//!
//! ```rust,ignore
//! static LTDC: spin::Once<LtdcController> = spin::Once::new();
//!
//! #[interrupt]
//! fn LTDC() {
//!     if let Some(ltdc) = LTDC.get() {
//!         ltdc.on_interrupt();
//!     }
//! }
//!
//! let ltdc = LTDC.call_once(|| {
//!     // SAFETY: LTDC_BASE is the peripheral's register block and nothing
//!     // else accesses it.
//!     LtdcController::new(unsafe { Registers::new(LTDC_BASE as *mut u32) })
//! });
//! let scanout = Scanout::<_, SpinSemaphore>::new(ltdc, ControllerConfig::portrait_240x320_rgb888());
//! ```
//!
//! [`DisplayController`]: scanout_core::backend::DisplayController
//! [`SyncPrimitive`]: scanout_core::sync::SyncPrimitive

#![no_std]
#![expect(
    unsafe_code,
    reason = "LTDC backend requires volatile access to memory-mapped registers"
)]

extern crate alloc;

mod controller;
mod regs;
mod semaphore;

pub use controller::{InterruptStats, LtdcController};
pub use regs::{LTDC_BASE, REGISTER_WORDS, Registers};
pub use semaphore::{SpinSemaphore, install_clock};
pub use scanout_core::backend::DisplayController;
