// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contracts between the flush engine and the hardware it drives.
//!
//! Scanout splits hardware-specific work into *backend* crates. Each backend
//! provides the following pieces:
//!
//! - **Controller**: Implements [`DisplayController`]. Starts the timing
//!   controller from a [`ControllerConfig`], shows layers, reads and writes
//!   layer buffer addresses, and requests shadow-register reloads.
//!
//! - **Interrupt entry point**: A free function or method the platform's
//!   vector table calls when the controller raises its register-reload
//!   interrupt. It acknowledges the hardware and forwards to the bound
//!   [`ReloadListener`]. Interrupt registration is left to the platform.
//!
//! - **Sync primitive**: Implements [`SyncPrimitive`](crate::sync::SyncPrimitive)
//!   on top of whatever blocking mechanism the platform has (an RTOS
//!   semaphore, a spin loop, a host condition variable).
//!
//! # Crate boundaries
//!
//! `scanout_core` owns the per-layer flush state, the display adapter and
//! this contract module. Backend crates depend on `scanout_core` and provide
//! register glue. Firmware depends on both and wires the interrupt vector to
//! the backend's entry point.
//!
//! # Reload protocol
//!
//! ```text
//!   render thread                     controller                 interrupt
//!   ─────────────                     ──────────                 ─────────
//!   set_layer_address(l, buf)  ──►  shadow register
//!   request_reload(mode)       ──►  latch at next blank ──► reload IRQ
//!                                                               │
//!                                   ReloadListener::on_reload_complete()
//! ```
//!
//! [`ControllerConfig`]: crate::config::ControllerConfig

use alloc::sync::Arc;
use core::fmt;

use crate::config::ControllerConfig;
use crate::layer::{FrameAddr, LayerIndex};

/// When a requested register reload takes effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReloadMode {
    /// Shadow registers are copied right away.
    Immediate,
    /// Shadow registers are copied during the next vertical blanking period.
    #[default]
    VerticalBlanking,
}

/// Receives reload-complete notifications in interrupt context.
///
/// Implementations must not block, allocate, or take locks that the render
/// thread may hold.
pub trait ReloadListener: Send + Sync {
    /// Called once per acknowledged register reload.
    fn on_reload_complete(&self);
}

/// A display timing controller with shadowed layer registers.
///
/// All methods take `&self`: the controller is shared with its interrupt
/// handler, so implementations use interior mutability. Shared references to
/// a controller are controllers too, which lets a `static` controller be
/// handed to a [`Scanout`](crate::display::Scanout).
pub trait DisplayController {
    /// Programs timing, polarity, background and layer registers from
    /// `config`, then enables the controller.
    ///
    /// Calling `start` again re-applies `config`.
    fn start(&self, config: &ControllerConfig) -> Result<(), ControllerError>;

    /// Enables or disables the register-reload interrupt.
    fn set_reload_interrupt(&self, enabled: bool);

    /// Installs the listener invoked when a register reload completes.
    ///
    /// Replaces any previously bound listener.
    fn bind_reload_listener(&self, listener: Arc<dyn ReloadListener>);

    /// Makes `layer` visible or hides it.
    ///
    /// Applies immediately, together with any staged layer address.
    fn show_layer(&self, layer: LayerIndex, visible: bool);

    /// Buffer address the controller currently has for `layer`.
    fn layer_address(&self, layer: LayerIndex) -> FrameAddr;

    /// Stages a new buffer address for `layer`. Takes effect on the next
    /// reload.
    fn set_layer_address(&self, layer: LayerIndex, addr: FrameAddr);

    /// Requests a shadow-register reload.
    ///
    /// With [`ReloadMode::VerticalBlanking`] the reload interrupt fires once
    /// the new registers are latched. A vertical-blank request made while
    /// another reload is pending joins that reload.
    fn request_reload(&self, mode: ReloadMode) -> Result<(), ReloadError>;
}

impl<T: DisplayController + ?Sized> DisplayController for &T {
    fn start(&self, config: &ControllerConfig) -> Result<(), ControllerError> {
        (**self).start(config)
    }

    fn set_reload_interrupt(&self, enabled: bool) {
        (**self).set_reload_interrupt(enabled);
    }

    fn bind_reload_listener(&self, listener: Arc<dyn ReloadListener>) {
        (**self).bind_reload_listener(listener);
    }

    fn show_layer(&self, layer: LayerIndex, visible: bool) {
        (**self).show_layer(layer, visible);
    }

    fn layer_address(&self, layer: LayerIndex) -> FrameAddr {
        (**self).layer_address(layer)
    }

    fn set_layer_address(&self, layer: LayerIndex, addr: FrameAddr) {
        (**self).set_layer_address(layer, addr);
    }

    fn request_reload(&self, mode: ReloadMode) -> Result<(), ReloadError> {
        (**self).request_reload(mode)
    }
}

/// Errors raised while starting the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerError {
    /// The panel timing does not fit the controller's counters.
    TimingOutOfRange,
    /// A layer window lies outside the active area.
    WindowOutOfRange(LayerIndex),
    /// A layer's line pitch or line count does not fit the controller.
    FrameOutOfRange(LayerIndex),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimingOutOfRange => f.write_str("panel timing exceeds controller limits"),
            Self::WindowOutOfRange(layer) => {
                write!(f, "{layer:?} window lies outside the active area")
            }
            Self::FrameOutOfRange(layer) => {
                write!(f, "{layer:?} frame geometry exceeds controller limits")
            }
        }
    }
}

impl core::error::Error for ControllerError {}

/// Errors raised when a reload cannot be requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReloadError {
    /// The controller is not running.
    NotStarted,
    /// The controller cannot take a reload request right now.
    Busy,
}

impl fmt::Display for ReloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("controller is not running"),
            Self::Busy => f.write_str("controller cannot take a reload request"),
        }
    }
}

impl core::error::Error for ReloadError {}
