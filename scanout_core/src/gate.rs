// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-layer flush state shared between the render thread and the reload
//! interrupt.
//!
//! The render thread arms a layer right before it requests a reload; the
//! interrupt disarms it and signals the layer's sync primitive. Arming uses
//! release ordering and disarming is a single acquire-release `swap`, so a
//! reload is acknowledged at most once and the signal carries the
//! render thread's writes to whoever waits on it.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use spin::Once;

use crate::backend::ReloadListener;
use crate::layer::{LayerIndex, MAX_LAYERS};
use crate::sync::SyncPrimitive;
use crate::time::Duration;

/// Flush state of one hardware layer.
pub struct LayerRuntimeState<S> {
    flushed_in_callback: AtomicBool,
    interrupt_owned: AtomicBool,
    sync: Once<S>,
    reloads_completed: AtomicU32,
    stray_signals: AtomicU32,
}

impl<S> LayerRuntimeState<S> {
    const fn new() -> Self {
        Self {
            flushed_in_callback: AtomicBool::new(false),
            interrupt_owned: AtomicBool::new(false),
            sync: Once::new(),
            reloads_completed: AtomicU32::new(0),
            stray_signals: AtomicU32::new(0),
        }
    }

    /// Whether the last flush finished without needing a reload.
    #[must_use]
    pub fn flushed_in_callback(&self) -> bool {
        self.flushed_in_callback.load(Ordering::Acquire)
    }

    /// Whether a requested reload is still waiting for its interrupt.
    #[must_use]
    pub fn is_interrupt_owned(&self) -> bool {
        self.interrupt_owned.load(Ordering::Acquire)
    }

    /// Number of reloads the interrupt has acknowledged for this layer.
    #[must_use]
    pub fn reloads_completed(&self) -> u32 {
        self.reloads_completed.load(Ordering::Acquire)
    }

    /// Signals owed by reloads whose waiter gave up before they arrived.
    ///
    /// Nonzero only after a sync failure or a timeout that raced the
    /// interrupt. They are drained before the layer is armed again.
    #[must_use]
    pub fn stray_signals(&self) -> u32 {
        self.stray_signals.load(Ordering::Acquire)
    }

    /// Whether the layer's sync primitive has been created.
    #[must_use]
    pub fn has_sync(&self) -> bool {
        self.sync.is_completed()
    }

    pub(crate) fn sync(&self) -> Option<&S> {
        self.sync.get()
    }

    pub(crate) fn set_flushed_in_callback(&self, flushed: bool) {
        self.flushed_in_callback.store(flushed, Ordering::Release);
    }

    /// Hands the next reload interrupt to this layer.
    pub(crate) fn arm(&self) {
        self.interrupt_owned.store(true, Ordering::Release);
    }

    /// Takes back an armed reload. Returns `false` if the interrupt got
    /// there first.
    pub(crate) fn disarm(&self) -> bool {
        self.interrupt_owned.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn note_stray_signal(&self) {
        self.stray_signals.fetch_add(1, Ordering::AcqRel);
    }
}

impl<S: SyncPrimitive> LayerRuntimeState<S> {
    /// Creates the sync primitive on first call; later calls return the
    /// existing one.
    pub(crate) fn init_sync(&self) -> &S {
        self.sync.call_once(S::new)
    }

    /// Consumes stray signals that have arrived by now, without blocking.
    pub(crate) fn drain_stray_signals(&self) {
        let Some(sync) = self.sync() else {
            return;
        };
        while self.stray_signals() > 0 && sync.wait_timeout(Duration::ZERO).is_ok() {
            self.stray_signals.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

impl<S> fmt::Debug for LayerRuntimeState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerRuntimeState")
            .field("flushed_in_callback", &self.flushed_in_callback())
            .field("interrupt_owned", &self.is_interrupt_owned())
            .field("has_sync", &self.has_sync())
            .field("reloads_completed", &self.reloads_completed())
            .field("stray_signals", &self.stray_signals())
            .finish()
    }
}

/// Flush state for every hardware layer, bound to the controller as its
/// [`ReloadListener`].
pub struct ReloadGate<S> {
    layers: [LayerRuntimeState<S>; MAX_LAYERS],
}

impl<S> ReloadGate<S> {
    /// Creates a gate with every layer idle and no sync primitives.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            layers: [LayerRuntimeState::new(), LayerRuntimeState::new()],
        }
    }

    /// State of `layer`.
    #[must_use]
    pub fn layer(&self, layer: LayerIndex) -> &LayerRuntimeState<S> {
        &self.layers[layer.get()]
    }
}

impl<S> Default for ReloadGate<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for ReloadGate<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.layers.iter()).finish()
    }
}

impl<S: SyncPrimitive> ReloadListener for ReloadGate<S> {
    fn on_reload_complete(&self) {
        // The controller reports one reload for all layers; scan them all.
        for state in &self.layers {
            if state.disarm() {
                state.reloads_completed.fetch_add(1, Ordering::AcqRel);
                if let Some(sync) = state.sync() {
                    sync.signal_from_isr();
                }
            }
        }
    }
}
