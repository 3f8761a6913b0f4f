// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A thread-safe stand-in for a display controller.
//!
//! [`SimulatedController`] keeps shadow and active layer addresses like the
//! hardware does. A vertical-blank reload is only latched when something
//! calls [`SimulatedController::vblank`], either a test directly or a
//! background [`VblankPump`], and the bound listener is then invoked on that
//! caller's thread, standing in for interrupt context.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use scanout_core::backend::{
    ControllerError, DisplayController, ReloadError, ReloadListener, ReloadMode,
};
use scanout_core::config::ControllerConfig;
use scanout_core::layer::{FrameAddr, LayerIndex, MAX_LAYERS};

#[derive(Debug, Default)]
struct State {
    starts: u32,
    reload_irq: bool,
    visible: [bool; MAX_LAYERS],
    shadow: [FrameAddr; MAX_LAYERS],
    active: [FrameAddr; MAX_LAYERS],
    pending: bool,
    requests: Vec<ReloadMode>,
    latched: u32,
    fail_next: Option<ReloadError>,
}

impl State {
    fn latch(&mut self) {
        self.active = self.shadow;
        self.pending = false;
        self.latched += 1;
    }
}

/// A [`DisplayController`] that latches reloads on demand.
#[derive(Default)]
pub struct SimulatedController {
    state: Mutex<State>,
    listener: Mutex<Option<Arc<dyn ReloadListener>>>,
}

impl SimulatedController {
    /// Creates a controller that has not been started.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            listener.on_reload_complete();
        }
    }

    /// Simulates a vertical blanking period.
    ///
    /// Latches a pending reload and, if the reload interrupt is enabled,
    /// calls the bound listener. Returns whether a reload was latched.
    pub fn vblank(&self) -> bool {
        let irq = {
            let mut state = self.state();
            if !state.pending {
                return false;
            }
            state.latch();
            state.reload_irq
        };
        if irq {
            self.notify();
        }
        true
    }

    /// Makes the next reload request fail with `err`.
    pub fn fail_next_reload(&self, err: ReloadError) {
        self.state().fail_next = Some(err);
    }

    /// How many times [`DisplayController::start`] was called.
    #[must_use]
    pub fn starts(&self) -> u32 {
        self.state().starts
    }

    /// Whether the reload interrupt is enabled.
    #[must_use]
    pub fn reload_interrupt_enabled(&self) -> bool {
        self.state().reload_irq
    }

    /// Whether `layer` is shown.
    #[must_use]
    pub fn is_visible(&self, layer: LayerIndex) -> bool {
        self.state().visible[layer.get()]
    }

    /// The address the simulated panel is scanning out for `layer`.
    #[must_use]
    pub fn scanned_address(&self, layer: LayerIndex) -> FrameAddr {
        self.state().active[layer.get()]
    }

    /// Whether a vertical-blank reload is waiting to be latched.
    #[must_use]
    pub fn has_pending_reload(&self) -> bool {
        self.state().pending
    }

    /// Every accepted reload request, oldest first.
    #[must_use]
    pub fn reload_requests(&self) -> Vec<ReloadMode> {
        self.state().requests.clone()
    }

    /// Reloads latched so far, including immediate ones.
    #[must_use]
    pub fn reloads_latched(&self) -> u32 {
        self.state().latched
    }
}

impl DisplayController for SimulatedController {
    fn start(&self, _config: &ControllerConfig) -> Result<(), ControllerError> {
        self.state().starts += 1;
        Ok(())
    }

    fn set_reload_interrupt(&self, enabled: bool) {
        self.state().reload_irq = enabled;
    }

    fn bind_reload_listener(&self, listener: Arc<dyn ReloadListener>) {
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    fn show_layer(&self, layer: LayerIndex, visible: bool) {
        let mut state = self.state();
        let i = layer.get();
        state.visible[i] = visible;
        state.active[i] = state.shadow[i];
    }

    fn layer_address(&self, layer: LayerIndex) -> FrameAddr {
        self.state().shadow[layer.get()]
    }

    fn set_layer_address(&self, layer: LayerIndex, addr: FrameAddr) {
        self.state().shadow[layer.get()] = addr;
    }

    fn request_reload(&self, mode: ReloadMode) -> Result<(), ReloadError> {
        let irq = {
            let mut state = self.state();
            if state.starts == 0 {
                return Err(ReloadError::NotStarted);
            }
            if let Some(err) = state.fail_next.take() {
                return Err(err);
            }
            state.requests.push(mode);
            match mode {
                ReloadMode::VerticalBlanking => {
                    state.pending = true;
                    return Ok(());
                }
                ReloadMode::Immediate => {
                    state.latch();
                    state.reload_irq
                }
            }
        };
        if irq {
            self.notify();
        }
        Ok(())
    }
}

impl fmt::Debug for SimulatedController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedController")
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

/// Calls [`SimulatedController::vblank`] at a fixed period on a background
/// thread until dropped.
pub struct VblankPump {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<u32>>,
}

impl VblankPump {
    /// Starts pumping `controller` every `period`.
    #[must_use]
    pub fn start(controller: Arc<SimulatedController>, period: std::time::Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut latched = 0;
                while !stop.load(Ordering::Acquire) {
                    thread::sleep(period);
                    if controller.vblank() {
                        latched += 1;
                    }
                }
                latched
            })
        };
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stops the pump and returns how many reloads it latched.
    pub fn stop(mut self) -> u32 {
        self.halt()
    }

    fn halt(&mut self) -> u32 {
        self.stop.store(true, Ordering::Release);
        self.handle
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or(0)
    }
}

impl Drop for VblankPump {
    fn drop(&mut self) {
        self.halt();
    }
}

impl fmt::Debug for VblankPump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VblankPump")
            .field("running", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::*;

    #[derive(Default)]
    struct Count(AtomicU32);

    impl ReloadListener for Count {
        fn on_reload_complete(&self) {
            self.0.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn started() -> (SimulatedController, Arc<Count>) {
        let c = SimulatedController::new();
        let count = Arc::new(Count::default());
        c.bind_reload_listener(count.clone());
        c.start(&ControllerConfig::portrait_240x320_rgb888())
            .expect("simulated start never fails");
        (c, count)
    }

    #[test]
    fn vertical_blank_reload_latches_on_vblank() {
        let (c, count) = started();
        c.set_reload_interrupt(true);
        c.set_layer_address(LayerIndex::FIRST, FrameAddr(0x100));
        assert_eq!(c.scanned_address(LayerIndex::FIRST), FrameAddr(0));
        assert_eq!(c.request_reload(ReloadMode::VerticalBlanking), Ok(()));
        c.set_layer_address(LayerIndex::SECOND, FrameAddr(0x200));
        assert_eq!(c.request_reload(ReloadMode::VerticalBlanking), Ok(()));
        assert_eq!(count.0.load(Ordering::Acquire), 0);

        assert!(c.vblank());
        assert_eq!(c.scanned_address(LayerIndex::SECOND), FrameAddr(0x200));
        assert_eq!(c.scanned_address(LayerIndex::FIRST), FrameAddr(0x100));
        assert_eq!(count.0.load(Ordering::Acquire), 1);
        assert!(!c.vblank(), "nothing left to latch");
    }

    #[test]
    fn listener_needs_the_interrupt_enabled() {
        let (c, count) = started();
        assert_eq!(c.request_reload(ReloadMode::Immediate), Ok(()));
        assert_eq!(c.reloads_latched(), 1);
        assert_eq!(count.0.load(Ordering::Acquire), 0);
    }

    #[test]
    fn reload_before_start_is_refused() {
        let c = SimulatedController::new();
        assert_eq!(
            c.request_reload(ReloadMode::Immediate),
            Err(ReloadError::NotStarted)
        );
    }

    #[test]
    fn injected_failure_applies_once() {
        let (c, _) = started();
        c.fail_next_reload(ReloadError::Busy);
        assert_eq!(
            c.request_reload(ReloadMode::VerticalBlanking),
            Err(ReloadError::Busy)
        );
        assert_eq!(c.request_reload(ReloadMode::VerticalBlanking), Ok(()));
        assert_eq!(c.reload_requests(), [ReloadMode::VerticalBlanking]);
    }

    #[test]
    fn pump_latches_from_another_thread() {
        let (c, count) = started();
        let c = Arc::new(c);
        c.set_reload_interrupt(true);
        c.request_reload(ReloadMode::VerticalBlanking)
            .expect("controller is started");
        let pump = VblankPump::start(Arc::clone(&c), std::time::Duration::from_millis(1));
        while c.has_pending_reload() {
            thread::yield_now();
        }
        assert_eq!(pump.stop(), 1);
        assert_eq!(count.0.load(Ordering::Acquire), 1);
    }
}
