// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display adapter: turns renderer flushes into layer updates.
//!
//! A [`Scanout`] owns the controller and the shared [`ReloadGate`]. Each
//! active layer gets one [`Display`], created in one of two modes:
//!
//! - **Direct** ([`Scanout::create_direct`]): the renderer draws whole
//!   frames into its own buffers. With two buffers, the last flush of a
//!   frame points the layer at the finished buffer and requests a
//!   vertical-blank reload; the following [`FlushTarget::flush_wait`] blocks
//!   until the reload interrupt confirms the controller has switched, so
//!   the renderer never draws into the buffer being scanned out.
//! - **Partial** ([`Scanout::create_partial`]): the renderer draws regions
//!   into scratch buffers and every flush copies (and, if needed, rotates)
//!   the region into the live frame buffer before returning.
//!
//! Renderer buffers are registered by address. The controller scans them
//! out directly, so they must stay alive and in place for as long as the
//! display exists.

use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::area::{Area, Rotation};
use crate::backend::{DisplayController, ReloadError};
use crate::blit::{self, BlitError, BlitGeometry};
use crate::config::{ConfigError, ControllerConfig, FlushConfig};
use crate::format::ColorFormat;
use crate::gate::{LayerRuntimeState, ReloadGate};
use crate::layer::{FrameAddr, LayerDescriptor, LayerIndex, MAX_LAYERS};
use crate::sync::{SyncError, SyncPrimitive};
use crate::time::Duration;
use crate::trace::{
    DisplayCreatedEvent, FlushEvent, FlushWaitEvent, ReloadObservedEvent, Tracer, WaitOutcome,
};

/// How a display hands frames to its layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// The renderer draws whole frames and the layer is pointed at them.
    Direct,
    /// The renderer draws regions that are copied into a live frame buffer.
    Partial,
}

/// What a flush did with the pixels it was given.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlushPath {
    /// Finished before returning; the next flush-wait does not block.
    Synchronous,
    /// A reload was requested; the next flush-wait blocks until the reload
    /// interrupt.
    ReloadRequested,
}

/// One or two renderer-owned pixel buffers, registered by address.
///
/// Only addresses are kept, so the renderer can go on drawing into the
/// buffers. See [`Scanout::create_direct`] for how long they must live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawBuffers {
    first: (FrameAddr, usize),
    second: Option<(FrameAddr, usize)>,
}

impl DrawBuffers {
    /// Registers a single buffer.
    #[must_use]
    pub fn single(buf: &[u8]) -> Self {
        Self {
            first: (FrameAddr::of(buf), buf.len()),
            second: None,
        }
    }

    /// Registers two buffers the renderer alternates between.
    #[must_use]
    pub fn double(first: &[u8], second: &[u8]) -> Self {
        Self {
            first: (FrameAddr::of(first), first.len()),
            second: Some((FrameAddr::of(second), second.len())),
        }
    }

    /// Whether two buffers are registered.
    #[must_use]
    pub const fn is_double(&self) -> bool {
        self.second.is_some()
    }

    /// Address of the first buffer.
    #[must_use]
    pub const fn first(&self) -> FrameAddr {
        self.first.0
    }

    /// Whether `addr` is the start of a registered buffer.
    #[must_use]
    pub fn contains(&self, addr: FrameAddr) -> bool {
        self.first.0 == addr || self.second.is_some_and(|(a, _)| a == addr)
    }

    /// Length of the smallest registered buffer.
    #[must_use]
    pub fn min_len(&self) -> usize {
        self.second
            .map_or(self.first.1, |(_, len)| len.min(self.first.1))
    }
}

/// Errors returned by [`FlushTarget::flush`] and
/// [`FlushTarget::flush_wait`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushError {
    /// The area is empty or extends past the display.
    AreaOutOfBounds(Area),
    /// The pixel map is shorter than the area it claims to cover.
    PixelMapTooSmall {
        /// Bytes needed.
        required: usize,
        /// Bytes supplied.
        provided: usize,
    },
    /// A direct-mode pixel map is not one of the registered buffers.
    UnknownBuffer(FrameAddr),
    /// A reload from the previous flush has not been waited for.
    ReloadPending,
    /// The controller refused the reload request.
    Reload(ReloadError),
    /// The sync primitive failed while waiting.
    Sync(SyncError),
    /// The reload interrupt did not arrive within the configured timeout.
    Timeout,
    /// Copying into the frame buffer failed.
    Blit(BlitError),
}

impl fmt::Display for FlushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AreaOutOfBounds(area) => write!(f, "flush area {area:?} is out of bounds"),
            Self::PixelMapTooSmall { required, provided } => {
                write!(f, "pixel map holds {provided} bytes, {required} required")
            }
            Self::UnknownBuffer(addr) => write!(f, "{addr:?} is not a registered buffer"),
            Self::ReloadPending => f.write_str("previous reload has not been waited for"),
            Self::Reload(err) => write!(f, "reload request failed: {err}"),
            Self::Sync(err) => write!(f, "flush wait failed: {err}"),
            Self::Timeout => f.write_str("timed out waiting for reload"),
            Self::Blit(err) => write!(f, "frame buffer copy failed: {err}"),
        }
    }
}

impl core::error::Error for FlushError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Reload(err) => Some(err),
            Self::Sync(err) => Some(err),
            Self::Blit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BlitError> for FlushError {
    fn from(err: BlitError) -> Self {
        Self::Blit(err)
    }
}

/// The renderer-facing side of a display.
///
/// A renderer calls [`flush`](Self::flush) for every finished region and
/// [`flush_wait`](Self::flush_wait) before it draws into the same buffer
/// again.
pub trait FlushTarget {
    /// Hands `px_map`, covering `area` in logical coordinates, to the
    /// display. `is_last` marks the final flush of a frame.
    fn flush(&mut self, area: &Area, px_map: &[u8], is_last: bool) -> Result<FlushPath, FlushError>;

    /// Blocks until the previous flush has been consumed by the hardware.
    ///
    /// Returns immediately if it already has. Must not be called from
    /// interrupt context.
    fn flush_wait(&mut self) -> Result<(), FlushError>;

    /// Whether the renderer alternates between two buffers.
    fn is_double_buffered(&self) -> bool;

    /// The display's render mode.
    fn render_mode(&self) -> RenderMode;

    /// Logical `(width, height)`, after rotation.
    fn resolution(&self) -> (u32, u32);

    /// Color format the renderer must draw in.
    fn color_format(&self) -> ColorFormat;

    /// Sets the rotation applied to partial-mode flushes.
    fn set_rotation(&mut self, rotation: Rotation);
}

/// The display controller, its configuration, and the per-layer flush
/// state shared with the reload interrupt.
pub struct Scanout<C, S> {
    controller: C,
    config: ControllerConfig,
    flush: FlushConfig,
    gate: Arc<ReloadGate<S>>,
    started: AtomicBool,
    claimed: [AtomicBool; MAX_LAYERS],
}

impl<C: DisplayController, S: SyncPrimitive + 'static> Scanout<C, S> {
    /// Wraps `controller` and binds the reload gate as its reload listener.
    ///
    /// The controller is not started until the first display is created.
    pub fn new(controller: C, config: ControllerConfig) -> Self {
        let gate = Arc::new(ReloadGate::new());
        controller.bind_reload_listener(gate.clone());
        Self {
            controller,
            config,
            flush: FlushConfig::default(),
            gate,
            started: AtomicBool::new(false),
            claimed: [AtomicBool::new(false), AtomicBool::new(false)],
        }
    }

    /// Returns a copy using `flush` for every display created afterwards.
    #[must_use]
    pub fn with_flush_config(mut self, flush: FlushConfig) -> Self {
        self.flush = flush;
        self
    }

    /// The wrapped controller.
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// The static controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Per-layer flush state.
    pub fn gate(&self) -> &ReloadGate<S> {
        &self.gate
    }

    /// Resolves frame geometry, color format and current buffer of `layer`.
    ///
    /// # Panics
    ///
    /// Panics if the layer's pixel format has no renderer color format.
    pub fn resolve_layer(&self, layer: LayerIndex) -> Result<LayerDescriptor, ConfigError> {
        let frame = self.config.layer(layer)?.frame;
        Ok(LayerDescriptor {
            layer,
            width: u32::from(frame.width),
            height: u32::from(frame.height),
            stride: frame.stride as usize,
            format: frame.format,
            color_format: ColorFormat::from_layer(frame.format),
            buffer: self.controller.layer_address(layer),
        })
    }

    /// Creates a direct-mode display on `layer`.
    ///
    /// Every buffer must hold a full frame. With two buffers the reload
    /// interrupt is enabled and flushes alternate the layer between them;
    /// with one, the layer scans out that buffer and flushes never block.
    ///
    /// The layer's stride must equal one packed line of pixels.
    ///
    /// # Buffer lifetime
    ///
    /// The controller reads the buffers by address, outside the borrow
    /// checker's view. They must stay allocated and in place until the
    /// display is dropped and, if the layer is left showing one of them,
    /// until the layer is pointed elsewhere.
    ///
    /// # Panics
    ///
    /// Panics if the layer's pixel format has no renderer color format.
    pub fn create_direct(
        &self,
        buffers: DrawBuffers,
        layer: LayerIndex,
    ) -> Result<Display<'_, C, S>, ConfigError> {
        let mut descriptor = self.resolve_layer(layer)?;
        if descriptor.stride != descriptor.line_size() {
            return Err(ConfigError::PaddedStride {
                stride: descriptor.stride,
                line: descriptor.line_size(),
            });
        }
        let required = descriptor.frame_size();
        if buffers.min_len() < required {
            return Err(ConfigError::BufferTooSmall {
                required,
                provided: buffers.min_len(),
            });
        }
        self.claim(layer)?;
        if let Err(err) = self.start() {
            self.release(layer);
            return Err(err);
        }
        if buffers.is_double() {
            self.gate.layer(layer).init_sync();
            self.controller.set_reload_interrupt(true);
        }
        self.controller.set_layer_address(layer, buffers.first());
        self.controller.show_layer(layer, true);
        descriptor.buffer = buffers.first();
        Ok(Display::new(self, descriptor, Mode::Direct { buffers }))
    }

    /// Creates a partial-mode display on `layer` that copies flushed
    /// regions into `frame_buffer`.
    ///
    /// `frame_buffer` becomes the layer's scan-out buffer and must hold
    /// `stride * height` bytes. Scratch buffers may be any size that holds
    /// at least one pixel; the renderer splits frames to fit.
    ///
    /// # Panics
    ///
    /// Panics if the layer's pixel format has no renderer color format.
    pub fn create_partial<'a>(
        &'a self,
        buffers: DrawBuffers,
        frame_buffer: &'a mut [u8],
        layer: LayerIndex,
    ) -> Result<Display<'a, C, S>, ConfigError> {
        let mut descriptor = self.resolve_layer(layer)?;
        if buffers.min_len() < descriptor.color_format.bytes_per_pixel() {
            return Err(ConfigError::EmptyBuffer);
        }
        let required = descriptor.scanout_size();
        if frame_buffer.len() < required {
            return Err(ConfigError::FrameBufferTooSmall {
                required,
                provided: frame_buffer.len(),
            });
        }
        self.claim(layer)?;
        if let Err(err) = self.start() {
            self.release(layer);
            return Err(err);
        }
        let addr = FrameAddr::of(frame_buffer);
        self.controller.set_layer_address(layer, addr);
        self.controller.show_layer(layer, true);
        descriptor.buffer = addr;
        Ok(Display::new(
            self,
            descriptor,
            Mode::Partial {
                buffers,
                frame: frame_buffer,
            },
        ))
    }

    fn start(&self) -> Result<(), ConfigError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.controller.start(&self.config).map_err(|err| {
            self.started.store(false, Ordering::Release);
            ConfigError::Controller(err)
        })
    }

    fn claim(&self, layer: LayerIndex) -> Result<(), ConfigError> {
        if self.claimed[layer.get()].swap(true, Ordering::AcqRel) {
            Err(ConfigError::LayerInUse(layer))
        } else {
            Ok(())
        }
    }

    fn release(&self, layer: LayerIndex) {
        self.claimed[layer.get()].store(false, Ordering::Release);
    }
}

impl<C, S> fmt::Debug for Scanout<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanout")
            .field("config", &self.config)
            .field("flush", &self.flush)
            .field("gate", &self.gate)
            .field("started", &self.started.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

enum Mode<'a> {
    Direct {
        buffers: DrawBuffers,
    },
    Partial {
        buffers: DrawBuffers,
        frame: &'a mut [u8],
    },
}

/// A renderer-facing display bound to one hardware layer.
///
/// Dropping the display frees its layer for a new display. The layer keeps
/// showing whatever it last scanned out. A reload still in flight is taken
/// back, or its signal consumed, so it cannot release a later display's
/// flush-wait.
pub struct Display<'a, C: DisplayController, S: SyncPrimitive + 'static> {
    scanout: &'a Scanout<C, S>,
    descriptor: LayerDescriptor,
    mode: Mode<'a>,
    rotation: Rotation,
    reload_pending: bool,
    tracer: Tracer<'a>,
}

impl<'a, C: DisplayController, S: SyncPrimitive + 'static> Display<'a, C, S> {
    fn new(scanout: &'a Scanout<C, S>, descriptor: LayerDescriptor, mode: Mode<'a>) -> Self {
        Self {
            scanout,
            descriptor,
            mode,
            rotation: Rotation::None,
            reload_pending: false,
            tracer: Tracer::none(),
        }
    }

    /// Attaches a tracer, which immediately receives a
    /// [`DisplayCreatedEvent`] describing this display.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer<'a>) -> Self {
        self.tracer = tracer;
        let (width, height) = self.resolution();
        self.tracer.display_created(&DisplayCreatedEvent {
            layer: self.layer(),
            mode: self.render_mode(),
            width,
            height,
            format: self.descriptor.color_format,
            double_buffered: self.is_double_buffered(),
        });
        self
    }

    /// The hardware layer this display drives.
    #[must_use]
    pub fn layer(&self) -> LayerIndex {
        self.descriptor.layer
    }

    /// Frame geometry of the layer, as resolved at creation.
    #[must_use]
    pub fn descriptor(&self) -> &LayerDescriptor {
        &self.descriptor
    }

    /// The current rotation.
    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Whether a requested reload still needs a flush-wait.
    #[must_use]
    pub fn is_reload_pending(&self) -> bool {
        self.reload_pending
    }

    /// The live frame buffer of a partial-mode display.
    #[must_use]
    pub fn frame_buffer(&self) -> Option<&[u8]> {
        match &self.mode {
            Mode::Partial { frame, .. } => Some(frame),
            Mode::Direct { .. } => None,
        }
    }

    fn state(&self) -> &'a LayerRuntimeState<S> {
        self.scanout.gate.layer(self.descriptor.layer)
    }

    /// Consumes the signal of a reload the interrupt took after its waiter
    /// stopped waiting. A signal that does not arrive within the flush
    /// timeout is left to be drained before the next reload.
    fn absorb_late_signal(&self, sync: &S) {
        let absorbed = match self.scanout.flush.wait_timeout {
            None => sync.wait(),
            Some(timeout) => sync.wait_timeout(timeout),
        };
        if absorbed.is_err() {
            self.state().note_stray_signal();
        }
    }

    fn dispatch(&mut self, area: &Area, px_map: &[u8], is_last: bool) -> Result<FlushPath, FlushError> {
        let state = self.state();
        match &mut self.mode {
            Mode::Direct { buffers } => {
                if !(buffers.is_double() && is_last) {
                    state.set_flushed_in_callback(true);
                    return Ok(FlushPath::Synchronous);
                }
                let addr = FrameAddr::of(px_map);
                if !buffers.contains(addr) {
                    state.set_flushed_in_callback(true);
                    return Err(FlushError::UnknownBuffer(addr));
                }
                let controller = &self.scanout.controller;
                controller.set_layer_address(self.descriptor.layer, addr);
                self.descriptor.buffer = addr;
                state.drain_stray_signals();
                state.arm();
                match controller.request_reload(self.scanout.flush.reload_mode) {
                    Ok(()) => {
                        self.reload_pending = true;
                        Ok(FlushPath::ReloadRequested)
                    }
                    Err(err) => {
                        if state.disarm() {
                            state.set_flushed_in_callback(true);
                        } else {
                            // The interrupt already fired for this layer;
                            // the next flush-wait consumes its signal.
                            self.reload_pending = true;
                        }
                        Err(FlushError::Reload(err))
                    }
                }
            }
            Mode::Partial { frame, .. } => {
                let result = copy_region(&self.descriptor, self.rotation, area, px_map, frame);
                state.set_flushed_in_callback(true);
                result.map(|()| FlushPath::Synchronous)
            }
        }
    }
}

/// Copies a logical `area` of `px_map` into the frame buffer, rotating it
/// into the panel's orientation.
fn copy_region(
    descriptor: &LayerDescriptor,
    rotation: Rotation,
    area: &Area,
    px_map: &[u8],
    frame: &mut [u8],
) -> Result<(), FlushError> {
    let (width, height) = logical_size(descriptor, rotation);
    if !area.fits_within(width, height) {
        return Err(FlushError::AreaOutOfBounds(*area));
    }
    let bpp = descriptor.color_format.bytes_per_pixel();
    let w = to_index(area.width());
    let h = to_index(area.height());
    let required = w * h * bpp;
    if px_map.len() < required {
        return Err(FlushError::PixelMapTooSmall {
            required,
            provided: px_map.len(),
        });
    }

    let physical = area.rotated(rotation, to_coord(descriptor.width), to_coord(descriptor.height));
    let offset = descriptor.stride * to_index(physical.y1) + bpp * to_index(physical.x1);
    let dst = frame.get_mut(offset..).unwrap_or_default();
    let geometry = BlitGeometry::packed(w, h, bpp, descriptor.stride);
    match rotation {
        Rotation::None => blit::copy_area(px_map, dst, &geometry)?,
        _ => blit::rotate_area(px_map, dst, &geometry, rotation)?,
    }
    Ok(())
}

fn logical_size(descriptor: &LayerDescriptor, rotation: Rotation) -> (u32, u32) {
    if rotation.swaps_axes() {
        (descriptor.height, descriptor.width)
    } else {
        (descriptor.width, descriptor.height)
    }
}

/// Converts a coordinate already checked to be non-negative.
fn to_index(v: i32) -> usize {
    usize::try_from(v).unwrap_or_default()
}

fn to_coord(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

impl<C: DisplayController, S: SyncPrimitive + 'static> FlushTarget for Display<'_, C, S> {
    fn flush(&mut self, area: &Area, px_map: &[u8], is_last: bool) -> Result<FlushPath, FlushError> {
        if self.reload_pending {
            return Err(FlushError::ReloadPending);
        }
        self.state().set_flushed_in_callback(false);
        let result = self.dispatch(area, px_map, is_last);
        if let Ok(path) = result {
            self.tracer.flush(&FlushEvent {
                layer: self.descriptor.layer,
                area: *area,
                is_last,
                path,
                timestamp: self.scanout.flush.now(),
            });
        }
        result
    }

    fn flush_wait(&mut self) -> Result<(), FlushError> {
        let flush = self.scanout.flush;
        let layer = self.descriptor.layer;
        let state = self.state();
        let start = flush.now();

        let sync = match state.sync() {
            Some(sync) if !state.flushed_in_callback() => sync,
            _ => {
                self.reload_pending = false;
                self.tracer.flush_wait(&FlushWaitEvent {
                    layer,
                    blocked: false,
                    waited: Duration::ZERO,
                    outcome: WaitOutcome::Immediate,
                    timestamp: start,
                });
                return Ok(());
            }
        };

        let waited = match flush.wait_timeout {
            None => sync.wait(),
            Some(timeout) => sync.wait_timeout(timeout),
        };
        if waited.is_err() && !state.disarm() {
            self.absorb_late_signal(sync);
        }
        state.set_flushed_in_callback(true);
        self.reload_pending = false;

        let end = flush.now();
        let (outcome, result) = match waited {
            Ok(()) => (WaitOutcome::Signaled, Ok(())),
            Err(SyncError::TimedOut) => (WaitOutcome::TimedOut, Err(FlushError::Timeout)),
            Err(err) => (WaitOutcome::Failed, Err(FlushError::Sync(err))),
        };
        self.tracer.flush_wait(&FlushWaitEvent {
            layer,
            blocked: true,
            waited: end.saturating_duration_since(start),
            outcome,
            timestamp: end,
        });
        if result.is_ok() {
            self.tracer.reload_observed(&ReloadObservedEvent {
                layer,
                reloads_completed: state.reloads_completed(),
                timestamp: end,
            });
        }
        result
    }

    fn is_double_buffered(&self) -> bool {
        match &self.mode {
            Mode::Direct { buffers } | Mode::Partial { buffers, .. } => buffers.is_double(),
        }
    }

    fn render_mode(&self) -> RenderMode {
        match self.mode {
            Mode::Direct { .. } => RenderMode::Direct,
            Mode::Partial { .. } => RenderMode::Partial,
        }
    }

    fn resolution(&self) -> (u32, u32) {
        logical_size(&self.descriptor, self.rotation)
    }

    fn color_format(&self) -> ColorFormat {
        self.descriptor.color_format
    }

    fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }
}

impl<C: DisplayController, S: SyncPrimitive + 'static> Drop for Display<'_, C, S> {
    fn drop(&mut self) {
        if self.reload_pending {
            let state = self.state();
            if !state.disarm()
                && let Some(sync) = state.sync()
            {
                self.absorb_late_signal(sync);
            }
            state.set_flushed_in_callback(true);
        }
        self.scanout.release(self.descriptor.layer);
    }
}

impl<C: DisplayController, S: SyncPrimitive + 'static> fmt::Debug for Display<'_, C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Display")
            .field("descriptor", &self.descriptor)
            .field("mode", &self.render_mode())
            .field("rotation", &self.rotation)
            .field("reload_pending", &self.reload_pending)
            .finish_non_exhaustive()
    }
}
