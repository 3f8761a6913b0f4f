// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Static hardware configuration and flush policy.
//!
//! Panel timing and layer geometry are fixed at build time on the boards
//! this crate targets, so configuration is plain `const` data.
//! [`ControllerConfig`] describes the controller and its layers;
//! [`FlushConfig`] selects how flushes interact with the reload interrupt.

use core::fmt;

use crate::backend::{ControllerError, ReloadMode};
use crate::format::LayerPixelFormat;
use crate::layer::{LayerIndex, MAX_LAYERS};
use crate::time::{Duration, HostTime};

/// Opaque white in `0xAARRGGBB` form.
pub const WHITE: u32 = 0xFFFF_FFFF;

/// Panel timing, in pixel clocks (horizontal) and lines (vertical).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelTiming {
    /// Active width.
    pub width: u16,
    /// Active height.
    pub height: u16,
    /// Horizontal sync pulse width.
    pub hsync: u16,
    /// Vertical sync pulse height.
    pub vsync: u16,
    /// Horizontal back porch.
    pub hbp: u16,
    /// Vertical back porch.
    pub vbp: u16,
    /// Horizontal front porch.
    pub hfp: u16,
    /// Vertical front porch.
    pub vfp: u16,
}

/// Signal polarities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Polarity {
    /// Horizontal sync is active high.
    pub hsync_active_high: bool,
    /// Vertical sync is active high.
    pub vsync_active_high: bool,
    /// Data enable is active high.
    pub data_enable_active_high: bool,
    /// Pixel clock is inverted.
    pub pixel_clock_inverted: bool,
}

/// Geometry and format of a layer's frame buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameConfig {
    /// Width in pixels.
    pub width: u16,
    /// Height in lines.
    pub height: u16,
    /// Bytes between the starts of two consecutive lines.
    pub stride: u32,
    /// Hardware pixel format.
    pub format: LayerPixelFormat,
}

/// Inclusive on-screen window a layer is displayed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    /// First visible column.
    pub h_start: u16,
    /// Last visible column.
    pub h_stop: u16,
    /// First visible line.
    pub v_start: u16,
    /// Last visible line.
    pub v_stop: u16,
}

impl Window {
    /// A window covering a full `width` x `height` panel.
    #[must_use]
    pub const fn fullscreen(width: u16, height: u16) -> Self {
        Self {
            h_start: 0,
            h_stop: width - 1,
            v_start: 0,
            v_stop: height - 1,
        }
    }
}

/// How a layer is blended with what lies beneath it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Blending {
    /// Constant alpha only.
    #[default]
    ConstantAlpha,
    /// Pixel alpha multiplied by constant alpha.
    PixelAlpha,
}

/// Static configuration of one hardware layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerConfig {
    /// Frame buffer geometry.
    pub frame: FrameConfig,
    /// Display window.
    pub window: Window,
    /// Color outside the frame, `0xAARRGGBB`.
    pub default_color: u32,
    /// Constant alpha.
    pub constant_alpha: u8,
    /// Color key as `0xRRGGBB`, if keying is enabled.
    pub color_key: Option<u32>,
    /// Blending mode.
    pub blending: Blending,
}

/// Static configuration of the display controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Panel timing.
    pub timing: PanelTiming,
    /// Signal polarities.
    pub polarity: Polarity,
    /// Background color, `0xRRGGBB`.
    pub background: u32,
    /// Per-layer configuration, indexed by [`LayerIndex`].
    pub layers: [Option<LayerConfig>; MAX_LAYERS],
}

impl ControllerConfig {
    /// A 240x320 portrait panel with a single full-screen RGB888 layer.
    #[must_use]
    pub const fn portrait_240x320_rgb888() -> Self {
        const W: u16 = 240;
        const H: u16 = 320;
        Self {
            timing: PanelTiming {
                width: W,
                height: H,
                hsync: 10,
                vsync: 2,
                hbp: 20,
                vbp: 2,
                hfp: 10,
                vfp: 4,
            },
            polarity: Polarity {
                hsync_active_high: false,
                vsync_active_high: false,
                data_enable_active_high: false,
                pixel_clock_inverted: false,
            },
            background: 0x00FF_FFFF,
            layers: [
                Some(LayerConfig {
                    frame: FrameConfig {
                        width: W,
                        height: H,
                        stride: W as u32 * 3,
                        format: LayerPixelFormat::Rgb888,
                    },
                    window: Window::fullscreen(W, H),
                    default_color: WHITE,
                    constant_alpha: 0xFF,
                    color_key: Some(0x98_0088),
                    blending: Blending::ConstantAlpha,
                }),
                None,
            ],
        }
    }

    /// Returns a copy with `layer` configured as a full-screen layer of the
    /// given format, using a tightly packed stride.
    #[must_use]
    pub const fn with_fullscreen_layer(mut self, layer: LayerIndex, format: LayerPixelFormat) -> Self {
        let w = self.timing.width;
        let h = self.timing.height;
        self.layers[layer.get()] = Some(LayerConfig {
            frame: FrameConfig {
                width: w,
                height: h,
                stride: w as u32 * format.bytes_per_pixel() as u32,
                format,
            },
            window: Window::fullscreen(w, h),
            default_color: WHITE,
            constant_alpha: 0xFF,
            color_key: None,
            blending: Blending::ConstantAlpha,
        });
        self
    }

    /// Returns the configuration of `layer`.
    pub fn layer(&self, layer: LayerIndex) -> Result<&LayerConfig, ConfigError> {
        self.layers[layer.get()]
            .as_ref()
            .ok_or(ConfigError::LayerNotConfigured(layer))
    }
}

/// How flushes hand buffers to the controller and wait for it.
#[derive(Clone, Copy, Debug)]
pub struct FlushConfig {
    /// When a requested reload takes effect.
    pub reload_mode: ReloadMode,
    /// Upper bound on a blocking flush-wait. `None` waits forever.
    pub wait_timeout: Option<Duration>,
    /// Monotonic clock used to timestamp trace events.
    pub clock: Option<fn() -> HostTime>,
}

impl FlushConfig {
    /// Vertical-blank reloads with an unbounded wait.
    #[must_use]
    pub const fn reference() -> Self {
        Self {
            reload_mode: ReloadMode::VerticalBlanking,
            wait_timeout: None,
            clock: None,
        }
    }

    /// Vertical-blank reloads; a wait longer than `timeout` fails with
    /// [`FlushError::Timeout`](crate::display::FlushError::Timeout).
    #[must_use]
    pub const fn hardened(timeout: Duration) -> Self {
        Self {
            reload_mode: ReloadMode::VerticalBlanking,
            wait_timeout: Some(timeout),
            clock: None,
        }
    }

    /// Returns a copy that timestamps trace events with `clock`.
    #[must_use]
    pub const fn with_clock(mut self, clock: fn() -> HostTime) -> Self {
        self.clock = Some(clock);
        self
    }

    pub(crate) fn now(&self) -> HostTime {
        self.clock.map_or(HostTime(0), |clock| clock())
    }
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self::reference()
    }
}

/// Errors detected while building a display from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The layer has no entry in [`ControllerConfig::layers`].
    LayerNotConfigured(LayerIndex),
    /// A renderer buffer is smaller than the frame it must hold.
    BufferTooSmall {
        /// Bytes needed.
        required: usize,
        /// Bytes supplied.
        provided: usize,
    },
    /// The live frame buffer is smaller than `stride * height`.
    FrameBufferTooSmall {
        /// Bytes needed.
        required: usize,
        /// Bytes supplied.
        provided: usize,
    },
    /// A direct-mode layer's stride leaves padding after each line; the
    /// renderer draws packed lines.
    PaddedStride {
        /// Configured bytes per line.
        stride: usize,
        /// Bytes the renderer writes per line.
        line: usize,
    },
    /// A partial-mode scratch buffer cannot hold even one pixel.
    EmptyBuffer,
    /// Another display already drives the layer.
    LayerInUse(LayerIndex),
    /// The controller rejected the configuration.
    Controller(ControllerError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LayerNotConfigured(layer) => write!(f, "{layer:?} is not configured"),
            Self::BufferTooSmall { required, provided } => {
                write!(f, "render buffer holds {provided} bytes, {required} required")
            }
            Self::FrameBufferTooSmall { required, provided } => {
                write!(f, "frame buffer holds {provided} bytes, {required} required")
            }
            Self::PaddedStride { stride, line } => {
                write!(f, "stride of {stride} bytes does not match {line}-byte lines")
            }
            Self::EmptyBuffer => f.write_str("render buffer cannot hold a single pixel"),
            Self::LayerInUse(layer) => write!(f, "{layer:?} already has a display"),
            Self::Controller(err) => write!(f, "controller rejected configuration: {err}"),
        }
    }
}

impl core::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Controller(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portrait_preset_matches_panel() {
        let cfg = ControllerConfig::portrait_240x320_rgb888();
        let layer = cfg.layer(LayerIndex::FIRST).expect("layer 0 is configured");
        assert_eq!(layer.frame.stride, 720);
        assert_eq!(layer.window, Window::fullscreen(240, 320));
        assert_eq!(
            cfg.layer(LayerIndex::SECOND),
            Err(ConfigError::LayerNotConfigured(LayerIndex::SECOND))
        );
    }

    #[test]
    fn added_layer_uses_packed_stride() {
        let cfg = ControllerConfig::portrait_240x320_rgb888()
            .with_fullscreen_layer(LayerIndex::SECOND, LayerPixelFormat::Rgb565);
        let layer = cfg.layer(LayerIndex::SECOND).expect("layer 1 was added");
        assert_eq!(layer.frame.stride, 480);
        assert_eq!(layer.frame.format, LayerPixelFormat::Rgb565);
    }

    #[test]
    fn flush_config_clock() {
        fn fixed() -> HostTime {
            HostTime(77)
        }
        assert_eq!(FlushConfig::reference().now(), HostTime(0));
        assert_eq!(FlushConfig::reference().with_clock(fixed).now(), HostTime(77));
        assert_eq!(
            FlushConfig::hardened(Duration(5)).wait_timeout,
            Some(Duration(5))
        );
    }
}
