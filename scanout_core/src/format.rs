// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel formats on both sides of the flush boundary.
//!
//! [`LayerPixelFormat`] is what the display controller scans out of a layer's
//! frame buffer. [`ColorFormat`] is what the renderer draws into its pixel
//! maps. Only five of the controller's formats have a renderer counterpart;
//! translating any other one is a configuration bug, so
//! [`ColorFormat::from_layer`] panics instead of guessing a byte layout.

use core::fmt;

/// Pixel format of a hardware scan-out layer.
///
/// The discriminants are the controller's 3-bit pixel format codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LayerPixelFormat {
    /// 32-bit ARGB.
    Argb8888 = 0,
    /// 24-bit RGB.
    Rgb888 = 1,
    /// 16-bit RGB.
    Rgb565 = 2,
    /// 16-bit ARGB with 1-bit alpha.
    Argb1555 = 3,
    /// 16-bit ARGB with 4-bit channels.
    Argb4444 = 4,
    /// 8-bit luminance.
    L8 = 5,
    /// 8-bit luminance with 4-bit alpha.
    Al44 = 6,
    /// 8-bit luminance with 8-bit alpha.
    Al88 = 7,
}

impl LayerPixelFormat {
    /// Decodes a raw pixel format code.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Argb8888,
            1 => Self::Rgb888,
            2 => Self::Rgb565,
            3 => Self::Argb1555,
            4 => Self::Argb4444,
            5 => Self::L8,
            6 => Self::Al44,
            7 => Self::Al88,
            _ => return None,
        })
    }

    /// Returns the raw pixel format code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Bytes per pixel as scanned out by the controller.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Argb8888 => 4,
            Self::Rgb888 => 3,
            Self::Rgb565 | Self::Argb1555 | Self::Argb4444 | Self::Al88 => 2,
            Self::L8 | Self::Al44 => 1,
        }
    }
}

/// Color format of renderer pixel maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    /// 32-bit ARGB.
    Argb8888,
    /// 24-bit RGB.
    Rgb888,
    /// 16-bit RGB.
    Rgb565,
    /// 8-bit luminance.
    L8,
    /// 8-bit luminance with 8-bit alpha.
    Al88,
}

impl ColorFormat {
    /// Translates a layer format to the renderer format with the same byte
    /// layout.
    ///
    /// # Panics
    ///
    /// Panics if the layer format has no renderer counterpart.
    #[must_use]
    pub fn from_layer(format: LayerPixelFormat) -> Self {
        match Self::try_from(format) {
            Ok(cf) => cf,
            Err(err) => panic!("{err}"),
        }
    }

    /// Size of one pixel in bytes.
    #[inline]
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Argb8888 => 4,
            Self::Rgb888 => 3,
            Self::Rgb565 | Self::Al88 => 2,
            Self::L8 => 1,
        }
    }
}

impl TryFrom<LayerPixelFormat> for ColorFormat {
    type Error = UnsupportedFormat;

    fn try_from(format: LayerPixelFormat) -> Result<Self, Self::Error> {
        match format {
            LayerPixelFormat::Argb8888 => Ok(Self::Argb8888),
            LayerPixelFormat::Rgb888 => Ok(Self::Rgb888),
            LayerPixelFormat::Rgb565 => Ok(Self::Rgb565),
            LayerPixelFormat::L8 => Ok(Self::L8),
            LayerPixelFormat::Al88 => Ok(Self::Al88),
            LayerPixelFormat::Argb1555 | LayerPixelFormat::Argb4444 | LayerPixelFormat::Al44 => {
                Err(UnsupportedFormat(format))
            }
        }
    }
}

/// A layer pixel format that renderer pixel maps cannot represent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnsupportedFormat(pub LayerPixelFormat);

impl fmt::Display for UnsupportedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer pixel format {:?} is not supported", self.0)
    }
}

impl core::error::Error for UnsupportedFormat {}
