// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hardware layer identity and resolved frame descriptors.

use core::fmt;

use crate::format::{ColorFormat, LayerPixelFormat};

/// Number of hardware scan-out layers.
pub const MAX_LAYERS: usize = 2;

/// Identifies one of the [`MAX_LAYERS`] hardware scan-out layers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerIndex(u8);

impl LayerIndex {
    /// The bottom layer.
    pub const FIRST: Self = Self(0);
    /// The top layer.
    pub const SECOND: Self = Self(1);

    /// Creates a layer index, or `None` if `index` is not a hardware layer.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::FIRST),
            1 => Some(Self::SECOND),
            _ => None,
        }
    }

    /// Returns the index as an array offset.
    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0 as usize
    }

    /// Iterates over every hardware layer.
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::FIRST, Self::SECOND].into_iter()
    }
}

impl fmt::Debug for LayerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerIndex({})", self.0)
    }
}

/// Address of a frame buffer as seen by the display controller.
///
/// Core code only compares and forwards addresses; it never dereferences
/// them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameAddr(pub usize);

impl FrameAddr {
    /// The address of the first byte of `buf`.
    #[inline]
    #[must_use]
    pub fn of(buf: &[u8]) -> Self {
        Self(buf.as_ptr() as usize)
    }

    /// Returns `true` if no buffer is attached.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for FrameAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameAddr({:#010x})", self.0)
    }
}

/// Frame geometry and current buffer of a hardware layer.
///
/// Produced by [`Scanout::resolve_layer`](crate::display::Scanout::resolve_layer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerDescriptor {
    /// Which layer this describes.
    pub layer: LayerIndex,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Bytes between the starts of two consecutive rows.
    pub stride: usize,
    /// Hardware pixel format.
    pub format: LayerPixelFormat,
    /// Matching renderer color format.
    pub color_format: ColorFormat,
    /// Buffer the controller currently scans out for this layer.
    pub buffer: FrameAddr,
}

impl LayerDescriptor {
    /// Size of one full frame as the renderer draws it, in bytes.
    #[inline]
    #[must_use]
    pub const fn frame_size(&self) -> usize {
        self.line_size() * self.height as usize
    }

    /// Bytes in one packed line of pixels.
    #[inline]
    #[must_use]
    pub const fn line_size(&self) -> usize {
        self.width as usize * self.color_format.bytes_per_pixel()
    }

    /// Bytes needed to hold a frame at this layer's stride.
    #[inline]
    #[must_use]
    pub const fn scanout_size(&self) -> usize {
        self.stride * self.height as usize
    }
}
