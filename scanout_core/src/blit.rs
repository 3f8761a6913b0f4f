// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copying and rotating pixel regions into a live frame buffer.
//!
//! Partial-mode flushes land here. The source is a tightly or loosely packed
//! region from the renderer's scratch buffer, the destination is a slice of
//! the frame buffer starting at the region's first (frame-buffer space)
//! pixel. All bounds are checked once per call; the inner loops then work on
//! fixed-size pixel chunks so the compiler can unroll per pixel size.
//!
//! For a `w` x `h` source region, a source pixel at (row `r`, column `c`)
//! lands at:
//!
//! | Rotation | Destination row | Destination column |
//! |----------|-----------------|--------------------|
//! | none     | `r`             | `c`                |
//! | 90       | `w - 1 - c`     | `r`                |
//! | 180      | `h - 1 - r`     | `w - 1 - c`        |
//! | 270      | `c`             | `h - 1 - r`        |

use core::fmt;

use bytemuck::Pod;

use crate::area::Rotation;

/// Geometry of a blit, shared by source and destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlitGeometry {
    /// Source region width in pixels.
    pub width: usize,
    /// Source region height in pixels.
    pub height: usize,
    /// Bytes per pixel (1 to 4).
    pub bytes_per_pixel: usize,
    /// Bytes between source rows.
    pub src_stride: usize,
    /// Bytes between destination rows.
    pub dst_stride: usize,
}

impl BlitGeometry {
    /// Geometry for a source region packed without row padding.
    #[must_use]
    pub const fn packed(width: usize, height: usize, bytes_per_pixel: usize, dst_stride: usize) -> Self {
        Self {
            width,
            height,
            bytes_per_pixel,
            src_stride: width * bytes_per_pixel,
            dst_stride,
        }
    }

    /// Destination `(rows, columns)` after rotation.
    #[must_use]
    pub const fn rotated_dims(&self, rotation: Rotation) -> (usize, usize) {
        if rotation.swaps_axes() {
            (self.width, self.height)
        } else {
            (self.height, self.width)
        }
    }

    fn check(&self, rotation: Rotation, src_len: usize, dst_len: usize) -> Result<(), BlitError> {
        if !(1..=4).contains(&self.bytes_per_pixel) {
            return Err(BlitError::UnsupportedPixelSize(self.bytes_per_pixel));
        }
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }
        let (rows, cols) = self.rotated_dims(rotation);
        if self.src_stride < self.width * self.bytes_per_pixel
            || self.dst_stride < cols * self.bytes_per_pixel
        {
            return Err(BlitError::BadStride);
        }
        let src_needed = span(self.height, self.src_stride, self.width * self.bytes_per_pixel);
        if src_len < src_needed {
            return Err(BlitError::SourceTooSmall {
                required: src_needed,
                provided: src_len,
            });
        }
        let dst_needed = span(rows, self.dst_stride, cols * self.bytes_per_pixel);
        if dst_len < dst_needed {
            return Err(BlitError::DestinationTooSmall {
                required: dst_needed,
                provided: dst_len,
            });
        }
        Ok(())
    }
}

/// Bytes touched by `rows` rows of `row_bytes` each, `stride` apart.
const fn span(rows: usize, stride: usize, row_bytes: usize) -> usize {
    (rows - 1) * stride + row_bytes
}

/// Errors reported before any pixel is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlitError {
    /// Pixel size outside 1 to 4 bytes.
    UnsupportedPixelSize(usize),
    /// A stride is shorter than the row it has to hold.
    BadStride,
    /// The source slice ends before the region does.
    SourceTooSmall {
        /// Bytes needed.
        required: usize,
        /// Bytes supplied.
        provided: usize,
    },
    /// The destination slice ends before the rotated region does.
    DestinationTooSmall {
        /// Bytes needed.
        required: usize,
        /// Bytes supplied.
        provided: usize,
    },
}

impl fmt::Display for BlitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedPixelSize(n) => write!(f, "unsupported pixel size of {n} bytes"),
            Self::BadStride => f.write_str("stride shorter than row"),
            Self::SourceTooSmall { required, provided } => {
                write!(f, "source holds {provided} bytes, {required} required")
            }
            Self::DestinationTooSmall { required, provided } => {
                write!(f, "destination holds {provided} bytes, {required} required")
            }
        }
    }
}

impl core::error::Error for BlitError {}

/// Copies a region row by row without rotation.
pub fn copy_area(src: &[u8], dst: &mut [u8], geometry: &BlitGeometry) -> Result<(), BlitError> {
    geometry.check(Rotation::None, src.len(), dst.len())?;
    let row_bytes = geometry.width * geometry.bytes_per_pixel;
    for row in 0..geometry.height {
        let s = row * geometry.src_stride;
        let d = row * geometry.dst_stride;
        dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
    }
    Ok(())
}

/// Copies a region into `dst`, rotating it by `rotation`.
///
/// `dst` starts at the top-left pixel of the rotated region.
pub fn rotate_area(
    src: &[u8],
    dst: &mut [u8],
    geometry: &BlitGeometry,
    rotation: Rotation,
) -> Result<(), BlitError> {
    geometry.check(rotation, src.len(), dst.len())?;
    if geometry.width == 0 || geometry.height == 0 {
        return Ok(());
    }
    match geometry.bytes_per_pixel {
        1 => rotate_px::<1>(src, dst, geometry, rotation),
        2 => rotate_px::<2>(src, dst, geometry, rotation),
        3 => rotate_px::<3>(src, dst, geometry, rotation),
        _ => rotate_px::<4>(src, dst, geometry, rotation),
    }
    Ok(())
}

fn rotate_px<const N: usize>(src: &[u8], dst: &mut [u8], g: &BlitGeometry, rotation: Rotation)
where
    [u8; N]: Pod,
{
    let (w, h) = (g.width, g.height);
    let src_row = |r: usize| source_row::<N>(src, g, r);
    match rotation {
        Rotation::None => {
            for r in 0..h {
                let start = r * g.dst_stride;
                let out: &mut [[u8; N]] = bytemuck::cast_slice_mut(&mut dst[start..start + w * N]);
                out.copy_from_slice(src_row(r));
            }
        }
        Rotation::Deg180 => {
            for r in 0..h {
                let start = (h - 1 - r) * g.dst_stride;
                let out: &mut [[u8; N]] = bytemuck::cast_slice_mut(&mut dst[start..start + w * N]);
                for (o, px) in out.iter_mut().rev().zip(src_row(r)) {
                    *o = *px;
                }
            }
        }
        Rotation::Deg90 | Rotation::Deg270 => {
            // Destination rows are source columns; gather each one down the
            // source column.
            for c in 0..w {
                let dst_row = if rotation == Rotation::Deg90 { w - 1 - c } else { c };
                let start = dst_row * g.dst_stride;
                let out: &mut [[u8; N]] = bytemuck::cast_slice_mut(&mut dst[start..start + h * N]);
                for r in 0..h {
                    let px: &[u8; N] = bytemuck::from_bytes(&src[r * g.src_stride + c * N..][..N]);
                    let col = if rotation == Rotation::Deg90 { r } else { h - 1 - r };
                    out[col] = *px;
                }
            }
        }
    }
}

fn source_row<'s, const N: usize>(src: &'s [u8], g: &BlitGeometry, r: usize) -> &'s [[u8; N]]
where
    [u8; N]: Pod,
{
    let start = r * g.src_stride;
    bytemuck::cast_slice(&src[start..start + g.width * N])
}
