// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flush areas and display rotation.
//!
//! Renderers describe the region being flushed as an [`Area`] with inclusive
//! pixel coordinates in *logical* (rotated) space. Before pixels can be
//! written to a frame buffer the area has to be mapped into *physical*
//! frame-buffer space with [`Area::rotated`].
//!
//! Renderers built on `kurbo` geometry can convert damage rectangles with
//! [`Area::from_rect`] and [`Area::to_rect`].

use kurbo::Rect;

/// Display rotation relative to the panel's native orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    /// Native orientation.
    #[default]
    None,
    /// Rotated by 90 degrees.
    Deg90,
    /// Rotated by 180 degrees.
    Deg180,
    /// Rotated by 270 degrees.
    Deg270,
}

impl Rotation {
    /// Returns `true` if logical width and height are swapped relative to the
    /// panel.
    #[inline]
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// A rectangular pixel region with inclusive corner coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Area {
    /// Left column.
    pub x1: i32,
    /// Top row.
    pub y1: i32,
    /// Right column (inclusive).
    pub x2: i32,
    /// Bottom row (inclusive).
    pub y2: i32,
}

impl Area {
    /// Creates an area from inclusive corners.
    #[inline]
    #[must_use]
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Creates an area from its top-left corner and size.
    #[inline]
    #[must_use]
    pub const fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width - 1, y + height - 1)
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.x2 - self.x1 + 1
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.y2 - self.y1 + 1
    }

    /// Returns `true` if the area covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.x2 < self.x1 || self.y2 < self.y1
    }

    /// Returns `true` if the area is non-empty and lies entirely inside a
    /// `width` x `height` surface anchored at the origin.
    #[must_use]
    pub const fn fits_within(&self, width: u32, height: u32) -> bool {
        !self.is_empty()
            && self.x1 >= 0
            && self.y1 >= 0
            && (self.x2 as i64) < width as i64
            && (self.y2 as i64) < height as i64
    }

    /// Maps a logical area into frame-buffer space for a panel whose native
    /// resolution is `hor_res` x `ver_res`.
    #[must_use]
    pub const fn rotated(self, rotation: Rotation, hor_res: i32, ver_res: i32) -> Self {
        let w = self.width();
        let h = self.height();
        match rotation {
            Rotation::None => self,
            Rotation::Deg90 => {
                let y2 = ver_res - self.x1 - 1;
                let x1 = self.y1;
                Self::new(x1, y2 - w + 1, x1 + h - 1, y2)
            }
            Rotation::Deg180 => {
                let y2 = ver_res - self.y1 - 1;
                let x2 = hor_res - self.x1 - 1;
                Self::new(x2 - w + 1, y2 - h + 1, x2, y2)
            }
            Rotation::Deg270 => {
                let x1 = hor_res - self.y2 - 1;
                let y2 = self.x2;
                Self::new(x1, y2 - w + 1, x1 + h - 1, y2)
            }
        }
    }

    /// Converts to a `kurbo` rectangle with exclusive max edges.
    #[must_use]
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            f64::from(self.x1),
            f64::from(self.y1),
            f64::from(self.x2) + 1.0,
            f64::from(self.y2) + 1.0,
        )
    }

    /// Converts a `kurbo` rectangle to the smallest area covering it.
    ///
    /// Returns `None` for rectangles that cover no whole or partial pixel.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "expanded rect edges are integral and display-sized"
    )]
    pub fn from_rect(rect: Rect) -> Option<Self> {
        let r = rect.abs().expand();
        if r.width() <= 0.0 || r.height() <= 0.0 {
            return None;
        }
        Some(Self::new(
            r.x0 as i32,
            r.y0 as i32,
            r.x1 as i32 - 1,
            r.y1 as i32 - 1,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOR: i32 = 240;
    const VER: i32 = 320;

    #[test]
    fn size_and_bounds() {
        let a = Area::from_origin_size(5, 5, 10, 10);
        assert_eq!(a, Area::new(5, 5, 14, 14));
        assert_eq!((a.width(), a.height()), (10, 10));
        assert!(a.fits_within(240, 320));
        assert!(!Area::new(230, 0, 240, 9).fits_within(240, 320));
        assert!(!Area::new(-1, 0, 3, 3).fits_within(240, 320));
        assert!(!Area::new(4, 0, 3, 3).fits_within(240, 320));
    }

    #[test]
    fn rotation_none_is_identity() {
        let a = Area::new(3, 7, 12, 20);
        assert_eq!(a.rotated(Rotation::None, HOR, VER), a);
    }

    #[test]
    fn rotation_90_maps_columns_to_rows() {
        // Logical space is 320 x 240. The top-left logical pixel lands at the
        // bottom-left of the panel.
        let a = Area::new(0, 0, 9, 4);
        let r = a.rotated(Rotation::Deg90, HOR, VER);
        assert_eq!(r, Area::new(0, VER - 10, 4, VER - 1));
        assert_eq!((r.width(), r.height()), (a.height(), a.width()));
    }

    #[test]
    fn rotation_180_mirrors_both_axes() {
        let a = Area::new(0, 0, 9, 4);
        assert_eq!(
            a.rotated(Rotation::Deg180, HOR, VER),
            Area::new(HOR - 10, VER - 5, HOR - 1, VER - 1)
        );
    }

    #[test]
    fn rotation_270_maps_rows_to_columns() {
        let a = Area::new(0, 0, 9, 4);
        let r = a.rotated(Rotation::Deg270, HOR, VER);
        assert_eq!(r, Area::new(HOR - 5, 0, HOR - 1, 9));
    }

    #[test]
    fn rotated_full_screen_covers_panel() {
        let logical = Area::new(0, 0, VER - 1, HOR - 1);
        for rot in [Rotation::Deg90, Rotation::Deg270] {
            assert_eq!(logical.rotated(rot, HOR, VER), Area::new(0, 0, HOR - 1, VER - 1));
        }
    }

    #[test]
    fn kurbo_conversion() {
        let a = Area::new(2, 3, 11, 7);
        let rect = a.to_rect();
        assert_eq!(rect, Rect::new(2.0, 3.0, 12.0, 8.0));
        assert_eq!(Area::from_rect(rect), Some(a));
        assert_eq!(
            Area::from_rect(Rect::new(2.5, 3.2, 4.1, 4.0)),
            Some(Area::new(2, 3, 4, 3))
        );
        assert_eq!(Area::from_rect(Rect::new(1.0, 1.0, 1.0, 5.0)), None);
    }
}
