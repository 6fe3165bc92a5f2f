// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel geometry and flush-region tracking.

use kurbo::Rect;

/// A surface size in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Creates a size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The rectangle covering the whole surface, anchored at the origin.
    #[must_use]
    pub const fn to_rect(self) -> PixelRect {
        PixelRect {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        }
    }
}

/// An axis-aligned rectangle on the pixel grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl PixelRect {
    /// Creates a rectangle from origin and size.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the smallest pixel rectangle containing `rect`, or `None` if
    /// `rect` is empty or not finite.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "device coordinates are clamped to the i32 range before the cast"
    )]
    pub fn round_out(rect: Rect) -> Option<Self> {
        if !rect.is_finite() || rect.width() <= 0.0 || rect.height() <= 0.0 {
            return None;
        }
        let lo = f64::from(i32::MIN);
        let hi = f64::from(i32::MAX);
        let x0 = rect.x0.floor().clamp(lo, hi) as i32;
        let y0 = rect.y0.floor().clamp(lo, hi) as i32;
        let x1 = rect.x1.ceil().clamp(lo, hi) as i32;
        let y1 = rect.y1.ceil().clamp(lo, hi) as i32;
        Self::from_edges(x0, y0, x1, y1)
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Right edge (exclusive).
    #[must_use]
    pub const fn right(self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Bottom edge (exclusive).
    #[must_use]
    pub const fn bottom(self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Self::from_edges_wide(x0, y0, x1, y1).unwrap_or(self)
    }

    /// Overlap of both rectangles, or `None` if they do not overlap.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        Self::from_edges_wide(x0, y0, x1, y1)
    }

    /// Converts to a floating-point rectangle.
    #[must_use]
    pub fn to_kurbo(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.x) + f64::from(self.width),
            f64::from(self.y) + f64::from(self.height),
        )
    }

    fn from_edges(x0: i32, y0: i32, x1: i32, y1: i32) -> Option<Self> {
        Self::from_edges_wide(x0, y0, i64::from(x1), i64::from(y1))
    }

    fn from_edges_wide(x0: i32, y0: i32, x1: i64, y1: i64) -> Option<Self> {
        let width = u32::try_from(x1 - i64::from(x0)).ok()?;
        let height = u32::try_from(y1 - i64::from(y0)).ok()?;
        let rect = Self::new(x0, y0, width, height);
        (!rect.is_empty()).then_some(rect)
    }
}

/// The pixels written by one rasterization pass.
///
/// Tracked as a single bounding rectangle: presentation cost is bounded by
/// the rectangle's area, and backing stores flush rectangles natively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlushRegion {
    /// Nothing was drawn.
    #[default]
    Empty,
    /// Everything drawn lies within this rectangle.
    Rect(PixelRect),
}

impl FlushRegion {
    /// Returns `true` if nothing was drawn.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The bounding rectangle, if any.
    #[must_use]
    pub const fn bounds(&self) -> Option<PixelRect> {
        match self {
            Self::Empty => None,
            Self::Rect(r) => Some(*r),
        }
    }

    /// Adds a rectangle to the region.
    pub fn add(&mut self, rect: PixelRect) {
        if rect.is_empty() {
            return;
        }
        *self = Self::Rect(match *self {
            Self::Empty => rect,
            Self::Rect(r) => r.union(rect),
        });
    }

    /// Merges another region into this one.
    pub fn merge(&mut self, other: &Self) {
        if let Self::Rect(r) = other {
            self.add(*r);
        }
    }

    /// Restricts the region to `bounds`.
    #[must_use]
    pub fn clipped_to(self, bounds: PixelRect) -> Self {
        match self.bounds().and_then(|r| r.intersect(bounds)) {
            Some(r) => Self::Rect(r),
            None => Self::Empty,
        }
    }
}
