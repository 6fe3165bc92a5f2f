// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip shape types for clip nodes.

use kurbo::Rect;

use crate::transform::Transform3d;

/// A shape used to clip the subtree of a clip node.
///
/// Shapes are given in the node's local coordinates. The software path clips
/// to axis-aligned device rectangles, so a rounded rectangle clips to its
/// bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClipShape {
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A rectangle with rounded corners.
    RoundedRect(kurbo::RoundedRect),
}

impl ClipShape {
    /// Returns the local-space bounds of the shape.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect(r) => *r,
            Self::RoundedRect(rr) => rr.rect(),
        }
    }

    /// Returns `false` for shapes with non-finite coordinates or negative
    /// extent.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let b = self.bounds();
        b.is_finite() && b.x1 >= b.x0 && b.y1 >= b.y0
    }

    /// Returns the device-space bounding rectangle of this shape under
    /// `transform`.
    #[must_use]
    pub fn device_bounds(&self, transform: Transform3d) -> Rect {
        transform.map_rect_bounds(self.bounds())
    }
}

/// Intersects a device-space clip rectangle with the inherited clip.
///
/// An inherited `None` means "unclipped". Returns `None` when nothing of
/// `local` survives.
#[must_use]
pub fn intersect_clip(parent: Option<Rect>, local: Rect) -> Option<Rect> {
    let clipped = match parent {
        Some(p) => p.intersect(local),
        None => local,
    };
    (clipped.width() > 0.0 && clipped.height() > 0.0).then_some(clipped)
}
