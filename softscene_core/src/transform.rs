// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 transform carried by transform nodes and display entries.
//!
//! Scene nodes may carry full 3-D affine matrices, but the software path only
//! ever rasterizes their 2-D projection: [`Transform3d::to_affine`] drops the
//! Z row and column, and the point/rect mapping helpers work in the XY plane.

use core::ops::Mul;

use kurbo::{Affine, Point, Rect};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// A column-major 4×4 affine transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(col0: [f64; 4], col1: [f64; 4], col2: [f64; 4], col3: [f64; 4]) -> Self {
        Self {
            cols: [col0, col1, col2, col3],
        }
    }

    /// Creates a pure translation in the XY plane.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, 0.0, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale in the XY plane.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        #[cfg(feature = "std")]
        let (s, c) = radians.sin_cos();
        #[cfg(not(feature = "std"))]
        let (s, c) = (radians.sin(), radians.cos());
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a transform from a 2-D [`Affine`].
    #[must_use]
    pub fn from_affine(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self {
            cols: [
                [a, b, 0.0, 0.0],
                [c, d, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [e, f, 0.0, 1.0],
            ],
        }
    }

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Projects this transform onto the XY plane.
    #[must_use]
    pub fn to_affine(self) -> Affine {
        let c = &self.cols;
        Affine::new([c[0][0], c[0][1], c[1][0], c[1][1], c[3][0], c[3][1]])
    }

    /// Maps a point in the XY plane.
    #[must_use]
    pub fn map_point(self, p: Point) -> Point {
        let c = &self.cols;
        Point::new(
            c[0][0] * p.x + c[1][0] * p.y + c[3][0],
            c[0][1] * p.x + c[1][1] * p.y + c[3][1],
        )
    }

    /// Maps a rectangle and returns the axis-aligned bounding box of the
    /// result.
    #[must_use]
    pub fn map_rect_bounds(self, rect: Rect) -> Rect {
        let corners = [
            self.map_point(Point::new(rect.x0, rect.y0)),
            self.map_point(Point::new(rect.x1, rect.y0)),
            self.map_point(Point::new(rect.x0, rect.y1)),
            self.map_point(Point::new(rect.x1, rect.y1)),
        ];
        let mut out = Rect::from_points(corners[0], corners[1]);
        out = out.union_pt(corners[2]);
        out.union_pt(corners[3])
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        let mut j = 0;
        while j < 4 {
            let mut i = 0;
            while i < 4 {
                out[j][i] =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
                i += 1;
            }
            j += 1;
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_multiply() {
        let t = Transform3d::from_translation(1.0, 2.0);
        assert_eq!(Transform3d::IDENTITY * t, t);
        assert_eq!(t * Transform3d::IDENTITY, t);
    }

    #[test]
    fn translation_composition() {
        let a = Transform3d::from_translation(1.0, 0.0);
        let b = Transform3d::from_translation(0.0, 2.0);
        assert_eq!((a * b).col(3), [1.0, 2.0, 0.0, 1.0]);
    }

    #[test]
    fn parent_applies_after_child() {
        // Parent translates, child scales: a child-local point is scaled first.
        let parent = Transform3d::from_translation(10.0, 0.0);
        let child = Transform3d::from_scale(2.0, 2.0);
        let p = (parent * child).map_point(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(12.0, 2.0));
    }

    #[test]
    fn rect_bounds_under_rotation() {
        let r = Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_2);
        let bounds = r.map_rect_bounds(Rect::new(0.0, 0.0, 10.0, 5.0));
        let eps = 1e-9;
        assert!((bounds.x0 + 5.0).abs() < eps, "got {bounds:?}");
        assert!(bounds.y0.abs() < eps, "got {bounds:?}");
        assert!(bounds.x1.abs() < eps, "got {bounds:?}");
        assert!((bounds.y1 - 10.0).abs() < eps, "got {bounds:?}");
    }

    #[test]
    fn affine_round_trip() {
        let affine = Affine::translate((3.0, 4.0)) * Affine::scale(2.0);
        assert_eq!(Transform3d::from_affine(affine).to_affine(), affine);
    }

    #[test]
    fn non_finite_detected() {
        let mut t = Transform3d::IDENTITY;
        assert!(t.is_finite());
        t.cols[3][0] = f64::NAN;
        assert!(!t.is_finite());
        t.cols[3][0] = f64::INFINITY;
        assert!(!t.is_finite());
    }
}
