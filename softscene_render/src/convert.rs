// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions from scene geometry (`f64`, kurbo) to tiny-skia (`f32`).

#![expect(
    clippy::cast_possible_truncation,
    reason = "tiny-skia rasterizes in f32; precision beyond that is not representable on the pixel grid"
)]

use kurbo::{Affine, PathEl, Point, Rect, Shape};
use softscene_core::scene::Color;
use softscene_core::transform::Transform3d;
use tiny_skia::{Mask, Path, PathBuilder};

use crate::flush::PixelSize;

/// Curve flattening tolerance for converting kurbo shapes, in local units.
const TOLERANCE: f64 = 0.1;

pub(crate) fn transform(t: Transform3d) -> tiny_skia::Transform {
    affine(t.to_affine())
}

pub(crate) fn affine(a: Affine) -> tiny_skia::Transform {
    let [sx, ky, kx, sy, tx, ty] = a.as_coeffs();
    tiny_skia::Transform::from_row(
        sx as f32, ky as f32, kx as f32, sy as f32, tx as f32, ty as f32,
    )
}

pub(crate) fn scalar(v: f64) -> f32 {
    v as f32
}

pub(crate) fn rect(r: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_ltrb(r.x0 as f32, r.y0 as f32, r.x1 as f32, r.y1 as f32)
}

/// Builds a tiny-skia path from any kurbo shape.
pub(crate) fn path(shape: &impl Shape) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for el in shape.path_elements(TOLERANCE) {
        match el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32);
            }
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Builds a polyline (optionally closed) through `points`.
pub(crate) fn polyline(points: &[Point], close: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

/// Paint for a solid color with opacity folded into alpha.
pub(crate) fn paint(color: Color, opacity: f32) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    let alpha = (f32::from(color.a) * opacity.clamp(0.0, 1.0)).round() as u8;
    paint.set_color_rgba8(color.r, color.g, color.b, alpha);
    paint.anti_alias = true;
    paint
}

pub(crate) fn color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// A surface-sized mask admitting only the pixels under `clip`.
pub(crate) fn clip_mask(size: PixelSize, clip: Rect) -> Option<Mask> {
    let mut mask = Mask::new(size.width, size.height)?;
    let path = PathBuilder::from_rect(rect(clip)?);
    mask.fill_path(
        &path,
        tiny_skia::FillRule::Winding,
        true,
        tiny_skia::Transform::identity(),
    );
    Some(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affine_maps_like_kurbo() {
        let a = Affine::translate((3.0, 4.0)) * Affine::scale_non_uniform(2.0, 5.0);
        let t = affine(a);
        let mut pt = [tiny_skia::Point::from_xy(1.0, 1.0)];
        t.map_points(&mut pt);
        let expected = a * Point::new(1.0, 1.0);
        let eps = 1e-5;
        assert!((f64::from(pt[0].x) - expected.x).abs() < eps);
        assert!((f64::from(pt[0].y) - expected.y).abs() < eps);
    }

    #[test]
    fn opacity_scales_alpha() {
        let p = paint(Color::rgba(10, 20, 30, 200), 0.5);
        let c = match p.shader {
            tiny_skia::Shader::SolidColor(c) => c,
            _ => panic!("solid paint expected"),
        };
        let eps = 1e-2;
        assert!((c.alpha() - 100.0 / 255.0).abs() < eps, "alpha {}", c.alpha());
    }

    #[test]
    fn rounded_rect_converts() {
        let rr = kurbo::RoundedRect::new(0.0, 0.0, 10.0, 10.0, 3.0);
        let p = path(&rr).expect("rounded rect has a path");
        let b = p.bounds();
        let eps = 1e-3;
        assert!(b.left().abs() < eps && (b.right() - 10.0).abs() < eps);
    }

    #[test]
    fn degenerate_polyline_is_none() {
        assert!(polyline(&[], false).is_none());
    }
}
