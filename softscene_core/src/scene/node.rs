// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node kinds and their payloads.

use alloc::sync::Arc;

use kurbo::{Insets, Point, Rect};

use super::id::ResourceKey;
use crate::clip::ClipShape;
use crate::transform::Transform3d;

/// A straight (non-premultiplied) 8-bit RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);

    /// Creates a color from its four channels.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }
}

/// Miter limit used for stroked geometry, as a multiple of the line width.
///
/// A miter join reaches at most `STROKE_MITER_LIMIT * width / 2` past its
/// vertex; sharper corners fall back to a bevel.
pub const STROKE_MITER_LIMIT: f64 = 4.0;

/// How geometry vertices are rasterized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GeometryMode {
    /// Fill the closed polygon through the vertices (non-zero winding).
    Fill,
    /// Stroke the open polyline through the vertices with miter joins
    /// (see [`STROKE_MITER_LIMIT`]) and butt caps.
    Stroke {
        /// Line width in local units.
        width: f64,
    },
}

/// Arbitrary vertex geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryContent {
    /// Vertices in local coordinates.
    pub vertices: Arc<[Point]>,
    /// Fill or stroke.
    pub mode: GeometryMode,
    /// Paint color.
    pub color: Color,
}

/// A reference to an image resource drawn into a target rectangle.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageContent {
    /// Target rectangle in local coordinates.
    pub rect: Rect,
    /// Image resource.
    pub image: ResourceKey,
    /// Whether to use bilinear filtering when scaling.
    pub smooth: bool,
}

/// A region painted by an embedder-registered callback.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomPaintContent {
    /// Paint rectangle in local coordinates.
    pub rect: Rect,
    /// Callback resource.
    pub painter: ResourceKey,
}

/// A solid, optionally rounded, rectangle.
#[derive(Clone, Debug, PartialEq)]
pub struct RectangleContent {
    /// Rectangle in local coordinates.
    pub rect: Rect,
    /// Fill color.
    pub color: Color,
    /// Corner radius; `0.0` for square corners.
    pub radius: f64,
}

/// A positioned glyph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    /// Glyph index in its font.
    pub id: u32,
    /// Top-left of the glyph image in local coordinates.
    pub position: Point,
}

/// A run of glyphs sharing a font and color.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphRunContent {
    /// Font resource.
    pub font: ResourceKey,
    /// Glyphs in drawing order.
    pub glyphs: Arc<[Glyph]>,
    /// Text color.
    pub color: Color,
}

/// A nine-patch (border-image) drawn from an image resource.
#[derive(Clone, Debug, PartialEq)]
pub struct NinePatchContent {
    /// Target rectangle in local coordinates.
    pub rect: Rect,
    /// Image resource.
    pub image: ResourceKey,
    /// Non-stretching border widths, in source image pixels.
    pub insets: Insets,
}

/// The kind of a scene node, with its kind-specific payload.
///
/// The set is closed: traversal dispatches by matching. Kinds defined by the
/// upstream scene owner that the software path does not know are carried as
/// [`NodeKind::Unknown`] and treated as inert leaves.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum NodeKind {
    /// Transparent container.
    #[default]
    Root,
    /// Composes a local transform onto the inherited one.
    Transform(Transform3d),
    /// Intersects the inherited clip with a local shape.
    Clip(ClipShape),
    /// Multiplies the inherited opacity.
    Opacity(f32),
    /// Vertex geometry.
    Geometry(GeometryContent),
    /// Image.
    Image(ImageContent),
    /// Embedder-painted region.
    CustomPaint(CustomPaintContent),
    /// Solid rectangle.
    Rectangle(RectangleContent),
    /// Glyph run.
    GlyphRun(GlyphRunContent),
    /// Nine-patch image.
    NinePatch(NinePatchContent),
    /// A kind this crate does not recognise, identified by the owner's tag.
    Unknown(u32),
}

impl NodeKind {
    /// Whether nodes of this kind produce a display-list entry.
    #[must_use]
    pub const fn is_renderable(&self) -> bool {
        matches!(
            self,
            Self::Geometry(_)
                | Self::Image(_)
                | Self::CustomPaint(_)
                | Self::Rectangle(_)
                | Self::GlyphRun(_)
                | Self::NinePatch(_)
        )
    }

    /// Returns the drawable payload of a renderable node.
    #[must_use]
    pub fn payload(&self) -> Option<Payload> {
        Some(match self {
            Self::Geometry(c) => Payload::Geometry(c.clone()),
            Self::Image(c) => Payload::Image(c.clone()),
            Self::CustomPaint(c) => Payload::CustomPaint(c.clone()),
            Self::Rectangle(c) => Payload::Rectangle(c.clone()),
            Self::GlyphRun(c) => Payload::GlyphRun(c.clone()),
            Self::NinePatch(c) => Payload::NinePatch(c.clone()),
            Self::Root | Self::Transform(_) | Self::Clip(_) | Self::Opacity(_) | Self::Unknown(_) => {
                return None;
            }
        })
    }
}

/// The drawable part of a renderable node, as carried by a display entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Vertex geometry.
    Geometry(GeometryContent),
    /// Image.
    Image(ImageContent),
    /// Embedder-painted region.
    CustomPaint(CustomPaintContent),
    /// Solid rectangle.
    Rectangle(RectangleContent),
    /// Glyph run.
    GlyphRun(GlyphRunContent),
    /// Nine-patch image.
    NinePatch(NinePatchContent),
}

impl Payload {
    /// Local-space bounds of what this payload draws, if known without
    /// external resources.
    ///
    /// Glyph runs report the bounding box of their glyph origins only.
    /// Strokes are widened by the farthest a miter join can reach, so the
    /// result may be larger than the painted outline.
    #[must_use]
    pub fn local_bounds(&self) -> Option<Rect> {
        match self {
            Self::Geometry(g) => points_bounds(g.vertices.iter().copied()).map(|r| match g.mode {
                GeometryMode::Fill => r,
                GeometryMode::Stroke { width } => {
                    let reach = STROKE_MITER_LIMIT * width / 2.0;
                    r.inflate(reach, reach)
                }
            }),
            Self::Image(c) => Some(c.rect),
            Self::CustomPaint(c) => Some(c.rect),
            Self::Rectangle(c) => Some(c.rect),
            Self::GlyphRun(c) => points_bounds(c.glyphs.iter().map(|g| g.position)),
            Self::NinePatch(c) => Some(c.rect),
        }
    }

    /// Returns `false` for payloads the rasterizer cannot meaningfully draw:
    /// non-finite or inverted bounds, negative stroke widths or radii.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let extra_ok = match self {
            Self::Geometry(g) => match g.mode {
                GeometryMode::Fill => true,
                GeometryMode::Stroke { width } => width.is_finite() && width >= 0.0,
            },
            Self::Rectangle(c) => c.radius.is_finite() && c.radius >= 0.0,
            _ => true,
        };
        let bounds_ok = match self.local_bounds() {
            Some(b) => b.is_finite() && b.x1 >= b.x0 && b.y1 >= b.y0,
            // Empty vertex or glyph lists draw nothing but are not malformed.
            None => true,
        };
        extra_ok && bounds_ok
    }
}

fn points_bounds(mut points: impl Iterator<Item = Point>) -> Option<Rect> {
    let first = points.next()?;
    Some(points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn renderable_kinds_have_payloads() {
        let rect = NodeKind::Rectangle(RectangleContent {
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            color: Color::WHITE,
            radius: 0.0,
        });
        assert!(rect.is_renderable());
        assert!(rect.payload().is_some());

        for kind in [
            NodeKind::Root,
            NodeKind::Opacity(0.5),
            NodeKind::Transform(Transform3d::IDENTITY),
            NodeKind::Unknown(7),
        ] {
            assert!(!kind.is_renderable(), "{kind:?} must be structural");
            assert!(kind.payload().is_none(), "{kind:?} has no payload");
        }
    }

    #[test]
    fn stroke_bounds_include_miter_reach() {
        let payload = Payload::Geometry(GeometryContent {
            vertices: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)].into(),
            mode: GeometryMode::Stroke { width: 2.0 },
            color: Color::WHITE,
        });
        assert_eq!(payload.local_bounds(), Some(Rect::new(-4.0, -4.0, 14.0, 4.0)));
    }

    #[test]
    fn non_finite_rectangle_is_malformed() {
        let payload = Payload::Rectangle(RectangleContent {
            rect: Rect::new(0.0, 0.0, f64::INFINITY, 1.0),
            color: Color::WHITE,
            radius: 0.0,
        });
        assert!(!payload.is_well_formed());
    }

    #[test]
    fn empty_glyph_run_is_well_formed() {
        let payload = Payload::GlyphRun(GlyphRunContent {
            font: ResourceKey(1),
            glyphs: Arc::from(vec![]),
            color: Color::WHITE,
        });
        assert_eq!(payload.local_bounds(), None);
        assert!(payload.is_well_formed());
    }
}
