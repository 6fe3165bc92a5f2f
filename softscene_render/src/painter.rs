// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-payload drawing.
//!
//! The [`Painter`] trait is the drawing capability the rasterizer delegates
//! to: one call per display entry. [`SoftwarePainter`] implements it on
//! tiny-skia, resolving [`ResourceKey`]s against images, glyphs, and custom
//! paint callbacks registered by the embedder.

use std::collections::HashMap;
use std::fmt;

use kurbo::{Insets, Rect, RoundedRect};
use softscene_core::display::DisplayEntry;
use softscene_core::scene::{
    Color, CustomPaintContent, GeometryContent, GeometryMode, GlyphRunContent, ImageContent,
    NinePatchContent, Payload, RectangleContent, ResourceKey, STROKE_MITER_LIMIT,
};
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, IntRect, Mask, Pixmap, PixmapMut, PixmapPaint, Stroke,
    Transform,
};

use crate::convert;

/// Draws one display entry onto a pixmap.
pub trait Painter {
    /// Draws `entry` into `pixmap`, restricted to `clip` when given.
    ///
    /// Returns the device-space bounds of what was drawn, or `None` if
    /// nothing was.
    fn paint(
        &mut self,
        entry: &DisplayEntry,
        pixmap: &mut PixmapMut<'_>,
        clip: Option<&Mask>,
    ) -> Option<Rect>;

    /// Drops cached per-context resources. Called when the rendering context
    /// is invalidated.
    fn release_resources(&mut self) {}
}

/// Callback used for [`Payload::CustomPaint`] entries.
///
/// Receives the target pixmap, the entry's payload, its local-to-device
/// transform, opacity, and clip mask.
pub type CustomPaintFn =
    Box<dyn FnMut(&mut PixmapMut<'_>, &CustomPaintContent, Transform, f32, Option<&Mask>)>;

/// A [`Painter`] drawing with tiny-skia.
///
/// Images, nine-patches, and glyph runs reference pixmaps registered with
/// [`insert_image`](Self::insert_image) and
/// [`insert_glyph`](Self::insert_glyph). Glyph pixmaps are coverage masks:
/// only their alpha channel is used, tinted with the run's color. Entries
/// referencing unregistered resources draw nothing.
#[derive(Default)]
pub struct SoftwarePainter {
    images: HashMap<ResourceKey, Pixmap>,
    glyphs: HashMap<(ResourceKey, u32), Pixmap>,
    custom: HashMap<ResourceKey, CustomPaintFn>,
    glyph_scratch: Option<Pixmap>,
}

impl fmt::Debug for SoftwarePainter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwarePainter")
            .field("images", &self.images.len())
            .field("glyphs", &self.glyphs.len())
            .field("custom", &self.custom.len())
            .finish_non_exhaustive()
    }
}

impl SoftwarePainter {
    /// Creates a painter with no registered resources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) an image.
    pub fn insert_image(&mut self, key: ResourceKey, image: Pixmap) {
        self.images.insert(key, image);
    }

    /// Registers (or replaces) the coverage image of one glyph of a font.
    pub fn insert_glyph(&mut self, font: ResourceKey, glyph: u32, image: Pixmap) {
        self.glyphs.insert((font, glyph), image);
    }

    /// Registers (or replaces) a custom paint callback.
    pub fn insert_custom(&mut self, key: ResourceKey, paint: CustomPaintFn) {
        self.custom.insert(key, paint);
    }

    /// Removes an image, returning it if it was registered.
    pub fn remove_image(&mut self, key: ResourceKey) -> Option<Pixmap> {
        self.images.remove(&key)
    }

    fn rectangle(
        c: &RectangleContent,
        entry: &DisplayEntry,
        pixmap: &mut PixmapMut<'_>,
        clip: Option<&Mask>,
    ) -> bool {
        let paint = convert::paint(c.color, entry.opacity);
        let transform = convert::transform(entry.transform);
        if c.radius > 0.0 {
            let Some(path) = convert::path(&RoundedRect::from_rect(c.rect, c.radius)) else {
                return false;
            };
            pixmap.fill_path(&path, &paint, FillRule::Winding, transform, clip);
        } else {
            let Some(rect) = convert::rect(c.rect) else {
                return false;
            };
            pixmap.fill_rect(rect, &paint, transform, clip);
        }
        true
    }

    /// Returns the device bounds of the filled polygon or of the stroked
    /// outline, joins included.
    fn geometry(
        c: &GeometryContent,
        entry: &DisplayEntry,
        pixmap: &mut PixmapMut<'_>,
        clip: Option<&Mask>,
    ) -> Option<Rect> {
        let paint = convert::paint(c.color, entry.opacity);
        let transform = convert::transform(entry.transform);
        match c.mode {
            GeometryMode::Fill => {
                if c.vertices.len() < 3 {
                    return None;
                }
                let path = convert::polyline(&c.vertices, true)?;
                pixmap.fill_path(&path, &paint, FillRule::Winding, transform, clip);
                entry.device_bounds()
            }
            GeometryMode::Stroke { width } => {
                let path = convert::polyline(&c.vertices, false)?;
                let stroke = Stroke {
                    width: convert::scalar(width),
                    miter_limit: convert::scalar(STROKE_MITER_LIMIT),
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &paint, &stroke, transform, clip);
                let outline = path.stroke(&stroke, 1.0)?.bounds();
                let local = Rect::new(
                    f64::from(outline.left()),
                    f64::from(outline.top()),
                    f64::from(outline.right()),
                    f64::from(outline.bottom()),
                );
                Some(entry.transform.map_rect_bounds(local))
            }
        }
    }

    fn image(
        &self,
        c: &ImageContent,
        entry: &DisplayEntry,
        pixmap: &mut PixmapMut<'_>,
        clip: Option<&Mask>,
    ) -> bool {
        let Some(image) = self.images.get(&c.image) else {
            log::debug!(target: "softscene::renderer", "image {:?} is not registered", c.image);
            return false;
        };
        let quality = if c.smooth {
            FilterQuality::Bilinear
        } else {
            FilterQuality::Nearest
        };
        draw_scaled(image, c.rect, entry, quality, pixmap, clip)
    }

    fn nine_patch(
        &self,
        c: &NinePatchContent,
        entry: &DisplayEntry,
        pixmap: &mut PixmapMut<'_>,
        clip: Option<&Mask>,
    ) -> bool {
        let Some(image) = self.images.get(&c.image) else {
            log::debug!(target: "softscene::renderer", "image {:?} is not registered", c.image);
            return false;
        };
        let src = Rect::new(0.0, 0.0, f64::from(image.width()), f64::from(image.height()));
        let mut drawn = false;
        for (SrcCell([l, t, r, b]), dst_cell) in nine_patch_cells(src, c.rect, c.insets) {
            let Some(patch) =
                IntRect::from_ltrb(l, t, r, b).and_then(|rect| image.clone_rect(rect))
            else {
                continue;
            };
            drawn |= draw_scaled(&patch, dst_cell, entry, FilterQuality::Bilinear, pixmap, clip);
        }
        drawn
    }

    fn glyph_run(
        &mut self,
        c: &GlyphRunContent,
        entry: &DisplayEntry,
        pixmap: &mut PixmapMut<'_>,
        clip: Option<&Mask>,
    ) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        for glyph in c.glyphs.iter() {
            let Some(coverage) = self.glyphs.get(&(c.font, glyph.id)) else {
                log::trace!(
                    target: "softscene::renderer",
                    "glyph {} of font {:?} is not registered",
                    glyph.id,
                    c.font,
                );
                continue;
            };
            let Some(tinted) = tint(&mut self.glyph_scratch, coverage, c.color) else {
                continue;
            };
            let local = Rect::from_origin_size(
                glyph.position,
                (f64::from(coverage.width()), f64::from(coverage.height())),
            );
            if draw_scaled(tinted, local, entry, FilterQuality::Nearest, pixmap, clip) {
                let device = entry.transform.map_rect_bounds(local);
                bounds = Some(bounds.map_or(device, |b| b.union(device)));
            }
        }
        bounds
    }

    fn custom_paint(
        &mut self,
        c: &CustomPaintContent,
        entry: &DisplayEntry,
        pixmap: &mut PixmapMut<'_>,
        clip: Option<&Mask>,
    ) -> bool {
        let Some(callback) = self.custom.get_mut(&c.painter) else {
            log::debug!(
                target: "softscene::renderer",
                "custom painter {:?} is not registered",
                c.painter
            );
            return false;
        };
        callback(
            pixmap,
            c,
            convert::transform(entry.transform),
            entry.opacity,
            clip,
        );
        true
    }
}

impl Painter for SoftwarePainter {
    fn paint(
        &mut self,
        entry: &DisplayEntry,
        pixmap: &mut PixmapMut<'_>,
        clip: Option<&Mask>,
    ) -> Option<Rect> {
        if entry.opacity <= 0.0 {
            return None;
        }
        let drawn = match &entry.payload {
            Payload::Rectangle(c) => Self::rectangle(c, entry, pixmap, clip),
            Payload::Geometry(c) => return Self::geometry(c, entry, pixmap, clip),
            Payload::Image(c) => self.image(c, entry, pixmap, clip),
            Payload::NinePatch(c) => self.nine_patch(c, entry, pixmap, clip),
            Payload::CustomPaint(c) => self.custom_paint(c, entry, pixmap, clip),
            Payload::GlyphRun(c) => return self.glyph_run(c, entry, pixmap, clip),
        };
        if drawn { entry.device_bounds() } else { None }
    }

    fn release_resources(&mut self) {
        self.glyph_scratch = None;
    }
}

/// Draws `image` stretched over `dst` (local coordinates).
fn draw_scaled(
    image: &Pixmap,
    dst: Rect,
    entry: &DisplayEntry,
    quality: FilterQuality,
    pixmap: &mut PixmapMut<'_>,
    clip: Option<&Mask>,
) -> bool {
    if dst.width() <= 0.0 || dst.height() <= 0.0 {
        return false;
    }
    let place = kurbo::Affine::new([
        dst.width() / f64::from(image.width()),
        0.0,
        0.0,
        dst.height() / f64::from(image.height()),
        dst.x0,
        dst.y0,
    ]);
    let transform = convert::affine(entry.transform.to_affine() * place);
    let paint = PixmapPaint {
        opacity: entry.opacity,
        quality,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, transform, clip);
    true
}

/// Colors a coverage image: the result has `color` with the coverage alpha.
fn tint<'a>(scratch: &'a mut Option<Pixmap>, coverage: &Pixmap, color: Color) -> Option<&'a Pixmap> {
    let fits = scratch
        .as_ref()
        .is_some_and(|s| s.width() == coverage.width() && s.height() == coverage.height());
    if !fits {
        *scratch = Pixmap::new(coverage.width(), coverage.height());
    }
    let out = scratch.as_mut()?;
    out.fill(convert::color(color));
    let paint = PixmapPaint {
        blend_mode: BlendMode::DestinationIn,
        ..PixmapPaint::default()
    };
    out.draw_pixmap(0, 0, coverage.as_ref(), &paint, Transform::identity(), None);
    Some(&*out)
}

/// Integer source rectangle as `[left, top, right, bottom]`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SrcCell([i32; 4]);

/// Splits a nine-patch into its source and destination cells.
///
/// Insets larger than the image or the target are scaled down so opposite
/// borders never overlap. Empty cells are omitted.
fn nine_patch_cells(src: Rect, dst: Rect, insets: Insets) -> Vec<(SrcCell, Rect)> {
    let fit = |a: f64, b: f64, extent: f64| {
        let (a, b) = (a.max(0.0), b.max(0.0));
        if a + b > extent && a + b > 0.0 {
            let k = extent / (a + b);
            (a * k, b * k)
        } else {
            (a, b)
        }
    };
    let (sl, sr) = fit(insets.x0, insets.x1, src.width());
    let (st, sb) = fit(insets.y0, insets.y1, src.height());
    // Destination borders keep the source border size unless the target is
    // smaller.
    let (dl, dr) = fit(sl, sr, dst.width());
    let (dt, db) = fit(st, sb, dst.height());

    let sx = [src.x0, src.x0 + sl, src.x1 - sr, src.x1];
    let sy = [src.y0, src.y0 + st, src.y1 - sb, src.y1];
    let dx = [dst.x0, dst.x0 + dl, dst.x1 - dr, dst.x1];
    let dy = [dst.y0, dst.y0 + dt, dst.y1 - db, dst.y1];

    let mut cells = Vec::with_capacity(9);
    for row in 0..3 {
        for col in 0..3 {
            let s = SrcCell([
                round_px(sx[col]),
                round_px(sy[row]),
                round_px(sx[col + 1]),
                round_px(sy[row + 1]),
            ]);
            let d = Rect::new(dx[col], dy[row], dx[col + 1], dy[row + 1]);
            if s.0[2] > s.0[0] && s.0[3] > s.0[1] && d.width() > 0.0 && d.height() > 0.0 {
                cells.push((s, d));
            }
        }
    }
    cells
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "image coordinates are bounded by the pixmap size"
)]
fn round_px(v: f64) -> i32 {
    v.round() as i32
}
