// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display-list rasterization.

use kurbo::Rect;
use softscene_core::display::DisplayList;
use tiny_skia::Mask;

use crate::convert;
use crate::flush::{FlushRegion, PixelRect, PixelSize};
use crate::painter::Painter;
use crate::target::PaintTarget;

/// Draws display lists onto paint targets and tracks the flush region.
///
/// Entries are drawn strictly in list order. The only state kept between
/// passes is the flush region of the latest pass and a clip mask that is
/// reused while consecutive entries share a clip.
#[derive(Debug, Default)]
pub struct Rasterizer {
    flush: FlushRegion,
    drawn: u32,
    mask: Option<CachedMask>,
}

#[derive(Debug)]
struct CachedMask {
    size: PixelSize,
    clip: Rect,
    mask: Mask,
}

impl Rasterizer {
    /// Creates a rasterizer with an empty flush region.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws every entry of `list` onto `target` through `painter`.
    ///
    /// The target must be inside a paint pass. Replaces the flush region with
    /// the pixels touched by this pass, restricted to the target bounds.
    pub fn render(
        &mut self,
        list: &DisplayList,
        target: &mut dyn PaintTarget,
        painter: &mut dyn Painter,
    ) {
        self.flush = FlushRegion::Empty;
        self.drawn = 0;
        let size = target.size();
        let surface = size.to_rect();
        let Some(mut pixmap) = target.pixmap_mut() else {
            return;
        };

        for entry in list {
            let mask = match entry.clip {
                Some(clip) => match self.mask_for(size, clip) {
                    Some(mask) => Some(mask),
                    // A clip that cannot be rasterized admits nothing.
                    None => continue,
                },
                None => None,
            };
            let Some(touched) = painter.paint(entry, &mut pixmap, mask) else {
                continue;
            };
            self.drawn += 1;
            let touched = match entry.clip {
                Some(clip) => touched.intersect(clip),
                None => touched,
            };
            if let Some(rect) = PixelRect::round_out(touched).and_then(|r| r.intersect(surface)) {
                self.flush.add(rect);
            }
        }

        log::trace!(
            target: "softscene::renderer",
            "rasterized {} of {} entries, flush region {:?}",
            self.drawn,
            list.len(),
            self.flush,
        );
    }

    /// The pixels written by the most recent [`render`](Self::render).
    #[must_use]
    pub fn flush_region(&self) -> FlushRegion {
        self.flush
    }

    /// Number of entries that drew something in the most recent pass.
    #[must_use]
    pub fn drawn_count(&self) -> u32 {
        self.drawn
    }

    /// Drops the cached clip mask.
    pub fn release_resources(&mut self) {
        self.mask = None;
    }

    fn mask_for(&mut self, size: PixelSize, clip: Rect) -> Option<&Mask> {
        let cached = self
            .mask
            .as_ref()
            .is_some_and(|m| m.size == size && m.clip == clip);
        if !cached {
            self.mask = convert::clip_mask(size, clip).map(|mask| CachedMask { size, clip, mask });
        }
        self.mask.as_ref().map(|m| &m.mask)
    }
}

#[cfg(test)]
mod tests {
    use softscene_core::clip::ClipShape;
    use softscene_core::display::DisplayListBuilder;
    use kurbo::Point;
    use softscene_core::scene::{
        Color, GeometryContent, GeometryMode, NodeKind, RectangleContent, SceneTree,
    };
    use softscene_core::transform::Transform3d;

    use super::*;
    use crate::painter::SoftwarePainter;
    use crate::target::PixmapBackingStore;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> NodeKind {
        NodeKind::Rectangle(RectangleContent {
            rect: Rect::new(x0, y0, x1, y1),
            color: Color::rgb(255, 0, 0),
            radius: 0.0,
        })
    }

    fn render(tree: &SceneTree, size: PixelSize) -> (Rasterizer, PixmapBackingStore) {
        let mut list = DisplayList::new();
        DisplayListBuilder::new().build(tree, &mut list);
        let mut store = PixmapBackingStore::new(size).unwrap();
        let mut raster = Rasterizer::new();
        store.begin_paint(size.to_rect(), Color::TRANSPARENT);
        raster.render(&list, &mut store, &mut SoftwarePainter::new());
        store.end_paint();
        (raster, store)
    }

    #[test]
    fn empty_list_has_empty_region() {
        let (tree, _) = SceneTree::with_root();
        let (raster, _) = render(&tree, PixelSize::new(16, 16));
        assert!(raster.flush_region().is_empty());
        assert_eq!(raster.drawn_count(), 0);
    }

    #[test]
    fn region_bounds_all_entries() {
        let (mut tree, root) = SceneTree::with_root();
        for kind in [rect(1.0, 1.0, 4.0, 4.0), rect(10.5, 8.0, 12.0, 12.2)] {
            let n = tree.create_node(kind);
            tree.append_child(root, n);
        }
        let (raster, _) = render(&tree, PixelSize::new(32, 32));
        assert_eq!(
            raster.flush_region().bounds(),
            Some(PixelRect::new(1, 1, 11, 12))
        );
    }

    #[test]
    fn region_is_clipped_to_surface_and_clip() {
        let (mut tree, root) = SceneTree::with_root();
        let clip = tree.create_node(NodeKind::Clip(ClipShape::Rect(Rect::new(
            0.0, 0.0, 8.0, 100.0,
        ))));
        tree.append_child(root, clip);
        let big = tree.create_node(rect(-10.0, -10.0, 100.0, 100.0));
        tree.append_child(clip, big);

        let (raster, store) = render(&tree, PixelSize::new(16, 16));
        assert_eq!(
            raster.flush_region().bounds(),
            Some(PixelRect::new(0, 0, 8, 16))
        );
        let snap = store.snapshot().unwrap();
        assert_eq!(snap.pixel(4, 4).unwrap().alpha(), 255);
        assert_eq!(snap.pixel(12, 4).unwrap().alpha(), 0);
    }

    #[test]
    fn later_entries_paint_over_earlier() {
        let (mut tree, root) = SceneTree::with_root();
        let under = tree.create_node(rect(0.0, 0.0, 8.0, 8.0));
        tree.append_child(root, under);
        let over = tree.create_node(NodeKind::Rectangle(RectangleContent {
            rect: Rect::new(0.0, 0.0, 8.0, 8.0),
            color: Color::rgb(0, 0, 255),
            radius: 0.0,
        }));
        tree.append_child(root, over);

        let (_, store) = render(&tree, PixelSize::new(8, 8));
        let px = store.snapshot().unwrap().pixel(4, 4).unwrap();
        assert_eq!((px.red(), px.blue()), (0, 255));
    }

    #[test]
    fn transformed_entry_lands_in_device_space() {
        let (mut tree, root) = SceneTree::with_root();
        let t = tree.create_node(NodeKind::Transform(Transform3d::from_translation(
            20.0, 20.0,
        )));
        tree.append_child(root, t);
        let r = tree.create_node(rect(0.0, 0.0, 4.0, 4.0));
        tree.append_child(t, r);

        let (raster, store) = render(&tree, PixelSize::new(32, 32));
        assert_eq!(
            raster.flush_region().bounds(),
            Some(PixelRect::new(20, 20, 4, 4))
        );
        assert_eq!(store.snapshot().unwrap().pixel(21, 21).unwrap().alpha(), 255);
    }

    #[test]
    fn sharp_stroke_join_stays_inside_region() {
        let (mut tree, root) = SceneTree::with_root();
        let zigzag = tree.create_node(NodeKind::Geometry(GeometryContent {
            vertices: vec![
                Point::new(2.0, 0.0),
                Point::new(30.0, 16.0),
                Point::new(2.0, 32.0),
            ]
            .into(),
            mode: GeometryMode::Stroke { width: 4.0 },
            color: Color::rgb(0, 0, 0),
        }));
        tree.append_child(root, zigzag);

        let (raster, store) = render(&tree, PixelSize::new(64, 64));
        let flush = raster.flush_region().bounds().unwrap();
        let snap = store.snapshot().unwrap();
        let mut outside = 0;
        let mut max_x = 0;
        for y in 0..64_u32 {
            for x in 0..64_u32 {
                if snap.pixel(x, y).unwrap().alpha() == 0 {
                    continue;
                }
                max_x = max_x.max(x);
                let (xi, yi) = (i64::from(x), i64::from(y));
                let inside = xi >= i64::from(flush.x)
                    && xi < flush.right()
                    && yi >= i64::from(flush.y)
                    && yi < flush.bottom();
                if !inside {
                    outside += 1;
                }
            }
        }
        // The miter at (30, 16) pokes out past the vertex box.
        assert!(max_x > 32, "miter should extend past the vertex, max_x={max_x}");
        assert_eq!(outside, 0, "painted pixels outside {flush:?}");
    }

    #[test]
    fn offscreen_entry_is_not_flushed() {
        let (mut tree, root) = SceneTree::with_root();
        let r = tree.create_node(rect(100.0, 100.0, 110.0, 110.0));
        tree.append_child(root, r);
        let (raster, _) = render(&tree, PixelSize::new(16, 16));
        assert!(raster.flush_region().is_empty());
    }
}
