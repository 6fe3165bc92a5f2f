// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared software rendering context.

use softscene_core::display::{BuildStats, DisplayList, DisplayListBuilder};
use softscene_core::scene::SceneTree;
use softscene_render::{FlushRegion, PaintTarget, Painter, Rasterizer, SoftwarePainter};

const LOG: &str = "softscene::context";

/// Display-list builder, rasterizer and painter shared by every window of a
/// [`RenderLoop`](crate::RenderLoop).
///
/// Only one window's frame uses the context at a time. The display list is
/// rebuilt on every sync, so nothing in here is tied to a particular window
/// except the cached resources dropped by [`invalidate`](Self::invalidate).
#[derive(Debug)]
pub struct RenderContext<P = SoftwarePainter> {
    builder: DisplayListBuilder,
    list: DisplayList,
    rasterizer: Rasterizer,
    painter: P,
    initialized: bool,
    invalidations: u64,
}

impl<P: Painter> RenderContext<P> {
    /// Creates an uninitialized context drawing through `painter`.
    #[must_use]
    pub fn new(painter: P) -> Self {
        Self {
            builder: DisplayListBuilder::new(),
            list: DisplayList::new(),
            rasterizer: Rasterizer::new(),
            painter,
            initialized: false,
            invalidations: 0,
        }
    }

    /// Marks the context initialized. Returns `true` if it was not already.
    pub fn initialize_if_needed(&mut self) -> bool {
        if self.initialized {
            return false;
        }
        log::debug!(target: LOG, "software render context initialized");
        self.initialized = true;
        true
    }

    /// Tears the context down: drops the display list and every cached
    /// painter and rasterizer resource.
    ///
    /// Calling this on an uninitialized context does nothing.
    pub fn invalidate(&mut self) {
        if !self.initialized {
            return;
        }
        self.list.clear();
        self.rasterizer.release_resources();
        self.painter.release_resources();
        self.initialized = false;
        self.invalidations += 1;
        log::debug!(target: LOG, "software render context invalidated");
    }

    /// Whether the context is initialized.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// How many times the context has been torn down.
    #[must_use]
    pub fn invalidation_count(&self) -> u64 {
        self.invalidations
    }

    /// The display list produced by the latest [`sync`](Self::sync).
    #[must_use]
    pub fn display_list(&self) -> &DisplayList {
        &self.list
    }

    /// The painter.
    #[must_use]
    pub fn painter(&self) -> &P {
        &self.painter
    }

    /// Mutable access to the painter, e.g. to register images.
    pub fn painter_mut(&mut self) -> &mut P {
        &mut self.painter
    }

    /// Rebuilds the display list from `tree`.
    pub fn sync(&mut self, tree: &SceneTree) -> BuildStats {
        let stats = self.builder.build(tree, &mut self.list);
        debug_assert_eq!(self.builder.depth(), 0, "traversal state stack unbalanced");
        stats
    }

    /// Rasterizes the current display list onto `target`, which must be
    /// inside a paint pass.
    pub fn render(&mut self, target: &mut dyn PaintTarget) {
        self.rasterizer.render(&self.list, target, &mut self.painter);
    }

    /// The pixels touched by the latest [`render`](Self::render).
    #[must_use]
    pub fn flush_region(&self) -> FlushRegion {
        self.rasterizer.flush_region()
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(SoftwarePainter::new())
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;
    use softscene_core::scene::{Color, NodeKind, RectangleContent};
    use softscene_render::{PixelSize, PixmapBackingStore};

    use super::*;

    #[test]
    fn invalidate_is_idempotent() {
        let mut ctx = RenderContext::default();
        ctx.invalidate();
        assert_eq!(ctx.invalidation_count(), 0, "uninitialized context is not torn down");

        assert!(ctx.initialize_if_needed());
        assert!(!ctx.initialize_if_needed());
        ctx.invalidate();
        ctx.invalidate();
        assert_eq!(ctx.invalidation_count(), 1);
        assert!(!ctx.is_initialized());
    }

    #[test]
    fn sync_then_render_fills_flush_region() {
        let (mut tree, root) = SceneTree::with_root();
        let r = tree.create_node(NodeKind::Rectangle(RectangleContent {
            rect: Rect::new(2.0, 2.0, 6.0, 6.0),
            color: Color::rgb(0, 128, 0),
            radius: 0.0,
        }));
        tree.append_child(root, r);

        let mut ctx = RenderContext::default();
        ctx.initialize_if_needed();
        let stats = ctx.sync(&tree);
        assert_eq!(stats.emitted, 1);
        assert_eq!(ctx.display_list().len(), 1);

        let size = PixelSize::new(8, 8);
        let mut store = PixmapBackingStore::new(size).unwrap();
        store.begin_paint(size.to_rect(), Color::WHITE);
        ctx.render(&mut store);
        store.end_paint();
        assert!(!ctx.flush_region().is_empty());

        ctx.invalidate();
        assert!(ctx.display_list().is_empty(), "invalidation drops the display list");
    }
}
