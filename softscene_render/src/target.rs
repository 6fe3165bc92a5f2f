// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint targets: the pixel surfaces rasterization writes into.
//!
//! A [`PaintTarget`] is a window's backing store. Rasterization happens
//! between [`begin_paint`](PaintTarget::begin_paint) and
//! [`end_paint`](PaintTarget::end_paint); afterwards the contents can be
//! snapshotted for capture or [`flush`](PaintTarget::flush)ed to the screen.
//!
//! [`PixmapBackingStore`] is the reference implementation. It keeps a back
//! buffer that is painted into and a front buffer standing in for the
//! on-screen surface, so presentation can be observed without a window
//! system.

use softscene_core::scene::Color;
use tiny_skia::{BlendMode, IntRect, Pixmap, PixmapMut, PixmapPaint, Transform};

use crate::convert;
use crate::error::SurfaceError;
use crate::flush::{FlushRegion, PixelRect, PixelSize};

/// An addressable 2-D pixel surface used as a rasterization destination.
pub trait PaintTarget {
    /// Current size in device pixels.
    fn size(&self) -> PixelSize;

    /// Changes the size. Contents are unspecified afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Allocation`] if the new buffer cannot be
    /// allocated; the previous buffer is kept in that case.
    fn resize(&mut self, size: PixelSize) -> Result<(), SurfaceError>;

    /// Starts a paint pass over `rect`, clearing it to `clear`.
    fn begin_paint(&mut self, rect: PixelRect, clear: Color);

    /// Ends the paint pass started by [`begin_paint`](Self::begin_paint).
    fn end_paint(&mut self);

    /// Mutable access to the pixels being painted, or `None` for an empty
    /// surface.
    fn pixmap_mut(&mut self) -> Option<PixmapMut<'_>>;

    /// A copy of the current contents, or `None` for an empty surface.
    fn snapshot(&self) -> Option<Pixmap>;

    /// Presents `region` of the painted contents to the screen.
    fn flush(&mut self, region: &FlushRegion);
}

/// A [`PaintTarget`] backed by tiny-skia pixmaps.
#[derive(Debug)]
pub struct PixmapBackingStore {
    size: PixelSize,
    back: Option<Pixmap>,
    front: Option<Pixmap>,
    painting: Option<PixelRect>,
    flush_count: u64,
    last_flush: FlushRegion,
}

impl PixmapBackingStore {
    /// Allocates a store of the given size.
    ///
    /// A zero-sized store holds no pixels; painting into it is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Allocation`] if the pixel buffers cannot be
    /// allocated.
    pub fn new(size: PixelSize) -> Result<Self, SurfaceError> {
        let (back, front) = allocate(size)?;
        Ok(Self {
            size,
            back,
            front,
            painting: None,
            flush_count: 0,
            last_flush: FlushRegion::Empty,
        })
    }

    /// The contents last presented to the screen.
    #[must_use]
    pub fn presented(&self) -> Option<&Pixmap> {
        self.front.as_ref()
    }

    /// Number of [`flush`](PaintTarget::flush) calls that presented pixels.
    #[must_use]
    pub fn flush_count(&self) -> u64 {
        self.flush_count
    }

    /// The region presented by the most recent flush.
    #[must_use]
    pub fn last_flush(&self) -> FlushRegion {
        self.last_flush
    }

    /// Whether a paint pass is in progress.
    #[must_use]
    pub fn is_painting(&self) -> bool {
        self.painting.is_some()
    }
}

fn allocate(size: PixelSize) -> Result<(Option<Pixmap>, Option<Pixmap>), SurfaceError> {
    if size.is_empty() {
        return Ok((None, None));
    }
    let back = Pixmap::new(size.width, size.height).ok_or(SurfaceError::Allocation(size))?;
    let front = Pixmap::new(size.width, size.height).ok_or(SurfaceError::Allocation(size))?;
    Ok((Some(back), Some(front)))
}

fn int_rect(rect: PixelRect) -> Option<IntRect> {
    IntRect::from_xywh(rect.x, rect.y, rect.width, rect.height)
}

impl PaintTarget for PixmapBackingStore {
    fn size(&self) -> PixelSize {
        self.size
    }

    fn resize(&mut self, size: PixelSize) -> Result<(), SurfaceError> {
        if size == self.size {
            return Ok(());
        }
        let (back, front) = allocate(size)?;
        log::debug!(
            target: "softscene::renderer",
            "backing store resized from {}x{} to {}x{}",
            self.size.width,
            self.size.height,
            size.width,
            size.height,
        );
        self.size = size;
        self.back = back;
        self.front = front;
        self.last_flush = FlushRegion::Empty;
        Ok(())
    }

    fn begin_paint(&mut self, rect: PixelRect, clear: Color) {
        debug_assert!(self.painting.is_none(), "begin_paint without end_paint");
        let Some(rect) = rect.intersect(self.size.to_rect()) else {
            self.painting = Some(PixelRect::default());
            return;
        };
        self.painting = Some(rect);
        let Some(back) = self.back.as_mut() else {
            return;
        };
        if rect == self.size.to_rect() {
            back.fill(convert::color(clear));
            return;
        }
        if let Some(r) = convert::rect(rect.to_kurbo()) {
            let mut paint = convert::paint(clear, 1.0);
            paint.blend_mode = BlendMode::Source;
            paint.anti_alias = false;
            back.fill_rect(r, &paint, Transform::identity(), None);
        }
    }

    fn end_paint(&mut self) {
        debug_assert!(self.painting.is_some(), "end_paint without begin_paint");
        self.painting = None;
    }

    fn pixmap_mut(&mut self) -> Option<PixmapMut<'_>> {
        self.back.as_mut().map(Pixmap::as_mut)
    }

    fn snapshot(&self) -> Option<Pixmap> {
        self.back.clone()
    }

    fn flush(&mut self, region: &FlushRegion) {
        let region = region.clipped_to(self.size.to_rect());
        let (Some(rect), Some(back), Some(front)) = (
            region.bounds().and_then(int_rect),
            self.back.as_ref(),
            self.front.as_mut(),
        ) else {
            return;
        };
        let Some(patch) = back.clone_rect(rect) else {
            return;
        };
        let paint = PixmapPaint {
            blend_mode: BlendMode::Source,
            ..PixmapPaint::default()
        };
        front.draw_pixmap(
            rect.x(),
            rect.y(),
            patch.as_ref(),
            &paint,
            Transform::identity(),
            None,
        );
        self.flush_count += 1;
        self.last_flush = region;
    }
}
