// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU rasterization for softscene.
//!
//! This crate turns a [`DisplayList`](softscene_core::display::DisplayList)
//! into pixels:
//!
//! - [`PaintTarget`] is the backing-store contract (size, resize, paint
//!   bracketing, snapshot, flush), with [`PixmapBackingStore`] as the
//!   tiny-skia reference implementation.
//! - [`Painter`] is the per-payload drawing capability, with
//!   [`SoftwarePainter`] drawing rectangles, geometry, images, nine-patches,
//!   glyph runs, and custom paint.
//! - [`Rasterizer`] walks the list in order and accumulates the
//!   [`FlushRegion`], the bounding box of the pixels it touched.

mod convert;
mod error;
mod flush;
mod painter;
mod rasterizer;
mod target;

pub use error::SurfaceError;
pub use flush::{FlushRegion, PixelRect, PixelSize};
pub use painter::{CustomPaintFn, Painter, SoftwarePainter};
pub use rasterizer::Rasterizer;
pub use target::{PaintTarget, PixmapBackingStore};

pub use tiny_skia;
