// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software render loop for softscene windows.
//!
//! A [`RenderLoop`] drives every shown window through the same per-frame
//! sequence on the calling thread:
//!
//! ```text
//! resize ─► init context ─► consume pending ─► flush input
//!    ─► polish ─► after animating ─► sync (build display list)
//!    ─► begin paint ─► rasterize ─► end paint
//!    ─► capture (grab only) ─► present (if pending and visible)
//!    ─► request another frame (if raised during the frame)
//! ```
//!
//! The embedder implements [`WindowOwner`] for its windows and forwards
//! platform events to [`RenderLoop::show`], [`RenderLoop::hide`],
//! [`RenderLoop::exposure_changed`], [`RenderLoop::handle_update_request`]
//! and friends. All windows share one [`RenderContext`].
//!
//! Per-frame phase timings are delivered to an optional
//! [`TraceSink`](softscene_core::trace::TraceSink) and logged on the
//! `softscene::render_loop` target.
//!
//! # Crate features
//!
//! - `trace` (enabled by default): Forwards frame events to the attached
//!   trace sink.
//! - `trace-rich` (implies `trace`): Also emits flush-rect and display-list
//!   statistics events.

mod config;
mod context;
mod error;
mod owner;
mod render_loop;
mod time;

pub use config::{PROFILE_FRAMES_ENV, RenderLoopConfig};
pub use context::RenderContext;
pub use error::LoopError;
pub use owner::{InputOutcome, SurfaceType, UpdateRequest, WindowOwner};
pub use render_loop::RenderLoop;
pub use time::now;
