// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The window-owner contract.
//!
//! A [`WindowOwner`] is the embedder's view of one top-level window: it
//! answers whether the window can render, hands out its retained scene, and
//! receives the lifecycle notifications the [`RenderLoop`](crate::RenderLoop)
//! emits around each frame.
//!
//! # Frame callback order
//!
//! ```text
//! flush_deferred_input    (skipped for grabs)
//! polish                  may raise an UpdateRequest
//! after_animating         may raise an UpdateRequest
//! sync                    may raise an UpdateRequest; scene() is read after
//! ... rasterize ...
//! frame_swapped           only when the frame was presented
//! request_update          only when an update was raised above
//! ```

use softscene_core::scene::SceneTree;
use softscene_core::window::WindowId;
use softscene_render::{PaintTarget, PixelSize, SurfaceError};

/// Kind of surface a render loop renders into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceType {
    /// A CPU-addressable raster surface. No GPU context is involved.
    Raster,
}

/// What deferred input processing did to the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InputOutcome {
    /// The window is still live; the frame continues.
    #[default]
    Continue,
    /// An input handler hid the window.
    Hide,
    /// An input handler destroyed the window.
    Destroyed,
}

/// Collects "render another frame" requests raised during a frame.
///
/// Requests are honored after the current frame returns, never by the frame
/// that raised them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    requested: bool,
}

impl UpdateRequest {
    /// An empty request.
    #[must_use]
    pub const fn new() -> Self {
        Self { requested: false }
    }

    /// Asks for another frame.
    pub fn request(&mut self) {
        self.requested = true;
    }

    /// Whether [`request`](Self::request) was called.
    #[must_use]
    pub const fn is_requested(&self) -> bool {
        self.requested
    }
}

/// The embedder side of one window driven by a [`RenderLoop`](crate::RenderLoop).
pub trait WindowOwner {
    /// Backing store type allocated for this window.
    type Store: PaintTarget;

    /// Stable identifier used for tracking and trace events.
    fn id(&self) -> WindowId;

    /// Current size in device pixels.
    fn size(&self) -> PixelSize;

    /// Whether the window can produce a frame right now (e.g. it has a
    /// native surface and a non-degenerate size).
    fn is_renderable(&self) -> bool;

    /// Whether the window is exposed on screen.
    fn is_exposed(&self) -> bool;

    /// Whether the window is visible. Frames of invisible windows are not
    /// presented.
    fn is_visible(&self) -> bool;

    /// Whether the shared render context must survive the last window
    /// going away.
    fn persistent_scene_graph(&self) -> bool {
        false
    }

    /// Allocates a backing store of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the store cannot be allocated.
    fn create_backing_store(&mut self, size: PixelSize) -> Result<Self::Store, SurfaceError>;

    /// Asks the platform to call
    /// [`RenderLoop::handle_update_request`](crate::RenderLoop::handle_update_request)
    /// for this window soon.
    fn request_update(&mut self);

    /// Delivers input events that were deferred until the next frame.
    fn flush_deferred_input(&mut self) -> InputOutcome {
        InputOutcome::Continue
    }

    /// Finalizes pending visual adjustments before the scene is synced.
    fn polish(&mut self, update: &mut UpdateRequest);

    /// Post-animation hook. Animations that change the scene raise `update`.
    fn after_animating(&mut self, update: &mut UpdateRequest) {
        _ = update;
    }

    /// Brings the retained scene up to date for this frame.
    fn sync(&mut self, update: &mut UpdateRequest);

    /// The retained scene to draw, as of the last [`sync`](Self::sync).
    fn scene(&self) -> &SceneTree;

    /// A frame was presented to screen.
    fn frame_swapped(&mut self) {}

    /// Rendering for this window is about to stop.
    fn about_to_stop(&mut self) {}

    /// Release retained rendering resources tied to this window.
    fn cleanup_on_shutdown(&mut self) {}
}
