// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless run of the software render loop with two simulated windows.
//!
//! The first window is exposed and animates a spinner for a few frames; the
//! second is never exposed and is only captured with a grab. Frame events go
//! to a [`PrettyPrintSink`] on stdout and a [`RecorderSink`], which is
//! exported as `trace.json` at the end. The grabbed image is written to
//! `grab.png`.
//!
//! Set `RUST_LOG=softscene=debug` to see the per-frame timing lines, or
//! `SOFTSCENE_PROFILE_FRAMES=1` to log them at info level.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;
use std::sync::Arc;

use kurbo::{Point, Rect, RoundedRect};
use softscene_core::clip::ClipShape;
use softscene_core::scene::{
    Color, GeometryContent, GeometryMode, NodeId, NodeKind, RectangleContent, SceneTree,
};
use softscene_core::trace::{
    DisplayListEvent, FlushRectEvent, FrameBeginEvent, FrameSkippedEvent, FrameSummary,
    PhaseEndEvent, TraceSink,
};
use softscene_core::transform::Transform3d;
use softscene_core::window::WindowId;
use softscene_debug::pretty::PrettyPrintSink;
use softscene_debug::recorder::RecorderSink;
use softscene_loop::{RenderLoop, RenderLoopConfig, UpdateRequest, WindowOwner};
use softscene_render::{PixelSize, PixmapBackingStore, SurfaceError};

/// Spinner rotation per frame, in radians.
const SPIN_STEP: f64 = 0.2;

struct DemoWindow {
    id: WindowId,
    size: PixelSize,
    exposed: bool,
    update_requested: bool,
    frames_left: u32,
    angle: f64,
    spinner: NodeId,
    scene: SceneTree,
}

impl DemoWindow {
    fn new(id: WindowId, size: PixelSize, frames: u32) -> Self {
        let (mut scene, root) = SceneTree::with_root();
        let (w, h) = (f64::from(size.width), f64::from(size.height));

        let background = scene.create_node(NodeKind::Rectangle(RectangleContent {
            rect: Rect::new(0.0, 0.0, w, h),
            color: Color::rgb(30, 34, 46),
            radius: 0.0,
        }));
        scene.append_child(root, background);

        let clip = scene.create_node(NodeKind::Clip(ClipShape::RoundedRect(RoundedRect::new(
            8.0,
            8.0,
            w - 8.0,
            h - 8.0,
            6.0,
        ))));
        scene.append_child(root, clip);
        let fade = scene.create_node(NodeKind::Opacity(0.8));
        scene.append_child(clip, fade);
        let card = scene.create_node(NodeKind::Rectangle(RectangleContent {
            rect: Rect::new(-20.0, 16.0, w * 0.6, h * 0.5),
            color: Color::rgb(90, 160, 220),
            radius: 8.0,
        }));
        scene.append_child(fade, card);

        let spinner = scene.create_node(NodeKind::Transform(spin(w, h, 0.0)));
        scene.append_child(root, spinner);
        let blade = scene.create_node(NodeKind::Geometry(GeometryContent {
            vertices: Arc::from([
                Point::new(0.0, -20.0),
                Point::new(6.0, 0.0),
                Point::new(-6.0, 0.0),
            ]),
            mode: GeometryMode::Fill,
            color: Color::rgb(240, 180, 60),
        }));
        scene.append_child(spinner, blade);

        Self {
            id,
            size,
            exposed: false,
            update_requested: false,
            frames_left: frames,
            angle: 0.0,
            spinner,
            scene,
        }
    }
}

fn spin(w: f64, h: f64, angle: f64) -> Transform3d {
    Transform3d::from_translation(w * 0.75, h * 0.5) * Transform3d::from_rotation_z(angle)
}

impl WindowOwner for DemoWindow {
    type Store = PixmapBackingStore;

    fn id(&self) -> WindowId {
        self.id
    }

    fn size(&self) -> PixelSize {
        self.size
    }

    fn is_renderable(&self) -> bool {
        !self.size.is_empty()
    }

    fn is_exposed(&self) -> bool {
        self.exposed
    }

    fn is_visible(&self) -> bool {
        self.exposed
    }

    fn create_backing_store(&mut self, size: PixelSize) -> Result<Self::Store, SurfaceError> {
        PixmapBackingStore::new(size)
    }

    fn request_update(&mut self) {
        self.update_requested = true;
    }

    fn polish(&mut self, _update: &mut UpdateRequest) {}

    fn after_animating(&mut self, update: &mut UpdateRequest) {
        if self.frames_left > 0 {
            self.frames_left -= 1;
            self.angle += SPIN_STEP;
            update.request();
        }
    }

    fn sync(&mut self, _update: &mut UpdateRequest) {
        let (w, h) = (f64::from(self.size.width), f64::from(self.size.height));
        self.scene.set_kind(self.spinner, NodeKind::Transform(spin(w, h, self.angle)));
    }

    fn scene(&self) -> &SceneTree {
        &self.scene
    }

    fn frame_swapped(&mut self) {
        log::info!("{} presented", self.id);
    }

    fn about_to_stop(&mut self) {
        log::info!("{} stopping", self.id);
    }
}

/// Forwards every event to a pretty printer and a shared recorder.
struct DemoSink {
    pretty: PrettyPrintSink,
    recorder: Rc<RefCell<RecorderSink>>,
}

impl TraceSink for DemoSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.pretty.on_frame_begin(e);
        self.recorder.borrow_mut().on_frame_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.pretty.on_phase_end(e);
        self.recorder.borrow_mut().on_phase_end(e);
    }

    fn on_frame_skipped(&mut self, e: &FrameSkippedEvent) {
        self.pretty.on_frame_skipped(e);
        self.recorder.borrow_mut().on_frame_skipped(e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.pretty.on_frame_summary(s);
        self.recorder.borrow_mut().on_frame_summary(s);
    }

    fn on_flush_rect(&mut self, e: &FlushRectEvent) {
        self.pretty.on_flush_rect(e);
        self.recorder.borrow_mut().on_flush_rect(e);
    }

    fn on_display_list(&mut self, e: &DisplayListEvent) {
        self.pretty.on_display_list(e);
        self.recorder.borrow_mut().on_display_list(e);
    }
}

fn main() {
    env_logger::init();

    // -- sinks -------------------------------------------------------------
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));
    let mut render_loop = RenderLoop::new(RenderLoopConfig::from_env());
    render_loop.set_trace_sink(Some(Box::new(DemoSink {
        pretty: PrettyPrintSink::new(Box::new(std::io::stdout())),
        recorder: Rc::clone(&recorder),
    })));

    // -- windows -----------------------------------------------------------
    let mut windows = [
        DemoWindow::new(WindowId(1), PixelSize::new(160, 120), 6),
        DemoWindow::new(WindowId(2), PixelSize::new(96, 96), 0),
    ];
    for window in &mut windows {
        render_loop.show(window).expect("failed to show window");
    }

    // The platform exposes the first window right away.
    windows[0].exposed = true;
    render_loop
        .exposure_changed(&mut windows[0])
        .expect("failed to render exposed window");

    // -- simulated event loop ----------------------------------------------
    loop {
        let mut idle = true;
        for window in &mut windows {
            if core::mem::take(&mut window.update_requested) {
                idle = false;
                render_loop
                    .handle_update_request(window)
                    .expect("failed to render frame");
            }
        }
        if idle {
            break;
        }
    }

    // -- capture the hidden window -------------------------------------------
    if let Some(image) = render_loop
        .grab(&mut windows[1])
        .expect("failed to grab window")
    {
        image.save_png("grab.png").expect("failed to write grab.png");
        println!("Wrote grab.png ({}x{})", image.width(), image.height());
    }

    // -- teardown ------------------------------------------------------------
    let [first, second] = &mut windows;
    render_loop.hide(second);
    render_loop.window_destroyed(first);
    let context = render_loop.scene_graph_context();
    println!(
        "{} frames rendered, context invalidated {} time(s)",
        render_loop.frame_count(),
        context.invalidation_count(),
    );

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    softscene_debug::chrome::export(recorder.borrow().as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path}");
}
