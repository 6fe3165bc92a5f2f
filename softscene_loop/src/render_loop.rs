// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-window frame loop.
//!
//! [`RenderLoop`] tracks the windows that are currently shown and drives one
//! frame at a time through polish, sync, rasterize, capture and present. All
//! work happens synchronously on the caller's thread; frames are requested
//! through [`WindowOwner::request_update`] and delivered back through
//! [`RenderLoop::handle_update_request`].
//!
//! # Window lifecycle
//!
//! ```text
//!            show                    hide / window_destroyed
//!  Hidden ─────────► Shown ──────────────────────────────► Hidden
//!  (no record)       (record + backing store)              (record released)
//! ```
//!
//! Every operation checks tracking explicitly. Operations on windows that
//! are not shown are silent no-ops: teardown routinely races with pending
//! frame requests.

use std::collections::HashMap;

use softscene_core::time::HostTime;
use softscene_core::trace::{
    FrameBeginEvent, FrameSkippedEvent, FrameSummary, FrameSummaryBuilder, PhaseEndEvent,
    PhaseKind, SkipReason, TraceSink, Tracer,
};
use softscene_core::window::WindowId;
use softscene_render::{FlushRegion, PaintTarget, Painter, SoftwarePainter};
use tiny_skia::Pixmap;

use crate::config::RenderLoopConfig;
use crate::context::RenderContext;
use crate::error::LoopError;
use crate::owner::{InputOutcome, SurfaceType, UpdateRequest, WindowOwner};
use crate::time::now;

const LOG: &str = "softscene::render_loop";

/// Bookkeeping for one shown window.
#[derive(Debug)]
struct WindowRenderState<S> {
    update_pending: bool,
    grab_only: bool,
    backing_store: S,
    /// Region presented by the previous frame.
    last_flush: FlushRegion,
    /// The next present covers the whole surface (after show or resize).
    full_present: bool,
    /// Capture produced by a grab frame, taken by [`RenderLoop::grab`].
    grabbed: Option<Pixmap>,
}

impl<S> WindowRenderState<S> {
    fn new(backing_store: S) -> Self {
        Self {
            update_pending: false,
            grab_only: false,
            backing_store,
            last_flush: FlushRegion::Empty,
            full_present: true,
            grabbed: None,
        }
    }
}

/// Drives frames for a set of windows sharing one [`RenderContext`].
pub struct RenderLoop<W: WindowOwner, P: Painter = SoftwarePainter> {
    config: RenderLoopConfig,
    windows: HashMap<WindowId, WindowRenderState<W::Store>>,
    context: RenderContext<P>,
    sink: Option<Box<dyn TraceSink>>,
    frame_index: u64,
    last_frame_end: Option<HostTime>,
}

impl<W: WindowOwner, P: Painter> core::fmt::Debug for RenderLoop<W, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("config", &self.config)
            .field("windows", &self.windows.len())
            .field("initialized", &self.context.is_initialized())
            .field("frame_index", &self.frame_index)
            .field("traced", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl<W: WindowOwner> RenderLoop<W> {
    /// Creates a loop drawing with a fresh [`SoftwarePainter`].
    #[must_use]
    pub fn new(config: RenderLoopConfig) -> Self {
        Self::with_painter(config, SoftwarePainter::new())
    }
}

impl<W: WindowOwner, P: Painter> RenderLoop<W, P> {
    /// Creates a loop drawing through `painter`.
    #[must_use]
    pub fn with_painter(config: RenderLoopConfig, painter: P) -> Self {
        Self {
            config,
            windows: HashMap::new(),
            context: RenderContext::new(painter),
            sink: None,
            frame_index: 0,
            last_frame_end: None,
        }
    }

    /// Attaches a trace sink, returning the previous one.
    ///
    /// Sinks only observe: frames run the same with or without one.
    pub fn set_trace_sink(
        &mut self,
        sink: Option<Box<dyn TraceSink>>,
    ) -> Option<Box<dyn TraceSink>> {
        core::mem::replace(&mut self.sink, sink)
    }

    /// The loop configuration.
    #[must_use]
    pub fn config(&self) -> &RenderLoopConfig {
        &self.config
    }

    /// The kind of surface windows must provide.
    #[must_use]
    pub fn window_surface_type(&self) -> SurfaceType {
        SurfaceType::Raster
    }

    /// The rendering context shared by all windows.
    #[must_use]
    pub fn scene_graph_context(&self) -> &RenderContext<P> {
        &self.context
    }

    /// Mutable access to the shared rendering context.
    pub fn scene_graph_context_mut(&mut self) -> &mut RenderContext<P> {
        &mut self.context
    }

    /// Whether `id` is currently shown.
    #[must_use]
    pub fn is_tracked(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id)
    }

    /// Whether a frame has been requested for `id` but not yet started.
    /// `false` for windows that are not shown.
    #[must_use]
    pub fn is_update_pending(&self, id: WindowId) -> bool {
        self.windows.get(&id).is_some_and(|s| s.update_pending)
    }

    /// Number of shown windows.
    #[must_use]
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// The backing store of a shown window.
    #[must_use]
    pub fn backing_store(&self, id: WindowId) -> Option<&W::Store> {
        self.windows.get(&id).map(|s| &s.backing_store)
    }

    /// Number of frames started so far, across all windows.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_index
    }

    /// Starts tracking `window`, allocates its backing store and requests
    /// its first frame. Does nothing if the window is already shown.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::Surface`] if the backing store cannot be
    /// allocated; the window stays hidden.
    pub fn show(&mut self, window: &mut W) -> Result<(), LoopError> {
        let id = window.id();
        if self.windows.contains_key(&id) {
            log::trace!(target: LOG, "show: {id} already shown");
            return Ok(());
        }
        let size = window.size();
        let store = window.create_backing_store(size)?;
        self.windows.insert(id, WindowRenderState::new(store));
        log::debug!(
            target: LOG,
            "{id} shown with a {}x{} backing store",
            size.width,
            size.height,
        );
        self.maybe_update(window);
        Ok(())
    }

    /// Stops tracking `window` and releases its backing store.
    ///
    /// The owner is told that rendering is about to stop and to clean up.
    /// When the last window goes away the shared context is invalidated,
    /// unless the owner asks for a persistent scene graph.
    pub fn hide(&mut self, window: &mut W) {
        let id = window.id();
        if self.windows.remove(&id).is_none() {
            log::trace!(target: LOG, "hide: {id} not shown");
            return;
        }
        log::debug!(target: LOG, "{id} hidden");
        window.about_to_stop();
        window.cleanup_on_shutdown();
        if self.windows.is_empty() && !window.persistent_scene_graph() {
            self.context.invalidate();
        }
    }

    /// Like [`hide`](Self::hide), and additionally invalidates the shared
    /// context whenever no windows remain, regardless of persistence.
    ///
    /// Windows are usually hidden before they are destroyed, so the
    /// invalidation also happens when `window` is no longer shown.
    pub fn window_destroyed(&mut self, window: &mut W) {
        self.hide(window);
        if self.windows.is_empty() {
            self.context.invalidate();
        }
    }

    /// Renders one frame immediately if `window` is shown and now exposed.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::Surface`] if the backing store cannot be resized.
    pub fn exposure_changed(&mut self, window: &mut W) -> Result<(), LoopError> {
        if !window.is_exposed() {
            return Ok(());
        }
        let Some(state) = self.windows.get_mut(&window.id()) else {
            return Ok(());
        };
        state.update_pending = true;
        self.render_window(window)
    }

    /// Schedules one more frame for `window`.
    ///
    /// Requests coalesce: the owner's [`request_update`] is only called when
    /// no frame is pending yet.
    ///
    /// [`request_update`]: WindowOwner::request_update
    pub fn maybe_update(&mut self, window: &mut W) {
        let Some(state) = self.windows.get_mut(&window.id()) else {
            return;
        };
        if !state.update_pending {
            state.update_pending = true;
            window.request_update();
        }
    }

    /// Renders the frame requested through [`WindowOwner::request_update`].
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::Surface`] if the backing store cannot be resized.
    pub fn handle_update_request(&mut self, window: &mut W) -> Result<(), LoopError> {
        self.render_window(window)
    }

    /// Renders `window` off-screen and returns the captured image.
    ///
    /// Works for shown windows that are not exposed. The grab frame skips
    /// deferred input and only presents if a regular update was already
    /// pending. Returns `Ok(None)` if the window is not shown, not
    /// renderable, or has an empty surface.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::Surface`] if the backing store cannot be resized.
    pub fn grab(&mut self, window: &mut W) -> Result<Option<Pixmap>, LoopError> {
        let id = window.id();
        let Some(state) = self.windows.get_mut(&id) else {
            return Ok(None);
        };
        state.grab_only = true;
        let result = self.render_window(window);
        let Some(state) = self.windows.get_mut(&id) else {
            return result.map(|()| None);
        };
        state.grab_only = false;
        let grabbed = state.grabbed.take();
        result.map(|()| grabbed)
    }

    fn render_window(&mut self, window: &mut W) -> Result<(), LoopError> {
        let id = window.id();
        let Some(state) = self.windows.get_mut(&id) else {
            log::trace!(target: LOG, "frame for {id} dropped: not shown");
            return Ok(());
        };
        if !window.is_renderable() {
            log::trace!(target: LOG, "frame for {id} skipped: not renderable");
            tracer(&mut self.sink).frame_skipped(&FrameSkippedEvent {
                window: id,
                timestamp: now(),
                reason: SkipReason::NotRenderable,
            });
            return Ok(());
        }

        let size = window.size();
        if state.backing_store.size() != size {
            state.backing_store.resize(size)?;
            state.full_present = true;
        }

        self.context.initialize_if_needed();

        let also_present = core::mem::replace(&mut state.update_pending, false);
        let grab_only = state.grab_only;

        if !grab_only {
            match window.flush_deferred_input() {
                InputOutcome::Continue => {}
                InputOutcome::Hide => self.hide(window),
                InputOutcome::Destroyed => self.window_destroyed(window),
            }
        }
        let Some(state) = self.windows.get_mut(&id) else {
            log::debug!(target: LOG, "frame for {id} aborted: window gone during input");
            tracer(&mut self.sink).frame_skipped(&FrameSkippedEvent {
                window: id,
                timestamp: now(),
                reason: SkipReason::WindowGone,
            });
            return Ok(());
        };

        self.frame_index += 1;
        let frame_index = self.frame_index;
        let begin = FrameBeginEvent {
            frame_index,
            window: id,
            timestamp: now(),
            also_present,
            grab_only,
        };
        let mut tracer = tracer(&mut self.sink);
        tracer.frame_begin(&begin);
        let mut summary = FrameSummaryBuilder::new(&begin, self.last_frame_end);
        let mut phase_end = |tracer: &mut Tracer<'_>, phase: PhaseKind| {
            let timestamp = now();
            summary.phase_end(phase, timestamp);
            tracer.phase_end(&PhaseEndEvent {
                frame_index,
                window: id,
                phase,
                timestamp,
            });
            timestamp
        };
        let mut update = UpdateRequest::new();

        window.polish(&mut update);
        phase_end(&mut tracer, PhaseKind::Polish);

        window.after_animating(&mut update);
        window.sync(&mut update);
        let stats = self.context.sync(window.scene());
        log::trace!(target: LOG, "{id} synced: {stats:?}");
        #[cfg(feature = "trace-rich")]
        tracer.display_list(&softscene_core::trace::DisplayListEvent {
            frame_index,
            visited: stats.visited,
            emitted: stats.emitted,
            pruned: stats.pruned,
            malformed: stats.malformed,
        });
        phase_end(&mut tracer, PhaseKind::Sync);

        let surface = state.backing_store.size().to_rect();
        let clear = self.config.clear_color;
        state.backing_store.begin_paint(surface, clear);
        self.context.render(&mut state.backing_store);
        state.backing_store.end_paint();
        let flush = self.context.flush_region();
        #[cfg(feature = "trace-rich")]
        if let Some(r) = flush.bounds() {
            tracer.flush_rect(&softscene_core::trace::FlushRectEvent {
                frame_index,
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
            });
        }
        phase_end(&mut tracer, PhaseKind::Render);

        let captured = if grab_only {
            state.grabbed = state.backing_store.snapshot();
            state.grab_only = false;
            state.grabbed.is_some()
        } else {
            false
        };

        let presented = also_present && window.is_visible();
        if presented {
            let mut region = flush;
            if state.full_present {
                region.add(surface);
            } else {
                region.merge(&state.last_flush);
            }
            state.backing_store.flush(&region);
            state.last_flush = flush;
            state.full_present = false;
            window.frame_swapped();
        }
        let frame_end = phase_end(&mut tracer, PhaseKind::Swap);

        summary.set_presented(presented);
        summary.set_captured(captured);
        let summary = summary.finish();
        tracer.frame_summary(&summary);
        drop(tracer);
        self.last_frame_end = Some(frame_end);
        self.log_timing(&summary);

        if update.is_requested() {
            self.maybe_update(window);
        }
        Ok(())
    }

    fn log_timing(&self, summary: &FrameSummary) {
        let level = if self.config.profile_frames {
            log::Level::Info
        } else {
            log::Level::Debug
        };
        if !log::log_enabled!(target: LOG, level) {
            return;
        }
        log::log!(
            target: LOG,
            level,
            "frame rendered with software render loop in {:.2}ms, polish={:.2}ms, sync={:.2}ms, render={:.2}ms, swap={:.2}ms, frame_delta={:.2}ms",
            summary.total().as_millis_f64(),
            summary.polish.as_millis_f64(),
            summary.sync.as_millis_f64(),
            summary.render.as_millis_f64(),
            summary.swap.as_millis_f64(),
            summary.frame_delta.as_millis_f64(),
        );
    }
}

fn tracer(sink: &mut Option<Box<dyn TraceSink>>) -> Tracer<'_> {
    match sink {
        Some(sink) => {
            let sink: &mut dyn TraceSink = &mut **sink;
            Tracer::new(Some(sink))
        }
        None => Tracer::none(),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use kurbo::Rect;
    use softscene_core::scene::{Color, NodeId, NodeKind, RectangleContent, SceneTree};
    use softscene_render::{PixelRect, PixelSize, PixmapBackingStore, SurfaceError};

    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Call {
        RequestUpdate,
        FlushInput,
        Polish,
        AfterAnimating,
        Sync,
        FrameSwapped,
        AboutToStop,
        Cleanup,
    }

    struct TestWindow {
        id: WindowId,
        size: PixelSize,
        renderable: bool,
        exposed: bool,
        visible: bool,
        persistent: bool,
        input: InputOutcome,
        request_in_sync: bool,
        scene: SceneTree,
        rect: NodeId,
        calls: Vec<Call>,
    }

    impl TestWindow {
        fn new(id: u32) -> Self {
            let (mut scene, root) = SceneTree::with_root();
            let rect = scene.create_node(red_rect(Rect::new(2.0, 2.0, 10.0, 10.0)));
            scene.append_child(root, rect);
            Self {
                id: WindowId(id),
                size: PixelSize::new(32, 32),
                renderable: true,
                exposed: true,
                visible: true,
                persistent: false,
                input: InputOutcome::Continue,
                request_in_sync: false,
                scene,
                rect,
                calls: Vec::new(),
            }
        }

        fn count(&self, call: Call) -> usize {
            self.calls.iter().filter(|c| **c == call).count()
        }
    }

    fn red_rect(rect: Rect) -> NodeKind {
        NodeKind::Rectangle(RectangleContent {
            rect,
            color: Color::rgb(255, 0, 0),
            radius: 0.0,
        })
    }

    impl WindowOwner for TestWindow {
        type Store = PixmapBackingStore;

        fn id(&self) -> WindowId {
            self.id
        }
        fn size(&self) -> PixelSize {
            self.size
        }
        fn is_renderable(&self) -> bool {
            self.renderable
        }
        fn is_exposed(&self) -> bool {
            self.exposed
        }
        fn is_visible(&self) -> bool {
            self.visible
        }
        fn persistent_scene_graph(&self) -> bool {
            self.persistent
        }
        fn create_backing_store(&mut self, size: PixelSize) -> Result<Self::Store, SurfaceError> {
            PixmapBackingStore::new(size)
        }
        fn request_update(&mut self) {
            self.calls.push(Call::RequestUpdate);
        }
        fn flush_deferred_input(&mut self) -> InputOutcome {
            self.calls.push(Call::FlushInput);
            self.input
        }
        fn polish(&mut self, _update: &mut UpdateRequest) {
            self.calls.push(Call::Polish);
        }
        fn after_animating(&mut self, _update: &mut UpdateRequest) {
            self.calls.push(Call::AfterAnimating);
        }
        fn sync(&mut self, update: &mut UpdateRequest) {
            self.calls.push(Call::Sync);
            if core::mem::take(&mut self.request_in_sync) {
                update.request();
            }
        }
        fn scene(&self) -> &SceneTree {
            &self.scene
        }
        fn frame_swapped(&mut self) {
            self.calls.push(Call::FrameSwapped);
        }
        fn about_to_stop(&mut self) {
            self.calls.push(Call::AboutToStop);
        }
        fn cleanup_on_shutdown(&mut self) {
            self.calls.push(Call::Cleanup);
        }
    }

    #[derive(Debug, Default)]
    struct Recorded {
        begins: Vec<FrameBeginEvent>,
        phases: Vec<PhaseKind>,
        skipped: Vec<SkipReason>,
        summaries: Vec<FrameSummary>,
    }

    struct RecordingSink(Rc<RefCell<Recorded>>);

    impl TraceSink for RecordingSink {
        fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
            self.0.borrow_mut().begins.push(*e);
        }
        fn on_phase_end(&mut self, e: &PhaseEndEvent) {
            self.0.borrow_mut().phases.push(e.phase);
        }
        fn on_frame_skipped(&mut self, e: &FrameSkippedEvent) {
            self.0.borrow_mut().skipped.push(e.reason);
        }
        fn on_frame_summary(&mut self, s: &FrameSummary) {
            self.0.borrow_mut().summaries.push(*s);
        }
    }

    fn traced_loop() -> (RenderLoop<TestWindow>, Rc<RefCell<Recorded>>) {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        rl.set_trace_sink(Some(Box::new(RecordingSink(recorded.clone()))));
        (rl, recorded)
    }

    fn store<'a>(rl: &'a RenderLoop<TestWindow>, w: &TestWindow) -> &'a PixmapBackingStore {
        rl.backing_store(w.id).expect("window is shown")
    }

    #[test]
    fn show_tracks_and_requests_first_frame() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        rl.show(&mut w).unwrap();
        assert!(rl.is_tracked(w.id));
        assert!(rl.is_update_pending(w.id));
        assert_eq!(w.calls, [Call::RequestUpdate]);
        assert_eq!(store(&rl, &w).size(), w.size);

        rl.show(&mut w).unwrap();
        assert_eq!(w.calls, [Call::RequestUpdate], "second show is a no-op");
        assert_eq!(rl.window_count(), 1);
    }

    #[test]
    fn update_requests_coalesce_into_one_pass() {
        let (mut rl, recorded) = traced_loop();
        let mut w = TestWindow::new(1);
        rl.show(&mut w).unwrap();
        rl.maybe_update(&mut w);
        rl.maybe_update(&mut w);
        assert_eq!(w.count(Call::RequestUpdate), 1);

        rl.handle_update_request(&mut w).unwrap();
        assert!(!rl.is_update_pending(w.id));
        assert_eq!(w.count(Call::Polish), 1);
        assert_eq!(store(&rl, &w).flush_count(), 1);

        let recorded = recorded.borrow();
        assert_eq!(recorded.begins.len(), 1);
        assert!(recorded.begins[0].also_present, "pending update consumed by the frame");
        assert_eq!(recorded.phases, PhaseKind::ALL);
    }

    #[test]
    fn frame_callbacks_run_in_order() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        rl.show(&mut w).unwrap();
        w.calls.clear();
        rl.handle_update_request(&mut w).unwrap();
        assert_eq!(
            w.calls,
            [
                Call::FlushInput,
                Call::Polish,
                Call::AfterAnimating,
                Call::Sync,
                Call::FrameSwapped,
            ]
        );
    }

    #[test]
    fn update_without_pending_flag_does_not_present() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        rl.show(&mut w).unwrap();
        rl.handle_update_request(&mut w).unwrap();
        rl.handle_update_request(&mut w).unwrap();
        assert_eq!(w.count(Call::Polish), 2);
        assert_eq!(w.count(Call::FrameSwapped), 1);
        assert_eq!(store(&rl, &w).flush_count(), 1);
    }

    #[test]
    fn update_raised_during_sync_schedules_next_frame() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        rl.show(&mut w).unwrap();
        w.calls.clear();
        w.request_in_sync = true;
        rl.handle_update_request(&mut w).unwrap();

        assert_eq!(w.calls.last(), Some(&Call::RequestUpdate));
        assert_eq!(w.count(Call::RequestUpdate), 1);
        assert_eq!(w.count(Call::FrameSwapped), 1, "current frame presents once");
        assert!(rl.is_update_pending(w.id));

        rl.handle_update_request(&mut w).unwrap();
        assert_eq!(w.count(Call::FrameSwapped), 2);
        assert!(!rl.is_update_pending(w.id));
    }

    #[test]
    fn grab_captures_without_presenting() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        w.exposed = false;
        w.visible = false;
        rl.show(&mut w).unwrap();
        w.calls.clear();

        let image = rl.grab(&mut w).unwrap().expect("shown window can be grabbed");
        assert_eq!((image.width(), image.height()), (32, 32));
        let px = image.pixel(5, 5).unwrap();
        assert_eq!((px.red(), px.green(), px.alpha()), (255, 0, 255));
        assert_eq!(store(&rl, &w).flush_count(), 0);
        assert_eq!(w.count(Call::FrameSwapped), 0);
        assert_eq!(w.count(Call::FlushInput), 0, "grab frames skip deferred input");
    }

    #[test]
    fn grab_of_presented_window_does_not_flush_again() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        rl.show(&mut w).unwrap();
        rl.handle_update_request(&mut w).unwrap();
        assert_eq!(store(&rl, &w).flush_count(), 1);

        assert!(rl.grab(&mut w).unwrap().is_some());
        assert!(rl.grab(&mut w).unwrap().is_some(), "capture buffer is per grab");
        assert_eq!(store(&rl, &w).flush_count(), 1);
    }

    #[test]
    fn grab_of_unrenderable_window_is_none() {
        let (mut rl, recorded) = traced_loop();
        let mut w = TestWindow::new(1);
        rl.show(&mut w).unwrap();
        w.renderable = false;
        assert!(rl.grab(&mut w).unwrap().is_none());
        assert_eq!(recorded.borrow().skipped, [SkipReason::NotRenderable]);

        w.renderable = true;
        rl.handle_update_request(&mut w).unwrap();
        assert_eq!(
            w.count(Call::FlushInput),
            1,
            "grab flag does not leak into later frames"
        );
    }

    #[test]
    fn operations_on_untracked_windows_are_noops() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(7);
        rl.hide(&mut w);
        rl.maybe_update(&mut w);
        rl.exposure_changed(&mut w).unwrap();
        rl.handle_update_request(&mut w).unwrap();
        assert!(rl.grab(&mut w).unwrap().is_none());
        rl.window_destroyed(&mut w);

        assert!(w.calls.is_empty());
        assert_eq!(rl.frame_count(), 0);
        assert_eq!(rl.scene_graph_context().invalidation_count(), 0);
    }

    #[test]
    fn hide_twice_is_idempotent() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        rl.show(&mut w).unwrap();
        rl.handle_update_request(&mut w).unwrap();
        rl.hide(&mut w);
        rl.hide(&mut w);
        assert_eq!(w.count(Call::AboutToStop), 1);
        assert_eq!(w.count(Call::Cleanup), 1);
        assert_eq!(rl.scene_graph_context().invalidation_count(), 1);
    }

    #[test]
    fn show_expose_hide_scenario() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        w.exposed = false;
        rl.show(&mut w).unwrap();
        w.calls.clear();

        w.exposed = true;
        rl.exposure_changed(&mut w).unwrap();
        assert_eq!(w.count(Call::Polish), 1);
        assert_eq!(w.count(Call::FrameSwapped), 1);
        assert_eq!(
            rl.scene_graph_context().flush_region().bounds(),
            Some(PixelRect::new(2, 2, 8, 8))
        );
        let presented = store(&rl, &w).presented().unwrap();
        assert_eq!(presented.pixel(5, 5).unwrap().red(), 255);
        assert!(rl.scene_graph_context().is_initialized());

        rl.hide(&mut w);
        assert!(rl.backing_store(w.id).is_none());
        assert!(!rl.scene_graph_context().is_initialized());
        assert_eq!(rl.scene_graph_context().invalidation_count(), 1);
    }

    #[test]
    fn persistent_owner_keeps_context_until_destroyed() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        w.persistent = true;
        rl.show(&mut w).unwrap();
        rl.handle_update_request(&mut w).unwrap();

        rl.hide(&mut w);
        assert!(rl.scene_graph_context().is_initialized());

        rl.window_destroyed(&mut w);
        assert!(!rl.scene_graph_context().is_initialized());
        assert_eq!(w.count(Call::AboutToStop), 1);
    }

    #[test]
    fn context_survives_while_other_windows_remain() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut a = TestWindow::new(1);
        let mut b = TestWindow::new(2);
        rl.show(&mut a).unwrap();
        rl.show(&mut b).unwrap();
        rl.handle_update_request(&mut a).unwrap();

        rl.window_destroyed(&mut a);
        assert!(rl.scene_graph_context().is_initialized());
        assert!(rl.is_tracked(b.id));

        rl.hide(&mut b);
        assert!(!rl.scene_graph_context().is_initialized());
    }

    #[test]
    fn input_hiding_window_aborts_frame() {
        let (mut rl, recorded) = traced_loop();
        let mut w = TestWindow::new(1);
        rl.show(&mut w).unwrap();
        w.calls.clear();
        w.input = InputOutcome::Hide;
        rl.handle_update_request(&mut w).unwrap();

        assert_eq!(w.calls, [Call::FlushInput, Call::AboutToStop, Call::Cleanup]);
        assert!(!rl.is_tracked(w.id));
        let recorded = recorded.borrow();
        assert_eq!(recorded.skipped, [SkipReason::WindowGone]);
        assert!(recorded.begins.is_empty());
    }

    #[test]
    fn input_destroying_window_invalidates_persistent_context() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        w.persistent = true;
        rl.show(&mut w).unwrap();
        w.input = InputOutcome::Destroyed;
        rl.handle_update_request(&mut w).unwrap();

        assert!(!rl.is_tracked(w.id));
        assert_eq!(w.count(Call::Polish), 0);
        // Context was initialized for the aborted frame, then torn down.
        assert_eq!(rl.scene_graph_context().invalidation_count(), 1);
    }

    #[test]
    fn unrenderable_window_skips_frame_and_keeps_pending() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        w.renderable = false;
        rl.show(&mut w).unwrap();
        rl.handle_update_request(&mut w).unwrap();
        assert_eq!(w.count(Call::Polish), 0);
        assert!(rl.is_update_pending(w.id));
        assert!(!rl.scene_graph_context().is_initialized());
    }

    #[test]
    fn resize_reallocates_and_presents_whole_surface() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        rl.show(&mut w).unwrap();
        rl.handle_update_request(&mut w).unwrap();
        assert_eq!(
            store(&rl, &w).last_flush().bounds(),
            Some(PixelRect::new(0, 0, 32, 32)),
            "first present covers the whole surface"
        );

        w.size = PixelSize::new(48, 40);
        rl.maybe_update(&mut w);
        rl.handle_update_request(&mut w).unwrap();
        assert_eq!(store(&rl, &w).size(), PixelSize::new(48, 40));
        assert_eq!(
            store(&rl, &w).last_flush().bounds(),
            Some(PixelRect::new(0, 0, 48, 40))
        );
    }

    #[test]
    fn present_covers_previous_and_current_content() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        rl.show(&mut w).unwrap();
        rl.handle_update_request(&mut w).unwrap();

        w.scene.set_kind(w.rect, red_rect(Rect::new(20.0, 20.0, 24.0, 24.0)));
        rl.maybe_update(&mut w);
        rl.handle_update_request(&mut w).unwrap();

        let s = store(&rl, &w);
        assert_eq!(s.last_flush().bounds(), Some(PixelRect::new(2, 2, 22, 22)));
        let presented = s.presented().unwrap();
        assert_eq!(presented.pixel(5, 5).unwrap().green(), 255, "old rect erased");
        assert_eq!(presented.pixel(21, 21).unwrap().green(), 0, "new rect shown");
    }

    #[test]
    fn invisible_window_does_not_present() {
        let mut rl = RenderLoop::new(RenderLoopConfig::default());
        let mut w = TestWindow::new(1);
        w.visible = false;
        rl.show(&mut w).unwrap();
        rl.handle_update_request(&mut w).unwrap();
        assert_eq!(w.count(Call::Polish), 1);
        assert_eq!(w.count(Call::FrameSwapped), 0);
        assert_eq!(store(&rl, &w).flush_count(), 0);
    }

    #[test]
    fn observer_does_not_change_flow() {
        fn drive(rl: &mut RenderLoop<TestWindow>) -> (Vec<Call>, u64) {
            let mut w = TestWindow::new(1);
            rl.show(&mut w).unwrap();
            rl.handle_update_request(&mut w).unwrap();
            w.request_in_sync = true;
            rl.maybe_update(&mut w);
            rl.handle_update_request(&mut w).unwrap();
            rl.grab(&mut w).unwrap();
            let flushes = store(rl, &w).flush_count();
            rl.hide(&mut w);
            (w.calls, flushes)
        }

        let mut plain = RenderLoop::new(RenderLoopConfig::default());
        let (mut traced, recorded) = traced_loop();
        assert_eq!(drive(&mut plain), drive(&mut traced));
        assert_eq!(plain.frame_count(), traced.frame_count());

        let recorded = recorded.borrow();
        assert_eq!(recorded.summaries.len(), 3);
        assert!(recorded.summaries[2].captured);
        assert_eq!(
            recorded
                .summaries
                .iter()
                .map(|s| s.frame_index)
                .collect::<Vec<_>>(),
            [1, 2, 3]
        );
    }

    #[test]
    fn surface_type_is_raster() {
        let rl: RenderLoop<TestWindow> = RenderLoop::new(RenderLoopConfig::default());
        assert_eq!(rl.window_surface_type(), SurfaceType::Raster);
    }
}
