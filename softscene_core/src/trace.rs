// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame instrumentation for the render loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! render loop calls at each phase boundary. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching. Either way the
//! loop's control flow does not depend on whether a sink is attached.
//!
//! [`FrameSummaryBuilder`] collects phase boundary timestamps during a frame
//! and produces a [`FrameSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies.
//! - `trace-rich` (implies `trace`) gates [`FlushRectEvent`] and
//!   [`DisplayListEvent`] plus the corresponding `TraceSink` methods.

use crate::time::{Duration, HostTime};
use crate::window::WindowId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a frame is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// The window owner finalizes pending visual adjustments.
    Polish,
    /// Post-animation notification plus scene synchronization and
    /// display-list building.
    Sync,
    /// Rasterization into the backing store.
    Render,
    /// Capture and presentation of the flush region.
    Swap,
}

impl PhaseKind {
    /// All phases in frame order.
    pub const ALL: [Self; 4] = [Self::Polish, Self::Sync, Self::Render, Self::Swap];

    /// Short lowercase name, as used in log lines.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Polish => "polish",
            Self::Sync => "sync",
            Self::Render => "render",
            Self::Swap => "swap",
        }
    }
}

/// Why a requested frame produced no output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The window owner reported the window as not renderable.
    NotRenderable,
    /// Deferred input processing hid or destroyed the window mid-frame.
    WindowGone,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a frame starts for a tracked, renderable window.
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter across all windows.
    pub frame_index: u64,
    /// Which window is rendering.
    pub window: WindowId,
    /// Host time at the start of the frame.
    pub timestamp: HostTime,
    /// Whether this frame will present (an update was pending).
    pub also_present: bool,
    /// Whether this frame serves a capture request.
    pub grab_only: bool,
}

/// Marks the end of a frame phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which window.
    pub window: WindowId,
    /// Which phase just finished.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted when a frame was requested but aborted before rasterization.
#[derive(Clone, Copy, Debug)]
pub struct FrameSkippedEvent {
    /// Which window.
    pub window: WindowId,
    /// Host time when the frame was abandoned.
    pub timestamp: HostTime,
    /// Why no output was produced.
    pub reason: SkipReason,
}

/// Per-frame timing summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Which window.
    pub window: WindowId,
    /// Host time at the start of the frame.
    pub begin: HostTime,
    /// Polish phase duration (zero if not measured).
    pub polish: Duration,
    /// Sync phase duration (zero if not measured).
    pub sync: Duration,
    /// Render phase duration (zero if not measured).
    pub render: Duration,
    /// Swap phase duration (zero if not measured).
    pub swap: Duration,
    /// Time since the end of the previous frame of any window.
    pub frame_delta: Duration,
    /// Whether the flush region was presented to screen.
    pub presented: bool,
    /// Whether a capture image was taken.
    pub captured: bool,
}

impl FrameSummary {
    /// Sum of all phase durations.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.polish
            .saturating_add(self.sync)
            .saturating_add(self.render)
            .saturating_add(self.swap)
    }
}

/// The flush region of one frame, in device pixels.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushRectEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// Display-list statistics for one sync phase.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayListEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Nodes visited.
    pub visited: u32,
    /// Entries emitted.
    pub emitted: u32,
    /// Clip subtrees skipped as empty.
    pub pruned: u32,
    /// Malformed nodes ignored.
    pub malformed: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the render loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a frame starts.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called at the end of each frame phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a frame is abandoned before rasterization.
    fn on_frame_skipped(&mut self, e: &FrameSkippedEvent) {
        _ = e;
    }

    /// Called with a per-frame timing summary once the frame completes.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called with the frame's flush region (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_flush_rect(&mut self, e: &FlushRectEvent) {
        _ = e;
    }

    /// Called after display-list building (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_display_list(&mut self, e: &DisplayListEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink, if any.
    #[inline]
    #[must_use]
    pub fn new(sink: Option<&'a mut dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::new(None)
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSkippedEvent`].
    #[inline]
    pub fn frame_skipped(&mut self, e: &FrameSkippedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_skipped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits a [`FlushRectEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn flush_rect(&mut self, e: &FlushRectEvent) {
        if let Some(s) = &mut self.sink {
            s.on_flush_rect(e);
        }
    }

    /// Emits a [`DisplayListEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn display_list(&mut self, e: &DisplayListEvent) {
        if let Some(s) = &mut self.sink {
            s.on_display_list(e);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase boundary timestamps during a frame and produces a
/// [`FrameSummary`].
///
/// Each phase starts where the previous recorded boundary left off, so a
/// phase's duration also covers any bookkeeping between two phases.
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    begin: FrameBeginEvent,
    phase_ends: [Option<HostTime>; 4],
    frame_delta: Duration,
    presented: bool,
    captured: bool,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the given frame.
    ///
    /// `previous_frame_end` is when the last frame of any window finished,
    /// if there was one.
    #[must_use]
    pub fn new(begin: &FrameBeginEvent, previous_frame_end: Option<HostTime>) -> Self {
        Self {
            begin: *begin,
            phase_ends: [None; 4],
            frame_delta: previous_frame_end
                .map_or(Duration::ZERO, |end| begin.timestamp.saturating_duration_since(end)),
            presented: false,
            captured: false,
        }
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Records whether the flush region reached the screen.
    pub fn set_presented(&mut self, presented: bool) {
        self.presented = presented;
    }

    /// Records whether a capture image was taken.
    pub fn set_captured(&mut self, captured: bool) {
        self.captured = captured;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.begin.frame_index,
            window: self.begin.window,
            begin: self.begin.timestamp,
            polish: self.phase_duration(PhaseKind::Polish),
            sync: self.phase_duration(PhaseKind::Sync),
            render: self.phase_duration(PhaseKind::Render),
            swap: self.phase_duration(PhaseKind::Swap),
            frame_delta: self.frame_delta,
            presented: self.presented,
            captured: self.captured,
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> Duration {
        let idx = phase_index(phase);
        let Some(end) = self.phase_ends[idx] else {
            return Duration::ZERO;
        };
        let start = self.phase_ends[..idx]
            .iter()
            .rev()
            .find_map(|t| *t)
            .unwrap_or(self.begin.timestamp);
        end.saturating_duration_since(start)
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Polish => 0,
        PhaseKind::Sync => 1,
        PhaseKind::Render => 2,
        PhaseKind::Swap => 3,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> FrameBeginEvent {
        FrameBeginEvent {
            frame_index: 42,
            window: WindowId(3),
            timestamp: HostTime(1_000_000),
            also_present: true,
            grab_only: false,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_frame_begin(&sample_begin());
        sink.on_frame_summary(&FrameSummaryBuilder::new(&sample_begin(), None).finish());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.frame_begin(&sample_begin());
        tracer.frame_skipped(&FrameSkippedEvent {
            window: WindowId(3),
            timestamp: HostTime(0),
            reason: SkipReason::NotRenderable,
        });
    }

    #[test]
    fn summary_builder_chains_phase_boundaries() {
        let mut builder = FrameSummaryBuilder::new(&sample_begin(), Some(HostTime(900_000)));
        builder.phase_end(PhaseKind::Polish, HostTime(1_000_100));
        builder.phase_end(PhaseKind::Sync, HostTime(1_000_500));
        builder.phase_end(PhaseKind::Render, HostTime(1_002_000));
        builder.phase_end(PhaseKind::Swap, HostTime(1_002_050));
        builder.set_presented(true);

        let summary = builder.finish();
        assert_eq!(summary.polish, Duration(100));
        assert_eq!(summary.sync, Duration(400));
        assert_eq!(summary.render, Duration(1_500));
        assert_eq!(summary.swap, Duration(50));
        assert_eq!(summary.total(), Duration(2_050));
        assert_eq!(summary.frame_delta, Duration(100_000));
        assert!(summary.presented);
        assert!(!summary.captured);
        assert_eq!(summary.frame_index, 42);
    }

    #[test]
    fn summary_builder_missing_phases_are_zero() {
        let mut builder = FrameSummaryBuilder::new(&sample_begin(), None);
        builder.phase_end(PhaseKind::Render, HostTime(1_000_300));
        let summary = builder.finish();
        assert_eq!(summary.polish, Duration::ZERO);
        assert_eq!(summary.sync, Duration::ZERO);
        // Render is measured from the frame start when earlier phases are absent.
        assert_eq!(summary.render, Duration(300));
        assert_eq!(summary.swap, Duration::ZERO);
        assert_eq!(summary.frame_delta, Duration::ZERO);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            phases: Vec<PhaseKind>,
        }
        impl TraceSink for RecordingSink {
            fn on_phase_end(&mut self, e: &PhaseEndEvent) {
                self.phases.push(e.phase);
            }
        }

        let mut sink = RecordingSink { phases: Vec::new() };
        let mut tracer = Tracer::new(Some(&mut sink));
        for phase in PhaseKind::ALL {
            tracer.phase_end(&PhaseEndEvent {
                frame_index: 1,
                window: WindowId(0),
                phase,
                timestamp: HostTime(0),
            });
        }
        drop(tracer);
        assert_eq!(sink.phases, PhaseKind::ALL);
    }
}
