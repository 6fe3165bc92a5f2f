// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! and durations are printed in microseconds.

use std::io::Write;

use softscene_core::time::{Duration, HostTime};
use softscene_core::trace::{
    DisplayListEvent, FlushRectEvent, FrameBeginEvent, FrameSkippedEvent, FrameSummary,
    PhaseEndEvent, SkipReason, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn host_us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

fn dur_us(d: Duration) -> f64 {
    d.nanos() as f64 / 1000.0
}

fn skip_reason(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::NotRenderable => "not-renderable",
        SkipReason::WindowGone => "window-gone",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] frame={} {} at {:.1}µs present={} grab={}",
            e.frame_index,
            e.window,
            host_us(e.timestamp),
            e.also_present,
            e.grab_only,
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {:.1}µs",
            e.frame_index,
            e.phase.name(),
            host_us(e.timestamp),
        );
    }

    fn on_frame_skipped(&mut self, e: &FrameSkippedEvent) {
        let _ = writeln!(
            self.writer,
            "[skipped] {} at {:.1}µs reason={}",
            e.window,
            host_us(e.timestamp),
            skip_reason(e.reason),
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} {} polish={:.1}µs sync={:.1}µs \
             render={:.1}µs swap={:.1}µs delta={:.1}µs presented={} captured={}",
            s.frame_index,
            s.window,
            dur_us(s.polish),
            dur_us(s.sync),
            dur_us(s.render),
            dur_us(s.swap),
            dur_us(s.frame_delta),
            s.presented,
            s.captured,
        );
    }

    fn on_flush_rect(&mut self, e: &FlushRectEvent) {
        let _ = writeln!(
            self.writer,
            "[flush] frame={} x={} y={} w={} h={}",
            e.frame_index, e.x, e.y, e.width, e.height,
        );
    }

    fn on_display_list(&mut self, e: &DisplayListEvent) {
        let _ = writeln!(
            self.writer,
            "[display-list] frame={} visited={} emitted={} pruned={} malformed={}",
            e.frame_index, e.visited, e.emitted, e.pruned, e.malformed,
        );
    }
}

#[cfg(test)]
mod tests {
    use softscene_core::window::WindowId;

    use super::*;

    #[test]
    fn pretty_print_frame_begin() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_frame_begin(&FrameBeginEvent {
            frame_index: 1,
            window: WindowId(4),
            timestamp: HostTime(1_000_000),
            also_present: true,
            grab_only: false,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[frame]"), "got: {output}");
        assert!(output.contains("frame=1"), "got: {output}");
        assert!(output.contains("window#4"), "got: {output}");
        assert!(output.contains("1000.0µs"), "got: {output}");
    }

    #[test]
    fn pretty_print_skip_reason() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_frame_skipped(&FrameSkippedEvent {
            window: WindowId(2),
            timestamp: HostTime(0),
            reason: SkipReason::WindowGone,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("reason=window-gone"), "got: {output}");
    }
}
