// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each window becomes a thread (`tid` = window id). Frame summaries are
//! expanded into back-to-back complete (`"X"`) events, one per phase, so the
//! polish / sync / render / swap split is visible on the timeline.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use softscene_core::time::{Duration, HostTime};
use softscene_core::trace::{FrameSummary, PhaseKind};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted from nanoseconds to microseconds.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Rich events carry no window; attribute them to the frame's window.
    let mut frame_window = 0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameBegin(e) => {
                frame_window = e.window.0;
                events.push(json!({
                    "ph": "i",
                    "name": "FrameBegin",
                    "cat": "Frame",
                    "ts": host_us(e.timestamp),
                    "pid": 0,
                    "tid": e.window.0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "also_present": e.also_present,
                        "grab_only": e.grab_only,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{}:end", e.phase.name()),
                    "cat": "Phase",
                    "ts": host_us(e.timestamp),
                    "pid": 0,
                    "tid": e.window.0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::FrameSkipped(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSkipped",
                    "cat": "Frame",
                    "ts": host_us(e.timestamp),
                    "pid": 0,
                    "tid": e.window.0,
                    "s": "t",
                    "args": {
                        "reason": format!("{:?}", e.reason),
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => push_phase_spans(&mut events, &s),
            RecordedEvent::FlushRect(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FlushRect",
                    "cat": "Rich",
                    "ts": 0,
                    "pid": 0,
                    "tid": frame_window,
                    "s": "p",
                    "args": {
                        "frame_index": e.frame_index,
                        "x": e.x,
                        "y": e.y,
                        "width": e.width,
                        "height": e.height,
                    }
                }));
            }
            RecordedEvent::DisplayList(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "DisplayList",
                    "cat": "Rich",
                    "ts": 0,
                    "pid": 0,
                    "tid": frame_window,
                    "s": "p",
                    "args": {
                        "frame_index": e.frame_index,
                        "visited": e.visited,
                        "emitted": e.emitted,
                        "pruned": e.pruned,
                        "malformed": e.malformed,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn push_phase_spans(events: &mut Vec<Value>, s: &FrameSummary) {
    let mut start = s.begin;
    for (phase, dur) in [
        (PhaseKind::Polish, s.polish),
        (PhaseKind::Sync, s.sync),
        (PhaseKind::Render, s.render),
        (PhaseKind::Swap, s.swap),
    ] {
        events.push(json!({
            "ph": "X",
            "name": phase.name(),
            "cat": "Frame",
            "ts": host_us(start),
            "dur": dur_us(dur),
            "pid": 0,
            "tid": s.window.0,
            "args": {
                "frame_index": s.frame_index,
            }
        }));
        start = start + dur;
    }
    events.push(json!({
        "ph": "i",
        "name": "FrameSummary",
        "cat": "Summary",
        "ts": host_us(start),
        "pid": 0,
        "tid": s.window.0,
        "s": "t",
        "args": {
            "frame_index": s.frame_index,
            "total_us": dur_us(s.total()),
            "frame_delta_us": dur_us(s.frame_delta),
            "presented": s.presented,
            "captured": s.captured,
        }
    }));
}

fn host_us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

fn dur_us(d: Duration) -> f64 {
    d.nanos() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use softscene_core::trace::{FrameBeginEvent, PhaseEndEvent, TraceSink};
    use softscene_core::window::WindowId;

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 1,
            window: WindowId(3),
            timestamp: HostTime(1_000_000),
            also_present: true,
            grab_only: false,
        });
        rec.on_phase_end(&PhaseEndEvent {
            frame_index: 1,
            window: WindowId(3),
            phase: PhaseKind::Polish,
            timestamp: HostTime(1_000_100),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["name"], "FrameBegin");
        assert_eq!(parsed[0]["tid"], 3);
        assert_eq!(parsed[1]["name"], "polish:end");
        assert_eq!(parsed[1]["ts"], 1000.1);
    }

    #[test]
    fn summary_expands_into_phase_spans() {
        let mut rec = RecorderSink::new();
        rec.on_frame_summary(&FrameSummary {
            frame_index: 2,
            window: WindowId(1),
            begin: HostTime(10_000),
            polish: Duration(1_000),
            sync: Duration(2_000),
            render: Duration(3_000),
            swap: Duration(4_000),
            frame_delta: Duration::ZERO,
            presented: true,
            captured: false,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 5);

        let spans: Vec<(&str, f64, f64)> = parsed[..4]
            .iter()
            .map(|e| {
                (
                    e["name"].as_str().unwrap(),
                    e["ts"].as_f64().unwrap(),
                    e["dur"].as_f64().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            spans,
            [
                ("polish", 10.0, 1.0),
                ("sync", 11.0, 2.0),
                ("render", 13.0, 3.0),
                ("swap", 16.0, 4.0),
            ]
        );
        assert_eq!(parsed[4]["args"]["total_us"], 10.0);
        assert_eq!(parsed[4]["ts"], 20.0);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
