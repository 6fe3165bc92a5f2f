// Copyright 2026 the Softscene Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use softscene_core::time::{Duration, HostTime};
use softscene_core::trace::{
    DisplayListEvent, FlushRectEvent, FrameBeginEvent, FrameSkippedEvent, FrameSummary,
    PhaseEndEvent, PhaseKind, SkipReason, TraceSink,
};
use softscene_core::window::WindowId;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_BEGIN: u8 = 1;
const TAG_PHASE_END: u8 = 2;
const TAG_FRAME_SKIPPED: u8 = 3;
const TAG_FRAME_SUMMARY: u8 = 4;
const TAG_FLUSH_RECT: u8 = 5;
const TAG_DISPLAY_LIST: u8 = 6;

const FLAG_FIRST: u8 = 1 << 0;
const FLAG_SECOND: u8 = 1 << 1;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_flags(&mut self, first: bool, second: bool) {
        let mut flags = 0;
        if first {
            flags |= FLAG_FIRST;
        }
        if second {
            flags |= FLAG_SECOND;
        }
        self.write_u8(flags);
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Polish => 0,
            PhaseKind::Sync => 1,
            PhaseKind::Render => 2,
            PhaseKind::Swap => 3,
        });
    }

    fn write_reason(&mut self, r: SkipReason) {
        self.write_u8(match r {
            SkipReason::NotRenderable => 0,
            SkipReason::WindowGone => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.write_u8(TAG_FRAME_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u32(e.window.0);
        self.write_u64(e.timestamp.nanos());
        self.write_flags(e.also_present, e.grab_only);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_u32(e.window.0);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_frame_skipped(&mut self, e: &FrameSkippedEvent) {
        self.write_u8(TAG_FRAME_SKIPPED);
        self.write_u32(e.window.0);
        self.write_u64(e.timestamp.nanos());
        self.write_reason(e.reason);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u32(s.window.0);
        self.write_u64(s.begin.nanos());
        self.write_u64(s.polish.nanos());
        self.write_u64(s.sync.nanos());
        self.write_u64(s.render.nanos());
        self.write_u64(s.swap.nanos());
        self.write_u64(s.frame_delta.nanos());
        self.write_flags(s.presented, s.captured);
    }

    fn on_flush_rect(&mut self, e: &FlushRectEvent) {
        self.write_u8(TAG_FLUSH_RECT);
        self.write_u64(e.frame_index);
        self.write_i32(e.x);
        self.write_i32(e.y);
        self.write_u32(e.width);
        self.write_u32(e.height);
    }

    fn on_display_list(&mut self, e: &DisplayListEvent) {
        self.write_u8(TAG_DISPLAY_LIST);
        self.write_u64(e.frame_index);
        self.write_u32(e.visited);
        self.write_u32(e.emitted);
        self.write_u32(e.pruned);
        self.write_u32(e.malformed);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`FrameBeginEvent`].
    FrameBegin(FrameBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`FrameSkippedEvent`].
    FrameSkipped(FrameSkippedEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
    /// A [`FlushRectEvent`].
    FlushRect(FlushRectEvent),
    /// A [`DisplayListEvent`].
    DisplayList(DisplayListEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first truncated record or unknown tag.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_flags(&mut self) -> Option<(bool, bool)> {
        let flags = self.read_u8()?;
        Some((flags & FLAG_FIRST != 0, flags & FLAG_SECOND != 0))
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Polish,
            1 => PhaseKind::Sync,
            2 => PhaseKind::Render,
            _ => PhaseKind::Swap,
        })
    }

    fn read_reason(&mut self) -> Option<SkipReason> {
        Some(match self.read_u8()? {
            0 => SkipReason::NotRenderable,
            _ => SkipReason::WindowGone,
        })
    }

    fn decode_frame_begin(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let window = WindowId(self.read_u32()?);
        let timestamp = HostTime(self.read_u64()?);
        let (also_present, grab_only) = self.read_flags()?;
        Some(RecordedEvent::FrameBegin(FrameBeginEvent {
            frame_index,
            window,
            timestamp,
            also_present,
            grab_only,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame_index: self.read_u64()?,
            window: WindowId(self.read_u32()?),
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_frame_skipped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSkipped(FrameSkippedEvent {
            window: WindowId(self.read_u32()?),
            timestamp: HostTime(self.read_u64()?),
            reason: self.read_reason()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let window = WindowId(self.read_u32()?);
        let begin = HostTime(self.read_u64()?);
        let polish = Duration(self.read_u64()?);
        let sync = Duration(self.read_u64()?);
        let render = Duration(self.read_u64()?);
        let swap = Duration(self.read_u64()?);
        let frame_delta = Duration(self.read_u64()?);
        let (presented, captured) = self.read_flags()?;
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index,
            window,
            begin,
            polish,
            sync,
            render,
            swap,
            frame_delta,
            presented,
            captured,
        }))
    }

    fn decode_flush_rect(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FlushRect(FlushRectEvent {
            frame_index: self.read_u64()?,
            x: self.read_i32()?,
            y: self.read_i32()?,
            width: self.read_u32()?,
            height: self.read_u32()?,
        }))
    }

    fn decode_display_list(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DisplayList(DisplayListEvent {
            frame_index: self.read_u64()?,
            visited: self.read_u32()?,
            emitted: self.read_u32()?,
            pruned: self.read_u32()?,
            malformed: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_BEGIN => self.decode_frame_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_FRAME_SKIPPED => self.decode_frame_skipped(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            TAG_FLUSH_RECT => self.decode_flush_rect(),
            TAG_DISPLAY_LIST => self.decode_display_list(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
