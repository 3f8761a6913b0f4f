// Copyright 2026 the Scanout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binary session recording.
//!
//! A [`RecorderSink`] appends every flush-path event to a byte buffer as a
//! tag byte followed by the event's fields in little-endian order. The
//! buffer can be saved from a device and replayed later: [`decode`] yields
//! the events back as [`RecordedEvent`]s.

use scanout_core::area::Area;
use scanout_core::display::{FlushPath, RenderMode};
use scanout_core::format::ColorFormat;
use scanout_core::layer::LayerIndex;
use scanout_core::time::{Duration, HostTime};
use scanout_core::trace::{
    DisplayCreatedEvent, FlushEvent, FlushWaitEvent, ReloadObservedEvent, TraceSink, WaitOutcome,
};

const TAG_DISPLAY_CREATED: u8 = 1;
const TAG_FLUSH: u8 = 2;
const TAG_FLUSH_WAIT: u8 = 3;
const TAG_RELOAD_OBSERVED: u8 = 4;

/// A value with a fixed little-endian encoding.
trait Field: Sized {
    fn put(self, out: &mut Vec<u8>);
    fn get(input: &mut &[u8]) -> Option<Self>;
}

macro_rules! int_field {
    ($($ty:ty),*) => {$(
        impl Field for $ty {
            fn put(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn get(input: &mut &[u8]) -> Option<Self> {
                let (bytes, rest) = input.split_first_chunk()?;
                *input = rest;
                Some(Self::from_le_bytes(*bytes))
            }
        }
    )*};
}

int_field!(u8, u32, i32, u64);

/// Fields stored as a single code byte.
macro_rules! code_field {
    ($ty:ty { $($variant:path => $code:literal),* $(,)? }) => {
        impl Field for $ty {
            fn put(self, out: &mut Vec<u8>) {
                out.push(match self {
                    $($variant => $code),*
                });
            }

            fn get(input: &mut &[u8]) -> Option<Self> {
                match u8::get(input)? {
                    $($code => Some($variant),)*
                    _ => None,
                }
            }
        }
    };
}

code_field!(RenderMode { RenderMode::Direct => 0, RenderMode::Partial => 1 });
code_field!(FlushPath { FlushPath::Synchronous => 0, FlushPath::ReloadRequested => 1 });
code_field!(WaitOutcome {
    WaitOutcome::Immediate => 0,
    WaitOutcome::Signaled => 1,
    WaitOutcome::TimedOut => 2,
    WaitOutcome::Failed => 3,
});
code_field!(ColorFormat {
    ColorFormat::Argb8888 => 0,
    ColorFormat::Rgb888 => 1,
    ColorFormat::Rgb565 => 2,
    ColorFormat::L8 => 3,
    ColorFormat::Al88 => 4,
});

impl Field for bool {
    fn put(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    fn get(input: &mut &[u8]) -> Option<Self> {
        match u8::get(input)? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}

impl Field for LayerIndex {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "layer indices are below MAX_LAYERS"
    )]
    fn put(self, out: &mut Vec<u8>) {
        out.push(self.get() as u8);
    }

    fn get(input: &mut &[u8]) -> Option<Self> {
        Self::new(u32::from(u8::get(input)?))
    }
}

impl Field for Area {
    fn put(self, out: &mut Vec<u8>) {
        for v in [self.x1, self.y1, self.x2, self.y2] {
            v.put(out);
        }
    }

    fn get(input: &mut &[u8]) -> Option<Self> {
        Some(Self::new(
            i32::get(input)?,
            i32::get(input)?,
            i32::get(input)?,
            i32::get(input)?,
        ))
    }
}

impl Field for HostTime {
    fn put(self, out: &mut Vec<u8>) {
        self.ticks().put(out);
    }

    fn get(input: &mut &[u8]) -> Option<Self> {
        u64::get(input).map(Self)
    }
}

impl Field for Duration {
    fn put(self, out: &mut Vec<u8>) {
        self.ticks().put(out);
    }

    fn get(input: &mut &[u8]) -> Option<Self> {
        u64::get(input).map(Self)
    }
}

/// Records flush-path events into a byte buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// An empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The bytes recorded so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Ends the recording.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn put(&mut self, field: impl Field) -> &mut Self {
        field.put(&mut self.buf);
        self
    }
}

impl TraceSink for RecorderSink {
    fn on_display_created(&mut self, e: &DisplayCreatedEvent) {
        self.put(TAG_DISPLAY_CREATED)
            .put(e.layer)
            .put(e.mode)
            .put(e.width)
            .put(e.height)
            .put(e.format)
            .put(e.double_buffered);
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.put(TAG_FLUSH)
            .put(e.layer)
            .put(e.area)
            .put(e.is_last)
            .put(e.path)
            .put(e.timestamp);
    }

    fn on_flush_wait(&mut self, e: &FlushWaitEvent) {
        self.put(TAG_FLUSH_WAIT)
            .put(e.layer)
            .put(e.blocked)
            .put(e.waited)
            .put(e.outcome)
            .put(e.timestamp);
    }

    fn on_reload_observed(&mut self, e: &ReloadObservedEvent) {
        self.put(TAG_RELOAD_OBSERVED)
            .put(e.layer)
            .put(e.reloads_completed)
            .put(e.timestamp);
    }
}

/// One event read back from a recording.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// See [`TraceSink::on_display_created`].
    DisplayCreated(DisplayCreatedEvent),
    /// See [`TraceSink::on_flush`].
    Flush(FlushEvent),
    /// See [`TraceSink::on_flush_wait`].
    FlushWait(FlushWaitEvent),
    /// See [`TraceSink::on_reload_observed`].
    ReloadObserved(ReloadObservedEvent),
}

impl RecordedEvent {
    /// Delivers the event to `sink` as if it had just happened.
    pub fn replay(&self, sink: &mut dyn TraceSink) {
        match self {
            Self::DisplayCreated(e) => sink.on_display_created(e),
            Self::Flush(e) => sink.on_flush(e),
            Self::FlushWait(e) => sink.on_flush_wait(e),
            Self::ReloadObserved(e) => sink.on_reload_observed(e),
        }
    }
}

/// Reads back a recording made by [`RecorderSink`].
///
/// Stops at the first record that is cut short or carries an unknown tag or
/// code.
pub fn decode(bytes: &[u8]) -> Decoder<'_> {
    Decoder { rest: bytes }
}

/// Iterator returned by [`decode`].
#[derive(Debug)]
pub struct Decoder<'a> {
    rest: &'a [u8],
}

impl Decoder<'_> {
    fn get<T: Field>(&mut self) -> Option<T> {
        T::get(&mut self.rest)
    }

    fn record(&mut self, tag: u8) -> Option<RecordedEvent> {
        Some(match tag {
            TAG_DISPLAY_CREATED => RecordedEvent::DisplayCreated(DisplayCreatedEvent {
                layer: self.get()?,
                mode: self.get()?,
                width: self.get()?,
                height: self.get()?,
                format: self.get()?,
                double_buffered: self.get()?,
            }),
            TAG_FLUSH => RecordedEvent::Flush(FlushEvent {
                layer: self.get()?,
                area: self.get()?,
                is_last: self.get()?,
                path: self.get()?,
                timestamp: self.get()?,
            }),
            TAG_FLUSH_WAIT => RecordedEvent::FlushWait(FlushWaitEvent {
                layer: self.get()?,
                blocked: self.get()?,
                waited: self.get()?,
                outcome: self.get()?,
                timestamp: self.get()?,
            }),
            TAG_RELOAD_OBSERVED => RecordedEvent::ReloadObserved(ReloadObservedEvent {
                layer: self.get()?,
                reloads_completed: self.get()?,
                timestamp: self.get()?,
            }),
            _ => return None,
        })
    }
}

impl Iterator for Decoder<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<RecordedEvent> {
        let tag = self.get()?;
        let event = self.record(tag);
        if event.is_none() {
            self.rest = &[];
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session(rec: &mut RecorderSink) {
        rec.on_display_created(&DisplayCreatedEvent {
            layer: LayerIndex::SECOND,
            mode: RenderMode::Partial,
            width: 320,
            height: 240,
            format: ColorFormat::Rgb565,
            double_buffered: false,
        });
        rec.on_flush(&FlushEvent {
            layer: LayerIndex::SECOND,
            area: Area::new(5, 5, 14, 14),
            is_last: true,
            path: FlushPath::Synchronous,
            timestamp: HostTime(1_000),
        });
        rec.on_flush_wait(&FlushWaitEvent {
            layer: LayerIndex::FIRST,
            blocked: true,
            waited: Duration(16_000),
            outcome: WaitOutcome::TimedOut,
            timestamp: HostTime(17_000),
        });
        rec.on_reload_observed(&ReloadObservedEvent {
            layer: LayerIndex::FIRST,
            reloads_completed: 9,
            timestamp: HostTime(18_000),
        });
    }

    #[test]
    fn session_decodes_in_order() {
        let mut rec = RecorderSink::new();
        sample_session(&mut rec);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        match &events[0] {
            RecordedEvent::DisplayCreated(e) => {
                assert_eq!(e.layer, LayerIndex::SECOND);
                assert_eq!(e.mode, RenderMode::Partial);
                assert_eq!((e.width, e.height), (320, 240));
                assert_eq!(e.format, ColorFormat::Rgb565);
                assert!(!e.double_buffered);
            }
            other => panic!("expected DisplayCreated, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::Flush(e) => {
                assert_eq!(e.area, Area::new(5, 5, 14, 14));
                assert_eq!(e.path, FlushPath::Synchronous);
                assert!(e.is_last);
            }
            other => panic!("expected Flush, got {other:?}"),
        }
        match &events[2] {
            RecordedEvent::FlushWait(e) => {
                assert!(e.blocked);
                assert_eq!(e.waited, Duration(16_000));
                assert_eq!(e.outcome, WaitOutcome::TimedOut);
            }
            other => panic!("expected FlushWait, got {other:?}"),
        }
        assert!(matches!(
            events[3],
            RecordedEvent::ReloadObserved(ReloadObservedEvent {
                reloads_completed: 9,
                ..
            })
        ));
    }

    #[test]
    fn truncated_record_ends_iteration() {
        let mut rec = RecorderSink::new();
        sample_session(&mut rec);
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0);
    }

    #[test]
    fn unknown_code_ends_iteration() {
        let mut rec = RecorderSink::new();
        sample_session(&mut rec);
        let mut bytes = rec.into_bytes();
        // Tag, layer, then the render-mode code of the first record.
        bytes[2] = 7;
        assert_eq!(decode(&bytes).count(), 0);
    }
}
