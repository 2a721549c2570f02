// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! A watch owns its sink, so recording goes through a shared [`Recording`]
//! buffer: hand [`Recording::sink`] to the watch and read the bytes back
//! from the `Recording`. [`RecorderSink`] encodes events as little-endian
//! records; [`decode`] reads them back as an iterator of [`RecordedEvent`].

use std::cell::RefCell;
use std::rc::Rc;

use scrollwatch_core::event::{Direction, EventKind, SourceEvent, SourceKind};
use scrollwatch_core::time::HostTime;
use scrollwatch_core::trace::{
    DelayedEvent, DelayedOutcome, DispatchEvent, Lifecycle, LifecycleEvent, NotificationEvent,
    NotificationOutcome, SuppressReason, SuppressedEvent, TraceSink, VisibilityEvent,
};
use scrollwatch_core::tracker::Transition;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_NOTIFICATION: u8 = 1;
const TAG_VISIBILITY: u8 = 2;
const TAG_DISPATCH: u8 = 3;
const TAG_SUPPRESSED: u8 = 4;
const TAG_DELAYED: u8 = 5;
const TAG_LIFECYCLE: u8 = 6;

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

/// A shared recording buffer.
///
/// Clones share the same bytes.
#[derive(Clone, Debug, Default)]
pub struct Recording {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl Recording {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a sink that appends to this recording.
    #[must_use]
    pub fn sink(&self) -> RecorderSink {
        RecorderSink {
            buf: self.buf.clone(),
        }
    }

    /// Copies out the recorded bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buf.borrow().clone()
    }

    /// Decodes everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        decode(&self.buf.borrow()).collect()
    }

    /// Discards everything recorded so far.
    pub fn clear(&self) {
        self.buf.borrow_mut().clear();
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a [`Recording`].
#[derive(Debug)]
pub struct RecorderSink {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl RecorderSink {
    fn write_u8(&mut self, v: u8) {
        self.buf.borrow_mut().push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.borrow_mut().extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.borrow_mut().extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_option_f64(&mut self, v: Option<f64>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_f64(val);
            }
            None => {
                self.write_u8(0);
                self.write_f64(0.0);
            }
        }
    }

    fn write_time(&mut self, t: HostTime) {
        self.write_u64(t.micros());
    }

    fn write_kind(&mut self, kind: EventKind) {
        self.write_u8(match kind {
            EventKind::ScrollIn => 0,
            EventKind::ScrollOut => 1,
            EventKind::Scroll => 2,
        });
    }

    fn write_direction(&mut self, direction: Direction) {
        self.write_u8(match direction {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Unknown => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_notification(&mut self, e: &NotificationEvent) {
        self.write_u8(TAG_NOTIFICATION);
        self.write_u8(match e.source.kind {
            SourceKind::Scroll => 0,
            SourceKind::Resize => 1,
            SourceKind::Synthetic => 2,
        });
        self.write_time(e.source.time);
        self.write_u8(match e.outcome {
            NotificationOutcome::Admitted => 0,
            NotificationOutcome::Throttled => 1,
            NotificationOutcome::Reentrant => 2,
            NotificationOutcome::Detached => 3,
        });
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        self.write_u8(TAG_VISIBILITY);
        self.write_time(e.time);
        self.write_f64(e.ratio);
        self.write_option_f64(e.previous);
        self.write_direction(e.direction);
        self.write_u8(u8::from(e.member));
        self.write_u8(match e.transition {
            None => 0,
            Some(Transition::Enter) => 1,
            Some(Transition::Exit) => 2,
            Some(Transition::ExitDeferred) => 3,
        });
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.write_u8(TAG_DISPATCH);
        self.write_time(e.time);
        self.write_kind(e.kind);
        self.write_u32(u32::try_from(e.subscribers).unwrap_or(u32::MAX));
        self.write_f64(e.visibility);
        self.write_direction(e.direction);
    }

    fn on_suppressed(&mut self, e: &SuppressedEvent) {
        self.write_u8(TAG_SUPPRESSED);
        self.write_time(e.time);
        self.write_kind(e.kind);
        self.write_u8(match e.reason {
            SuppressReason::Duplicate => 0,
            SuppressReason::ExitDeferred => 1,
            SuppressReason::StaleExit => 2,
        });
    }

    fn on_delayed(&mut self, e: &DelayedEvent) {
        self.write_u8(TAG_DELAYED);
        self.write_time(e.time);
        self.write_kind(e.kind);
        self.write_u8(match e.outcome {
            DelayedOutcome::Invoked => 0,
            DelayedOutcome::StateChanged => 1,
            DelayedOutcome::Detached => 2,
        });
    }

    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        self.write_u8(TAG_LIFECYCLE);
        self.write_time(e.time);
        self.write_u8(match e.lifecycle {
            Lifecycle::Attached => 0,
            Lifecycle::Detached => 1,
        });
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`NotificationEvent`].
    Notification(NotificationEvent),
    /// A [`VisibilityEvent`].
    Visibility(VisibilityEvent),
    /// A [`DispatchEvent`].
    Dispatch(DispatchEvent),
    /// A [`SuppressedEvent`].
    Suppressed(SuppressedEvent),
    /// A [`DelayedEvent`].
    Delayed(DelayedEvent),
    /// A [`LifecycleEvent`].
    Lifecycle(LifecycleEvent),
}

impl RecordedEvent {
    /// Host time the event refers to.
    #[must_use]
    pub fn time(&self) -> HostTime {
        match self {
            Self::Notification(e) => e.source.time,
            Self::Visibility(e) => e.time,
            Self::Dispatch(e) => e.time,
            Self::Suppressed(e) => e.time,
            Self::Delayed(e) => e.time,
            Self::Lifecycle(e) => e.time,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
///
/// Stops at the first unknown tag or truncated record.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_option_f64(&mut self) -> Option<Option<f64>> {
        let present = self.read_u8()?;
        let val = self.read_f64()?;
        Some(if present != 0 { Some(val) } else { None })
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_kind(&mut self) -> Option<EventKind> {
        Some(match self.read_u8()? {
            0 => EventKind::ScrollIn,
            1 => EventKind::ScrollOut,
            _ => EventKind::Scroll,
        })
    }

    fn read_direction(&mut self) -> Option<Direction> {
        Some(match self.read_u8()? {
            0 => Direction::Up,
            1 => Direction::Down,
            _ => Direction::Unknown,
        })
    }

    fn decode_notification(&mut self) -> Option<RecordedEvent> {
        let kind = match self.read_u8()? {
            0 => SourceKind::Scroll,
            1 => SourceKind::Resize,
            _ => SourceKind::Synthetic,
        };
        let time = self.read_time()?;
        let outcome = match self.read_u8()? {
            0 => NotificationOutcome::Admitted,
            1 => NotificationOutcome::Throttled,
            2 => NotificationOutcome::Reentrant,
            _ => NotificationOutcome::Detached,
        };
        Some(RecordedEvent::Notification(NotificationEvent {
            source: SourceEvent { kind, time },
            outcome,
        }))
    }

    fn decode_visibility(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Visibility(VisibilityEvent {
            time: self.read_time()?,
            ratio: self.read_f64()?,
            previous: self.read_option_f64()?,
            direction: self.read_direction()?,
            member: self.read_u8()? != 0,
            transition: match self.read_u8()? {
                0 => None,
                1 => Some(Transition::Enter),
                2 => Some(Transition::Exit),
                _ => Some(Transition::ExitDeferred),
            },
        }))
    }

    fn decode_dispatch(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Dispatch(DispatchEvent {
            time: self.read_time()?,
            kind: self.read_kind()?,
            subscribers: usize::try_from(self.read_u32()?).ok()?,
            visibility: self.read_f64()?,
            direction: self.read_direction()?,
        }))
    }

    fn decode_suppressed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Suppressed(SuppressedEvent {
            time: self.read_time()?,
            kind: self.read_kind()?,
            reason: match self.read_u8()? {
                0 => SuppressReason::Duplicate,
                1 => SuppressReason::ExitDeferred,
                _ => SuppressReason::StaleExit,
            },
        }))
    }

    fn decode_delayed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Delayed(DelayedEvent {
            time: self.read_time()?,
            kind: self.read_kind()?,
            outcome: match self.read_u8()? {
                0 => DelayedOutcome::Invoked,
                1 => DelayedOutcome::StateChanged,
                _ => DelayedOutcome::Detached,
            },
        }))
    }

    fn decode_lifecycle(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Lifecycle(LifecycleEvent {
            time: self.read_time()?,
            lifecycle: match self.read_u8()? {
                0 => Lifecycle::Attached,
                _ => Lifecycle::Detached,
            },
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_NOTIFICATION => self.decode_notification(),
            TAG_VISIBILITY => self.decode_visibility(),
            TAG_DISPATCH => self.decode_dispatch(),
            TAG_SUPPRESSED => self.decode_suppressed(),
            TAG_DELAYED => self.decode_delayed(),
            TAG_LIFECYCLE => self.decode_lifecycle(),
            _ => None,
        }
    }
}
