// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for watches.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`Watch`](crate::watch::Watch) driver calls at each decision point. All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! [`Tracer`] owns an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing and installed sinks are
//! dropped. When **on**, each method performs a single `Option` branch before
//! dispatching.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).

use alloc::boxed::Box;

use crate::event::{Direction, EventKind, SourceEvent};
use crate::time::HostTime;
use crate::tracker::Transition;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What happened to a host notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationOutcome {
    /// The notification was evaluated.
    Admitted,
    /// Dropped inside the current throttle window.
    Throttled,
    /// Dropped because an evaluation was already running.
    Reentrant,
    /// Dropped because the watch is detached.
    Detached,
}

/// Why a dispatch did not happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SuppressReason {
    /// The membership event repeated the last one dispatched.
    Duplicate,
    /// `scrollout` was queued behind an open exit gate.
    ExitDeferred,
    /// A queued `scrollout` was discarded because the target re-entered.
    StaleExit,
}

/// What happened to a delayed handler invocation when its task ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DelayedOutcome {
    /// The handler ran.
    Invoked,
    /// Dropped by the `only_if_still` guard.
    StateChanged,
    /// Dropped because the watch was detached.
    Detached,
}

/// Watch lifecycle milestones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// The watch was created and its host is listening.
    Attached,
    /// The watch was detached.
    Detached,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted for every host notification and synthetic request.
#[derive(Clone, Copy, Debug)]
pub struct NotificationEvent {
    /// The notification.
    pub source: SourceEvent,
    /// Whether it was evaluated.
    pub outcome: NotificationOutcome,
}

/// Emitted after each evaluation of the visibility ratio.
#[derive(Clone, Copy, Debug)]
pub struct VisibilityEvent {
    /// Host time of the evaluation.
    pub time: HostTime,
    /// The new ratio.
    pub ratio: f64,
    /// The previously recorded ratio.
    pub previous: Option<f64>,
    /// Scroll direction.
    pub direction: Direction,
    /// Membership after the evaluation.
    pub member: bool,
    /// Membership change, if any.
    pub transition: Option<Transition>,
}

/// Emitted before handlers for an event kind are invoked.
#[derive(Clone, Copy, Debug)]
pub struct DispatchEvent {
    /// Host time of the dispatch.
    pub time: HostTime,
    /// Which event.
    pub kind: EventKind,
    /// Number of registered handlers.
    pub subscribers: usize,
    /// Ratio carried by the event.
    pub visibility: f64,
    /// Direction carried by the event.
    pub direction: Direction,
}

/// Emitted when an event that would otherwise dispatch is held back.
#[derive(Clone, Copy, Debug)]
pub struct SuppressedEvent {
    /// Host time of the decision.
    pub time: HostTime,
    /// Which event.
    pub kind: EventKind,
    /// Why it was not dispatched.
    pub reason: SuppressReason,
}

/// Emitted when a delayed handler's task runs.
#[derive(Clone, Copy, Debug)]
pub struct DelayedEvent {
    /// Host time when the task ran.
    pub time: HostTime,
    /// Which event the handler was registered for.
    pub kind: EventKind,
    /// What happened.
    pub outcome: DelayedOutcome,
}

/// Emitted on attach and detach.
#[derive(Clone, Copy, Debug)]
pub struct LifecycleEvent {
    /// Host time of the milestone.
    pub time: HostTime,
    /// Which milestone.
    pub lifecycle: Lifecycle,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a watch.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called for every notification, admitted or not.
    fn on_notification(&mut self, e: &NotificationEvent) {
        _ = e;
    }

    /// Called after the ratio is evaluated.
    fn on_visibility(&mut self, e: &VisibilityEvent) {
        _ = e;
    }

    /// Called before handlers run.
    fn on_dispatch(&mut self, e: &DispatchEvent) {
        _ = e;
    }

    /// Called when an event is held back.
    fn on_suppressed(&mut self, e: &SuppressedEvent) {
        _ = e;
    }

    /// Called when a delayed handler task runs.
    fn on_delayed(&mut self, e: &DelayedEvent) {
        _ = e;
    }

    /// Called on attach and detach.
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
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

/// Owner of an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::none()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {}
        }
    }

    /// Returns `true` if events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Emits a [`NotificationEvent`].
    #[inline]
    pub fn notification(&mut self, e: &NotificationEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_notification(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`VisibilityEvent`].
    #[inline]
    pub fn visibility(&mut self, e: &VisibilityEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_visibility(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DispatchEvent`].
    #[inline]
    pub fn dispatch(&mut self, e: &DispatchEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_dispatch(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SuppressedEvent`].
    #[inline]
    pub fn suppressed(&mut self, e: &SuppressedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_suppressed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DelayedEvent`].
    #[inline]
    pub fn delayed(&mut self, e: &DelayedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_delayed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LifecycleEvent`].
    #[inline]
    pub fn lifecycle(&mut self, e: &LifecycleEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_lifecycle(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SourceKind;

    fn notification() -> NotificationEvent {
        NotificationEvent {
            source: SourceEvent {
                kind: SourceKind::Scroll,
                time: HostTime(10),
            },
            outcome: NotificationOutcome::Admitted,
        }
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let mut tracer = Tracer::new(Box::new(NoopSink));
        tracer.notification(&notification());
        tracer.lifecycle(&LifecycleEvent {
            time: HostTime(0),
            lifecycle: Lifecycle::Attached,
        });
    }

    #[test]
    fn none_is_disabled() {
        assert!(!Tracer::none().is_enabled());
        assert!(!Tracer::default().is_enabled());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn events_reach_the_sink() {
        use alloc::rc::Rc;
        use core::cell::Cell;

        struct Counting(Rc<Cell<u32>>);

        impl TraceSink for Counting {
            fn on_notification(&mut self, _: &NotificationEvent) {
                self.0.set(self.0.get() + 1);
            }
        }

        let count = Rc::new(Cell::new(0));
        let mut tracer = Tracer::new(Box::new(Counting(count.clone())));
        assert!(tracer.is_enabled());
        tracer.notification(&notification());
        tracer.notification(&notification());
        tracer.suppressed(&SuppressedEvent {
            time: HostTime(0),
            kind: EventKind::ScrollIn,
            reason: SuppressReason::Duplicate,
        });
        assert_eq!(count.get(), 2);
    }
}
