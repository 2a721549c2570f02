// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The watch driver.
//!
//! A [`Watch`] binds one [`Host`] to a [`VisibilityTracker`] and a set of
//! subscribers. Every admitted notification runs the same pipeline:
//!
//! ```text
//!   notify(kind) ──► detached? ──► running? ──► throttle ──► host.sample()
//!                                                                  │
//!            ┌─────────────────────────────────────────────────────┘
//!            ▼
//!   tracker.evaluate() ──► scrollin / scrollout ──► scroll ──► replay exits
//! ```
//!
//! Handlers run synchronously on the notifying call stack unless they were
//! registered with a delay, in which case the host schedules them.
//!
//! # Re-entrancy
//!
//! While a notification is being processed, further notifications (including
//! the synthetic evaluation triggered by subscribing from inside a handler)
//! are dropped, not queued. A handler may detach the watch; dispatch stops
//! before the next handler.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::callbacks::{Callbacks, SubscribeOptions, Subscriber};
use crate::completion::{Completion, EntryGate};
use crate::config::WatchConfig;
use crate::event::{Direction, EventKind, ScrollEvent, SourceEvent, SourceKind};
use crate::host::{Host, Notifier, Task};
use crate::throttle::Throttle;
use crate::time::{Duration, HostTime};
use crate::trace::{
    DelayedEvent, DelayedOutcome, DispatchEvent, Lifecycle, LifecycleEvent, NotificationEvent,
    NotificationOutcome, SuppressReason, SuppressedEvent, TraceSink, Tracer, VisibilityEvent,
};
use crate::tracker::{GateStatus, Transition, VisibilityTracker};

/// A handle to a watched target.
///
/// Handles are cheap to clone and all clones refer to the same watch. The
/// host's listener owns the watch too, so it keeps tracking after every
/// handle is gone; only [`detach`](Self::detach) ends it.
pub struct Watch<H: Host> {
    inner: Rc<WatchInner<H>>,
}

/// A non-owning reference to a [`Watch`].
pub struct WeakWatch<H: Host> {
    inner: Weak<WatchInner<H>>,
}

struct WatchInner<H: Host> {
    host: RefCell<H>,
    tracker: RefCell<VisibilityTracker>,
    callbacks: RefCell<Callbacks<H::Context>>,
    throttle: Cell<Throttle>,
    last_source: Cell<SourceEvent>,
    running: Cell<bool>,
    detached: Cell<bool>,
    replay_exit: Cell<bool>,
    tracer: RefCell<Tracer>,
}

/// Clears the running flag when a pass ends, including by unwinding.
struct RunningGuard<'a>(&'a Cell<bool>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<H: Host> Watch<H> {
    /// Creates a watch and starts listening on `host`.
    ///
    /// No evaluation happens until a handler is registered or the host
    /// delivers a notification.
    #[must_use]
    pub fn new(host: H, config: WatchConfig) -> Self {
        Self::with_tracer(host, config, Tracer::none())
    }

    /// Like [`new`](Self::new), reporting to `sink` from the start.
    #[must_use]
    pub fn with_trace_sink(host: H, config: WatchConfig, sink: Box<dyn TraceSink>) -> Self {
        Self::with_tracer(host, config, Tracer::new(sink))
    }

    fn with_tracer(host: H, config: WatchConfig, tracer: Tracer) -> Self {
        let now = host.now();
        let inner = Rc::new(WatchInner {
            host: RefCell::new(host),
            tracker: RefCell::new(VisibilityTracker::new(&config)),
            callbacks: RefCell::new(Callbacks::default()),
            throttle: Cell::new(Throttle::new(config.notification_mode)),
            last_source: Cell::new(SourceEvent {
                kind: SourceKind::Synthetic,
                time: now,
            }),
            running: Cell::new(false),
            detached: Cell::new(false),
            replay_exit: Cell::new(false),
            tracer: RefCell::new(tracer),
        });

        // Owned by the host until `unlisten`, which breaks the cycle.
        let listener = Rc::clone(&inner);
        let notifier: Notifier = Rc::new(move |kind| {
            let inner = Rc::clone(&listener);
            inner.notify(kind);
        });
        inner.host.borrow_mut().listen(notifier);
        inner.tracer.borrow_mut().lifecycle(&LifecycleEvent {
            time: now,
            lifecycle: Lifecycle::Attached,
        });

        Self { inner }
    }

    /// Registers `handler` for `kind` with default options.
    ///
    /// See [`on_with`](Self::on_with).
    pub fn on<F>(&self, kind: EventKind, handler: F) -> &Self
    where
        F: FnMut(&H::Context, &ScrollEvent) + 'static,
    {
        self.on_with(kind, SubscribeOptions::new(), handler)
    }

    /// Registers `handler` for `kind`.
    ///
    /// The handler receives the context from `options`, or the host's default
    /// context (the target). Registering runs one forced evaluation so the
    /// new handler observes the current state without waiting for a scroll.
    /// After [`detach`](Self::detach) this does nothing.
    pub fn on_with<F>(
        &self,
        kind: EventKind,
        mut options: SubscribeOptions<H::Context>,
        handler: F,
    ) -> &Self
    where
        F: FnMut(&H::Context, &ScrollEvent) + 'static,
    {
        let inner = &self.inner;
        if inner.detached.get() {
            return self;
        }
        let context = options
            .context
            .take()
            .unwrap_or_else(|| inner.host.borrow().context());
        inner
            .callbacks
            .borrow_mut()
            .add(kind, Subscriber::new(Box::new(handler), context, options));
        inner.notify(SourceKind::Synthetic);
        self
    }

    /// Stops the watch.
    ///
    /// Blocks every later notification, synthetic evaluation, delayed
    /// handler and queued exit, then removes the host listeners and drops all
    /// subscriptions. Calling it again has no effect.
    pub fn detach(&self) {
        let inner = &self.inner;
        if inner.detached.replace(true) {
            return;
        }
        inner.host.borrow_mut().unlisten();
        let callbacks = core::mem::take(&mut *inner.callbacks.borrow_mut());
        drop(callbacks);
        let time = inner.now();
        inner.tracer.borrow_mut().lifecycle(&LifecycleEvent {
            time,
            lifecycle: Lifecycle::Detached,
        });
    }

    /// Returns `true` once [`detach`](Self::detach) has been called.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.inner.detached.get()
    }

    /// Computes the current visibility ratio from fresh geometry.
    ///
    /// Reads the host only; no state changes and no events.
    #[must_use]
    pub fn visibility(&self) -> f64 {
        self.inner.host.borrow().sample().visibility()
    }

    /// Direction derived by the last evaluation.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.inner.tracker.borrow().direction()
    }

    /// Returns `true` while the target is considered in the viewport.
    #[must_use]
    pub fn is_member(&self) -> bool {
        self.inner.tracker.borrow().is_member()
    }

    /// The ratio recorded by the last evaluation, if any.
    #[must_use]
    pub fn ratio(&self) -> Option<f64> {
        self.inner.tracker.borrow().ratio()
    }

    /// Number of handlers registered for `kind`. Zero after detach.
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.inner.callbacks.borrow().len(kind)
    }

    /// Delivers a notification, as a host does for scroll and resize.
    ///
    /// [`SourceKind::Synthetic`] behaves like [`refresh`](Self::refresh).
    pub fn notify(&self, kind: SourceKind) {
        self.inner.notify(kind);
    }

    /// Runs a forced evaluation against the current geometry, bypassing the
    /// throttle.
    pub fn refresh(&self) {
        self.inner.notify(SourceKind::Synthetic);
    }

    /// Replaces the trace sink.
    ///
    /// Without the `trace` feature the sink is dropped.
    pub fn set_trace_sink(&self, sink: Box<dyn TraceSink>) {
        *self.inner.tracer.borrow_mut() = Tracer::new(sink);
    }

    /// Gives access to the host.
    ///
    /// `f` must not call back into this watch.
    pub fn with_host<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        f(&self.inner.host.borrow())
    }

    /// Creates a non-owning reference.
    #[must_use]
    pub fn downgrade(&self) -> WeakWatch<H> {
        WeakWatch {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Returns `true` if both handles refer to the same watch.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<H: Host> WeakWatch<H> {
    /// Returns a handle if the watch is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Watch<H>> {
        self.inner.upgrade().map(|inner| Watch { inner })
    }
}

impl<H: Host> WatchInner<H> {
    fn now(&self) -> HostTime {
        self.host.borrow().now()
    }

    fn notify(self: &Rc<Self>, kind: SourceKind) {
        let source = SourceEvent {
            kind,
            time: self.now(),
        };
        let outcome = if self.detached.get() {
            NotificationOutcome::Detached
        } else if self.running.get() {
            NotificationOutcome::Reentrant
        } else if kind == SourceKind::Synthetic {
            NotificationOutcome::Admitted
        } else {
            let mut throttle = self.throttle.get();
            let admitted = throttle.admit(source.time);
            self.throttle.set(throttle);
            if admitted {
                NotificationOutcome::Admitted
            } else {
                NotificationOutcome::Throttled
            }
        };
        self.tracer
            .borrow_mut()
            .notification(&NotificationEvent { source, outcome });

        if outcome == NotificationOutcome::Admitted {
            self.exclusive(|inner| inner.evaluate(source, kind == SourceKind::Synthetic));
        }
    }

    /// Runs `body` with the re-entrancy guard held, then dispatches any exit
    /// released during it.
    fn exclusive(self: &Rc<Self>, body: impl FnOnce(&Rc<Self>)) {
        self.running.set(true);
        let _guard = RunningGuard(&self.running);
        body(self);
        while self.replay_exit.take() {
            if self.detached.get() {
                break;
            }
            self.replay_exit();
        }
    }

    fn evaluate(self: &Rc<Self>, source: SourceEvent, force: bool) {
        self.last_source.set(source);
        let sample = self.host.borrow().sample();
        let ratio = sample.visibility();
        let (evaluation, member) = {
            let mut tracker = self.tracker.borrow_mut();
            let evaluation = tracker.evaluate(ratio, sample.scroll_top, force);
            (evaluation, tracker.is_member())
        };
        self.tracer.borrow_mut().visibility(&VisibilityEvent {
            time: source.time,
            ratio,
            previous: evaluation.previous,
            direction: evaluation.direction,
            member,
            transition: evaluation.transition,
        });

        match evaluation.transition {
            Some(Transition::Enter) => {
                self.trigger(EventKind::ScrollIn, ratio, evaluation.direction, source);
            }
            Some(Transition::Exit) => {
                self.trigger(EventKind::ScrollOut, ratio, evaluation.direction, source);
            }
            Some(Transition::ExitDeferred) => {
                self.suppressed(EventKind::ScrollOut, SuppressReason::ExitDeferred, source.time);
            }
            None => {}
        }
        if evaluation.scroll {
            self.trigger(EventKind::Scroll, ratio, evaluation.direction, source);
        }
    }

    fn replay_exit(self: &Rc<Self>) {
        let (member, ratio, direction) = {
            let tracker = self.tracker.borrow();
            (
                tracker.is_member(),
                tracker.ratio().unwrap_or(0.0),
                tracker.direction(),
            )
        };
        let source = self.last_source.get();
        if member {
            self.suppressed(EventKind::ScrollOut, SuppressReason::StaleExit, source.time);
            return;
        }
        self.trigger(EventKind::ScrollOut, ratio, direction, source);
    }

    fn trigger(
        self: &Rc<Self>,
        kind: EventKind,
        visibility: f64,
        direction: Direction,
        source: SourceEvent,
    ) {
        if self.detached.get() {
            return;
        }
        if !self.tracker.borrow_mut().admit(kind) {
            self.suppressed(kind, SuppressReason::Duplicate, source.time);
            return;
        }

        let subscribers = self.callbacks.borrow().snapshot(kind);
        self.tracer.borrow_mut().dispatch(&DispatchEvent {
            time: source.time,
            kind,
            subscribers: subscribers.len(),
            visibility,
            direction,
        });

        let cycle = if kind == EventKind::ScrollIn {
            let outstanding = subscribers.iter().filter(|s| s.defer_exit).count();
            let outstanding = u32::try_from(outstanding).unwrap_or(u32::MAX);
            self.tracker.borrow_mut().open_gate(outstanding)
        } else {
            None
        };
        let member = self.tracker.borrow().is_member();
        let gate: Weak<Self> = Rc::downgrade(self);
        let gate: Weak<dyn EntryGate> = gate;

        for subscriber in subscribers {
            if self.detached.get() {
                break;
            }
            let mut event = ScrollEvent {
                kind,
                direction,
                visibility,
                source,
                completion: None,
            };
            if let Some(cycle) = cycle
                && subscriber.defer_exit
            {
                event.completion = Some(Completion::new(gate.clone(), cycle));
            }
            let delay = subscriber.delay;
            match delay {
                Some(delay) => self.schedule(subscriber, event, delay, member),
                None => {
                    subscriber.invoke(&event);
                }
            }
        }
    }

    fn schedule(
        self: &Rc<Self>,
        subscriber: Rc<Subscriber<H::Context>>,
        event: ScrollEvent,
        delay: Duration,
        member_at_dispatch: bool,
    ) {
        let weak = Rc::downgrade(self);
        let task: Task = Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.run_delayed(&subscriber, &event, member_at_dispatch);
            }
        });
        self.host.borrow_mut().defer(delay, task);
    }

    fn run_delayed(
        &self,
        subscriber: &Subscriber<H::Context>,
        event: &ScrollEvent,
        member_at_dispatch: bool,
    ) {
        let outcome = if self.detached.get() {
            DelayedOutcome::Detached
        } else if subscriber.only_if_still
            && self.tracker.borrow().is_member() != member_at_dispatch
        {
            DelayedOutcome::StateChanged
        } else {
            DelayedOutcome::Invoked
        };
        let time = self.now();
        self.tracer.borrow_mut().delayed(&DelayedEvent {
            time,
            kind: event.kind,
            outcome,
        });
        if outcome == DelayedOutcome::Invoked {
            subscriber.invoke(event);
        }
    }

    fn suppressed(&self, kind: EventKind, reason: SuppressReason, time: HostTime) {
        self.tracer
            .borrow_mut()
            .suppressed(&SuppressedEvent { time, kind, reason });
    }
}

impl<H: Host> EntryGate for WatchInner<H> {
    fn entry_completed(self: Rc<Self>, cycle: u64) {
        if self.detached.get() {
            return;
        }
        let status = self.tracker.borrow_mut().complete_entry(cycle);
        match status {
            GateStatus::ReleaseExit if self.running.get() => self.replay_exit.set(true),
            GateStatus::ReleaseExit => self.exclusive(|inner| inner.replay_exit()),
            GateStatus::DiscardExit => {
                let time = self.now();
                self.suppressed(EventKind::ScrollOut, SuppressReason::StaleExit, time);
            }
            GateStatus::Open | GateStatus::Closed => {}
        }
    }
}

impl<H: Host> Drop for WatchInner<H> {
    fn drop(&mut self) {
        if !self.detached.get() {
            self.host.get_mut().unlisten();
        }
    }
}

impl<H: Host> Clone for Watch<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: Host> Clone for WeakWatch<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: Host> fmt::Debug for Watch<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tracker = self.inner.tracker.try_borrow();
        let mut s = f.debug_struct("Watch");
        s.field("detached", &self.inner.detached.get());
        if let Ok(tracker) = tracker {
            s.field("member", &tracker.is_member())
                .field("ratio", &tracker.ratio())
                .field("direction", &tracker.direction());
        }
        s.finish_non_exhaustive()
    }
}

impl<H: Host> fmt::Debug for WeakWatch<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakWatch")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
