// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for platform integrations.
//!
//! The core never touches a document, a window, or a timer. A backend crate
//! implements [`Host`] for one target element and supplies the following:
//!
//! - **Geometry**: a [`Sample`] of the container's scroll offset and height
//!   plus the target's bounds in container content coordinates.
//!
//! - **Time**: a monotonic [`HostTime`] for throttle windows and trace
//!   timestamps.
//!
//! - **Notifications**: the backend calls the [`Notifier`] handed to
//!   [`listen`](Host::listen) for every scroll (and, for viewport watches,
//!   resize) notification, and stops on [`unlisten`](Host::unlisten).
//!
//! - **Deferred tasks**: [`defer`](Host::defer) runs a task once after a
//!   delay, on the same thread, outside any dispatch in progress.
//!
//! # Crate boundaries
//!
//! `scrollwatch_core` owns the visibility math, the state machine, and the
//! dispatch rules. Backend crates depend on `scrollwatch_core` and provide
//! the platform glue. Application code usually goes through a backend's
//! `attach` function rather than implementing `Host` itself; tests implement
//! it with a scripted mock.

use alloc::boxed::Box;
use alloc::rc::Rc;

use crate::event::SourceKind;
use crate::geometry::Sample;
use crate::time::{Duration, HostTime};

/// Callback a host invokes for every raw notification.
pub type Notifier = Rc<dyn Fn(SourceKind)>;

/// A task scheduled with [`Host::defer`].
pub type Task = Box<dyn FnOnce()>;

/// Platform glue for a single watched target.
///
/// # Wiring pseudocode
///
/// ```rust,ignore
/// let host = DomHost::new(target, container)?;
/// let watch = Watch::new(host, WatchConfig::new());
/// // Watch::new calls host.listen(notifier). From now on:
/// //   scroll event  -> notifier(SourceKind::Scroll)
/// //   notifier      -> throttle -> host.sample() -> tracker -> handlers
/// watch.on(EventKind::ScrollIn, |target, event| reveal(target, event));
/// // ...
/// watch.detach(); // host.unlisten()
/// ```
pub trait Host: 'static {
    /// Value passed to handlers that did not register their own context.
    /// Typically a handle to the target element.
    type Context: Clone + 'static;

    /// Returns the default handler context.
    fn context(&self) -> Self::Context;

    /// Reads the current geometry.
    fn sample(&self) -> Sample;

    /// Reads the monotonic clock.
    fn now(&self) -> HostTime;

    /// Starts forwarding notifications to `notifier`.
    ///
    /// Called once, when the watch is created. The notifier owns the watch:
    /// a host that holds it until [`unlisten`](Self::unlisten) keeps the
    /// watch running after the caller drops every handle.
    fn listen(&mut self, notifier: Notifier);

    /// Stops forwarding notifications and releases the notifier.
    ///
    /// Called at most once: on detach, or when the watch is dropped by a host
    /// that did not retain its notifier.
    fn unlisten(&mut self);

    /// Runs `task` once after `delay`.
    ///
    /// The task must not run synchronously inside this call.
    fn defer(&mut self, delay: Duration, task: Task);
}
