// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handler registration.
//!
//! Each event kind has an ordered list of subscribers. Dispatch iterates a
//! snapshot of the list, so a handler that subscribes or detaches while
//! running never invalidates the iteration.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::event::{EventKind, ScrollEvent};
use crate::time::Duration;

/// Per-subscription options.
///
/// `C` is the host's handler context type; see
/// [`Host::Context`](crate::host::Host::Context).
#[derive(Clone, PartialEq)]
pub struct SubscribeOptions<C> {
    /// Run the handler this long after the dispatch instead of synchronously.
    pub delay: Option<Duration>,
    /// For delayed handlers, drop the invocation if the target's membership
    /// changed between dispatch and run.
    pub only_if_still: bool,
    /// For `scrollin` handlers, hold the next `scrollout` until this
    /// handler's [`Completion`](crate::completion::Completion) resolves.
    pub defer_exit: bool,
    /// Context passed to the handler. Defaults to the watch's target.
    pub context: Option<C>,
}

impl<C> SubscribeOptions<C> {
    /// Synchronous handler with the default context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delay: None,
            only_if_still: false,
            defer_exit: false,
            context: None,
        }
    }

    /// Delays the handler.
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Drops a delayed invocation if membership changed meanwhile.
    #[must_use]
    pub fn only_if_still(mut self, only_if_still: bool) -> Self {
        self.only_if_still = only_if_still;
        self
    }

    /// Holds the next `scrollout` until this handler completes.
    #[must_use]
    pub fn defer_exit(mut self, defer_exit: bool) -> Self {
        self.defer_exit = defer_exit;
        self
    }

    /// Overrides the handler context.
    #[must_use]
    pub fn context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }
}

impl<C> Default for SubscribeOptions<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: fmt::Debug> fmt::Debug for SubscribeOptions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeOptions")
            .field("delay", &self.delay)
            .field("only_if_still", &self.only_if_still)
            .field("defer_exit", &self.defer_exit)
            .field("context", &self.context)
            .finish()
    }
}

/// A boxed event handler.
pub type Handler<C> = Box<dyn FnMut(&C, &ScrollEvent)>;

pub(crate) struct Subscriber<C> {
    handler: RefCell<Handler<C>>,
    pub(crate) context: C,
    pub(crate) delay: Option<Duration>,
    pub(crate) only_if_still: bool,
    pub(crate) defer_exit: bool,
}

impl<C> Subscriber<C> {
    pub(crate) fn new(handler: Handler<C>, context: C, options: SubscribeOptions<C>) -> Self {
        Self {
            handler: RefCell::new(handler),
            context,
            delay: options.delay,
            only_if_still: options.only_if_still,
            defer_exit: options.defer_exit,
        }
    }

    /// Calls the handler. A handler already on the stack (re-entered through
    /// a nested dispatch) is skipped.
    pub(crate) fn invoke(&self, event: &ScrollEvent) -> bool {
        let Ok(mut handler) = self.handler.try_borrow_mut() else {
            return false;
        };
        (*handler)(&self.context, event);
        true
    }
}

pub(crate) struct Callbacks<C> {
    lists: [Vec<Rc<Subscriber<C>>>; 3],
}

impl<C> Callbacks<C> {
    pub(crate) fn add(&mut self, kind: EventKind, subscriber: Subscriber<C>) {
        self.lists[kind.index()].push(Rc::new(subscriber));
    }

    /// Clones the current list for `kind`, in insertion order.
    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<Rc<Subscriber<C>>> {
        self.lists[kind.index()].clone()
    }

    pub(crate) fn len(&self, kind: EventKind) -> usize {
        self.lists[kind.index()].len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.lists.iter().all(Vec::is_empty)
    }
}

impl<C> Default for Callbacks<C> {
    fn default() -> Self {
        Self {
            lists: [Vec::new(), Vec::new(), Vec::new()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Direction, SourceEvent, SourceKind};
    use crate::time::HostTime;
    use core::cell::Cell;

    fn event(kind: EventKind) -> ScrollEvent {
        ScrollEvent {
            kind,
            direction: Direction::Unknown,
            visibility: 1.0,
            source: SourceEvent {
                kind: SourceKind::Synthetic,
                time: HostTime(0),
            },
            completion: None,
        }
    }

    #[test]
    fn options_builder() {
        let options = SubscribeOptions::new()
            .delay(Duration::from_millis(50))
            .only_if_still(true)
            .defer_exit(true)
            .context("ctx");
        assert_eq!(options.delay, Some(Duration::from_millis(50)));
        assert!(options.only_if_still);
        assert!(options.defer_exit);
        assert_eq!(options.context, Some("ctx"));
    }

    #[test]
    fn lists_are_per_kind_and_ordered() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut callbacks = Callbacks::<()>::default();
        for tag in 0..3_u8 {
            let order = order.clone();
            callbacks.add(
                EventKind::Scroll,
                Subscriber::new(
                    Box::new(move |_: &(), _: &ScrollEvent| order.borrow_mut().push(tag)),
                    (),
                    SubscribeOptions::new(),
                ),
            );
        }
        assert_eq!(callbacks.len(EventKind::Scroll), 3);
        assert_eq!(callbacks.len(EventKind::ScrollIn), 0);

        let e = event(EventKind::Scroll);
        for subscriber in callbacks.snapshot(EventKind::Scroll) {
            subscriber.invoke(&e);
        }
        assert_eq!(*order.borrow(), [0, 1, 2]);
    }

    #[test]
    fn handler_receives_its_context() {
        let seen = Rc::new(Cell::new(0_u32));
        let seen_in = seen.clone();
        let subscriber = Subscriber::new(
            Box::new(move |ctx: &u32, _: &ScrollEvent| seen_in.set(*ctx)),
            7,
            SubscribeOptions::new(),
        );
        assert!(subscriber.invoke(&event(EventKind::ScrollIn)));
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn default_is_empty() {
        assert!(Callbacks::<()>::default().is_empty());
    }
}
