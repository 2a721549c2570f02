// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted host for driver tests.
//!
//! Geometry: a 500-tall container and a 250-tall target at offset 2100. A
//! scroll offset of 2000 shows the whole target; 0 shows none of it.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use kurbo::Rect;

use crate::event::{Direction, EventKind, ScrollEvent, SourceEvent, SourceKind};
use crate::geometry::Sample;
use crate::host::{Host, Notifier, Task};
use crate::time::{Duration, HostTime};

pub(crate) struct MockState {
    scroll_top: Cell<f64>,
    container_height: Cell<f64>,
    target: Cell<Option<Rect>>,
    now: Cell<HostTime>,
    notifier: RefCell<Option<Notifier>>,
    listens: Cell<u32>,
    unlistens: Cell<u32>,
    tasks: RefCell<Vec<(HostTime, Task)>>,
}

impl MockState {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            scroll_top: Cell::new(0.0),
            container_height: Cell::new(500.0),
            target: Cell::new(Some(Rect::new(0.0, 2100.0, 100.0, 2350.0))),
            now: Cell::new(HostTime(0)),
            notifier: RefCell::new(None),
            listens: Cell::new(0),
            unlistens: Cell::new(0),
            tasks: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn host(self: &Rc<Self>) -> MockHost {
        MockHost {
            state: self.clone(),
        }
    }

    pub(crate) fn scroll_to(&self, top: f64) {
        self.scroll_top.set(top);
    }

    /// Moves the container and delivers a scroll notification.
    pub(crate) fn scroll(&self, top: f64) {
        self.scroll_to(top);
        self.fire(SourceKind::Scroll);
    }

    pub(crate) fn fire(&self, kind: SourceKind) {
        let notifier = self.notifier.borrow().clone();
        if let Some(notifier) = notifier {
            notifier(kind);
        }
    }

    pub(crate) fn remove_target(&self) {
        self.target.set(None);
    }

    pub(crate) fn listens(&self) -> u32 {
        self.listens.get()
    }

    pub(crate) fn unlistens(&self) -> u32 {
        self.unlistens.get()
    }

    /// Advances the clock, running due tasks in deadline order.
    pub(crate) fn advance(&self, by: Duration) {
        let end = self.now.get() + by;
        loop {
            let next = {
                let mut tasks = self.tasks.borrow_mut();
                let due = tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, (at, _))| *at <= end)
                    .min_by_key(|(_, (at, _))| *at)
                    .map(|(index, _)| index);
                due.map(|index| tasks.remove(index))
            };
            let Some((at, task)) = next else {
                break;
            };
            self.now.set(at);
            task();
        }
        self.now.set(end);
    }
}

pub(crate) struct MockHost {
    state: Rc<MockState>,
}

impl Host for MockHost {
    type Context = &'static str;

    fn context(&self) -> Self::Context {
        "target"
    }

    fn sample(&self) -> Sample {
        Sample {
            scroll_top: self.state.scroll_top.get(),
            container_height: self.state.container_height.get(),
            target: self.state.target.get(),
        }
    }

    fn now(&self) -> HostTime {
        self.state.now.get()
    }

    fn listen(&mut self, notifier: Notifier) {
        self.state.listens.set(self.state.listens.get() + 1);
        *self.state.notifier.borrow_mut() = Some(notifier);
    }

    fn unlisten(&mut self) {
        self.state.unlistens.set(self.state.unlistens.get() + 1);
        self.state.notifier.borrow_mut().take();
    }

    fn defer(&mut self, delay: Duration, task: Task) {
        let at = self.state.now.get() + delay;
        self.state.tasks.borrow_mut().push((at, task));
    }
}

/// What a logging handler saw, without keeping completion tokens alive.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Seen {
    pub(crate) kind: EventKind,
    pub(crate) direction: Direction,
    pub(crate) visibility: f64,
    pub(crate) source: SourceEvent,
    pub(crate) had_completion: bool,
}

#[derive(Clone, Default)]
pub(crate) struct Log {
    seen: Rc<RefCell<Vec<Seen>>>,
}

impl Log {
    pub(crate) fn handler(&self) -> impl FnMut(&&'static str, &ScrollEvent) + 'static {
        let seen = self.seen.clone();
        move |_: &&'static str, event: &ScrollEvent| {
            seen.borrow_mut().push(Seen {
                kind: event.kind,
                direction: event.direction,
                visibility: event.visibility,
                source: event.source,
                had_completion: event.completion().is_some(),
            });
        }
    }

    pub(crate) fn events(&self) -> Vec<Seen> {
        self.seen.borrow().clone()
    }

    pub(crate) fn kinds(&self) -> Vec<EventKind> {
        self.seen.borrow().iter().map(|s| s.kind).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.seen.borrow().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.seen.borrow().is_empty()
    }

    pub(crate) fn clear(&self) {
        self.seen.borrow_mut().clear();
    }
}
