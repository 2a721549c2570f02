// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entry completion tokens for deferred exits.
//!
//! When a `scrollin` handler is registered with
//! [`defer_exit`](crate::callbacks::SubscribeOptions::defer_exit), each entry
//! dispatch hands it a [`Completion`]. The watch holds back the next
//! `scrollout` until every completion of that membership cycle has resolved.
//!
//! A completion resolves on [`resolve`](Completion::resolve) or when its last
//! clone is dropped. A handler that ignores its token therefore resolves on
//! return, a delayed handler resolves once its task has run (or been
//! dropped), and a handler driving an animation keeps a clone until the
//! animation ends.

use alloc::rc::{Rc, Weak};
use core::cell::Cell;
use core::fmt;

/// Receives resolutions for the cycle a completion belongs to.
pub(crate) trait EntryGate {
    fn entry_completed(self: Rc<Self>, cycle: u64);
}

/// A shared token signalling that an entry-side handler has finished.
#[derive(Clone)]
pub struct Completion {
    inner: Rc<CompletionInner>,
}

struct CompletionInner {
    gate: Weak<dyn EntryGate>,
    cycle: u64,
    resolved: Cell<bool>,
}

impl Completion {
    pub(crate) fn new(gate: Weak<dyn EntryGate>, cycle: u64) -> Self {
        Self {
            inner: Rc::new(CompletionInner {
                gate,
                cycle,
                resolved: Cell::new(false),
            }),
        }
    }

    /// Marks the entry as complete.
    ///
    /// Resolving more than once, from any clone, has no further effect.
    pub fn resolve(&self) {
        self.inner.resolve();
    }

    /// Returns `true` once any clone has been resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.inner.resolved.get()
    }
}

impl CompletionInner {
    fn resolve(&self) {
        if self.resolved.replace(true) {
            return;
        }
        if let Some(gate) = self.gate.upgrade() {
            gate.entry_completed(self.cycle);
        }
    }
}

impl Drop for CompletionInner {
    fn drop(&mut self) {
        self.resolve();
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("cycle", &self.inner.cycle)
            .field("resolved", &self.inner.resolved.get())
            .finish_non_exhaustive()
    }
}
