// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event kinds and the payload delivered to handlers.

use core::fmt;

use crate::completion::Completion;
use crate::time::HostTime;

/// The lifecycle events a watch dispatches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The target became fully visible (`scrollin`).
    ScrollIn,
    /// The target left the visible window entirely (`scrollout`).
    ScrollOut,
    /// The visibility ratio changed (`scroll`).
    Scroll,
}

impl EventKind {
    /// All kinds, in registry order.
    pub const ALL: [Self; 3] = [Self::ScrollIn, Self::ScrollOut, Self::Scroll];

    /// The conventional DOM-style event name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ScrollIn => "scrollin",
            Self::ScrollOut => "scrollout",
            Self::Scroll => "scroll",
        }
    }

    /// Parses a conventional event name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::ScrollIn => 0,
            Self::ScrollOut => 1,
            Self::Scroll => 2,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scroll direction derived from consecutive container offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The offset decreased or stayed the same.
    Up,
    /// The offset increased.
    Down,
    /// No previous offset has been recorded yet.
    #[default]
    Unknown,
}

/// What caused an evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// The container scrolled.
    Scroll,
    /// The viewport was resized.
    Resize,
    /// A subscription or an explicit refresh requested an evaluation.
    Synthetic,
}

/// The notification that led to a dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceEvent {
    /// What kind of notification it was.
    pub kind: SourceKind,
    /// When the watch received it.
    pub time: HostTime,
}

/// Payload passed to every handler.
#[derive(Clone, Debug)]
pub struct ScrollEvent {
    /// Which event is being dispatched.
    pub kind: EventKind,
    /// Scroll direction at the time of the evaluation.
    pub direction: Direction,
    /// Signed visibility ratio at the time of the evaluation.
    pub visibility: f64,
    /// The notification that caused this dispatch.
    pub source: SourceEvent,
    pub(crate) completion: Option<Completion>,
}

impl ScrollEvent {
    /// The entry completion token, present only for `scrollin` handlers
    /// registered with [`defer_exit`](crate::callbacks::SubscribeOptions::defer_exit).
    ///
    /// Clone it to keep the following `scrollout` on hold until the clone is
    /// resolved or dropped.
    #[must_use]
    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EventKind::from_name("mousewheel"), None);
    }

    #[test]
    fn indices_are_distinct() {
        let indices = EventKind::ALL.map(EventKind::index);
        assert_eq!(indices, [0, 1, 2]);
    }
}
