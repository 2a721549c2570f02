// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The visibility state machine.
//!
//! [`VisibilityTracker`] holds the per-target state (membership, last ratio,
//! last offset, direction, last membership event) and decides, for each new
//! ratio, which events a notification warrants. It performs no I/O and
//! invokes no handlers; [`Watch`](crate::watch::Watch) drives it.
//!
//! ```text
//!            ratio meets FullVisibility
//!   Hidden ─────────────────────────────► Visible      (scrollin)
//!      ▲                                     │
//!      └─────────────────────────────────────┘
//!                  ratio == 0                          (scrollout, or queued
//!                                                       behind an exit gate)
//! ```
//!
//! # Exit gates
//!
//! An entry dispatch may open an exit gate with a number of outstanding
//! completions. While the gate is open an exit transition still flips
//! membership but the `scrollout` is queued. When the last completion
//! resolves, the queued exit is released only if the target is still hidden
//! at that moment; an exit overtaken by a re-entry is discarded.

use crate::config::{FullVisibility, ScrollDedup, WatchConfig};
use crate::event::{Direction, EventKind};

/// A membership change produced by [`VisibilityTracker::evaluate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Hidden → Visible; dispatch `scrollin`.
    Enter,
    /// Visible → Hidden; dispatch `scrollout`.
    Exit,
    /// Visible → Hidden while an exit gate is open; `scrollout` is queued.
    ExitDeferred,
}

/// The outcome of evaluating one notification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    /// The new ratio.
    pub ratio: f64,
    /// The ratio recorded before this evaluation, if any.
    pub previous: Option<f64>,
    /// Direction derived from the container offset.
    pub direction: Direction,
    /// Membership change, if any.
    pub transition: Option<Transition>,
    /// Whether a `scroll` event is warranted.
    pub scroll: bool,
}

/// The state of the exit gate after a completion resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateStatus {
    /// Completions are still outstanding.
    Open,
    /// No gate is open and no exit is waiting.
    Closed,
    /// The gate closed with an exit queued and the target still hidden;
    /// dispatch `scrollout` now.
    ReleaseExit,
    /// The gate closed with an exit queued but the target re-entered; the
    /// exit is dropped.
    DiscardExit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ExitGate {
    cycle: u64,
    outstanding: u32,
    exit_queued: bool,
}

/// Per-target visibility state.
#[derive(Clone, Debug)]
pub struct VisibilityTracker {
    full_visibility: FullVisibility,
    scroll_dedup: ScrollDedup,
    member: bool,
    ratio: Option<f64>,
    last_offset: Option<f64>,
    direction: Direction,
    last_fired: Option<EventKind>,
    gate: Option<ExitGate>,
    cycle: u64,
}

impl VisibilityTracker {
    /// Creates a tracker in the hidden state with no recorded ratio or offset.
    #[must_use]
    pub const fn new(config: &WatchConfig) -> Self {
        Self {
            full_visibility: config.full_visibility,
            scroll_dedup: config.scroll_dedup,
            member: false,
            ratio: None,
            last_offset: None,
            direction: Direction::Unknown,
            last_fired: None,
            gate: None,
            cycle: 0,
        }
    }

    /// Records a freshly computed `ratio` at container `offset` and decides
    /// which events it warrants.
    ///
    /// `force` marks a synthetic evaluation; depending on the
    /// [`ScrollDedup`] policy it may dispatch `scroll` with an unchanged
    /// ratio.
    pub fn evaluate(&mut self, ratio: f64, offset: f64, force: bool) -> Evaluation {
        let previous = self.ratio;

        self.direction = match self.last_offset {
            None => Direction::Unknown,
            Some(last) if offset > last => Direction::Down,
            Some(_) => Direction::Up,
        };
        self.last_offset = Some(offset);
        self.ratio = Some(ratio);

        let transition = if !self.member && self.full_visibility.is_met(ratio) {
            self.member = true;
            Some(Transition::Enter)
        } else if self.member && ratio == 0.0 {
            self.member = false;
            match &mut self.gate {
                Some(gate) => {
                    gate.exit_queued = true;
                    Some(Transition::ExitDeferred)
                }
                None => Some(Transition::Exit),
            }
        } else {
            None
        };

        let changed = previous != Some(ratio);
        let scroll = changed || (force && self.scroll_dedup == ScrollDedup::BypassOnForce);

        Evaluation {
            ratio,
            previous,
            direction: self.direction,
            transition,
            scroll,
        }
    }

    /// Decides whether `kind` may be dispatched now and records it.
    ///
    /// `scrollin` and `scrollout` are refused when they would repeat the last
    /// membership event. `scroll` is always admitted and does not count as an
    /// intervening event.
    pub fn admit(&mut self, kind: EventKind) -> bool {
        if kind == EventKind::Scroll {
            return true;
        }
        if self.last_fired == Some(kind) {
            return false;
        }
        self.last_fired = Some(kind);
        true
    }

    /// Starts a new membership cycle and, if `outstanding` is non-zero, opens
    /// an exit gate for it.
    ///
    /// Returns the cycle identifier completions must carry, or `None` when no
    /// gate was opened.
    pub fn open_gate(&mut self, outstanding: u32) -> Option<u64> {
        self.cycle += 1;
        if outstanding == 0 {
            self.gate = None;
            return None;
        }
        self.gate = Some(ExitGate {
            cycle: self.cycle,
            outstanding,
            exit_queued: false,
        });
        Some(self.cycle)
    }

    /// Records one resolved completion for `cycle`.
    ///
    /// Completions from an older cycle, or arriving after the gate closed,
    /// are ignored and report [`GateStatus::Open`] if a gate is still open.
    pub fn complete_entry(&mut self, cycle: u64) -> GateStatus {
        let Some(gate) = &mut self.gate else {
            return GateStatus::Closed;
        };
        if gate.cycle != cycle {
            return GateStatus::Open;
        }
        gate.outstanding = gate.outstanding.saturating_sub(1);
        if gate.outstanding > 0 {
            return GateStatus::Open;
        }
        let exit_queued = gate.exit_queued;
        self.gate = None;
        match (exit_queued, self.member) {
            (false, _) => GateStatus::Closed,
            (true, false) => GateStatus::ReleaseExit,
            (true, true) => GateStatus::DiscardExit,
        }
    }

    /// Returns `true` while an exit gate is open.
    #[must_use]
    pub fn has_open_gate(&self) -> bool {
        self.gate.is_some()
    }

    /// Returns `true` while the target is considered in the viewport.
    #[must_use]
    pub fn is_member(&self) -> bool {
        self.member
    }

    /// The most recently recorded ratio.
    #[must_use]
    pub fn ratio(&self) -> Option<f64> {
        self.ratio
    }

    /// The direction derived by the most recent evaluation.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The last membership event that was dispatched.
    #[must_use]
    pub fn last_fired(&self) -> Option<EventKind> {
        self.last_fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> VisibilityTracker {
        VisibilityTracker::new(&WatchConfig::new())
    }

    #[test]
    fn first_evaluation_has_unknown_direction() {
        let mut t = tracker();
        let eval = t.evaluate(0.0, 500.0, false);
        assert_eq!(eval.direction, Direction::Unknown);
        assert_eq!(eval.previous, None);
        assert!(eval.scroll, "unset ratio always differs");
    }

    #[test]
    fn zero_offset_is_a_real_baseline() {
        let mut t = tracker();
        t.evaluate(0.0, 0.0, false);
        let eval = t.evaluate(0.0, 25.0, false);
        assert_eq!(eval.direction, Direction::Down);
        let eval = t.evaluate(0.0, 10.0, false);
        assert_eq!(eval.direction, Direction::Up);
    }

    #[test]
    fn unchanged_offset_reads_as_up() {
        let mut t = tracker();
        t.evaluate(0.0, 40.0, false);
        assert_eq!(t.evaluate(0.0, 40.0, false).direction, Direction::Up);
    }

    #[test]
    fn enters_on_full_visibility_only() {
        let mut t = tracker();
        assert_eq!(t.evaluate(0.5, 0.0, false).transition, None);
        assert_eq!(t.evaluate(-0.9, 0.0, false).transition, None);
        assert_eq!(t.evaluate(1.0, 0.0, false).transition, Some(Transition::Enter));
        assert!(t.is_member());
        // Partial visibility keeps membership.
        assert_eq!(t.evaluate(0.3, 0.0, false).transition, None);
        assert!(t.is_member());
        assert_eq!(t.evaluate(0.0, 0.0, false).transition, Some(Transition::Exit));
        assert!(!t.is_member());
    }

    #[test]
    fn approximate_threshold_enters_early() {
        let config = WatchConfig::new().with_full_visibility(FullVisibility::Above(0.9));
        let mut t = VisibilityTracker::new(&config);
        assert_eq!(t.evaluate(0.95, 0.0, false).transition, Some(Transition::Enter));
    }

    #[test]
    fn scroll_only_when_ratio_changes_unless_forced() {
        let mut t = tracker();
        assert!(t.evaluate(0.4, 0.0, false).scroll);
        assert!(!t.evaluate(0.4, 10.0, false).scroll);
        assert!(t.evaluate(0.4, 10.0, true).scroll);
    }

    #[test]
    fn always_dedup_ignores_force() {
        let config = WatchConfig::new().with_scroll_dedup(ScrollDedup::Always);
        let mut t = VisibilityTracker::new(&config);
        t.evaluate(0.4, 0.0, false);
        assert!(!t.evaluate(0.4, 0.0, true).scroll);
    }

    #[test]
    fn membership_events_are_not_repeated() {
        let mut t = tracker();
        assert!(t.admit(EventKind::ScrollIn));
        assert!(t.admit(EventKind::Scroll));
        assert!(t.admit(EventKind::Scroll));
        assert!(!t.admit(EventKind::ScrollIn), "scroll does not separate repeats");
        assert!(t.admit(EventKind::ScrollOut));
        assert!(t.admit(EventKind::ScrollIn));
        assert_eq!(t.last_fired(), Some(EventKind::ScrollIn));
    }

    #[test]
    fn exit_is_queued_behind_open_gate() {
        let mut t = tracker();
        t.evaluate(1.0, 0.0, false);
        let cycle = t.open_gate(1).expect("gate opened");
        assert_eq!(
            t.evaluate(0.0, 0.0, false).transition,
            Some(Transition::ExitDeferred)
        );
        assert!(!t.is_member());
        assert_eq!(t.complete_entry(cycle), GateStatus::ReleaseExit);
        assert!(!t.has_open_gate());
    }

    #[test]
    fn queued_exit_is_dropped_after_reentry() {
        let mut t = tracker();
        t.evaluate(1.0, 0.0, false);
        let cycle = t.open_gate(1).expect("gate opened");
        t.evaluate(0.0, 0.0, false);
        t.evaluate(1.0, 0.0, false);
        assert!(t.is_member());
        assert_eq!(t.complete_entry(cycle), GateStatus::DiscardExit);
        assert!(!t.has_open_gate());
    }

    #[test]
    fn gate_waits_for_every_completion() {
        let mut t = tracker();
        t.evaluate(1.0, 0.0, false);
        let cycle = t.open_gate(2).expect("gate opened");
        t.evaluate(0.0, 0.0, false);
        assert_eq!(t.complete_entry(cycle), GateStatus::Open);
        assert!(t.has_open_gate());
        assert_eq!(t.complete_entry(cycle), GateStatus::ReleaseExit);
    }

    #[test]
    fn stale_cycle_is_ignored() {
        let mut t = tracker();
        let old = t.open_gate(1).expect("gate opened");
        let current = t.open_gate(1).expect("gate opened");
        assert_ne!(old, current);
        assert_eq!(t.complete_entry(old), GateStatus::Open);
        assert!(t.has_open_gate());
        assert_eq!(t.complete_entry(current), GateStatus::Closed);
    }

    #[test]
    fn no_gate_without_outstanding_completions() {
        let mut t = tracker();
        assert_eq!(t.open_gate(0), None);
        t.evaluate(1.0, 0.0, false);
        assert_eq!(t.evaluate(0.0, 0.0, false).transition, Some(Transition::Exit));
    }
}
