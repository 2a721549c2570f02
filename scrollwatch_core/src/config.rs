// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-watch configuration.
//!
//! Earlier generations of this kind of tracker disagreed on three behaviors.
//! Each is a policy here rather than a fixed choice:
//!
//! - [`NotificationMode`]: leading-edge throttle or every raw notification.
//! - [`FullVisibility`]: the ratio that counts as "entered".
//! - [`ScrollDedup`]: whether a forced evaluation may repeat an unchanged
//!   `scroll` event.

use crate::time::Duration;

/// How host notifications are admitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationMode {
    /// Process the first notification of every window of the given length and
    /// drop the rest. Nothing is replayed at the trailing edge.
    Throttled(Duration),
    /// Process every notification; only the re-entrancy guard applies.
    Raw,
}

/// The visibility ratio at which a hidden target becomes a member.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FullVisibility {
    /// The ratio must be exactly `1`.
    Exact,
    /// The magnitude of the ratio must exceed the given fraction.
    Above(f64),
}

impl FullVisibility {
    /// Returns `true` if `ratio` meets this threshold.
    #[must_use]
    pub fn is_met(self, ratio: f64) -> bool {
        match self {
            Self::Exact => ratio == 1.0,
            Self::Above(threshold) => ratio.abs() > threshold,
        }
    }
}

/// Whether forced evaluations bypass `scroll` deduplication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrollDedup {
    /// A forced evaluation dispatches `scroll` even when the ratio is
    /// unchanged.
    BypassOnForce,
    /// `scroll` is dispatched only when the ratio changed.
    Always,
}

/// Configuration for a [`Watch`](crate::watch::Watch).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WatchConfig {
    /// How host notifications are admitted.
    pub notification_mode: NotificationMode,
    /// Entry threshold.
    pub full_visibility: FullVisibility,
    /// `scroll` deduplication policy for forced evaluations.
    pub scroll_dedup: ScrollDedup,
}

impl WatchConfig {
    /// Default throttle interval.
    pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(100);

    /// Default configuration: 100 ms leading-edge throttle, exact entry
    /// threshold, forced evaluations bypass `scroll` dedup.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            notification_mode: NotificationMode::Throttled(Self::DEFAULT_THROTTLE),
            full_visibility: FullVisibility::Exact,
            scroll_dedup: ScrollDedup::BypassOnForce,
        }
    }

    /// Like [`new`](Self::new) but binds to every raw notification.
    #[must_use]
    pub const fn raw() -> Self {
        Self::new().with_notification_mode(NotificationMode::Raw)
    }

    /// Sets the notification mode.
    #[must_use]
    pub const fn with_notification_mode(mut self, mode: NotificationMode) -> Self {
        self.notification_mode = mode;
        self
    }

    /// Throttles notifications to one per `interval`.
    #[must_use]
    pub const fn with_throttle(self, interval: Duration) -> Self {
        self.with_notification_mode(NotificationMode::Throttled(interval))
    }

    /// Sets the entry threshold.
    #[must_use]
    pub const fn with_full_visibility(mut self, full_visibility: FullVisibility) -> Self {
        self.full_visibility = full_visibility;
        self
    }

    /// Sets the `scroll` deduplication policy.
    #[must_use]
    pub const fn with_scroll_dedup(mut self, scroll_dedup: ScrollDedup) -> Self {
        self.scroll_dedup = scroll_dedup;
        self
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::new()
    }
}
