// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leading-edge notification throttle.
//!
//! The first notification opens a window of the configured length and is
//! admitted. Later notifications inside the window are dropped, and no
//! trailing call is made when the window closes. The next notification after
//! the window opens a new one.

use crate::config::NotificationMode;
use crate::time::{Duration, HostTime};

/// Admits at most one notification per window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Throttle {
    interval: Duration,
    window_start: Option<HostTime>,
}

impl Throttle {
    /// Creates a throttle for `mode`. [`NotificationMode::Raw`] admits every
    /// notification.
    #[must_use]
    pub const fn new(mode: NotificationMode) -> Self {
        let interval = match mode {
            NotificationMode::Throttled(interval) => interval,
            NotificationMode::Raw => Duration::ZERO,
        };
        Self {
            interval,
            window_start: None,
        }
    }

    /// Returns `true` if a notification at `now` should be processed.
    pub fn admit(&mut self, now: HostTime) -> bool {
        if self.interval.is_zero() {
            return true;
        }
        if let Some(start) = self.window_start
            && now.saturating_duration_since(start) < self.interval
        {
            return false;
        }
        self.window_start = Some(now);
        true
    }

    /// The window length; zero when unthrottled.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn at_ms(ms: u64) -> HostTime {
        HostTime(ms * 1000)
    }

    #[test]
    fn admits_leading_edge_once_per_window() {
        let mut throttle = Throttle::new(NotificationMode::Throttled(Duration::from_millis(100)));
        let admitted: Vec<u64> = [0, 30, 60, 90, 120, 150, 180, 210]
            .into_iter()
            .filter(|&ms| throttle.admit(at_ms(ms)))
            .collect();
        assert_eq!(admitted, [0, 120]);
    }

    #[test]
    fn window_boundary_is_inclusive_of_next_window() {
        let mut throttle = Throttle::new(NotificationMode::Throttled(Duration::from_millis(100)));
        assert!(throttle.admit(at_ms(0)));
        assert!(!throttle.admit(at_ms(99)));
        assert!(throttle.admit(at_ms(100)));
    }

    #[test]
    fn raw_admits_everything() {
        let mut throttle = Throttle::new(NotificationMode::Raw);
        assert!(throttle.admit(at_ms(0)));
        assert!(throttle.admit(at_ms(0)));
        assert!(throttle.admit(at_ms(1)));
        assert_eq!(throttle.interval(), Duration::ZERO);
    }
}
