// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility ratio computation.
//!
//! All geometry lives in the container's coordinate space: the container's
//! visible window starts at its scroll offset and extends for its visible
//! height, and the target's bounds are its offset within the same space.
//! Only the vertical axis takes part in the computation.
//!
//! The result is a *signed* ratio:
//!
//! ```text
//!          1   fully visible (or spanning the whole window)
//!   (0, 1)     clipped by the bottom edge, value = visible fraction
//!  (-1, 0)     clipped by the top edge, magnitude = visible fraction
//!          0   not visible
//! ```

use kurbo::Rect;

/// A snapshot of the geometry a host reports for one evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Current vertical scroll offset of the container.
    pub scroll_top: f64,
    /// Visible height of the container.
    pub container_height: f64,
    /// Target bounds in the container's coordinate space, or `None` when the
    /// target is not attached to a layout tree.
    pub target: Option<Rect>,
}

impl Sample {
    /// The container's visible window as a rectangle.
    ///
    /// The horizontal extent is unused and left empty.
    #[must_use]
    pub fn visible_window(&self) -> Rect {
        Rect::new(
            0.0,
            self.scroll_top,
            0.0,
            self.scroll_top + self.container_height,
        )
    }

    /// Computes the visibility ratio for this sample.
    ///
    /// A detached target reports `0`.
    #[must_use]
    pub fn visibility(&self) -> f64 {
        match self.target {
            Some(target) => compute_visibility(self.visible_window(), target),
            None => 0.0,
        }
    }
}

/// Computes the signed visibility ratio of `target` within `window`.
///
/// Boundary ties resolve to the fully-visible and not-visible cases before
/// the partial ones. Degenerate input (non-positive heights, non-finite
/// coordinates) yields `0`.
#[must_use]
pub fn compute_visibility(window: Rect, target: Rect) -> f64 {
    let scroll_top = window.y0;
    let scroll_bottom = window.y1;
    let container_height = window.height();

    let el_top = target.y0;
    let el_bottom = target.y1;
    let el_height = target.height();

    if !is_positive(container_height)
        || !is_positive(el_height)
        || !scroll_top.is_finite()
        || !el_top.is_finite()
    {
        return 0.0;
    }

    let larger_than_container = el_height >= container_height;

    // Target spans the whole window.
    if larger_than_container && scroll_top >= el_top && scroll_bottom <= el_bottom {
        return 1.0;
    }

    // Target sits inside the window.
    if el_top >= scroll_top && el_bottom <= scroll_bottom {
        return 1.0;
    }

    // Clipped by the bottom edge.
    if el_top > scroll_top && el_top < scroll_bottom && el_bottom > scroll_bottom {
        return (scroll_bottom - el_top) / el_height;
    }

    // Clipped by the top edge; negative to tell the edges apart.
    if el_bottom > scroll_top && el_bottom < scroll_bottom {
        return (scroll_top - el_bottom) / el_height;
    }

    0.0
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCROLL_TOP: f64 = 2000.0;
    const CONTAINER_HEIGHT: f64 = 500.0;

    fn window() -> Rect {
        Rect::new(0.0, SCROLL_TOP, 0.0, SCROLL_TOP + CONTAINER_HEIGHT)
    }

    fn target(top: f64, height: f64) -> Rect {
        Rect::new(0.0, top, 100.0, top + height)
    }

    #[test]
    fn small_element_fully_in_view() {
        assert_eq!(compute_visibility(window(), target(2100.0, 250.0)), 1.0);
    }

    #[test]
    fn small_element_below_view() {
        assert_eq!(compute_visibility(window(), target(4000.0, 250.0)), 0.0);
    }

    #[test]
    fn small_element_above_view() {
        assert_eq!(compute_visibility(window(), target(100.0, 250.0)), 0.0);
    }

    #[test]
    fn half_clipped_by_top_edge() {
        // (2000 - 2125) / 250
        assert_eq!(compute_visibility(window(), target(1875.0, 250.0)), -0.5);
    }

    #[test]
    fn mostly_showing_at_top_edge() {
        assert_eq!(compute_visibility(window(), target(1950.0, 250.0)), -0.8);
    }

    #[test]
    fn clipped_by_bottom_edge() {
        // Window ends at 2500; 100 of 250 visible.
        let ratio = compute_visibility(window(), target(2400.0, 250.0));
        assert!((ratio - 0.4).abs() < 1e-12, "got {ratio}");
    }

    #[test]
    fn element_larger_than_window_spanning_it() {
        assert_eq!(compute_visibility(window(), target(1500.0, 2000.0)), 1.0);
    }

    #[test]
    fn element_larger_than_window_partially_visible() {
        // Top at 2300, bottom at 3300: only the top 200 show.
        let ratio = compute_visibility(window(), target(2300.0, 1000.0));
        assert!((ratio - 0.2).abs() < 1e-12, "got {ratio}");
    }

    #[test]
    fn exact_boundaries_count_as_fully_visible() {
        assert_eq!(compute_visibility(window(), target(2000.0, 500.0)), 1.0);
        assert_eq!(compute_visibility(window(), target(2250.0, 250.0)), 1.0);
    }

    #[test]
    fn touching_edges_count_as_hidden() {
        // Bottom edge exactly at scroll top, top edge exactly at scroll bottom.
        assert_eq!(compute_visibility(window(), target(1750.0, 250.0)), 0.0);
        assert_eq!(compute_visibility(window(), target(2500.0, 250.0)), 0.0);
    }

    #[test]
    fn degenerate_geometry_is_hidden() {
        assert_eq!(compute_visibility(window(), target(2100.0, 0.0)), 0.0);
        let empty_window = Rect::new(0.0, SCROLL_TOP, 0.0, SCROLL_TOP);
        assert_eq!(compute_visibility(empty_window, target(2100.0, 250.0)), 0.0);
        assert_eq!(compute_visibility(window(), target(f64::NAN, 250.0)), 0.0);
    }

    #[test]
    fn detached_target_reports_zero() {
        let sample = Sample {
            scroll_top: SCROLL_TOP,
            container_height: CONTAINER_HEIGHT,
            target: None,
        };
        assert_eq!(sample.visibility(), 0.0);
    }

    #[test]
    fn sample_uses_scroll_offset_as_window_origin() {
        let sample = Sample {
            scroll_top: SCROLL_TOP,
            container_height: CONTAINER_HEIGHT,
            target: Some(target(2100.0, 250.0)),
        };
        assert_eq!(sample.visible_window(), window());
        assert_eq!(sample.visibility(), 1.0);
    }
}
