// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport visibility tracking for watched elements.
//!
//! `scrollwatch_core` decides when a target element scrolls into and out of
//! its container's visible window, and fans the resulting lifecycle events
//! out to subscribers. It is `no_std` compatible (with `alloc`) and performs
//! no I/O: a backend implements [`Host`](host::Host) to supply geometry,
//! time, notifications and deferred tasks.
//!
//! # Architecture
//!
//! Every notification flows through the same pipeline:
//!
//! ```text
//!   Host (scroll / resize listener)
//!       │ notifier(SourceKind)
//!       ▼
//!   Watch::notify ──► Throttle ──► Host::sample() ──► compute_visibility
//!                                                          │
//!                 ┌────────────────────────────────────────┘
//!                 ▼
//!   VisibilityTracker::evaluate ──► scrollin / scrollout / scroll
//!                                           │
//!                 ┌─────────────────────────┘
//!                 ▼
//!   subscribers (sync, or Host::defer for delayed ones) ──► Completion
//! ```
//!
//! **[`geometry`]**: The signed visibility ratio, a pure function of the
//! container window and the target bounds.
//!
//! **[`tracker`]**: The Hidden/Visible state machine with direction tracking,
//! membership event dedup and exit gates.
//!
//! **[`watch`]**: The driver. Owns a host, a tracker and the subscriber
//! lists, and enforces the re-entrancy guard, the throttle and detach.
//!
//! **[`callbacks`]**: Per-subscription options (delay, state guard, deferred
//! exit, explicit context).
//!
//! **[`completion`]**: Entry completion tokens that hold back `scrollout`.
//!
//! **[`registry`]**: Weak side table ensuring one watch per target.
//!
//! **[`config`]**: Throttle, threshold and dedup policies.
//!
//! **[`host`]**: The [`Host`](host::Host) trait backends implement.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with
//! a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Example
//!
//! ```rust,ignore
//! let watch = Watch::new(host, WatchConfig::new());
//! watch
//!     .on(EventKind::ScrollIn, |target, e| show(target, e.direction))
//!     .on(EventKind::ScrollOut, |target, _| hide(target));
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod callbacks;
pub mod completion;
pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod host;
pub mod registry;
pub mod throttle;
pub mod time;
pub mod trace;
pub mod tracker;
pub mod watch;

#[cfg(test)]
mod test_host;
