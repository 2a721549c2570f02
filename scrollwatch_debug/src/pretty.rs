// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use scrollwatch_core::event::{Direction, SourceKind};
use scrollwatch_core::time::HostTime;
use scrollwatch_core::trace::{
    DelayedEvent, DispatchEvent, Lifecycle, LifecycleEvent, NotificationEvent, SuppressedEvent,
    TraceSink, VisibilityEvent,
};
use scrollwatch_core::tracker::Transition;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.micros() as f64 / 1000.0
}

fn source_name(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Scroll => "scroll",
        SourceKind::Resize => "resize",
        SourceKind::Synthetic => "synthetic",
    }
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "up",
        Direction::Down => "down",
        Direction::Unknown => "-",
    }
}

fn transition_name(transition: Option<Transition>) -> &'static str {
    match transition {
        None => "none",
        Some(Transition::Enter) => "enter",
        Some(Transition::Exit) => "exit",
        Some(Transition::ExitDeferred) => "exit-deferred",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_notification(&mut self, e: &NotificationEvent) {
        let _ = writeln!(
            self.writer,
            "[notify] at={:.3}ms source={} outcome={:?}",
            ms(e.source.time),
            source_name(e.source.kind),
            e.outcome,
        );
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        let previous = e
            .previous
            .map_or_else(|| "-".to_owned(), |p| format!("{p:.3}"));
        let _ = writeln!(
            self.writer,
            "[visibility] at={:.3}ms ratio={:.3} previous={previous} dir={} member={} transition={}",
            ms(e.time),
            e.ratio,
            direction_name(e.direction),
            e.member,
            transition_name(e.transition),
        );
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        let _ = writeln!(
            self.writer,
            "[dispatch] at={:.3}ms {} subscribers={} visibility={:.3} dir={}",
            ms(e.time),
            e.kind.name(),
            e.subscribers,
            e.visibility,
            direction_name(e.direction),
        );
    }

    fn on_suppressed(&mut self, e: &SuppressedEvent) {
        let _ = writeln!(
            self.writer,
            "[suppressed] at={:.3}ms {} reason={:?}",
            ms(e.time),
            e.kind.name(),
            e.reason,
        );
    }

    fn on_delayed(&mut self, e: &DelayedEvent) {
        let _ = writeln!(
            self.writer,
            "[delayed] at={:.3}ms {} outcome={:?}",
            ms(e.time),
            e.kind.name(),
            e.outcome,
        );
    }

    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        let what = match e.lifecycle {
            Lifecycle::Attached => "attached",
            Lifecycle::Detached => "detached",
        };
        let _ = writeln!(self.writer, "[watch] at={:.3}ms {what}", ms(e.time));
    }
}
