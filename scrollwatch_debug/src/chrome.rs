// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`Recording`](super::recorder::Recording)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use scrollwatch_core::time::HostTime;

use crate::recorder::{RecordedEvent, decode};

// Trace tracks.
const TID_NOTIFY: u32 = 0;
const TID_VISIBILITY: u32 = 1;
const TID_DISPATCH: u32 = 2;
const TID_DELAYED: u32 = 3;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of instant events, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Timestamps are the recorded host times in microseconds.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        let ts = micros(recorded.time());
        match recorded {
            RecordedEvent::Notification(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Notification",
                    "cat": "Source",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_NOTIFY,
                    "s": "t",
                    "args": {
                        "source": format!("{:?}", e.source.kind),
                        "outcome": format!("{:?}", e.outcome),
                    }
                }));
            }
            RecordedEvent::Visibility(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Visibility",
                    "cat": "Tracker",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_VISIBILITY,
                    "s": "t",
                    "args": {
                        "ratio": e.ratio,
                        "previous": e.previous,
                        "direction": format!("{:?}", e.direction),
                        "member": e.member,
                        "transition": e.transition.map(|t| format!("{t:?}")),
                    }
                }));
                // Counter track for plotting the ratio over time.
                events.push(json!({
                    "ph": "C",
                    "name": "ratio",
                    "ts": ts,
                    "pid": 0,
                    "args": { "ratio": e.ratio }
                }));
            }
            RecordedEvent::Dispatch(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": e.kind.name(),
                    "cat": "Dispatch",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_DISPATCH,
                    "s": "g",
                    "args": {
                        "subscribers": e.subscribers,
                        "visibility": e.visibility,
                        "direction": format!("{:?}", e.direction),
                    }
                }));
            }
            RecordedEvent::Suppressed(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{} suppressed", e.kind.name()),
                    "cat": "Dispatch",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_DISPATCH,
                    "s": "t",
                    "args": {
                        "reason": format!("{:?}", e.reason),
                    }
                }));
            }
            RecordedEvent::Delayed(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{} delayed", e.kind.name()),
                    "cat": "Delayed",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_DELAYED,
                    "s": "t",
                    "args": {
                        "outcome": format!("{:?}", e.outcome),
                    }
                }));
            }
            RecordedEvent::Lifecycle(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.lifecycle),
                    "cat": "Lifecycle",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn micros(t: HostTime) -> f64 {
    t.micros() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::Recording;
    use scrollwatch_core::event::{Direction, EventKind};
    use scrollwatch_core::trace::{
        DelayedEvent, DelayedOutcome, DispatchEvent, Lifecycle, LifecycleEvent, TraceSink,
        VisibilityEvent,
    };
    use scrollwatch_core::tracker::Transition;

    fn exported(recording: &Recording) -> Vec<Value> {
        let mut out = Vec::new();
        export(&recording.to_bytes(), &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn export_produces_valid_json() {
        let recording = Recording::new();
        let mut sink = recording.sink();
        sink.on_lifecycle(&LifecycleEvent {
            time: HostTime(0),
            lifecycle: Lifecycle::Attached,
        });
        sink.on_dispatch(&DispatchEvent {
            time: HostTime(2_000),
            kind: EventKind::ScrollIn,
            subscribers: 1,
            visibility: 1.0,
            direction: Direction::Down,
        });
        sink.on_delayed(&DelayedEvent {
            time: HostTime(502_000),
            kind: EventKind::ScrollIn,
            outcome: DelayedOutcome::Invoked,
        });

        let events = exported(&recording);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["name"], "Attached");
        assert_eq!(events[1]["name"], "scrollin");
        assert_eq!(events[1]["ts"], 2_000.0);
        assert_eq!(events[1]["args"]["subscribers"], 1);
        assert_eq!(events[2]["name"], "scrollin delayed");
        assert_eq!(events[2]["args"]["outcome"], "Invoked");
    }

    #[test]
    fn visibility_adds_a_counter() {
        let recording = Recording::new();
        recording.sink().on_visibility(&VisibilityEvent {
            time: HostTime(10),
            ratio: 0.5,
            previous: Some(0.25),
            direction: Direction::Down,
            member: false,
            transition: Some(Transition::Enter),
        });

        let events = exported(&recording);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["args"]["previous"], 0.25);
        assert_eq!(events[0]["args"]["transition"], "Enter");
        assert_eq!(events[1]["ph"], "C");
        assert_eq!(events[1]["args"]["ratio"], 0.5);
    }

    #[test]
    fn empty_recording_exports_empty_array() {
        let events = exported(&Recording::new());
        assert!(events.is_empty());
    }
}
