// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM [`Host`] implementation.
//!
//! [`DomHost`] reads geometry straight from layout on every sample. Target
//! bounds are expressed in the container's content coordinates so they can
//! be compared with its scroll offset:
//!
//! - viewport: `getBoundingClientRect().top + scrollY`
//! - element container: the sum of `offsetTop` up the offset-parent chain,
//!   stopping at the container
//!
//! A target that is no longer connected to the document reports no bounds,
//! which the core turns into a ratio of `0`.

use kurbo::Rect;
use scrollwatch_core::error::ConfigurationError;
use scrollwatch_core::event::SourceKind;
use scrollwatch_core::geometry::Sample;
use scrollwatch_core::host::{Host, Notifier, Task};
use scrollwatch_core::time::{Duration, HostTime};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, HtmlElement, Window};

use crate::container::{Container, Frame};

type ListenerClosure = Closure<dyn FnMut(Event)>;

struct Listener {
    closure: ListenerClosure,
    registrations: Vec<(EventTarget, &'static str)>,
}

/// Platform glue for one watched element.
pub struct DomHost {
    window: Window,
    target: HtmlElement,
    frame: Frame,
    listener: Option<Listener>,
}

impl DomHost {
    /// Resolves `container` and prepares to watch `target` inside it.
    ///
    /// Fails if there is no window or the container cannot be resolved.
    pub fn new(target: HtmlElement, container: &Container) -> Result<Self, ConfigurationError> {
        let window = web_sys::window().ok_or(ConfigurationError::NoDocument)?;
        let frame = container.resolve(&window)?;
        Ok(Self {
            window,
            target,
            frame,
            listener: None,
        })
    }

    /// The watched element.
    #[must_use]
    pub fn target(&self) -> &HtmlElement {
        &self.target
    }

    /// Returns `true` when measuring against the browser viewport.
    #[must_use]
    pub fn is_viewport(&self) -> bool {
        matches!(self.frame, Frame::Viewport)
    }

    /// Returns `true` while listeners are installed.
    ///
    /// Stays `false` after [`Host::listen`] if the DOM rejected every
    /// registration; the watch then receives no notifications.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    fn scroll_metrics(&self) -> (f64, f64) {
        match &self.frame {
            Frame::Viewport => {
                let scroll_top = self.window.scroll_y().unwrap_or(0.0);
                let height = self
                    .window
                    .inner_height()
                    .ok()
                    .and_then(|h| h.as_f64())
                    .unwrap_or(0.0);
                (scroll_top, height)
            }
            Frame::Element(container) => (
                f64::from(container.scroll_top()),
                f64::from(container.client_height()),
            ),
        }
    }

    fn target_bounds(&self, scroll_top: f64) -> Option<Rect> {
        if !self.target.is_connected() {
            return None;
        }
        let top = match &self.frame {
            Frame::Viewport => self.target.get_bounding_client_rect().top() + scroll_top,
            Frame::Element(container) => offset_top_within(&self.target, container),
        };
        let left = f64::from(self.target.offset_left());
        let width = f64::from(self.target.offset_width());
        let height = f64::from(self.target.offset_height());
        Some(Rect::new(left, top, left + width, top + height))
    }

    fn event_targets(&self) -> Vec<(EventTarget, &'static str)> {
        let window: EventTarget = self.window.clone().into();
        match &self.frame {
            Frame::Viewport => vec![(window.clone(), "scroll"), (window, "resize")],
            Frame::Element(container) => vec![(container.clone().into(), "scroll")],
        }
    }
}

fn offset_top_within(target: &HtmlElement, container: &HtmlElement) -> f64 {
    let mut offset = 0.0;
    let mut current = Some(target.clone());
    while let Some(element) = current {
        offset += f64::from(element.offset_top());
        current = element
            .offset_parent()
            .and_then(|parent| parent.dyn_into::<HtmlElement>().ok())
            .filter(|parent| parent != container);
    }
    offset
}

/// Keeps the candidates `add` accepted, in order.
pub(crate) fn accepted<T, E>(
    candidates: Vec<T>,
    mut add: impl FnMut(&T) -> Result<(), E>,
) -> Vec<T> {
    candidates.into_iter().filter(|c| add(c).is_ok()).collect()
}

/// Maps a DOM event type to the notification kind.
pub(crate) fn source_kind(event_type: &str) -> SourceKind {
    match event_type {
        "resize" => SourceKind::Resize,
        _ => SourceKind::Scroll,
    }
}

impl Host for DomHost {
    type Context = JsValue;

    fn context(&self) -> JsValue {
        self.target.clone().into()
    }

    fn sample(&self) -> Sample {
        let (scroll_top, container_height) = self.scroll_metrics();
        Sample {
            scroll_top,
            container_height,
            target: self.target_bounds(scroll_top),
        }
    }

    fn now(&self) -> HostTime {
        crate::now()
    }

    fn listen(&mut self, notifier: Notifier) {
        self.unlisten();
        let closure = Closure::wrap(Box::new(move |event: Event| {
            notifier(source_kind(&event.type_()));
        }) as Box<dyn FnMut(Event)>);
        let registrations = accepted(self.event_targets(), |(target, name)| {
            target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        });
        debug_assert!(
            !registrations.is_empty(),
            "the container accepted no scroll listener"
        );
        // Without a registration the closure, and with it the notifier, is
        // released here.
        if !registrations.is_empty() {
            self.listener = Some(Listener {
                closure,
                registrations,
            });
        }
    }

    fn unlisten(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        // `removeEventListener` does not throw for a registered pair.
        for (target, name) in &listener.registrations {
            let _ = target
                .remove_event_listener_with_callback(name, listener.closure.as_ref().unchecked_ref());
        }
    }

    fn defer(&mut self, delay: Duration, task: Task) {
        let callback = Closure::once_into_js(task);
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let scheduled = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis);
        // A rejected timer drops the delayed handler, like detach does.
        debug_assert!(scheduled.is_ok(), "setTimeout rejected a delayed handler");
    }
}

impl Drop for DomHost {
    fn drop(&mut self) {
        self.unlisten();
    }
}

impl core::fmt::Debug for DomHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomHost")
            .field("target", &"HtmlElement")
            .field("viewport", &self.is_viewport())
            .field("listening", &self.is_listening())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_registrations_are_not_kept() {
        let kept = accepted(vec!["scroll", "bogus", "resize"], |name| {
            if *name == "bogus" {
                Err(())
            } else {
                Ok(())
            }
        });
        assert_eq!(kept, ["scroll", "resize"]);
    }

    #[test]
    fn nothing_accepted_leaves_nothing_registered() {
        let kept = accepted(vec!["scroll"], |_| Err::<(), _>("rejected"));
        assert!(kept.is_empty());
    }

    #[test]
    fn resize_events_map_to_resize() {
        assert_eq!(source_kind("resize"), SourceKind::Resize);
        assert_eq!(source_kind("scroll"), SourceKind::Scroll);
        assert_eq!(source_kind("wheel"), SourceKind::Scroll);
    }
}
