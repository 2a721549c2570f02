// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for scrollwatch.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`DomHost`]: DOM geometry, `scroll`/`resize` listeners and `setTimeout`
//!   deferred tasks
//! - [`Container`]: viewport, element or selector container resolution
//! - [`attach`]: one [`Watch`] per element, tracked in a weak side table
//!
//! Handlers receive a [`JsValue`] context: the target element unless the
//! subscription supplied its own.

mod container;
mod host;

use std::cell::{Cell, RefCell};

use js_sys::{Object, WeakMap};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

pub use container::Container;
pub use host::DomHost;
pub use scrollwatch_core::config::WatchConfig;
pub use scrollwatch_core::error::ConfigurationError;
pub use scrollwatch_core::event::{Direction, EventKind, ScrollEvent};
pub use scrollwatch_core::watch::Watch;

use scrollwatch_core::registry::Registry;
use scrollwatch_core::time::{Duration, HostTime};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    fn performance_now() -> f64;
}

/// Returns the current host time from `performance.now()`, in microseconds.
#[must_use]
pub fn now() -> HostTime {
    let ms = performance_now();
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "performance.now() returns small positive f64; µs fits in u64"
    )]
    let us = (ms * 1000.0) as u64;
    HostTime(us)
}

/// Options for [`attach`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WatchOptions {
    /// Where the target is measured.
    pub container: Container,
    /// Throttle, threshold and dedup policies.
    pub config: WatchConfig,
}

impl WatchOptions {
    /// Viewport container with the default [`WatchConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the container.
    #[must_use]
    pub fn container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    /// Uses the first element matching `selector` as the container.
    #[must_use]
    pub fn selector(self, selector: impl Into<String>) -> Self {
        self.container(Container::Selector(selector.into()))
    }

    /// Sets the watch configuration.
    #[must_use]
    pub fn config(mut self, config: WatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Throttles notifications to one per `interval`.
    #[must_use]
    pub fn throttle(mut self, interval: Duration) -> Self {
        self.config = self.config.with_throttle(interval);
        self
    }
}

/// Identity side table for attached elements.
///
/// Elements get a numeric key stored in a JS `WeakMap`, so neither the map
/// nor the registry keeps an element alive.
struct TargetTable {
    keys: WeakMap,
    next: Cell<u32>,
    watches: RefCell<Registry<u32, DomHost>>,
}

impl TargetTable {
    fn new() -> Self {
        Self {
            keys: WeakMap::new(),
            next: Cell::new(0),
            watches: RefCell::new(Registry::new()),
        }
    }

    fn lookup(&self, target: &HtmlElement) -> Option<u32> {
        let object: &Object = target.as_ref();
        let key = self.keys.get(object).as_f64()?;
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "the map only ever holds u32 keys written by `key`"
        )]
        let key = key as u32;
        Some(key)
    }

    fn key(&self, target: &HtmlElement) -> u32 {
        if let Some(key) = self.lookup(target) {
            return key;
        }
        let key = self.next.get();
        self.next.set(key.wrapping_add(1));
        let object: &Object = target.as_ref();
        self.keys.set(object, &JsValue::from(key));
        key
    }
}

std::thread_local! {
    static TARGETS: TargetTable = TargetTable::new();
}

/// Starts watching `target`, or returns the live watch already attached to
/// it.
///
/// `options` only apply when a new watch is created. Fails with
/// [`ConfigurationError`] when the container cannot be resolved, in which
/// case nothing is attached.
///
/// The DOM listener owns the watch, so dropping the returned handle does not
/// stop it. Call [`Watch::detach`] to end tracking.
pub fn attach(
    target: &HtmlElement,
    options: WatchOptions,
) -> Result<Watch<DomHost>, ConfigurationError> {
    TARGETS.with(|table| {
        let key = table.key(target);
        table
            .watches
            .borrow_mut()
            .get_or_try_insert_with(key, || {
                let host = DomHost::new(target.clone(), &options.container)?;
                Ok(Watch::new(host, options.config))
            })
    })
}

/// Returns the live watch attached to `target`, if any.
#[must_use]
pub fn existing(target: &HtmlElement) -> Option<Watch<DomHost>> {
    TARGETS.with(|table| {
        let key = table.lookup(target)?;
        table.watches.borrow_mut().get(&key)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_watch_the_viewport() {
        let options = WatchOptions::new();
        assert_eq!(options.container, Container::Viewport);
        assert_eq!(options.config, WatchConfig::new());
    }

    #[test]
    fn option_builders() {
        let options = WatchOptions::new()
            .selector("#feed")
            .throttle(Duration::from_millis(250));
        assert_eq!(options.container, Container::Selector("#feed".into()));
        assert_eq!(
            options.config,
            WatchConfig::new().with_throttle(Duration::from_millis(250))
        );
    }
}
