// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Container resolution.
//!
//! A watch measures its target against a scroll container: the browser
//! viewport by default, or an ancestor element given directly or by CSS
//! selector. Element containers must be CSS-positioned so that `offsetTop`
//! chains end at them; an unpositioned container is switched to
//! `position: relative`.

use scrollwatch_core::error::ConfigurationError;
use wasm_bindgen::JsCast as _;
use web_sys::{HtmlElement, Window};

/// Where a target is measured.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Container {
    /// The browser viewport. Listens for `scroll` and `resize` on the window.
    #[default]
    Viewport,
    /// A scrollable ancestor element.
    Element(HtmlElement),
    /// The first element matching a CSS selector.
    Selector(String),
}

/// A resolved container.
#[derive(Clone, Debug)]
pub(crate) enum Frame {
    Viewport,
    Element(HtmlElement),
}

impl Container {
    /// Resolves the container against `window`'s document.
    pub(crate) fn resolve(&self, window: &Window) -> Result<Frame, ConfigurationError> {
        let element = match self {
            Self::Viewport => return Ok(Frame::Viewport),
            Self::Element(element) => element.clone(),
            Self::Selector(selector) => {
                let document = window.document().ok_or(ConfigurationError::NoDocument)?;
                let found = document.query_selector(selector).map_err(|_| {
                    ConfigurationError::InvalidSelector {
                        selector: selector.clone(),
                    }
                })?;
                let element = found.ok_or_else(|| ConfigurationError::ContainerNotFound {
                    selector: selector.clone(),
                })?;
                element
                    .dyn_into::<HtmlElement>()
                    .map_err(|_| ConfigurationError::NotAnElement)?
            }
        };
        ensure_positioned(window, &element);
        Ok(Frame::Element(element))
    }
}

fn ensure_positioned(window: &Window, element: &HtmlElement) {
    let position = window
        .get_computed_style(element)
        .ok()
        .flatten()
        .and_then(|style| style.get_property_value("position").ok())
        .unwrap_or_default();
    if !is_positioned(&position) {
        // A rejected write leaves offsets measured against the nearest
        // positioned ancestor instead of the container.
        let applied = element.style().set_property("position", "relative");
        debug_assert!(applied.is_ok(), "container style is read-only");
    }
}

/// Returns `true` for computed `position` values that establish an offset
/// parent.
pub(crate) fn is_positioned(position: &str) -> bool {
    matches!(position, "fixed" | "relative" | "absolute")
}
