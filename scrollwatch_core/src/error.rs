// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction errors.
//!
//! Runtime geometry problems are never errors: a detached target or an empty
//! container degrades to a visibility ratio of `0`. The only failure is a
//! container that cannot be resolved when a watch is created.

use alloc::string::String;
use core::fmt;

/// The configured container could not be resolved.
///
/// Returned by backends before a [`Watch`](crate::watch::Watch) exists, so the
/// caller never receives a handle for a misconfigured target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The container selector matched no element.
    ContainerNotFound {
        /// The selector that was looked up.
        selector: String,
    },
    /// The container selector could not be parsed by the host.
    InvalidSelector {
        /// The rejected selector.
        selector: String,
    },
    /// The container resolved to something that cannot scroll or be
    /// positioned (for example an SVG node).
    NotAnElement,
    /// No window or document is available to resolve against.
    NoDocument,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainerNotFound { selector } => {
                write!(f, "container selector `{selector}` matched no element")
            }
            Self::InvalidSelector { selector } => {
                write!(f, "container selector `{selector}` is not valid")
            }
            Self::NotAnElement => f.write_str("container is not an HTML element"),
            Self::NoDocument => f.write_str("no window or document to resolve the container in"),
        }
    }
}

impl core::error::Error for ConfigurationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_names_the_selector() {
        let err = ConfigurationError::ContainerNotFound {
            selector: "#scrolly".into(),
        };
        assert_eq!(err.to_string(), "container selector `#scrolly` matched no element");
    }
}
