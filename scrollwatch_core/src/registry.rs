// Copyright 2026 the Scrollwatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One watch per target.
//!
//! [`Registry`] is a side table from a target key to a weak watch handle.
//! Attaching twice to the same key returns the existing watch. The table
//! never keeps a watch alive: entries whose watch was detached (or dropped)
//! are treated as absent. They are pruned on access, and the whole table is
//! swept whenever inserts double its size since the last sweep, so keys that
//! are never looked up again do not accumulate.
//!
//! The key is whatever identity the backend can derive for a target. The web
//! backend hands out keys from a JS `WeakMap` so the table holds no element
//! references at all.

use alloc::collections::BTreeMap;
use core::fmt;

use crate::host::Host;
use crate::watch::{Watch, WeakWatch};

/// Weak side table of live watches keyed by target identity.
pub struct Registry<K, H: Host> {
    entries: BTreeMap<K, WeakWatch<H>>,
    sweep_at: usize,
}

/// Smallest table size that triggers a sweep on insert.
const MIN_SWEEP: usize = 16;

impl<K: Ord, H: Host> Registry<K, H> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            sweep_at: MIN_SWEEP,
        }
    }

    /// Returns the live, attached watch for `key`, if any.
    pub fn get(&mut self, key: &K) -> Option<Watch<H>> {
        let live = self
            .entries
            .get(key)
            .and_then(WeakWatch::upgrade)
            .filter(|watch| !watch.is_detached());
        if live.is_none() {
            self.entries.remove(key);
        }
        live
    }

    /// Returns the watch for `key`, creating it with `create` if there is no
    /// live one.
    ///
    /// Errors from `create` are returned unchanged and nothing is recorded.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        create: impl FnOnce() -> Result<Watch<H>, E>,
    ) -> Result<Watch<H>, E> {
        if let Some(watch) = self.get(&key) {
            return Ok(watch);
        }
        let watch = create()?;
        if self.entries.len() >= self.sweep_at {
            self.prune();
            self.sweep_at = (self.entries.len() * 2).max(MIN_SWEEP);
        }
        self.entries.insert(key, watch.downgrade());
        Ok(watch)
    }

    /// Infallible form of [`get_or_try_insert_with`](Self::get_or_try_insert_with).
    pub fn get_or_insert_with(&mut self, key: K, create: impl FnOnce() -> Watch<H>) -> Watch<H> {
        match self.get_or_try_insert_with(key, || Ok::<_, core::convert::Infallible>(create())) {
            Ok(watch) => watch,
            Err(never) => match never {},
        }
    }

    /// Forgets `key` without touching its watch.
    pub fn remove(&mut self, key: &K) -> Option<Watch<H>> {
        self.entries.remove(key).and_then(|weak| weak.upgrade())
    }

    /// Drops every entry whose watch is gone or detached.
    pub fn prune(&mut self) {
        self.entries
            .retain(|_, weak| weak.upgrade().is_some_and(|watch| !watch.is_detached()));
    }

    /// Number of recorded entries, including ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Ord, H: Host> Default for Registry<K, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, H: Host> fmt::Debug for Registry<K, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchConfig;
    use crate::test_host::{MockHost, MockState};
    use alloc::vec::Vec;

    #[test]
    fn repeated_attach_returns_existing_watch() {
        let state = MockState::new();
        let mut registry = Registry::<u32, MockHost>::new();
        let first = registry.get_or_insert_with(1, || Watch::new(state.host(), WatchConfig::new()));
        let second =
            registry.get_or_insert_with(1, || Watch::new(state.host(), WatchConfig::new()));
        assert!(first.ptr_eq(&second));
        assert_eq!(state.listens(), 1, "second factory never ran");
    }

    #[test]
    fn released_watch_is_forgotten() {
        let state = MockState::new();
        let mut registry = Registry::<u32, MockHost>::new();
        let watch = registry.get_or_insert_with(1, || Watch::new(state.host(), WatchConfig::new()));
        watch.detach();
        drop(watch);
        assert!(registry.get(&1).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn detached_watch_is_replaced() {
        let state = MockState::new();
        let mut registry = Registry::<u32, MockHost>::new();
        let first = registry.get_or_insert_with(1, || Watch::new(state.host(), WatchConfig::new()));
        first.detach();
        let second =
            registry.get_or_insert_with(1, || Watch::new(state.host(), WatchConfig::new()));
        assert!(!first.ptr_eq(&second));
        assert!(!second.is_detached());
    }

    #[test]
    fn failed_creation_records_nothing() {
        let mut registry = Registry::<u32, MockHost>::new();
        let result = registry.get_or_try_insert_with(1, || Err("no container"));
        assert_eq!(result.err(), Some("no container"));
        assert!(registry.is_empty());
    }

    #[test]
    fn prune_keeps_live_entries() {
        let state = MockState::new();
        let mut registry = Registry::<u32, MockHost>::new();
        let kept = registry.get_or_insert_with(1, || Watch::new(state.host(), WatchConfig::new()));
        let gone = registry.get_or_insert_with(2, || Watch::new(state.host(), WatchConfig::new()));
        gone.detach();
        drop(gone);
        assert_eq!(registry.len(), 2);
        registry.prune();
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&1).is_some_and(|w| w.ptr_eq(&kept)));
    }

    #[test]
    fn inserts_sweep_entries_that_are_never_looked_up() {
        let mut registry = Registry::<u32, MockHost>::new();
        let mut kept = Vec::new();
        for key in 0..1000 {
            let state = MockState::new();
            let watch =
                registry.get_or_insert_with(key, || Watch::new(state.host(), WatchConfig::new()));
            if key % 100 == 0 {
                kept.push((key, watch));
            } else {
                watch.detach();
            }
        }
        assert!(
            registry.len() <= 2 * MIN_SWEEP,
            "{} entries retained",
            registry.len()
        );
        for (key, watch) in &kept {
            assert!(registry.get(key).is_some_and(|w| w.ptr_eq(watch)));
        }
    }
}
