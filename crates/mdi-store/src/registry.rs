#![forbid(unsafe_code)]

//! Observer side-table.
//!
//! Callbacks cannot live in [`TabState`](crate::TabState): the state is
//! meant to be snapshotted and serialized, closures are neither. They are
//! kept here instead, keyed exactly like the tabs they belong to.
//!
//! # Invariants
//!
//! 1. After every store operation the set of keys in the registry equals the
//!    set of keys in the state's `items`.
//! 2. Re-registering a key appends; it never replaces or reorders.
//! 3. `rename` moves an entry wholesale; the old key is gone afterwards.
//! 4. `take`/`clear` drop callbacks, so nothing fires for a key after its
//!    entry is gone.
//!
//! Mutation is crate-private: only the reducer touches the table, inside the
//! same operation that changes the state.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::key::TabKey;
use crate::tab::{CloseCallback, ObserverCounts, Observers, UpdateCallback};

/// Mapping from tab key to that tab's observers.
pub struct ObserverRegistry<T> {
    entries: AHashMap<TabKey, Observers<T>>,
}

impl<T> Default for ObserverRegistry<T> {
    fn default() -> Self {
        Self {
            entries: AHashMap::new(),
        }
    }
}

impl<T> fmt::Debug for ObserverRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<T> ObserverRegistry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn counts(&self, key: &str) -> Option<ObserverCounts> {
        self.entries.get(key).map(Observers::counts)
    }

    /// Create the entry for `key`, or merge into the existing one.
    pub(crate) fn register(&mut self, key: TabKey, observers: Observers<T>) {
        self.entries.entry(key).or_default().merge(observers);
    }

    /// Move the entry under `from` to `to`.
    ///
    /// The caller has already checked that `to` is free; an existing entry
    /// under `to` would otherwise be merged into.
    pub(crate) fn rename(&mut self, from: &str, to: TabKey) {
        if let Some(observers) = self.entries.remove(from) {
            self.register(to, observers);
        }
    }

    /// Snapshot of the update callbacks for `key`, in registration order.
    pub(crate) fn update_callbacks(&self, key: &str) -> Vec<UpdateCallback<T>> {
        self.entries
            .get(key)
            .map(|o| o.on_update.clone())
            .unwrap_or_default()
    }

    /// Remove the entry for `key`, returning its close callbacks.
    pub(crate) fn take_close_callbacks(&mut self, key: &str) -> Vec<CloseCallback<T>> {
        self.entries
            .remove(key)
            .map(|o| o.on_close)
            .unwrap_or_default()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &TabKey> {
        self.entries.keys()
    }
}

/// Shared handle to an [`ObserverRegistry`].
///
/// Every clone of a store handle reaches the same table through this, so a
/// close issued from one call site fires callbacks registered at another.
pub struct SharedRegistry<T> {
    inner: Rc<RefCell<ObserverRegistry<T>>>,
}

impl<T> Clone for SharedRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedRegistry<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObserverRegistry::new())),
        }
    }
}

impl<T> fmt::Debug for SharedRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedRegistry")
            .field(&*self.inner.borrow())
            .finish()
    }
}

impl<T> SharedRegistry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only access to the table.
    pub fn with<R>(&self, f: impl FnOnce(&ObserverRegistry<T>) -> R) -> R {
        f(&self.inner.borrow())
    }

    /// Exclusive access for the reducer.
    ///
    /// # Panics
    ///
    /// Panics if called while a callback borrowed from this table is being
    /// run. Callbacks are always fired after the borrow is released.
    pub(crate) fn borrow_mut(&self) -> std::cell::RefMut<'_, ObserverRegistry<T>> {
        self.inner.borrow_mut()
    }
}
